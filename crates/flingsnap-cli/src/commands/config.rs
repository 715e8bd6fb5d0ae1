use std::path::Path;

use anyhow::Result;
use tracing::info;

use flingsnap_core::AppConfig;

pub fn show(path: &Path) -> Result<()> {
    let config = AppConfig::load_from(path)?;
    if !path.exists() {
        println!("# {} not found, showing defaults", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    AppConfig::default().save_to(path)?;
    info!(path = %path.display(), "Wrote default configuration");
    println!("Wrote default config to {}", path.display());
    Ok(())
}

pub fn path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flingsnap_core::AppConfig;

mod commands;

use commands::ListArgs;

#[derive(Parser)]
#[command(name = "flingsnap")]
#[command(author, version, about = "Simulate fling-to-snap scrolling over a list")]
struct Cli {
    /// Config file (defaults to ~/.config/flingsnap/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fling a list and print every animation frame
    Simulate {
        #[command(flatten)]
        list: ListArgs,
        /// Release velocity in units per second (negative flings toward the start)
        #[arg(short, long, allow_negative_numbers = true)]
        velocity: f32,
        /// Print JSON lines instead of a table
        #[arg(long)]
        json: bool,
        /// Pace frames in wall-clock time; Ctrl+C cancels the fling
        #[arg(long)]
        realtime: bool,
    },
    /// Print the index a fling would settle on without animating
    Target {
        #[command(flatten)]
        list: ListArgs,
        #[arg(short, long, allow_negative_numbers = true)]
        velocity: f32,
        #[arg(long)]
        json: bool,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}

fn init_logging(default_level: &str) {
    // Frames go to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Load the config file and start logging at its level
fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load_from(path)?;
    init_logging(&config.general.log_level);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);

    match cli.command {
        Commands::Simulate {
            list,
            velocity,
            json,
            realtime,
        } => {
            let config = load_config(&config_path)?;
            commands::simulate::run(&config, &list, velocity, json, realtime).await
        }
        Commands::Target {
            list,
            velocity,
            json,
        } => {
            let config = load_config(&config_path)?;
            commands::target::run(&config, &list, velocity, json)
        }
        Commands::Config { action } => {
            // Must work even when the file does not parse
            init_logging("info");
            match action {
                ConfigAction::Show => commands::config::show(&config_path),
                ConfigAction::Init { force } => commands::config::init(&config_path, force),
                ConfigAction::Path => commands::config::path(&config_path),
            }
        }
    }
}

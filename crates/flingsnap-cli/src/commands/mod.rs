pub mod config;
pub mod simulate;
pub mod target;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};

use flingsnap_core::{AppConfig, ListState, ScrollSurface, SnapAlignment};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Alignment {
    Start,
    Center,
    End,
}

impl From<Alignment> for SnapAlignment {
    fn from(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Start => SnapAlignment::Start,
            Alignment::Center => SnapAlignment::Center,
            Alignment::End => SnapAlignment::End,
        }
    }
}

/// List geometry shared by the simulation commands
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Number of items
    #[arg(long, default_value_t = 20)]
    pub items: usize,
    /// Item size along the scroll axis
    #[arg(long, default_value_t = 100)]
    pub item_size: i32,
    /// Gap between adjacent items
    #[arg(long, default_value_t = 0)]
    pub spacing: i32,
    /// Viewport size along the scroll axis
    #[arg(long, default_value_t = 300)]
    pub viewport: i32,
    /// Content padding before the first and after the last item
    #[arg(long, default_value_t = 0)]
    pub padding: i32,
    /// Item the list starts snapped on
    #[arg(long, default_value_t = 0)]
    pub start_index: usize,
    /// Extra scroll applied after snapping to the start item
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub start_offset: f32,
    /// Snap alignment (defaults to the configured one)
    #[arg(long, value_enum)]
    pub alignment: Option<Alignment>,
}

impl ListArgs {
    /// Lay out the list and scroll it to the requested start position
    pub fn build(&self, config: &AppConfig) -> Result<ListState> {
        if self.item_size <= 0 {
            bail!("--item-size must be positive, got {}", self.item_size);
        }
        if self.viewport <= 0 {
            bail!("--viewport must be positive, got {}", self.viewport);
        }
        if self.spacing < 0 || self.padding < 0 {
            bail!("--spacing and --padding must not be negative");
        }

        let alignment = self
            .alignment
            .map(SnapAlignment::from)
            .unwrap_or(config.snap.alignment);

        let mut list = ListState::uniform(self.items, self.item_size, self.viewport)
            .with_spacing(self.spacing)
            .with_content_padding(self.padding, self.padding)
            .with_snap_offset(alignment);
        list.scroll_to_index(self.start_index.min(self.items.saturating_sub(1)));
        if self.start_offset != 0.0 {
            list.scroll_by(self.start_offset);
        }

        Ok(list)
    }
}

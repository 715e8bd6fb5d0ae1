use std::fmt;
use std::sync::Arc;

use super::{Item, Viewport};
use crate::config::SnapAlignment;

type OffsetFn = dyn Fn(&SnapContext<'_>, &Item) -> i32 + Send + Sync;

/// Layout state a resting offset is computed against
#[derive(Debug, Clone, Copy)]
pub struct SnapContext<'a> {
    pub viewport: Viewport,
    pub visible_items: &'a [Item],
    pub total_items_count: usize,
}

/// Where inside the viewport an item rests once snapped
#[derive(Clone, Default)]
pub enum SnapOffset {
    Start,
    #[default]
    Center,
    End,
    /// Caller-defined resting offset
    Custom(Arc<OffsetFn>),
}

impl SnapOffset {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&SnapContext<'_>, &Item) -> i32 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Resting offset of `item` inside the context's viewport
    pub fn offset_for(&self, context: &SnapContext<'_>, item: &Item) -> i32 {
        let viewport = context.viewport;
        match self {
            Self::Start => viewport.start,
            Self::Center => viewport.start + (viewport.end - viewport.start - item.size) / 2,
            Self::End => viewport.end - item.size,
            Self::Custom(f) => f(context, item),
        }
    }
}

impl fmt::Debug for SnapOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("Start"),
            Self::Center => f.write_str("Center"),
            Self::End => f.write_str("End"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<SnapAlignment> for SnapOffset {
    fn from(alignment: SnapAlignment) -> Self {
        match alignment {
            SnapAlignment::Start => Self::Start,
            SnapAlignment::Center => Self::Center,
            SnapAlignment::End => Self::End,
        }
    }
}

//! Read-only layout view the snapping engine operates over
//!
//! `LayoutInfo` is a capability trait: implementors expose viewport bounds,
//! the visible items and the snap alignment, and the provided methods derive
//! everything else (current item, snap distances, boundary checks).
//!
//! Two adapters ship with the crate:
//! - `ListState` - a live, scrollable list that re-lays-out after each delta
//! - `SnapshotLayout` - a static snapshot pushed by the host (also used as a mock)

pub mod list;
pub mod snap_offset;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::physics::DecayModel;

pub use list::ListState;
pub use snap_offset::{SnapContext, SnapOffset};
pub use snapshot::{LayoutSnapshot, SnapshotLayout};

/// A laid-out item: its index, signed offset from the viewport origin and size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub offset: i32,
    pub size: i32,
}

impl Item {
    pub fn new(index: usize, offset: i32, size: i32) -> Self {
        Self { index, offset, size }
    }

    /// Offset of the item's trailing edge
    #[inline]
    pub fn end(&self) -> i32 {
        self.offset + self.size
    }
}

/// The span items snap against, in the same coordinates as item offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub start: i32,
    pub end: i32,
}

/// Live view over a scrollable list's layout
pub trait LayoutInfo {
    /// Leading edge of the snap area
    fn start_scroll_offset(&self) -> i32;

    /// Trailing edge of the snap area
    fn end_scroll_offset(&self) -> i32;

    /// Visible items ordered by ascending offset
    fn visible_items(&self) -> &[Item];

    fn total_items_count(&self) -> usize;

    /// Alignment used to compute each item's resting offset
    fn snap_offset(&self) -> &SnapOffset;

    fn viewport(&self) -> Viewport {
        Viewport {
            start: self.start_scroll_offset(),
            end: self.end_scroll_offset(),
        }
    }

    /// Offset at which `item` rests when snapped
    fn snap_offset_for_item(&self, item: &Item) -> i32 {
        let context = SnapContext {
            viewport: self.viewport(),
            visible_items: self.visible_items(),
            total_items_count: self.total_items_count(),
        };
        self.snap_offset().offset_for(&context, item)
    }

    /// The last visible item that sits at or before its snap offset
    fn current_item(&self) -> Option<Item> {
        self.visible_items()
            .iter()
            .rev()
            .find(|item| item.offset <= self.snap_offset_for_item(item))
            .copied()
    }

    /// Signed distance to scroll so that item `index` rests at its snap offset
    ///
    /// Exact for visible items; otherwise extrapolated from the current item
    /// using the estimated per-item extent. Returns 0 when nothing is current.
    fn distance_to_index_snap(&self, index: usize) -> i32 {
        if let Some(item) = self.visible_items().iter().find(|item| item.index == index) {
            return item.offset.saturating_sub(self.snap_offset_for_item(item));
        }

        let Some(current) = self.current_item() else {
            return 0;
        };
        let index_delta = index as f64 - current.index as f64;
        let estimated = (index_delta * self.estimate_distance_per_item() as f64).round() as i32;
        let current_distance = current.offset.saturating_sub(self.snap_offset_for_item(&current));
        estimated.saturating_add(current_distance)
    }

    fn can_scroll_toward_start(&self) -> bool {
        self.visible_items()
            .first()
            .is_some_and(|item| item.index > 0 || item.offset < self.start_scroll_offset())
    }

    fn can_scroll_toward_end(&self) -> bool {
        let count = self.total_items_count();
        self.visible_items()
            .last()
            .is_some_and(|item| item.index + 1 < count || item.end() > self.end_scroll_offset())
    }

    /// Gap between the first two visible items (0 with fewer than two)
    fn item_spacing(&self) -> i32 {
        match self.visible_items() {
            [first, second, ..] => second.offset - first.end(),
            _ => 0,
        }
    }

    /// Mean extent of one item including spacing, or -1.0 for an empty layout
    fn estimate_distance_per_item(&self) -> f32 {
        let items = self.visible_items();
        let Some(min_start) = items.iter().map(|item| item.offset).min() else {
            return -1.0;
        };
        let Some(max_end) = items.iter().map(Item::end).max() else {
            return -1.0;
        };

        match max_end - min_start {
            0 => -1.0,
            distance => (distance + self.item_spacing()) as f32 / items.len() as f32,
        }
    }

    /// Index a fling with `velocity` should come to rest on
    fn determine_target_index(
        &self,
        velocity: f32,
        decay: &dyn DecayModel,
        max_fling_distance: f32,
        near_zero_velocity: f32,
    ) -> Option<usize> {
        crate::snap::resolver::determine_target_index(
            self,
            velocity,
            decay,
            max_fling_distance,
            near_zero_velocity,
        )
    }
}

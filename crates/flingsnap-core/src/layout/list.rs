//! Live scrollable list adapter
//!
//! Keeps a continuous scroll position over a strip of items and recomputes
//! the visible window after every applied delta, the way a lazily laid-out
//! list would between frames.

use super::{Item, LayoutInfo, LayoutSnapshot, SnapOffset};
use crate::snap::ScrollSurface;

/// A scrollable list of items with a viewport and optional content padding
#[derive(Debug, Clone)]
pub struct ListState {
    /// Item sizes along the scroll axis
    sizes: Vec<i32>,
    /// Content position of each item's leading edge
    starts: Vec<i64>,
    spacing: i32,
    viewport: i32,
    before_padding: i32,
    after_padding: i32,
    /// Current scroll position, always within `[0, max_scroll]`
    scroll: f64,
    snap_offset: SnapOffset,
    /// Visible window, rebuilt after every layout change
    visible: Vec<Item>,
}

impl ListState {
    /// Create a list from per-item sizes (sizes below 1 are raised to 1)
    pub fn new(item_sizes: Vec<i32>, viewport: i32) -> Self {
        let mut state = Self {
            sizes: item_sizes.into_iter().map(|size| size.max(1)).collect(),
            starts: Vec::new(),
            spacing: 0,
            viewport: viewport.max(0),
            before_padding: 0,
            after_padding: 0,
            scroll: 0.0,
            snap_offset: SnapOffset::default(),
            visible: Vec::new(),
        };
        state.rebuild();
        state
    }

    /// Create a list of `count` items sharing one size
    pub fn uniform(count: usize, item_size: i32, viewport: i32) -> Self {
        Self::new(vec![item_size; count], viewport)
    }

    /// Set the gap between adjacent items
    pub fn with_spacing(mut self, spacing: i32) -> Self {
        self.spacing = spacing.max(0);
        self.rebuild();
        self
    }

    /// Reserve space before the first and after the last item
    ///
    /// The snap area shrinks by the same amounts, so a picker padded by half
    /// its viewport minus half a row can center its first and last rows.
    pub fn with_content_padding(mut self, before: i32, after: i32) -> Self {
        self.before_padding = before.max(0);
        self.after_padding = after.max(0);
        self.rebuild();
        self
    }

    pub fn with_snap_offset(mut self, snap_offset: impl Into<SnapOffset>) -> Self {
        self.snap_offset = snap_offset.into();
        self.relayout();
        self
    }

    pub fn item_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn viewport_size(&self) -> i32 {
        self.viewport
    }

    /// Current scroll position
    pub fn scroll_position(&self) -> f32 {
        self.scroll as f32
    }

    /// Largest reachable scroll position
    pub fn max_scroll(&self) -> f32 {
        self.max_scroll_exact() as f32
    }

    /// Jump to a scroll position (clamped, no animation)
    pub fn scroll_to(&mut self, position: f32) {
        self.scroll = (position as f64).clamp(0.0, self.max_scroll_exact());
        self.relayout();
    }

    /// Jump so that item `index` rests on its snap offset, as far as the bounds allow
    pub fn scroll_to_index(&mut self, index: usize) {
        let Some(&start) = self.starts.get(index) else {
            return;
        };
        let probe = Item::new(index, 0, self.sizes[index]);
        let resting = self.snap_offset_for_item(&probe) as i64;
        self.scroll_to((start - resting) as f32);
    }

    /// Export the current layout as a plain snapshot
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            start_bound: self.start_scroll_offset(),
            end_bound: self.end_scroll_offset(),
            visible_items: self.visible.clone(),
            total_item_count: self.item_count(),
        }
    }

    fn content_length(&self) -> i64 {
        let items: i64 = self.sizes.iter().map(|&size| size as i64).sum();
        let gaps = self.sizes.len().saturating_sub(1) as i64 * self.spacing as i64;
        self.before_padding as i64 + items + gaps + self.after_padding as i64
    }

    fn max_scroll_exact(&self) -> f64 {
        (self.content_length() - self.viewport as i64).max(0) as f64
    }

    fn rebuild(&mut self) {
        let mut position = self.before_padding as i64;
        self.starts = self
            .sizes
            .iter()
            .map(|&size| {
                let start = position;
                position += size as i64 + self.spacing as i64;
                start
            })
            .collect();
        self.scroll = self.scroll.clamp(0.0, self.max_scroll_exact());
        self.relayout();
    }

    fn relayout(&mut self) {
        // Offsets are reported in whole units, like a pixel-snapped layout pass
        let scroll_px = self.scroll.round() as i64;
        let first = self
            .starts
            .partition_point(|&start| start <= scroll_px)
            .saturating_sub(1);

        self.visible = (first..self.sizes.len())
            .map(|index| {
                Item::new(
                    index,
                    (self.starts[index] - scroll_px) as i32,
                    self.sizes[index],
                )
            })
            .skip_while(|item| item.end() <= 0)
            .take_while(|item| item.offset < self.viewport)
            .collect();
    }
}

impl LayoutInfo for ListState {
    fn start_scroll_offset(&self) -> i32 {
        self.before_padding
    }

    fn end_scroll_offset(&self) -> i32 {
        self.viewport - self.after_padding
    }

    fn visible_items(&self) -> &[Item] {
        &self.visible
    }

    fn total_items_count(&self) -> usize {
        self.sizes.len()
    }

    fn snap_offset(&self) -> &SnapOffset {
        &self.snap_offset
    }
}

impl ScrollSurface for ListState {
    fn scroll_by(&mut self, delta: f32) -> f32 {
        let requested = self.scroll + delta as f64;
        let clamped = requested.clamp(0.0, self.max_scroll_exact());
        let consumed = if clamped == requested {
            delta
        } else {
            (clamped - self.scroll) as f32
        };
        self.scroll = clamped;
        self.relayout();
        consumed
    }
}

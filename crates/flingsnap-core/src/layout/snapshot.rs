use serde::{Deserialize, Serialize};

use super::{Item, LayoutInfo, SnapOffset};
use crate::{Error, Result};

/// A host-produced layout pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub start_bound: i32,
    pub end_bound: i32,
    /// Visible items, front to back
    pub visible_items: Vec<Item>,
    pub total_item_count: usize,
}

impl LayoutSnapshot {
    /// Check that visible items are sorted by offset and form a contiguous
    /// index range inside `[0, total_item_count)`
    pub fn validate(&self) -> Result<()> {
        for pair in self.visible_items.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.offset < prev.offset {
                return Err(Error::InvalidLayout(format!(
                    "item {} at offset {} precedes item {} at offset {}",
                    next.index, next.offset, prev.index, prev.offset
                )));
            }
            if next.index != prev.index + 1 {
                return Err(Error::InvalidLayout(format!(
                    "visible indices are not contiguous: {} follows {}",
                    next.index, prev.index
                )));
            }
        }

        if let Some(last) = self.visible_items.last() {
            if last.index >= self.total_item_count {
                return Err(Error::InvalidLayout(format!(
                    "item {} is outside {} items",
                    last.index, self.total_item_count
                )));
            }
        }

        if let Some(item) = self.visible_items.iter().find(|item| item.size <= 0) {
            return Err(Error::InvalidLayout(format!(
                "item {} has non-positive size {}",
                item.index, item.size
            )));
        }

        Ok(())
    }
}

/// `LayoutInfo` over the most recent snapshot a host pushed
#[derive(Debug, Clone)]
pub struct SnapshotLayout {
    snapshot: LayoutSnapshot,
    snap_offset: SnapOffset,
}

impl SnapshotLayout {
    pub fn new(snapshot: LayoutSnapshot, snap_offset: impl Into<SnapOffset>) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            snapshot,
            snap_offset: snap_offset.into(),
        })
    }

    pub fn snapshot(&self) -> &LayoutSnapshot {
        &self.snapshot
    }

    /// Replace the snapshot after a new layout pass
    pub fn update(&mut self, snapshot: LayoutSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.snapshot = snapshot;
        Ok(())
    }
}

impl LayoutInfo for SnapshotLayout {
    fn start_scroll_offset(&self) -> i32 {
        self.snapshot.start_bound
    }

    fn end_scroll_offset(&self) -> i32 {
        self.snapshot.end_bound
    }

    fn visible_items(&self) -> &[Item] {
        &self.snapshot.visible_items
    }

    fn total_items_count(&self) -> usize {
        self.snapshot.total_item_count
    }

    fn snap_offset(&self) -> &SnapOffset {
        &self.snap_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(items: Vec<Item>, total: usize) -> LayoutSnapshot {
        LayoutSnapshot {
            start_bound: 0,
            end_bound: 300,
            visible_items: items,
            total_item_count: total,
        }
    }

    #[test]
    fn test_rejects_unsorted_items() {
        let items = vec![Item::new(0, 100, 100), Item::new(1, 0, 100)];
        assert!(matches!(
            SnapshotLayout::new(snapshot(items, 5), SnapOffset::Start),
            Err(Error::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_rejects_gaps_and_overflow() {
        let gap = vec![Item::new(0, 0, 100), Item::new(2, 100, 100)];
        assert!(snapshot(gap, 5).validate().is_err());

        let overflow = vec![Item::new(4, 0, 100), Item::new(5, 100, 100)];
        assert!(snapshot(overflow, 5).validate().is_err());
    }

    #[test]
    fn test_update_keeps_previous_on_error() {
        let mut layout =
            SnapshotLayout::new(snapshot(vec![Item::new(0, 0, 100)], 3), SnapOffset::Start)
                .unwrap();
        let bad = snapshot(vec![Item::new(7, 0, 100)], 3);
        assert!(layout.update(bad).is_err());
        assert_eq!(layout.visible_items()[0].index, 0);
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "start_bound": 0,
            "end_bound": 300,
            "visible_items": [
                {"index": 4, "offset": 0, "size": 100},
                {"index": 5, "offset": 100, "size": 100}
            ],
            "total_item_count": 20
        }"#;
        let snapshot: LayoutSnapshot = serde_json::from_str(json).unwrap();
        let layout = SnapshotLayout::new(snapshot, SnapOffset::Center).unwrap();
        assert_eq!(layout.current_item().unwrap().index, 5);
    }
}

//! L4 Atomic Layer: Target index selection
//!
//! Stateless helpers that turn a release velocity into the index a fling
//! should rest on, plus the caller-facing strategies that remap that index
//! or bound how far a fling may travel.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::{SnapConfig, SnapIndexPolicy};
use crate::layout::LayoutInfo;
use crate::physics::DecayModel;

/// Pick the index a fling with `velocity` should settle on
///
/// Near-zero velocities choose whichever of the current item and its
/// successor is closer to its snap point (ties favour the successor).
/// Faster releases project the decay distance, clamped to
/// `±max_fling_distance`, and convert it to an index delta using the
/// estimated item extent. The result is always inside `[0, count)`.
/// Returns `None` when no item is current.
pub fn determine_target_index<L: LayoutInfo + ?Sized>(
    layout: &L,
    velocity: f32,
    decay: &dyn DecayModel,
    max_fling_distance: f32,
    near_zero_velocity: f32,
) -> Option<usize> {
    let current = layout.current_item()?;
    let last_index = layout.total_items_count().saturating_sub(1);

    let distance_per_item = layout.estimate_distance_per_item();
    if distance_per_item <= 0.0 {
        return Some(current.index);
    }

    let distance_to_current = layout.distance_to_index_snap(current.index);
    let distance_to_next = layout.distance_to_index_snap(current.index + 1);

    if velocity.abs() < near_zero_velocity {
        let index = if distance_to_current.abs() < distance_to_next.abs() {
            current.index
        } else {
            current.index + 1
        };
        return Some(index.min(last_index));
    }

    let max_distance = max_fling_distance.abs();
    let projected = decay
        .target_value(velocity)
        .max(-max_distance)
        .min(max_distance);
    // Start the projection from a snap boundary rather than mid-item
    let fling_distance = if velocity < 0.0 {
        (projected + distance_to_next as f32).min(0.0)
    } else {
        (projected + distance_to_current as f32).max(0.0)
    };

    let fling_index_delta = fling_distance as f64 / distance_per_item as f64;
    let current_offset_ratio = distance_to_current as f64 / distance_per_item as f64;
    let index_offset = (fling_index_delta - current_offset_ratio).round() as i64;
    let index = (current.index as i64)
        .saturating_add(index_offset)
        .clamp(0, last_index as i64) as usize;

    trace!(
        current = current.index,
        projected,
        fling_distance,
        distance_per_item,
        index,
        "Projected fling target"
    );

    Some(index)
}

/// Index handed to the remap strategy as the fling's starting point
///
/// Backward flings start from the item after the current one, which is the
/// item the snap line leaves behind when moving toward the start.
#[inline]
pub fn start_index(current_index: usize, velocity: f32) -> usize {
    if velocity < 0.0 {
        current_index + 1
    } else {
        current_index
    }
}

type SnapIndexFn = dyn Fn(&dyn LayoutInfo, usize, usize) -> usize + Send + Sync;

/// Remaps a resolved target given the start index
#[derive(Clone, Default)]
pub enum SnapIndex {
    /// Keep the resolved target
    #[default]
    Target,
    /// Stay within `max_skip` items of the start index
    Adjacent { max_skip: usize },
    /// Caller-defined remap `(layout, start_index, target_index) -> index`
    Custom(Arc<SnapIndexFn>),
}

impl SnapIndex {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&dyn LayoutInfo, usize, usize) -> usize + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn from_config(config: &SnapConfig) -> Self {
        match config.snap_index {
            SnapIndexPolicy::Target => Self::Target,
            SnapIndexPolicy::Adjacent => Self::Adjacent {
                max_skip: config.max_skip,
            },
        }
    }

    pub fn resolve(&self, layout: &dyn LayoutInfo, start_index: usize, target_index: usize) -> usize {
        match self {
            Self::Target => target_index,
            Self::Adjacent { max_skip } => target_index.clamp(
                start_index.saturating_sub(*max_skip),
                start_index.saturating_add(*max_skip),
            ),
            Self::Custom(f) => f(layout, start_index, target_index),
        }
    }
}

impl fmt::Debug for SnapIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => f.write_str("Target"),
            Self::Adjacent { max_skip } => f
                .debug_struct("Adjacent")
                .field("max_skip", max_skip)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

type MaxFlingFn = dyn Fn(&dyn LayoutInfo) -> f32 + Send + Sync;

/// Bound on the projected fling distance
#[derive(Clone, Default)]
pub enum MaxFlingDistance {
    #[default]
    Unbounded,
    /// Fixed distance in layout units
    Fixed(f32),
    /// Multiple of the estimated item extent
    Items(f32),
    Custom(Arc<MaxFlingFn>),
}

impl MaxFlingDistance {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&dyn LayoutInfo) -> f32 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn resolve(&self, layout: &dyn LayoutInfo) -> f32 {
        match self {
            Self::Unbounded => f32::MAX,
            Self::Fixed(distance) => *distance,
            Self::Items(items) => items * layout.estimate_distance_per_item(),
            Self::Custom(f) => f(layout),
        }
    }
}

impl fmt::Debug for MaxFlingDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("Unbounded"),
            Self::Fixed(distance) => f.debug_tuple("Fixed").field(distance).finish(),
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ListState, SnapOffset};
    use crate::physics::SplineDecay;

    const NEAR_ZERO: f32 = 0.5;

    fn list_at(scroll: f32) -> ListState {
        let mut state = ListState::uniform(20, 100, 300).with_snap_offset(SnapOffset::Center);
        state.scroll_to(scroll);
        state
    }

    fn target(layout: &ListState, velocity: f32) -> usize {
        determine_target_index(layout, velocity, &SplineDecay::default(), f32::MAX, NEAR_ZERO)
            .unwrap()
    }

    #[test]
    fn test_near_zero_picks_closest() {
        // Item 5 sits 30 past its snap point, item 6 is 70 away
        assert_eq!(target(&list_at(430.0), 0.0), 5);
        // Item 6 is 20 away
        assert_eq!(target(&list_at(480.0), 0.2), 6);
    }

    #[test]
    fn test_near_zero_tie_favours_next() {
        assert_eq!(target(&list_at(450.0), 0.0), 6);
    }

    #[test]
    fn test_fling_projection() {
        // 1200/s travels ~267 units, 100 units per item
        assert_eq!(target(&list_at(400.0), 1200.0), 8);
        // Backward projections start from the next item's snap point
        assert_eq!(target(&list_at(400.0), -1200.0), 3);
    }

    #[test]
    fn test_target_clamped_to_bounds() {
        for velocity in [1.0e6, 1.0e9, f32::MAX] {
            assert_eq!(target(&list_at(400.0), velocity), 19);
            assert_eq!(target(&list_at(400.0), -velocity), 0);
        }
    }

    #[test]
    fn test_max_fling_distance_limits_projection() {
        let layout = list_at(400.0);
        let index =
            determine_target_index(&layout, 1.0e6, &SplineDecay::default(), 150.0, NEAR_ZERO)
                .unwrap();
        assert_eq!(index, 7);
    }

    #[test]
    fn test_direction_is_monotonic() {
        for scroll in [100.0, 333.0, 450.0, 499.0, 1234.0] {
            let layout = list_at(scroll);
            let current = layout.current_item().unwrap().index;
            for velocity in [0.6, 50.0, 400.0, 2500.0, 9000.0] {
                assert!(target(&layout, velocity) >= current, "forward from {}", scroll);
                assert!(target(&layout, -velocity) <= current + 1, "backward from {}", scroll);
            }
        }
    }

    #[test]
    fn test_no_current_item() {
        let layout = ListState::new(Vec::new(), 300);
        assert!(determine_target_index(&layout, 100.0, &SplineDecay::default(), 1.0, NEAR_ZERO)
            .is_none());
    }

    #[test]
    fn test_start_index_bias() {
        assert_eq!(start_index(5, 300.0), 5);
        assert_eq!(start_index(5, 0.0), 5);
        assert_eq!(start_index(5, -300.0), 6);
    }

    #[test]
    fn test_adjacent_remap() {
        let layout = list_at(400.0);
        let remap = SnapIndex::Adjacent { max_skip: 1 };
        assert_eq!(remap.resolve(&layout, 5, 9), 6);
        assert_eq!(remap.resolve(&layout, 6, 1), 5);
        assert_eq!(remap.resolve(&layout, 0, 0), 0);
        assert_eq!(SnapIndex::Target.resolve(&layout, 5, 9), 9);
    }

    #[test]
    fn test_custom_remap_sees_layout() {
        let layout = list_at(400.0);
        let remap = SnapIndex::custom(|layout, _, target| target.min(layout.total_items_count() / 2));
        assert_eq!(remap.resolve(&layout, 5, 15), 10);
    }

    #[test]
    fn test_max_fling_distance_resolution() {
        let layout = list_at(400.0);
        assert_eq!(MaxFlingDistance::Unbounded.resolve(&layout), f32::MAX);
        assert!((MaxFlingDistance::Items(2.0).resolve(&layout) - 200.0).abs() < 0.001);
        assert!((MaxFlingDistance::Fixed(42.0).resolve(&layout) - 42.0).abs() < f32::EPSILON);
        assert_eq!(format!("{:?}", MaxFlingDistance::Items(2.0)), "Items(2.0)");
    }
}

use anyhow::Result;
use serde::Serialize;

use flingsnap_core::{AppConfig, FlingController, LayoutInfo};

use super::ListArgs;

#[derive(Debug, Serialize)]
struct TargetReport {
    velocity: f32,
    current_index: Option<usize>,
    /// Unconstrained decay distance for the velocity
    projected_distance: f32,
    distance_per_item: f32,
    /// A layout resting on an edge hands the velocity back instead of flinging
    at_edge: bool,
    target_index: Option<usize>,
    distance_to_target: Option<i32>,
}

pub fn run(config: &AppConfig, list: &ListArgs, velocity: f32, json: bool) -> Result<()> {
    let controller = FlingController::from_config(config)?;
    let host = list.build(config)?;

    let target_index = controller.resolve_target(&host, velocity)?;
    let report = TargetReport {
        velocity,
        current_index: host.current_item().map(|item| item.index),
        projected_distance: controller.decay().target_value(velocity),
        distance_per_item: host.estimate_distance_per_item(),
        at_edge: !host.can_scroll_toward_start() || !host.can_scroll_toward_end(),
        target_index,
        distance_to_target: target_index.map(|index| host.distance_to_index_snap(index)),
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    match (report.current_index, report.target_index) {
        (Some(current), Some(target)) => {
            println!("Current item: {}", current);
            println!("Target item:  {}", target);
            println!(
                "  Projected distance {:.2} over {:.2} per item",
                report.projected_distance, report.distance_per_item
            );
            if let Some(distance) = report.distance_to_target {
                println!("  Distance to target snap: {}", distance);
            }
            if report.at_edge {
                println!("  List rests on an edge; a fling would return its velocity unconsumed");
            }
        }
        _ => println!("No current item; nothing to fling."),
    }

    Ok(())
}

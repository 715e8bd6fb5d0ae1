use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::info;

use flingsnap_core::physics::frame_interval;
use flingsnap_core::{
    AppConfig, FlingController, FlingState, FlingStep, FrameClock, LayoutInfo, ListState,
    MonotonicClock, SnapScroller, VirtualClock,
};

use super::ListArgs;

/// One printed frame
#[derive(Debug, Serialize)]
struct FrameReport {
    frame: usize,
    time_ms: f64,
    scroll: f32,
    #[serde(flatten)]
    step: FlingStep,
}

/// Final line of a simulation
#[derive(Debug, Serialize)]
struct Summary {
    frames: usize,
    scroll: f32,
    current_index: Option<usize>,
    distance_to_snap: Option<i32>,
    #[serde(flatten)]
    state: FlingState,
}

struct Printer {
    json: bool,
    frames: usize,
}

impl Printer {
    fn frame(&mut self, host: &ListState, time: Duration, step: FlingStep) -> Result<()> {
        let report = FrameReport {
            frame: self.frames,
            time_ms: time.as_secs_f64() * 1000.0,
            scroll: host.scroll_position(),
            step,
        };
        self.frames += 1;

        if self.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            let index = report
                .step
                .current_index
                .map_or_else(|| "-".to_string(), |index| index.to_string());
            let snap_back = if report.step.snap_back != 0.0 {
                format!("  snap back {:.2}", report.step.snap_back)
            } else {
                String::new()
            };
            println!(
                "{:>4} {:>8.1}ms  {:<6}  delta {:>8.2}  consumed {:>8.2}  velocity {:>9.2}  scroll {:>8.2}  item {}{}",
                report.frame,
                report.time_ms,
                format!("{:?}", report.step.phase).to_lowercase(),
                report.step.requested,
                report.step.consumed,
                report.step.velocity,
                report.scroll,
                index,
                snap_back,
            );
        }
        Ok(())
    }

    fn summary(&self, host: &ListState, state: FlingState) -> Result<()> {
        let current = host.current_item();
        let summary = Summary {
            frames: self.frames,
            scroll: host.scroll_position(),
            current_index: current.map(|item| item.index),
            distance_to_snap: current.map(|item| host.distance_to_index_snap(item.index)),
            state,
        };

        if self.json {
            println!("{}", serde_json::to_string(&summary)?);
            return Ok(());
        }

        println!();
        match summary.state {
            FlingState::Finished { velocity_left } => println!(
                "Finished after {} frames, velocity left {:.2}",
                summary.frames, velocity_left
            ),
            FlingState::Cancelled => println!("Cancelled after {} frames", summary.frames),
            FlingState::Running => println!("Stopped after {} frames", summary.frames),
        }
        match (summary.current_index, summary.distance_to_snap) {
            (Some(index), Some(distance)) => println!(
                "  Resting on item {} ({} from its snap point), scroll {:.2}",
                index, distance, summary.scroll
            ),
            _ => println!("  No current item, scroll {:.2}", summary.scroll),
        }
        Ok(())
    }
}

pub async fn run(
    config: &AppConfig,
    list: &ListArgs,
    velocity: f32,
    json: bool,
    realtime: bool,
) -> Result<()> {
    let controller = FlingController::from_config(config)?;
    let host = list.build(config)?;
    let mut scroller = SnapScroller::new(host, controller);
    let mut printer = Printer { json, frames: 0 };

    if !json {
        let start = scroller.host().current_item();
        println!(
            "Fling {:.1} from scroll {:.2} (item {})",
            velocity,
            scroller.host().scroll_position(),
            start.map_or_else(|| "-".to_string(), |item| item.index.to_string()),
        );
    }

    let state = scroller.fling(velocity)?;
    if let Some(target) = scroller.current_fling_target() {
        info!(target_index = target, velocity, "Fling started");
        if !json {
            println!("Target item {}\n", target);
        }
    }

    let state = match state {
        FlingState::Running if realtime => {
            run_realtime(&mut scroller, &mut printer, config.frame.fps).await?
        }
        FlingState::Running => run_virtual(&mut scroller, &mut printer, config.frame.fps)?,
        settled => settled,
    };

    printer.summary(scroller.host(), state)
}

/// Step frames on a virtual clock as fast as possible
fn run_virtual(
    scroller: &mut SnapScroller<ListState>,
    printer: &mut Printer,
    fps: u32,
) -> Result<FlingState> {
    let mut clock = VirtualClock::new(fps);
    let mut state = FlingState::Running;

    loop {
        let time = clock.next_frame();
        let Some(step) = scroller.on_frame(time) else {
            break;
        };
        printer.frame(scroller.host(), time, step)?;
        state = step.state;
    }

    Ok(state)
}

/// Step frames at the configured rate until the fling ends or Ctrl+C
async fn run_realtime(
    scroller: &mut SnapScroller<ListState>,
    printer: &mut Printer,
    fps: u32,
) -> Result<FlingState> {
    let mut ticker = tokio::time::interval(frame_interval(fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut clock = MonotonicClock::new();
    let mut state = FlingState::Running;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while scroller.is_flinging() {
        tokio::select! {
            _ = ticker.tick() => {
                let time = clock.next_frame();
                if let Some(step) = scroller.on_frame(time) {
                    printer.frame(scroller.host(), time, step)?;
                    state = step.state;
                }
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received interrupt, cancelling fling");
                scroller.cancel();
                state = FlingState::Cancelled;
            }
        }
    }

    Ok(state)
}

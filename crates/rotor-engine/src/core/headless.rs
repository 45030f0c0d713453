use crate::device::{ContextKind, HeadlessBackend, HeadlessSurface, RenderResult};

use super::frame_loop::{FrameLoop, FrameScheduler, TickOutcome};
use super::harness::Harness;

/// Settings for an off-screen run.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u32,
    pub height: u32,
    /// Ticks to run before cancelling the loop.
    pub frames: u32,
    /// Synthetic gap between tick timestamps.
    pub frame_interval_ms: f64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 60,
            frame_interval_ms: 1000.0 / 60.0,
        }
    }
}

/// What an off-screen run did.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub context_kind: ContextKind,
    pub frames_rendered: u64,
    pub vertices_drawn: u64,
    pub final_angle_degrees: f64,
}

/// Scheduler that just remembers whether a tick is pending.
#[derive(Default)]
struct PendingFrame(bool);

impl FrameScheduler for PendingFrame {
    fn request_frame(&mut self) {
        self.0 = true;
    }
}

/// Runs the harness against an in-memory backend with synthetic timestamps.
///
/// Setup errors are returned as-is; the frame loop itself cannot fail.
pub fn run_headless(config: &HeadlessConfig) -> RenderResult<HeadlessReport> {
    let surface = HeadlessSurface::new(config.width, config.height);
    let mut harness: Harness<HeadlessBackend> = Harness::with_default_shaders(&surface)?;

    let mut frame_loop = FrameLoop::new();
    let cancel = frame_loop.cancel_handle();
    let mut scheduler = PendingFrame::default();

    if config.frames == 0 {
        cancel.cancel();
    }

    let mut tick = 0u32;
    frame_loop.start(&mut scheduler);
    while std::mem::take(&mut scheduler.0) {
        let now_ms = f64::from(tick) * config.frame_interval_ms;
        tick += 1;
        if frame_loop.tick(now_ms, &mut harness, &mut scheduler) == TickOutcome::Stopped {
            break;
        }
        if tick >= config.frames {
            cancel.cancel();
        }
    }

    let backend = harness.context.backend();
    let report = HeadlessReport {
        context_kind: harness.context.kind(),
        frames_rendered: backend.frames_submitted(),
        vertices_drawn: backend.vertices_drawn(),
        final_angle_degrees: frame_loop.rotation().degrees(),
    };

    log::info!(
        "headless run: {} frames, final angle {:.2}°",
        report.frames_rendered,
        report.final_angle_degrees
    );

    Ok(report)
}

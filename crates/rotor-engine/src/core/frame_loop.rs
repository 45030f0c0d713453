use std::cell::Cell;
use std::rc::Rc;

use crate::device::{Backend, PresentOutcome};
use crate::time::{Clock, RotationState};

use super::harness::Harness;

/// Host mechanism that invokes the next tick, once per display refresh.
pub trait FrameScheduler {
    /// Asks for exactly one more tick.
    fn request_frame(&mut self);
}

/// Stops a [`FrameLoop`] from re-scheduling itself.
///
/// Clones share the flag. Not `Send`: the loop and whoever cancels it live on the
/// thread that owns the context.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Whether the loop asked for another tick.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    Continue,
    Stopped,
}

/// Per-frame driver: draw, advance time, re-schedule.
#[derive(Debug, Default)]
pub struct FrameLoop {
    clock: Clock,
    rotation: RotationState,
    cancel: CancelHandle,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stops the loop from requesting further frames.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[inline]
    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    #[inline]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Requests the first tick.
    pub fn start<S: FrameScheduler + ?Sized>(&self, scheduler: &mut S) -> TickOutcome {
        if self.is_cancelled() {
            return TickOutcome::Stopped;
        }
        scheduler.request_frame();
        TickOutcome::Continue
    }

    /// Runs one frame at host timestamp `now_ms`.
    ///
    /// The frame is drawn with the angle accumulated so far, then the clock and the
    /// rotation advance, then the next tick is requested. A tick delivered after
    /// cancellation does nothing. Cancelling from inside a frame still lets that frame
    /// finish but no further tick is requested. A lost surface cancels the loop.
    pub fn tick<B, S>(
        &mut self,
        now_ms: f64,
        harness: &mut Harness<B>,
        scheduler: &mut S,
    ) -> TickOutcome
    where
        B: Backend,
        S: FrameScheduler + ?Sized,
    {
        if self.is_cancelled() {
            return TickOutcome::Stopped;
        }

        match harness.draw(&self.rotation) {
            PresentOutcome::Presented => {}
            PresentOutcome::Skipped => log::debug!("frame {} skipped", self.clock.frame_index()),
            PresentOutcome::Lost => {
                log::error!("surface lost; stopping frame loop");
                self.cancel.cancel();
            }
        }

        let elapsed = self.clock.advance(now_ms);
        self.rotation.advance(elapsed);

        if self.is_cancelled() {
            log::debug!("frame loop stopped after {} frames", self.clock.frame_index());
            return TickOutcome::Stopped;
        }

        scheduler.request_frame();
        TickOutcome::Continue
    }
}

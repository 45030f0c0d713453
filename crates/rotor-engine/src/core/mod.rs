//! Session and frame loop.
//!
//! `Harness` owns every GPU resource of a session; `FrameLoop` drives it once
//! per host frame callback. `run_headless` wires both to an in-memory backend.

mod frame_loop;
mod harness;
mod headless;

pub use frame_loop::{CancelHandle, FrameLoop, FrameScheduler, TickOutcome};
pub use harness::Harness;
pub use headless::{run_headless, HeadlessConfig, HeadlessReport};

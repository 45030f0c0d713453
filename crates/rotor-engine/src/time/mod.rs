//! Time subsystem.
//!
//! Frame timing and the animation state it drives. Nothing here reads the system
//! clock; timestamps come from whoever schedules frames.

mod clock;
mod rotation;

pub use clock::Clock;
pub use rotation::{RotationState, DEGREES_PER_SECOND};

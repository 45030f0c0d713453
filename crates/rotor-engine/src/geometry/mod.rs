//! Static vertex data.
//!
//! Buffers are write-once: no partial-update API exists.

mod buffer;
mod triangle;

pub use buffer::GeometryBuffer;
pub use triangle::{TriangleGeometry, TRIANGLE_COLORS, TRIANGLE_ITEM_SIZE, TRIANGLE_POSITIONS};

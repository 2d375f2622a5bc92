// Re-export glam for convenience
pub use glam::*;

// SDF math types
mod color;
mod compare;
pub use color::Color;
pub use compare::{equal, equal_f32, equal_with_tolerance, DEFAULT_TOLERANCE};

//! Tolerance-based comparison of real values.
//!
//! Schema objects compare their scalar fields with these helpers instead of
//! `==`, so values that went through a text round-trip still compare equal.

/// Default absolute tolerance used by [`equal`] and [`equal_f32`].
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Returns true if `a` and `b` differ by no more than `tolerance`.
#[inline]
pub fn equal_with_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Compare two doubles using [`DEFAULT_TOLERANCE`].
#[inline]
pub fn equal(a: f64, b: f64) -> bool {
    equal_with_tolerance(a, b, DEFAULT_TOLERANCE)
}

/// Compare two floats using [`DEFAULT_TOLERANCE`].
#[inline]
pub fn equal_f32(a: f32, b: f32) -> bool {
    equal_with_tolerance(a as f64, b as f64, DEFAULT_TOLERANCE)
}

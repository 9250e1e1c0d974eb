// Re-export glam for convenience
pub use glam::*;

// Octa math types
mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;

/// Tolerance used when checking that a direction has unit length.
pub const UNIT_TOLERANCE: f32 = 1e-3;

/// Returns true if `v` has unit length within [`UNIT_TOLERANCE`].
#[inline]
pub fn is_unit(v: Vec3) -> bool {
    (v.length_squared() - 1.0).abs() < UNIT_TOLERANCE
}

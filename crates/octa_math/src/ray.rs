use crate::{is_unit, Vec3};

/// A ray in 3D space: `origin + t * direction`.
///
/// The direction is expected to be unit length. This is checked in debug
/// builds only; release builds trust the caller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. `direction` must already be normalized.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        debug_assert!(
            is_unit(direction),
            "ray direction {direction:?} is not unit length"
        );
        Self { origin, direction }
    }

    /// Create a ray, normalizing `direction` first.
    #[inline]
    pub fn towards(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction.normalize())
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

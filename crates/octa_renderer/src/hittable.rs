//! Hittable trait and HitRecord for ray-object intersection.

use octa_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Produced by an intersection test and consumed by the integrator right
/// away; nothing keeps it beyond one trace step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Outward geometric normal (unit length), independent of the ray side
    pub normal: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f32,
}

impl HitRecord {
    /// Whether the ray arrived from the side the normal points to.
    #[inline]
    pub fn front_face(&self, ray: &Ray) -> bool {
        ray.direction().dot(self.normal) < 0.0
    }

    /// The normal flipped to point against the incoming ray.
    #[inline]
    pub fn facing_normal(&self, ray: &Ray) -> Vec3 {
        if self.front_face(ray) {
            self.normal
        } else {
            -self.normal
        }
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with `ray` strictly inside `ray_t`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}

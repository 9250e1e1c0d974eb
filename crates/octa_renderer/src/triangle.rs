//! Triangle primitive for ray tracing.
//!
//! Intersects the supporting plane first, then checks that the hit point
//! lies on the inner side of all three edges.

use crate::hittable::{HitRecord, Hittable};
use octa_math::{Aabb, Interval, Ray, Vec3};

/// Rays whose direction is this close to parallel with the plane miss.
const PARALLEL_EPSILON: f32 = 1e-6;

/// A triangle primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    vertices: [Vec3; 3],
    /// Cached unit face normal; zero for degenerate triangles
    normal: Vec3,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self {
            vertices: [v0, v1, v2],
            normal: face_normal(v0, v1, v2),
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    /// Unit face normal, following the counter-clockwise winding of the vertices.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Replace the vertices and recompute the face normal.
    pub fn set_vertices(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) {
        self.vertices = [v0, v1, v2];
        self.normal = face_normal(v0, v1, v2);
    }

    pub fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (a + b + c) / 3.0
    }

    /// Exact bounds of the three vertices, without padding.
    pub fn bounds(&self) -> Aabb {
        let [a, b, c] = self.vertices;
        Aabb::from_triangle(a, b, c)
    }
}

fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).normalize_or_zero()
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let n = self.normal;
        let [a, b, c] = self.vertices;

        let denom = n.dot(ray.direction());
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (n.dot(a) - n.dot(ray.origin())) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let p = ray.at(t);

        // Same-side test against every edge
        for (start, end) in [(a, b), (b, c), (c, a)] {
            if n.dot((end - start).cross(p - start)) < 0.0 {
                return None;
            }
        }

        Some(HitRecord { p, normal: n, t })
    }

    fn bounding_box(&self) -> Aabb {
        let bounds = self.bounds();
        Aabb::from_points(bounds.min(), bounds.max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: Interval = Interval::new(0.001, 1.0e7);

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_triangle_normal() {
        let tri = unit_triangle();
        assert!((tri.normal() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_triangle_hit_centroid_both_sides() {
        let tri = unit_triangle();
        let centroid = tri.centroid();

        for side in [1.0, -1.0] {
            let origin = centroid + tri.normal() * 3.0 * side;
            let ray = Ray::new(origin, -tri.normal() * side);
            let rec = tri.hit(&ray, RANGE).expect("centroid ray should hit");

            assert!(rec.t > 0.0);
            assert!((rec.t - 3.0).abs() < 1e-5);
            assert!((rec.p - centroid).length() < 1e-5);
            assert!((rec.normal.dot(tri.normal()).abs() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_triangle_miss_outside_edges() {
        let tri = unit_triangle();
        for target in [
            Vec3::new(-0.5, 0.2, 0.0),
            Vec3::new(0.2, -0.5, 0.0),
            Vec3::new(0.8, 0.8, 0.0),
        ] {
            let ray = Ray::new(target + Vec3::Z, -Vec3::Z);
            assert!(tri.hit(&ray, RANGE).is_none(), "ray at {target:?} should miss");
        }
    }

    #[test]
    fn test_triangle_parallel_ray() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(-1.0, 0.2, 0.0), Vec3::X);
        assert!(tri.hit(&ray, RANGE).is_none());
    }

    #[test]
    fn test_triangle_behind_ray() {
        let tri = unit_triangle();
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::Z);
        assert!(tri.hit(&ray, RANGE).is_none());
    }

    #[test]
    fn test_set_vertices_recomputes_normal() {
        let mut tri = unit_triangle();
        tri.set_vertices(Vec3::ZERO, Vec3::Y, Vec3::X);
        assert!((tri.normal() + Vec3::Z).length() < 1e-6);

        tri.set_vertices(Vec3::ZERO, Vec3::Z, Vec3::X);
        assert!((tri.normal() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_never_hits() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(tri.normal(), Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), -Vec3::Z);
        assert!(tri.hit(&ray, RANGE).is_none());
    }
}

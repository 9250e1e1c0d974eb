//! Triangle mesh model with its own octree.

use crate::hittable::{HitRecord, Hittable};
use crate::octree::Octree;
use crate::triangle::Triangle;
use octa_core::Mesh;
use octa_math::{Aabb, Interval, Ray};

/// A loaded mesh: triangles, their bounds and an octree over them.
///
/// The triangles are fixed once the model is built; the octree indexes
/// into them.
#[derive(Debug)]
pub struct Model {
    triangles: Vec<Triangle>,
    bounds: Aabb,
    octree: Octree,
}

impl Model {
    /// Build a model and its octree.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .map(Triangle::bounds)
            .reduce(|a, b| Aabb::surrounding(&a, &b))
            .map_or(Aabb::EMPTY, |b| Aabb::from_points(b.min(), b.max()));
        let octree = Octree::build(&triangles);

        Self {
            triangles,
            bounds,
            octree,
        }
    }

    /// Build a model from mesh geometry.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let triangles = mesh
            .triangles()
            .into_iter()
            .map(|[a, b, c]| Triangle::new(a, b, c))
            .collect();
        Self::new(triangles)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// Nearest triangle hit inside `ray_t`, with the triangle's index.
    pub fn hit_triangle(&self, ray: &Ray, ray_t: Interval) -> Option<(HitRecord, usize)> {
        if self.triangles.is_empty() || !self.bounds.hit(ray, ray_t) {
            return None;
        }
        self.octree.hit(&self.triangles, ray, ray_t)
    }
}

impl Hittable for Model {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.hit_triangle(ray, ray_t).map(|(rec, _)| rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }
}

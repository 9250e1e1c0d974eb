//! Octree acceleration structure for triangle meshes.
//!
//! Nodes hold indices into a triangle slice owned by the caller. A node keeps
//! up to [`CAPACITY`] triangles in its own list; the insert that finds it full
//! splits it into eight octants and pushes down every triangle that fits inside
//! exactly one of them. Triangles straddling a split plane stay with the parent.
//!
//! Queries are a depth-first branch-and-bound search: a subtree is skipped when
//! its box is missed or only entered beyond the closest hit found so far.

use crate::hittable::{HitRecord, Hittable};
use crate::triangle::Triangle;
use octa_math::{Aabb, Interval, Ray};

/// Triangles a node holds before it subdivides.
pub const CAPACITY: usize = 8;

/// Nodes at this depth never subdivide.
pub const MAX_DEPTH: u32 = 16;

/// Query boxes are grown by this much so flat or exactly-fitting triangles
/// are not lost to slab-test rounding.
const QUERY_PADDING: f32 = 2e-4;

/// A single node of the octree.
#[derive(Debug)]
pub struct OctreeNode {
    bounds: Aabb,
    query_bounds: Aabb,
    depth: u32,
    /// Exactly eight octants once the node has overflowed
    children: Option<Box<[OctreeNode; 8]>>,
    /// Triangles kept at this level
    triangles: Vec<usize>,
}

impl OctreeNode {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            query_bounds: bounds.expand(QUERY_PADDING),
            depth,
            children: None,
            triangles: Vec::new(),
        }
    }

    /// Box covered by this node.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Child octants, present only after the node has subdivided.
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    /// Indices of the triangles stored directly in this node.
    pub fn triangles(&self) -> &[usize] {
        &self.triangles
    }

    fn insert(&mut self, index: usize, triangles: &[Triangle]) {
        if self.triangles.len() < CAPACITY || self.depth >= MAX_DEPTH {
            self.triangles.push(index);
            return;
        }

        if self.children.is_none() {
            self.subdivide(triangles);
        }

        self.push_down(index, triangles);
    }

    fn subdivide(&mut self, triangles: &[Triangle]) {
        let depth = self.depth + 1;
        let octants = self.bounds.octants();
        self.children = Some(Box::new(octants.map(|b| OctreeNode::new(b, depth))));

        for index in std::mem::take(&mut self.triangles) {
            self.push_down(index, triangles);
        }
    }

    /// Hand the triangle to the one child that fits it, or keep it here.
    fn push_down(&mut self, index: usize, triangles: &[Triangle]) {
        if let Some(children) = self.children.as_deref_mut() {
            if let Some(child) = fitting_child(children, &triangles[index].bounds()) {
                children[child].insert(index, triangles);
                return;
            }
        }
        self.triangles.push(index);
    }

    fn hit(
        &self,
        triangles: &[Triangle],
        ray: &Ray,
        ray_t: Interval,
        closest: &mut Option<(HitRecord, usize)>,
    ) {
        let mut search = closest.map_or(ray_t, |(rec, _)| ray_t.with_max(rec.t));

        // Prune: box missed, or entered only beyond the closest hit
        if self.query_bounds.hit_distance(ray, search).is_none() {
            return;
        }

        for &index in &self.triangles {
            if let Some(rec) = triangles[index].hit(ray, search) {
                search = search.with_max(rec.t);
                *closest = Some((rec, index));
            }
        }

        let Some(children) = self.children.as_deref() else {
            return;
        };

        // Nearest child first, so later ones prune against its hit
        let mut order = [(0.0_f32, 0_usize); 8];
        let mut count = 0;
        for (i, child) in children.iter().enumerate() {
            if let Some(distance) = child.query_bounds.hit_distance(ray, search) {
                order[count] = (distance, i);
                count += 1;
            }
        }
        order[..count].sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        for &(_, i) in &order[..count] {
            children[i].hit(triangles, ray, ray_t, closest);
        }
    }

    fn collect_stats(&self, stats: &mut OctreeStats) {
        stats.nodes += 1;
        stats.max_depth = stats.max_depth.max(self.depth);
        stats.max_node_triangles = stats.max_node_triangles.max(self.triangles.len());
        if self.children.is_none() {
            stats.leaves += 1;
        }
        for child in self.children.iter().flat_map(|c| c.iter()) {
            child.collect_stats(stats);
        }
    }
}

/// The one child whose box contains `bounds`, if exactly one does.
fn fitting_child(children: &[OctreeNode; 8], bounds: &Aabb) -> Option<usize> {
    let mut fits = children
        .iter()
        .enumerate()
        .filter(|(_, child)| child.bounds.contains(bounds))
        .map(|(i, _)| i);

    match (fits.next(), fits.next()) {
        (Some(i), None) => Some(i),
        _ => None,
    }
}

/// Summary of an octree's shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: u32,
    /// Largest number of triangles kept directly by a single node
    pub max_node_triangles: usize,
}

/// Octree over a triangle slice.
///
/// The tree stores indices only; every call that needs geometry takes the
/// same slice the tree was built over.
#[derive(Debug)]
pub struct Octree {
    root: OctreeNode,
    len: usize,
}

impl Octree {
    /// Empty octree covering `bounds`.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            root: OctreeNode::new(bounds, 0),
            len: 0,
        }
    }

    /// Build an octree over all of `triangles`, rooted at their exact bounds.
    pub fn build(triangles: &[Triangle]) -> Self {
        let bounds = triangles
            .iter()
            .map(Triangle::bounds)
            .reduce(|a, b| Aabb::surrounding(&a, &b))
            .unwrap_or(Aabb::EMPTY);

        let mut octree = Self::new(bounds);
        for index in 0..triangles.len() {
            octree.insert(index, triangles);
        }

        let stats = octree.stats();
        log::debug!(
            "Built octree: {} triangles, {} nodes, {} leaves, depth {}",
            octree.len,
            stats.nodes,
            stats.leaves,
            stats.max_depth
        );

        octree
    }

    /// Insert `triangles[index]`.
    ///
    /// The triangle must lie inside the root box; queries never look past it.
    pub fn insert(&mut self, index: usize, triangles: &[Triangle]) {
        self.root.insert(index, triangles);
        self.len += 1;
    }

    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Number of triangles inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nearest triangle hit inside `ray_t`, with the triangle's index.
    pub fn hit(
        &self,
        triangles: &[Triangle],
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<(HitRecord, usize)> {
        if self.is_empty() {
            return None;
        }

        let mut closest = None;
        self.root.hit(triangles, ray, ray_t, &mut closest);
        closest
    }

    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats::default();
        self.root.collect_stats(&mut stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octa_math::Vec3;

    /// Small triangle inside the octant `octant` of the cube [0, 2]^3.
    fn tri_in_octant(octant: usize, offset: f32) -> Triangle {
        let base = Vec3::new(
            if octant & 1 == 0 { 0.25 } else { 1.25 },
            if octant & 2 == 0 { 0.25 } else { 1.25 },
            if octant & 4 == 0 { 0.25 } else { 1.25 },
        ) + Vec3::splat(offset);
        Triangle::new(base, base + Vec3::X * 0.1, base + Vec3::Y * 0.1)
    }

    fn build_in_cube(triangles: &[Triangle]) -> Octree {
        let mut octree = Octree::new(Aabb::tight(Vec3::ZERO, Vec3::splat(2.0)));
        for i in 0..triangles.len() {
            octree.insert(i, triangles);
        }
        octree
    }

    #[test]
    fn test_no_children_under_capacity() {
        let triangles: Vec<Triangle> = (0..CAPACITY).map(|i| tri_in_octant(i, 0.0)).collect();
        let octree = build_in_cube(&triangles);

        assert!(octree.root().children().is_none());
        assert_eq!(octree.root().triangles().len(), CAPACITY);
    }

    #[test]
    fn test_overflow_creates_eight_children() {
        let triangles: Vec<Triangle> = (0..=CAPACITY)
            .map(|i| tri_in_octant(i % 8, 0.05 * (i / 8) as f32))
            .collect();
        let octree = build_in_cube(&triangles);

        let children = octree.root().children().expect("root should have split");
        assert_eq!(children.len(), 8);
        // Every triangle fit in one octant, so nothing stays at the root
        assert!(octree.root().triangles().is_empty());
        for child in children {
            assert_eq!(child.depth(), 1);
            assert!(child.children().is_none());
        }
        assert_eq!(children[0].triangles().len(), 2);
    }

    #[test]
    fn test_straddling_triangle_stays_in_parent() {
        let mut triangles: Vec<Triangle> = (0..CAPACITY).map(|i| tri_in_octant(i, 0.0)).collect();
        // Crosses the x = 1 split plane
        triangles.push(Triangle::new(
            Vec3::new(0.9, 0.25, 0.25),
            Vec3::new(1.1, 0.25, 0.25),
            Vec3::new(1.0, 0.35, 0.25),
        ));

        let octree = build_in_cube(&triangles);
        assert!(octree.root().children().is_some());
        assert_eq!(octree.root().triangles(), &[CAPACITY]);
    }

    #[test]
    fn test_coincident_triangles_stop_at_max_depth() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X * 0.01, Vec3::Y * 0.01);
        let mut triangles = vec![tri; 64];
        triangles.push(Triangle::new(
            Vec3::splat(1.0),
            Vec3::splat(1.0) + Vec3::X,
            Vec3::splat(1.0) + Vec3::Y,
        ));

        let octree = Octree::build(&triangles);
        let stats = octree.stats();
        assert!(stats.max_depth <= MAX_DEPTH);
        assert_eq!(octree.len(), 65);
    }

    #[test]
    fn test_hit_returns_nearest() {
        // Stack of parallel triangles along -Z
        let triangles: Vec<Triangle> = (0..20)
            .map(|i| {
                let z = -(i as f32) - 1.0;
                Triangle::new(
                    Vec3::new(-1.0, -1.0, z),
                    Vec3::new(1.0, -1.0, z),
                    Vec3::new(0.0, 1.0, z),
                )
            })
            .collect();
        let octree = Octree::build(&triangles);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let (rec, index) = octree
            .hit(&triangles, &ray, Interval::new(0.001, 1.0e7))
            .unwrap();
        assert_eq!(index, 0);
        assert!((rec.t - 6.0).abs() < 1e-4);

        // Starting past the first few, the next one is found
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.5), -Vec3::Z);
        let (_, index) = octree
            .hit(&triangles, &ray, Interval::new(0.001, 1.0e7))
            .unwrap();
        assert_eq!(index, 3);
    }

    #[test]
    fn test_nearest_child_wins_in_both_directions() {
        let triangles: Vec<Triangle> = (0..=CAPACITY)
            .map(|i| tri_in_octant(i % 8, 0.05 * (i / 8) as f32))
            .collect();
        let octree = build_in_cube(&triangles);
        assert!(octree.root().children().is_some());

        // Octant 0 sits at z = 0.25, octant 4 at z = 1.25
        let up = Ray::new(Vec3::new(0.27, 0.27, -1.0), Vec3::Z);
        let (rec, index) = octree.hit(&triangles, &up, Interval::new(0.001, 1.0e7)).unwrap();
        assert_eq!(index, 0);
        assert!((rec.t - 1.25).abs() < 1e-4);

        let down = Ray::new(Vec3::new(0.27, 0.27, 3.0), -Vec3::Z);
        let (rec, index) = octree.hit(&triangles, &down, Interval::new(0.001, 1.0e7)).unwrap();
        assert_eq!(index, 4);
        assert!((rec.t - 1.75).abs() < 1e-4);
    }

    #[test]
    fn test_empty_octree_misses() {
        let octree = Octree::build(&[]);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(octree.hit(&[], &ray, Interval::new(0.001, 1.0e7)).is_none());
    }

    #[test]
    fn test_stats() {
        let triangles: Vec<Triangle> = (0..=CAPACITY)
            .map(|i| tri_in_octant(i % 8, 0.0))
            .collect();
        let octree = build_in_cube(&triangles);
        let stats = octree.stats();
        assert_eq!(stats.nodes, 9);
        assert_eq!(stats.leaves, 8);
        assert_eq!(stats.max_depth, 1);
    }
}

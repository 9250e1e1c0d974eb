//! Triangle mesh geometry loaded from model files.
//!
//! Meshes are indexed triangle lists. The renderer flattens them into
//! triangle soups and builds an octree over them.

use std::path::Path;

use octa_math::{Aabb, Vec3};
use thiserror::Error;

/// Errors that can occur while loading a mesh file.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Mesh contains no triangles")]
    Empty,
}

/// A mesh consisting of vertex positions and triangle indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_point_cloud(&positions);
        Self {
            positions,
            indices,
            bounds,
        }
    }

    /// Build an unindexed mesh from explicit triangles.
    pub fn from_triangles(triangles: &[[Vec3; 3]]) -> Self {
        let positions: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let indices = (0..positions.len() as u32).collect();
        Self::new(positions, indices)
    }

    /// Load every object of a Wavefront OBJ file into one mesh.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let (models, _materials) = tobj::load_obj(
            path.as_ref(),
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
        )?;

        let mut positions = Vec::new();
        let mut indices = Vec::new();

        for model in &models {
            let mesh = &model.mesh;
            let base = positions.len() as u32;
            positions.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            indices.extend(mesh.indices.iter().map(|i| base + i));
        }

        let mesh = Self::new(positions, indices);
        if mesh.triangle_count() == 0 {
            return Err(MeshError::Empty);
        }

        log::debug!(
            "Loaded {}: {} vertices, {} triangles",
            path.as_ref().display(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        Ok(mesh)
    }

    /// Multiply every vertex component-wise by `scale`.
    pub fn scale(&mut self, scale: Vec3) {
        for p in &mut self.positions {
            *p *= scale;
        }
        self.bounds = Aabb::from_point_cloud(&self.positions);
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
        self.bounds = Aabb::from_point_cloud(&self.positions);
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Extract triangle vertices as [v0, v1, v2] triplets.
    ///
    /// Triangles referencing vertices out of range are skipped with a warning.
    pub fn triangles(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let i0 = chunk[0] as usize;
            let i1 = chunk[1] as usize;
            let i2 = chunk[2] as usize;

            // Bounds check
            if i0 >= self.positions.len()
                || i1 >= self.positions.len()
                || i2 >= self.positions.len()
            {
                log::warn!(
                    "Invalid triangle indices: [{}, {}, {}], vertex count: {}",
                    i0,
                    i1,
                    i2,
                    self.positions.len()
                );
                continue;
            }

            triangles.push([self.positions[i0], self.positions[i1], self.positions[i2]]);
        }

        triangles
    }
}

//! Scene description types.
//!
//! A `SceneDescription` is what a scene file says: camera parameters, the
//! sky color, a material table and the primitives that reference it by
//! index. It is renderer-agnostic and cheap to inspect or rewrite.

use std::path::PathBuf;

use octa_math::Vec3;

use crate::material::Material;
use crate::mesh::Mesh;

/// Thin-lens camera parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Image width divided by height
    pub aspect: f32,
    /// Lens diameter; zero disables depth of field
    pub aperture: f32,
    /// Distance from the lens to the plane in perfect focus
    pub focus_dist: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            look_from: Vec3::new(0.0, 0.0, -2.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            vfov: 45.0,
            aspect: 1.0,
            aperture: 0.1,
            focus_dist: 2.0,
        }
    }
}

/// A sphere and the index of its material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereDef {
    pub material: usize,
    pub center: Vec3,
    pub radius: f32,
}

/// A standalone triangle and the index of its material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleDef {
    pub material: usize,
    pub vertices: [Vec3; 3],
}

/// A transform clause of a `model` directive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModelTransform {
    Scale(Vec3),
    Move(Vec3),
}

/// A mesh loaded from a model file, with its transforms already applied.
///
/// Models carry no material index of their own: every model is shaded
/// with material 0.
#[derive(Clone, Debug)]
pub struct ModelDef {
    /// Path as written in the scene file
    pub path: PathBuf,
    /// Transform clauses in the order they were written
    pub transforms: Vec<ModelTransform>,
    /// Transformed geometry
    pub mesh: Mesh,
}

impl ModelDef {
    /// Material index used for every loaded model.
    pub const MATERIAL: usize = 0;

    /// Apply `transforms` in order to `mesh` and wrap the result.
    pub fn new(path: impl Into<PathBuf>, transforms: Vec<ModelTransform>, mut mesh: Mesh) -> Self {
        for transform in &transforms {
            match *transform {
                ModelTransform::Scale(s) => mesh.scale(s),
                ModelTransform::Move(offset) => mesh.translate(offset),
            }
        }

        Self {
            path: path.into(),
            transforms,
            mesh,
        }
    }
}

/// Everything a scene file describes.
#[derive(Clone, Debug)]
pub struct SceneDescription {
    pub camera: CameraParams,
    /// Sky/background color
    pub background: Vec3,
    pub materials: Vec<Material>,
    pub spheres: Vec<SphereDef>,
    pub triangles: Vec<TriangleDef>,
    pub models: Vec<ModelDef>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            camera: CameraParams::default(),
            background: Vec3::new(0.2, 0.2, 1.0),
            materials: Vec::new(),
            spheres: Vec::new(),
            triangles: Vec::new(),
            models: Vec::new(),
        }
    }
}

impl SceneDescription {
    /// Total triangle count across standalone triangles and models.
    pub fn total_triangle_count(&self) -> usize {
        self.triangles.len()
            + self
                .models
                .iter()
                .map(|m| m.mesh.triangle_count())
                .sum::<usize>()
    }
}

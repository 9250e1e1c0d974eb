//! Octa Core - scene description types and scene-file IO.
//!
//! This crate provides:
//!
//! - **Scene description types**: `SceneDescription`, `Material`, `CameraParams`,
//!   sphere/triangle/model definitions
//! - **Scene files**: a line-oriented directive format (`load_scene`, `write_scene`)
//! - **Meshes**: Wavefront OBJ loading into triangle soups
//!
//! Nothing here knows how to trace rays; `octa_renderer` builds its
//! acceleration structures from a `SceneDescription`.
//!
//! # Example
//!
//! ```ignore
//! use octa_core::load_scene;
//!
//! let scene = load_scene("scenes/spheres.txt", 4.0 / 3.0)?;
//! println!("{} materials, {} spheres", scene.materials.len(), scene.spheres.len());
//! ```

pub mod material;
pub mod mesh;
pub mod parser;
pub mod scene;
pub mod writer;

// Re-export commonly used types
pub use material::{Material, MaterialKind};
pub use mesh::{Mesh, MeshError};
pub use parser::{load_scene, parse_scene, LoadError, LoadResult};
pub use scene::{CameraParams, ModelDef, ModelTransform, SceneDescription, SphereDef, TriangleDef};
pub use writer::{scene_to_string, write_scene};

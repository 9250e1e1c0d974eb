//! Octa Renderer - CPU path tracing
//!
//! A Monte Carlo path tracer over spheres, triangles and octree-indexed
//! triangle meshes, with explicit light sampling for diffuse surfaces.
//!
//! A render goes through three layers:
//!
//! - [`Scene`] is built once from an `octa_core::SceneDescription` and is
//!   read-only while frames are rendered.
//! - [`Tracer`] estimates the color seen along one ray.
//! - [`render_frame`] splits the image into row ranges, traces every pixel on
//!   a rayon pool and writes into a caller-owned [`FrameBuffer`].

mod camera;
mod dispatch;
mod framebuffer;
mod hittable;
mod material;
mod model;
mod octree;
mod renderer;
mod sampling;
mod scene;
mod sphere;
mod triangle;

pub use camera::Camera;
pub use dispatch::{
    partition_rows, render_frame, Blend, RenderError, RenderSettings, RenderStats, RowRange,
    MAX_HEIGHT, MAX_THREADS, MAX_WIDTH,
};
pub use framebuffer::{FrameBuffer, Pixel, Rgb8, RgbF32, Rgba8};
pub use hittable::{HitRecord, Hittable};
pub use material::{reflect, refract, schlick, Color, Scatter, ScatterResult};
pub use model::Model;
pub use octree::{Octree, OctreeNode, OctreeStats};
pub use renderer::{linear_to_gamma, RayStats, TraceConfig, Tracer};
pub use sampling::{gen_f32, random_in_unit_disk, random_in_unit_sphere};
pub use scene::{PrimitiveId, Scene, SceneError, SceneHit};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export math types from octa_math
pub use octa_math::{Aabb, Interval, Ray, Vec3};

/// Rays ignore hits closer than this to their origin.
pub const MIN_DISTANCE: f32 = 0.001;

/// Practical horizon for ray hits.
pub const MAX_DISTANCE: f32 = 1.0e7;

/// Valid hit range for every scene query.
pub const HIT_RANGE: Interval = Interval::new(MIN_DISTANCE, MAX_DISTANCE);

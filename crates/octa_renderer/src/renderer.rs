//! Core path tracing integrator.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with a depth cap
//! - Explicit light sampling of emissive spheres for diffuse surfaces
//! - A sky term driven by the ray's vertical direction

use std::f32::consts::{PI, TAU};
use std::ops::AddAssign;

use crate::material::{Color, Scatter};
use crate::scene::{PrimitiveId, Scene, SceneHit};
use octa_core::{Material, MaterialKind};
use octa_math::{Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::sampling::gen_f32;

/// Integrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Sample emissive spheres directly from diffuse hits
    pub light_sampling: bool,
    /// Multiplier on the sky/background term
    pub sky_intensity: f32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            light_sampling: true,
            sky_intensity: 1.0,
        }
    }
}

/// Ray counts gathered while tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RayStats {
    pub primary: u64,
    pub scatter: u64,
    pub shadow: u64,
}

impl RayStats {
    pub fn total(&self) -> u64 {
        self.primary + self.scatter + self.shadow
    }
}

impl AddAssign for RayStats {
    fn add_assign(&mut self, other: Self) {
        self.primary += other.primary;
        self.scatter += other.scatter;
        self.shadow += other.shadow;
    }
}

/// Estimates the radiance arriving along a ray.
pub struct Tracer<'a> {
    scene: &'a Scene,
    config: TraceConfig,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, config: TraceConfig) -> Self {
        Self { scene, config }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Compute the color seen by a ray.
    ///
    /// `depth` counts the bounces so far; primary rays start at 0.
    pub fn trace(
        &self,
        ray: &Ray,
        depth: u32,
        rng: &mut dyn RngCore,
        stats: &mut RayStats,
    ) -> Color {
        if depth >= self.config.max_depth {
            return self.sky(ray);
        }

        let Some(hit) = self.scene.hit(ray) else {
            return self.sky(ray);
        };

        let material = self.scene.material(hit.material);

        match material.scatter(ray, &hit.record, rng) {
            Some(result) => {
                let direct = if self.config.light_sampling && material.kind == MaterialKind::Lambert
                {
                    self.direct_light(ray, &hit, material, rng, stats)
                } else {
                    Color::ZERO
                };

                stats.scatter += 1;
                let indirect = self.trace(&result.scattered, depth + 1, rng, stats);
                material.emissive + direct + result.attenuation * indirect
            }
            // Absorbed: only what the surface emits
            None => material.emissive,
        }
    }

    /// Light arriving directly from emissive spheres, sampled by solid angle.
    fn direct_light(
        &self,
        ray: &Ray,
        hit: &SceneHit,
        material: &Material,
        rng: &mut dyn RngCore,
        stats: &mut RayStats,
    ) -> Color {
        let p = hit.record.p;
        let normal = hit.record.facing_normal(ray);
        let mut light = Color::ZERO;

        for &i in self.scene.lights() {
            if hit.primitive == PrimitiveId::Sphere(i) {
                continue;
            }

            let sphere = &self.scene.spheres()[i];
            let to_center = sphere.center() - p;
            let dist_sq = to_center.length_squared();
            let radius_sq = sphere.radius() * sphere.radius();
            if dist_sq <= radius_sq {
                continue; // Inside the light
            }

            // Basis around the direction to the light
            let sw = to_center / dist_sq.sqrt();
            let axis = if sw.x.abs() > 0.01 { Vec3::Y } else { Vec3::X };
            let su = axis.cross(sw).normalize();
            let sv = sw.cross(su);

            // Uniform direction inside the cone the sphere subtends
            let cos_a_max = (1.0 - radius_sq / dist_sq).sqrt();
            let e1 = gen_f32(rng);
            let e2 = gen_f32(rng);
            let cos_a = 1.0 - e1 + e1 * cos_a_max;
            let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
            let phi = TAU * e2;
            let l = (su * (phi.cos() * sin_a) + sv * (phi.sin() * sin_a) + sw * cos_a).normalize();

            stats.shadow += 1;
            let shadow = Ray::new(p, l);
            let unblocked = self
                .scene
                .hit(&shadow)
                .is_some_and(|h| h.primitive == PrimitiveId::Sphere(i));

            if unblocked {
                let omega = TAU * (1.0 - cos_a_max);
                let emissive = self.scene.material(self.scene.sphere_material(i)).emissive;
                light += material.albedo * emissive * l.dot(normal).max(0.0) * omega / PI;
            }
        }

        light
    }

    /// Background seen by a ray that escapes the scene.
    pub fn sky(&self, ray: &Ray) -> Color {
        self.scene.background * ray.direction().y.clamp(0.1, 1.0) * self.config.sky_intensity
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

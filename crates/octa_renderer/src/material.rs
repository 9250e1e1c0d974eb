//! Material scattering.
//!
//! Materials themselves are plain data from `octa_core`; this module gives
//! them their scattering behavior. Direct light sampling needs the whole
//! scene and lives in the integrator.

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_in_unit_sphere};
use octa_core::{Material, MaterialKind};
use octa_math::{Ray, Vec3};
use rand::RngCore;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Outcome of a scatter event that continues the path.
#[derive(Clone, Copy, Debug)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// How light interacts with a surface.
pub trait Scatter {
    /// Scatter an incoming ray.
    ///
    /// Returns the attenuation and the continuing ray, or None if the ray
    /// is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore)
        -> Option<ScatterResult>;
}

impl Scatter for Material {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        match self.kind {
            MaterialKind::Lambert => {
                let normal = rec.facing_normal(ray_in);
                let direction = (normal + random_in_unit_sphere(rng))
                    .try_normalize()
                    .unwrap_or(normal);

                Some(ScatterResult {
                    attenuation: self.albedo,
                    scattered: Ray::new(rec.p, direction),
                })
            }

            MaterialKind::Metal { roughness } => {
                let normal = rec.facing_normal(ray_in);
                let reflected = reflect(ray_in.direction(), normal);
                let direction =
                    (reflected + random_in_unit_sphere(rng) * roughness).try_normalize()?;

                // Fuzzed below the surface: absorbed
                if direction.dot(normal) <= 0.0 {
                    return None;
                }

                Some(ScatterResult {
                    attenuation: self.albedo,
                    scattered: Ray::new(rec.p, direction),
                })
            }

            MaterialKind::Dielectric { ior } => {
                let d = ray_in.direction();
                let n = rec.normal;
                let d_dot_n = d.dot(n);

                // Exiting when travelling along the outward normal
                let (outward, ni_over_nt, cosine) = if d_dot_n > 0.0 {
                    (-n, ior, ior * d_dot_n)
                } else {
                    (n, 1.0 / ior, -d_dot_n)
                };

                let reflected = reflect(d, n);
                let direction = match refract(d, outward, ni_over_nt) {
                    Some(refracted) if gen_f32(rng) >= schlick(cosine, ior) => refracted,
                    // Total internal reflection, or Fresnel chose reflection
                    _ => reflected,
                };

                Some(ScatterResult {
                    attenuation: Color::ONE,
                    scattered: Ray::towards(rec.p, direction),
                })
            }

            MaterialKind::Invisible => None,
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract unit vector `v` through a surface with unit normal `n` facing
/// the incoming side. None on total internal reflection.
#[inline]
pub fn refract(v: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let dt = v.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ni_over_nt * (v - n * dt) - n * discriminant.sqrt())
    } else {
        None
    }
}

/// Schlick's approximation for reflectance
#[inline]
pub fn schlick(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

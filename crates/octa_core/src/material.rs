//! Surface material descriptions.
//!
//! A material is pure data here: which scattering model applies, its albedo
//! and how much light it emits. The renderer decides how rays scatter.

use octa_math::Vec3;

/// Scattering model of a material, with the parameters only that model uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialKind {
    /// Never scatters; a path that hits it ends with the emissive color.
    Invisible,
    /// Diffuse surface.
    Lambert,
    /// Mirror-like surface; `roughness` in [0, 1] fuzzes the reflection.
    Metal { roughness: f32 },
    /// Glass-like surface with index of refraction `ior`.
    Dielectric { ior: f32 },
}

impl MaterialKind {
    /// Keyword used for this kind in scene files.
    pub fn keyword(&self) -> &'static str {
        match self {
            MaterialKind::Invisible => "invisible",
            MaterialKind::Lambert => "lambert",
            MaterialKind::Metal { .. } => "metal",
            MaterialKind::Dielectric { .. } => "dielectric",
        }
    }
}

/// A material shared by any number of primitives through its index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    /// Diffuse/albedo color (RGB, 0-1)
    pub albedo: Vec3,
    /// Emitted radiance (RGB, zero for non-lights)
    pub emissive: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Lambert,
            albedo: Vec3::splat(0.5), // Grey default
            emissive: Vec3::ZERO,
        }
    }
}

impl Material {
    /// Diffuse material.
    pub fn lambert(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Lambert,
            albedo,
            emissive: Vec3::ZERO,
        }
    }

    /// Metal material, roughness clamped to [0, 1].
    pub fn metal(albedo: Vec3, roughness: f32) -> Self {
        Self {
            kind: MaterialKind::Metal {
                roughness: roughness.clamp(0.0, 1.0),
            },
            albedo,
            emissive: Vec3::ZERO,
        }
    }

    /// Glass material with the given index of refraction.
    pub fn dielectric(ior: f32) -> Self {
        Self {
            kind: MaterialKind::Dielectric { ior },
            albedo: Vec3::ONE,
            emissive: Vec3::ZERO,
        }
    }

    /// Same material emitting `emissive`.
    pub fn with_emission(mut self, emissive: Vec3) -> Self {
        self.emissive = emissive;
        self
    }

    /// Check if this material emits light.
    pub fn is_emissive(&self) -> bool {
        self.emissive.x > 0.0 || self.emissive.y > 0.0 || self.emissive.z > 0.0
    }

    /// Metal roughness, zero for every other kind.
    pub fn roughness(&self) -> f32 {
        match self.kind {
            MaterialKind::Metal { roughness } => roughness,
            _ => 0.0,
        }
    }

    /// Dielectric index of refraction, zero for every other kind.
    pub fn ior(&self) -> f32 {
        match self.kind {
            MaterialKind::Dielectric { ior } => ior,
            _ => 0.0,
        }
    }
}

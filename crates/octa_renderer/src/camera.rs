//! Thin-lens camera for ray generation.

use crate::sampling::random_in_unit_disk;
use octa_core::CameraParams;
use octa_math::{Ray, Vec3};
use rand::RngCore;

/// Camera generating view rays with depth-of-field jitter.
///
/// The basis and view-plane corner are derived from [`CameraParams`] and
/// recomputed by [`Camera::update`] whenever the parameters change.
#[derive(Clone, Debug)]
pub struct Camera {
    params: CameraParams,

    // Cached computed values (set by update())
    origin: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f32,
}

impl Camera {
    /// Create a camera from its parameters.
    pub fn new(params: CameraParams) -> Self {
        let mut camera = Self {
            params,
            origin: Vec3::ZERO,
            lower_left: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            lens_radius: 0.0,
        };
        camera.update();
        camera
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, up: Vec3) -> Self {
        self.params.look_from = look_from;
        self.params.look_at = look_at;
        self.params.up = up;
        self.update();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, aperture: f32, focus_dist: f32) -> Self {
        self.params.vfov = vfov;
        self.params.aperture = aperture;
        self.params.focus_dist = focus_dist;
        self.update();
        self
    }

    /// Set the image aspect ratio (width / height).
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.params.aspect = aspect;
        self.update();
        self
    }

    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    /// Replace all parameters and recompute the derived values.
    pub fn set_params(&mut self, params: CameraParams) {
        self.params = params;
        self.update();
    }

    /// Recompute basis vectors and view-plane corners from the parameters.
    pub fn update(&mut self) {
        let p = &self.params;

        let theta = p.vfov.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = p.aspect * half_height;
        let focus = p.focus_dist;

        self.origin = p.look_from;
        self.lens_radius = p.aperture / 2.0;

        self.w = (p.look_from - p.look_at).try_normalize().unwrap_or(Vec3::Z);
        self.u = p
            .up
            .cross(self.w)
            .try_normalize()
            .unwrap_or_else(|| self.w.any_orthonormal_vector());
        self.v = self.w.cross(self.u);

        self.lower_left = self.origin
            - self.u * half_width * focus
            - self.v * half_height * focus
            - self.w * focus;
        self.horizontal = self.u * 2.0 * half_width * focus;
        self.vertical = self.v * 2.0 * half_height * focus;
    }

    /// Ray through view-plane coordinates `(s, t)` in [0, 1]², with `t = 0`
    /// at the bottom edge. The origin is jittered across the lens.
    pub fn get_ray(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        let offset = if self.lens_radius > 0.0 {
            let rd = random_in_unit_disk(rng) * self.lens_radius;
            self.u * rd.x + self.v * rd.y
        } else {
            Vec3::ZERO
        };

        let origin = self.origin + offset;
        let target = self.lower_left + self.horizontal * s + self.vertical * t;
        Ray::towards(origin, target - origin)
    }

    /// Pinhole ray through the center of the view plane.
    pub fn center_ray(&self) -> Ray {
        Ray::new(self.origin, -self.w)
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Camera basis: right, up and backward (away from the look-at point).
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraParams::default())
    }
}

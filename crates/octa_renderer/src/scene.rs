//! Render-ready scene and hit dispatch.

use crate::camera::Camera;
use crate::hittable::{HitRecord, Hittable};
use crate::material::Color;
use crate::model::Model;
use crate::sphere::Sphere;
use crate::triangle::Triangle;
use crate::HIT_RANGE;
use octa_core::{Material, ModelDef, SceneDescription};
use octa_math::{Interval, Ray};
use thiserror::Error;

/// Errors that can occur while building a render scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("camera focus distance must be positive and finite, got {0}")]
    InvalidFocus(f32),

    #[error("{kind} {primitive} uses material {index}, but only {count} materials are defined")]
    InvalidMaterial {
        kind: &'static str,
        primitive: usize,
        index: usize,
        count: usize,
    },
}

/// Identity of the primitive that produced a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveId {
    Sphere(usize),
    Triangle(usize),
    Model { model: usize, triangle: usize },
}

/// Nearest hit in the scene, with the material that shades it.
#[derive(Clone, Copy, Debug)]
pub struct SceneHit {
    pub record: HitRecord,
    pub material: usize,
    pub primitive: PrimitiveId,
}

/// Scene ready for rendering.
///
/// Read-only while frames render; every worker shares one reference.
pub struct Scene {
    pub camera: Camera,
    pub background: Color,
    materials: Vec<Material>,
    spheres: Vec<Sphere>,
    sphere_materials: Vec<usize>,
    triangles: Vec<Triangle>,
    triangle_materials: Vec<usize>,
    models: Vec<Model>,
    /// Spheres with an emissive material, sampled directly by diffuse surfaces
    lights: Vec<usize>,
}

impl Scene {
    /// Build a scene from a description, checking the camera focus and every
    /// material index, and building an octree for each model.
    pub fn from_description(desc: &SceneDescription) -> Result<Self, SceneError> {
        // A zero focus collapses the view plane onto the lens
        let focus = desc.camera.focus_dist;
        if !(focus.is_finite() && focus > 0.0) {
            return Err(SceneError::InvalidFocus(focus));
        }

        let count = desc.materials.len();
        let check = |kind: &'static str, primitive: usize, index: usize| {
            if index < count {
                Ok(index)
            } else {
                Err(SceneError::InvalidMaterial {
                    kind,
                    primitive,
                    index,
                    count,
                })
            }
        };

        let sphere_materials = desc
            .spheres
            .iter()
            .enumerate()
            .map(|(i, s)| check("sphere", i, s.material))
            .collect::<Result<Vec<_>, _>>()?;
        let triangle_materials = desc
            .triangles
            .iter()
            .enumerate()
            .map(|(i, t)| check("triangle", i, t.material))
            .collect::<Result<Vec<_>, _>>()?;
        for i in 0..desc.models.len() {
            check("model", i, ModelDef::MATERIAL)?;
        }

        let spheres: Vec<Sphere> = desc
            .spheres
            .iter()
            .map(|s| Sphere::new(s.center, s.radius))
            .collect();
        let triangles = desc
            .triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices;
                Triangle::new(a, b, c)
            })
            .collect();
        let models: Vec<Model> = desc
            .models
            .iter()
            .map(|m| Model::from_mesh(&m.mesh))
            .collect();

        let lights: Vec<usize> = sphere_materials
            .iter()
            .enumerate()
            .filter(|&(_, &m)| desc.materials[m].is_emissive())
            .map(|(i, _)| i)
            .collect();

        log::info!(
            "Built scene: {} spheres, {} triangles, {} models ({} mesh triangles), {} lights",
            spheres.len(),
            desc.triangles.len(),
            models.len(),
            models.iter().map(Model::triangle_count).sum::<usize>(),
            lights.len()
        );

        Ok(Self {
            camera: Camera::new(desc.camera),
            background: desc.background,
            materials: desc.materials.clone(),
            spheres,
            sphere_materials,
            triangles,
            triangle_materials,
            models,
            lights,
        })
    }

    /// Nearest hit inside the standard range (0.001, 1e7).
    pub fn hit(&self, ray: &Ray) -> Option<SceneHit> {
        self.hit_in(ray, HIT_RANGE)
    }

    /// Nearest hit over models, triangles and spheres inside `ray_t`.
    pub fn hit_in(&self, ray: &Ray, ray_t: Interval) -> Option<SceneHit> {
        let mut closest: Option<SceneHit> = None;
        let mut search = ray_t;

        for (i, model) in self.models.iter().enumerate() {
            if let Some((record, triangle)) = model.hit_triangle(ray, search) {
                search = search.with_max(record.t);
                closest = Some(SceneHit {
                    record,
                    material: ModelDef::MATERIAL,
                    primitive: PrimitiveId::Model { model: i, triangle },
                });
            }
        }

        for (i, triangle) in self.triangles.iter().enumerate() {
            if let Some(record) = triangle.hit(ray, search) {
                search = search.with_max(record.t);
                closest = Some(SceneHit {
                    record,
                    material: self.triangle_materials[i],
                    primitive: PrimitiveId::Triangle(i),
                });
            }
        }

        for (i, sphere) in self.spheres.iter().enumerate() {
            if let Some(record) = sphere.hit(ray, search) {
                search = search.with_max(record.t);
                closest = Some(SceneHit {
                    record,
                    material: self.sphere_materials[i],
                    primitive: PrimitiveId::Sphere(i),
                });
            }
        }

        closest
    }

    /// Focus the camera on whatever its center ray hits.
    ///
    /// Returns the new focus distance, or None (camera untouched) on a miss.
    pub fn autofocus(&mut self) -> Option<f32> {
        let hit = self.hit(&self.camera.center_ray())?;
        let mut params = *self.camera.params();
        params.focus_dist = hit.record.t;
        self.camera.set_params(params);
        log::debug!("Autofocus at distance {:.3}", hit.record.t);
        Some(hit.record.t)
    }

    pub fn material(&self, index: usize) -> &Material {
        &self.materials[index]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Material index of sphere `i`.
    pub fn sphere_material(&self, i: usize) -> usize {
        self.sphere_materials[i]
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Indices of the emissive spheres.
    pub fn lights(&self) -> &[usize] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octa_core::{Mesh, ModelTransform, SphereDef, TriangleDef};
    use octa_math::Vec3;

    fn description() -> SceneDescription {
        let mut desc = SceneDescription::default();
        desc.materials = vec![
            Material::lambert(Vec3::splat(0.5)),
            Material::lambert(Vec3::ONE).with_emission(Vec3::splat(4.0)),
        ];
        desc.spheres = vec![
            SphereDef {
                material: 0,
                center: Vec3::new(0.0, 0.0, 5.0),
                radius: 1.0,
            },
            SphereDef {
                material: 1,
                center: Vec3::new(0.0, 10.0, 5.0),
                radius: 2.0,
            },
        ];
        desc.triangles = vec![TriangleDef {
            material: 1,
            vertices: [
                Vec3::new(-1.0, -1.0, 3.0),
                Vec3::new(1.0, -1.0, 3.0),
                Vec3::new(0.0, -0.5, 3.0),
            ],
        }];
        desc
    }

    #[test]
    fn test_invalid_material_rejected() {
        let mut desc = description();
        desc.spheres[1].material = 7;

        let err = Scene::from_description(&desc).err().unwrap();
        assert_eq!(
            err,
            SceneError::InvalidMaterial {
                kind: "sphere",
                primitive: 1,
                index: 7,
                count: 2,
            }
        );
    }

    #[test]
    fn test_invalid_focus_rejected() {
        for focus in [0.0, -1.5, f32::NAN, f32::INFINITY] {
            let mut desc = description();
            desc.camera.focus_dist = focus;
            desc.camera.aperture = 0.0;
            assert!(matches!(
                Scene::from_description(&desc),
                Err(SceneError::InvalidFocus(_))
            ));
        }
    }

    #[test]
    fn test_model_without_materials_rejected() {
        let mut desc = SceneDescription::default();
        desc.models.push(ModelDef::new(
            "tri.obj",
            vec![ModelTransform::Move(Vec3::Z)],
            Mesh::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]),
        ));
        assert!(matches!(
            Scene::from_description(&desc),
            Err(SceneError::InvalidMaterial { kind: "model", .. })
        ));
    }

    #[test]
    fn test_lights_are_emissive_spheres() {
        let scene = Scene::from_description(&description()).unwrap();
        assert_eq!(scene.lights(), &[1]);
    }

    #[test]
    fn test_nearest_hit_wins() {
        let scene = Scene::from_description(&description()).unwrap();

        // Sphere only
        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        let hit = scene.hit(&ray).unwrap();
        assert_eq!(hit.primitive, PrimitiveId::Sphere(0));
        assert_eq!(hit.material, 0);
        assert!((hit.record.t - 6.0).abs() < 1e-4);

        // Triangle in front of the sphere
        let ray = Ray::new(Vec3::new(0.0, -0.8, -2.0), Vec3::Z);
        let hit = scene.hit(&ray).unwrap();
        assert_eq!(hit.primitive, PrimitiveId::Triangle(0));
        assert_eq!(hit.material, 1);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), -Vec3::Z);
        assert!(scene.hit(&ray).is_none());
    }

    #[test]
    fn test_model_hit_uses_material_zero() {
        let mut desc = description();
        desc.models.push(ModelDef::new(
            "wall.obj",
            Vec::new(),
            Mesh::from_triangles(&[[
                Vec3::new(-5.0, -5.0, 1.0),
                Vec3::new(5.0, -5.0, 1.0),
                Vec3::new(0.0, 5.0, 1.0),
            ]]),
        ));
        let scene = Scene::from_description(&desc).unwrap();

        let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
        let hit = scene.hit(&ray).unwrap();
        assert_eq!(hit.primitive, PrimitiveId::Model { model: 0, triangle: 0 });
        assert_eq!(hit.material, ModelDef::MATERIAL);
        assert!((hit.record.t - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_autofocus() {
        let mut desc = description();
        desc.camera.look_from = Vec3::new(0.0, 0.0, -2.0);
        desc.camera.look_at = Vec3::new(0.0, 0.0, 5.0);
        let mut scene = Scene::from_description(&desc).unwrap();

        let focus = scene.autofocus().unwrap();
        assert!((focus - 6.0).abs() < 1e-4);
        assert_eq!(scene.camera.params().focus_dist, focus);

        // Looking at nothing leaves the focus alone
        let mut params = *scene.camera.params();
        params.look_at = Vec3::new(0.0, 0.0, -10.0);
        scene.camera.set_params(params);
        assert!(scene.autofocus().is_none());
        assert_eq!(scene.camera.params().focus_dist, focus);
    }
}

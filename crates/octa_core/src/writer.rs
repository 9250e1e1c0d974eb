//! Scene file writer.
//!
//! Produces text the parser reads back into an equal `SceneDescription`.
//! Models are written as `model` directives with their transform clauses, so
//! reloading them needs the referenced OBJ files to still be reachable. A model
//! whose path would split into several tokens is left out with a warning.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use octa_math::Vec3;

use crate::material::MaterialKind;
use crate::parser::SEPARATORS;
use crate::scene::{ModelTransform, SceneDescription};

/// Serialize a scene description to scene file text.
pub fn scene_to_string(scene: &SceneDescription) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_into(&mut out, scene);
    out
}

/// Write a scene description to `path`.
pub fn write_scene(scene: &SceneDescription, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    fs::write(path, scene_to_string(scene))?;
    log::debug!("Wrote scene {}", path.display());
    Ok(())
}

fn write_into(out: &mut String, scene: &SceneDescription) -> std::fmt::Result {
    let camera = &scene.camera;
    writeln!(out, "# camera")?;
    writeln!(out, "lookfrom {}", vec3(camera.look_from))?;
    writeln!(out, "lookat {}", vec3(camera.look_at))?;
    writeln!(out, "up {}", vec3(camera.up))?;
    writeln!(out, "fov {}", camera.vfov)?;
    writeln!(out, "aperture {}", camera.aperture)?;
    writeln!(out, "focus {}", camera.focus_dist)?;
    writeln!(out, "background {}", vec3(scene.background))?;

    if !scene.materials.is_empty() {
        writeln!(out, "\n# materials")?;
    }
    for material in &scene.materials {
        let (roughness, ior) = match material.kind {
            MaterialKind::Metal { roughness } => (roughness, 0.0),
            MaterialKind::Dielectric { ior } => (0.0, ior),
            _ => (0.0, 0.0),
        };
        writeln!(
            out,
            "material {} {} {} {} {}",
            material.kind.keyword(),
            vec3(material.albedo),
            vec3(material.emissive),
            roughness,
            ior
        )?;
    }

    if !scene.spheres.is_empty() || !scene.triangles.is_empty() || !scene.models.is_empty() {
        writeln!(out, "\n# geometry")?;
    }
    for sphere in &scene.spheres {
        writeln!(
            out,
            "sphere {} {} {}",
            sphere.material,
            vec3(sphere.center),
            sphere.radius
        )?;
    }
    for triangle in &scene.triangles {
        let [a, b, c] = triangle.vertices;
        writeln!(
            out,
            "triangle {} {} {} {}",
            triangle.material,
            vec3(a),
            vec3(b),
            vec3(c)
        )?;
    }
    for model in &scene.models {
        let path = model.path.display().to_string();
        if !writable_path(&path) {
            log::warn!("Not writing model '{path}': the path would not read back as one token");
            continue;
        }
        write!(out, "model {path}")?;
        for transform in &model.transforms {
            match transform {
                ModelTransform::Scale(s) => write!(out, " scale {}", vec3(*s))?,
                ModelTransform::Move(m) => write!(out, " move {}", vec3(*m))?,
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

/// A path survives the parser only if no separator or comment splits it.
fn writable_path(path: &str) -> bool {
    !path.is_empty() && !path.contains(SEPARATORS) && !path.contains('#')
}

fn vec3(v: Vec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::parser::parse_scene;
    use crate::scene::{SphereDef, TriangleDef};

    fn sample_scene() -> SceneDescription {
        let mut scene = SceneDescription::default();
        scene.camera.look_from = Vec3::new(0.1, 1.0 / 3.0, -7.25);
        scene.camera.vfov = 38.5;
        scene.camera.aperture = 0.0;
        scene.background = Vec3::new(0.0, 0.05, 0.1);
        scene.materials = vec![
            Material::lambert(Vec3::new(0.8, 0.3, 0.3)),
            Material::metal(Vec3::splat(0.9), 0.25),
            Material::dielectric(1.5),
            Material::lambert(Vec3::ONE).with_emission(Vec3::splat(6.0)),
        ];
        scene.spheres = vec![
            SphereDef {
                material: 0,
                center: Vec3::new(0.0, -100.5, 1.0),
                radius: 100.0,
            },
            SphereDef {
                material: 3,
                center: Vec3::new(-1.0e-3, 4.0, 2.0),
                radius: 0.75,
            },
        ];
        scene.triangles = vec![TriangleDef {
            material: 1,
            vertices: [Vec3::ZERO, Vec3::new(1.5, 0.0, 0.0), Vec3::new(0.0, 2.0, -0.5)],
        }];
        scene
    }

    #[test]
    fn test_round_trip() {
        let scene = sample_scene();
        let text = scene_to_string(&scene);
        let parsed = parse_scene(&text, None, scene.camera.aspect).unwrap();

        assert_eq!(parsed.camera, scene.camera);
        assert_eq!(parsed.background, scene.background);
        assert_eq!(parsed.materials, scene.materials);
        assert_eq!(parsed.spheres, scene.spheres);
        assert_eq!(parsed.triangles, scene.triangles);
        assert!(parsed.models.is_empty());
    }

    #[test]
    fn test_model_directive() {
        use crate::mesh::Mesh;
        use crate::scene::ModelDef;

        let mut scene = SceneDescription::default();
        scene.models.push(ModelDef::new(
            "bunny.obj",
            vec![
                ModelTransform::Scale(Vec3::splat(2.0)),
                ModelTransform::Move(Vec3::new(0.0, -1.0, 0.0)),
            ],
            Mesh::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]),
        ));

        let text = scene_to_string(&scene);
        assert!(text.contains("model bunny.obj scale 2 2 2 move 0 -1 0\n"));
    }

    #[test]
    fn test_model_path_that_would_split_is_skipped() {
        use crate::mesh::Mesh;
        use crate::scene::ModelDef;

        let mesh = Mesh::from_triangles(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]);
        let mut scene = SceneDescription::default();
        for path in ["my models/bunny.obj", "parts(1).obj", "take#2.obj", "cube.obj"] {
            scene
                .models
                .push(ModelDef::new(path, Vec::new(), mesh.clone()));
        }

        let text = scene_to_string(&scene);
        let models: Vec<&str> = text.lines().filter(|l| l.starts_with("model")).collect();
        assert_eq!(models, ["model cube.obj"]);
    }

    #[test]
    fn test_write_scene_to_file() {
        let path = std::env::temp_dir().join(format!("octa_writer_{}.txt", std::process::id()));
        write_scene(&sample_scene(), &path).unwrap();

        let parsed = crate::parser::load_scene(&path, 1.0).unwrap();
        assert_eq!(parsed.spheres.len(), 2);

        fs::remove_file(&path).ok();
    }
}

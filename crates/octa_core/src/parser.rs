//! Scene file parser.
//!
//! Scene files are line oriented: one directive per line, tokens separated by
//! whitespace or any of `,:;[]{}()<>`, and `#` starts a comment that runs to
//! the end of the line.
//!
//! # Supported Directives
//!
//! - `lookfrom`/`origin x y z`, `lookat`/`direction x y z`, `up x y z`
//! - `fov deg`, `aperture a`, `focus d`
//! - `sky`/`background r g b`
//! - `material`/`mat`/`m type albedo.xyz emissive.xyz roughness ior`
//! - `sphere`/`s material center.xyz radius`
//! - `triangle`/`t material v0.xyz v1.xyz v2.xyz`
//! - `model`/`load path [scale x y z] [move x y z]`
//!
//! Numeric fields are best effort: a missing or malformed number leaves the
//! default in place. Unknown directives are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use octa_math::Vec3;
use thiserror::Error;

use crate::material::{Material, MaterialKind};
use crate::mesh::Mesh;
use crate::scene::{ModelDef, ModelTransform, SceneDescription, SphereDef, TriangleDef};

/// Errors that can occur while loading a scene file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No argument for '{directive}' at line {line}")]
    MissingArgument { line: usize, directive: String },
}

/// Result type for scene loading.
pub type LoadResult<T> = Result<T, LoadError>;

pub(crate) const SEPARATORS: &[char] = &[
    ' ', '\t', '\r', '\n', ',', ':', ';', '[', ']', '{', '}', '(', ')', '<', '>',
];

/// Load a scene file. Relative model paths are resolved against the
/// scene file's directory first, then the working directory.
pub fn load_scene(path: impl AsRef<Path>, aspect: f32) -> LoadResult<SceneDescription> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let scene = parse_scene(&content, path.parent(), aspect)?;

    log::info!(
        "Loaded scene {}: {} materials, {} spheres, {} triangles, {} models",
        path.display(),
        scene.materials.len(),
        scene.spheres.len(),
        scene.triangles.len(),
        scene.models.len()
    );

    Ok(scene)
}

/// Parse scene file contents.
pub fn parse_scene(
    content: &str,
    base_dir: Option<&Path>,
    aspect: f32,
) -> LoadResult<SceneDescription> {
    let mut scene = SceneDescription::default();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or_default();
        let mut tokens = Tokens::new(text);

        let Some(directive) = tokens.next() else {
            continue;
        };

        let missing = || LoadError::MissingArgument {
            line,
            directive: directive.to_string(),
        };

        match directive {
            "lookfrom" | "origin" => {
                tokens.require().ok_or_else(missing)?;
                scene.camera.look_from = tokens.read_vec3(scene.camera.look_from);
            }
            "lookat" | "direction" => {
                tokens.require().ok_or_else(missing)?;
                scene.camera.look_at = tokens.read_vec3(scene.camera.look_at);
            }
            "up" => {
                tokens.require().ok_or_else(missing)?;
                scene.camera.up = tokens.read_vec3(scene.camera.up);
            }
            "fov" => {
                tokens.require().ok_or_else(missing)?;
                tokens.fill(std::slice::from_mut(&mut scene.camera.vfov));
            }
            "aperture" => {
                tokens.require().ok_or_else(missing)?;
                tokens.fill(std::slice::from_mut(&mut scene.camera.aperture));
            }
            "focus" => {
                tokens.require().ok_or_else(missing)?;
                tokens.fill(std::slice::from_mut(&mut scene.camera.focus_dist));
            }
            "sky" | "background" => {
                scene.background = tokens.read_vec3(scene.background);
            }
            "material" | "mat" | "m" => {
                let keyword = tokens.next().ok_or_else(missing)?;
                scene.materials.push(parse_material(keyword, &mut tokens, line));
            }
            "sphere" | "s" => {
                let Some(material) = read_material_index(&mut tokens, line, directive)? else {
                    continue;
                };
                let mut f = [0.0, 0.0, 0.0, 1.0];
                tokens.fill(&mut f);
                scene.spheres.push(SphereDef {
                    material,
                    center: Vec3::new(f[0], f[1], f[2]),
                    radius: f[3],
                });
            }
            "triangle" | "t" => {
                let Some(material) = read_material_index(&mut tokens, line, directive)? else {
                    continue;
                };
                let mut f = [0.0; 9];
                tokens.fill(&mut f);
                scene.triangles.push(TriangleDef {
                    material,
                    vertices: [
                        Vec3::new(f[0], f[1], f[2]),
                        Vec3::new(f[3], f[4], f[5]),
                        Vec3::new(f[6], f[7], f[8]),
                    ],
                });
            }
            "model" | "load" => {
                let path = tokens.next().ok_or_else(missing)?;
                if let Some(model) = parse_model(path, &mut tokens, base_dir, line) {
                    scene.models.push(model);
                }
            }
            other => {
                log::warn!("line {line}: skipping unknown directive '{other}'");
            }
        }
    }

    scene.camera.aspect = aspect;
    Ok(scene)
}

fn parse_material(keyword: &str, tokens: &mut Tokens, line: usize) -> Material {
    // albedo.xyz, emissive.xyz, roughness, ior
    let mut f = [0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
    tokens.fill(&mut f);

    let kind = parse_kind(keyword, f[6], f[7]).unwrap_or_else(|| {
        log::warn!("line {line}: unknown material type '{keyword}', using invisible");
        MaterialKind::Invisible
    });

    Material {
        kind,
        albedo: Vec3::new(f[0], f[1], f[2]),
        emissive: Vec3::new(f[3], f[4], f[5]),
    }
}

fn parse_kind(keyword: &str, roughness: f32, ior: f32) -> Option<MaterialKind> {
    let is = |name: &str| keyword.eq_ignore_ascii_case(name);
    if is("l") || is("lambert") {
        Some(MaterialKind::Lambert)
    } else if is("m") || is("metal") {
        Some(MaterialKind::Metal {
            roughness: roughness.clamp(0.0, 1.0),
        })
    } else if is("d") || is("dielectric") {
        Some(MaterialKind::Dielectric { ior })
    } else if is("invisible") {
        Some(MaterialKind::Invisible)
    } else {
        None
    }
}

/// Reads the leading material index of a primitive directive.
///
/// Errors when the argument is absent; a malformed index skips the line.
fn read_material_index(
    tokens: &mut Tokens,
    line: usize,
    directive: &str,
) -> LoadResult<Option<usize>> {
    let token = tokens.next().ok_or_else(|| LoadError::MissingArgument {
        line,
        directive: directive.to_string(),
    })?;

    match token.parse() {
        Ok(index) => Ok(Some(index)),
        Err(_) => {
            log::warn!("line {line}: invalid material index '{token}', skipping {directive}");
            Ok(None)
        }
    }
}

fn parse_model(
    path: &str,
    tokens: &mut Tokens,
    base_dir: Option<&Path>,
    line: usize,
) -> Option<ModelDef> {
    let mut transforms = Vec::new();
    while let Some(clause) = tokens.next() {
        match clause {
            "scale" => transforms.push(ModelTransform::Scale(tokens.read_vec3(Vec3::ONE))),
            "move" => transforms.push(ModelTransform::Move(tokens.read_vec3(Vec3::ZERO))),
            other => log::warn!("line {line}: ignoring model clause '{other}'"),
        }
    }

    let resolved = resolve_path(path, base_dir);
    match Mesh::load_obj(&resolved) {
        Ok(mesh) => Some(ModelDef::new(path, transforms, mesh)),
        Err(err) => {
            log::warn!(
                "line {line}: skipping model {}: {err}",
                resolved.display()
            );
            None
        }
    }
}

fn resolve_path(path: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(path);
    if path.is_relative() {
        if let Some(dir) = base_dir {
            let candidate = dir.join(path);
            if candidate.exists() {
                return candidate;
            }
        }
    }
    path.to_path_buf()
}

/// Cursor over the tokens of one line.
struct Tokens<'a> {
    items: Vec<&'a str>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            items: line.split(SEPARATORS).filter(|t| !t.is_empty()).collect(),
            pos: 0,
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.items.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    /// Some(()) if at least one more token is present.
    fn require(&self) -> Option<()> {
        (self.pos < self.items.len()).then_some(())
    }

    /// Consume the next token only if it is a number.
    fn next_f32(&mut self) -> Option<f32> {
        let value = self.items.get(self.pos)?.parse().ok()?;
        self.pos += 1;
        Some(value)
    }

    /// Overwrite values front to back until the numbers run out.
    fn fill(&mut self, values: &mut [f32]) {
        for value in values {
            match self.next_f32() {
                Some(v) => *value = v,
                None => break,
            }
        }
    }

    fn read_vec3(&mut self, default: Vec3) -> Vec3 {
        let mut v = default.to_array();
        self.fill(&mut v);
        Vec3::from_array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> SceneDescription {
        parse_scene(content, None, 1.5).unwrap()
    }

    #[test]
    fn test_defaults() {
        let scene = parse("");
        assert_eq!(scene.camera.look_from, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(scene.camera.look_at, Vec3::ZERO);
        assert_eq!(scene.camera.up, Vec3::Y);
        assert_eq!(scene.camera.vfov, 45.0);
        assert_eq!(scene.camera.aperture, 0.1);
        assert_eq!(scene.camera.focus_dist, 2.0);
        assert_eq!(scene.camera.aspect, 1.5);
        assert_eq!(scene.background, Vec3::new(0.2, 0.2, 1.0));
    }

    #[test]
    fn test_camera_directives_and_aliases() {
        let scene = parse(
            "lookfrom {1, 2, 3}\n\
             direction 4 5 6\n\
             up (0, 0, 1)\n\
             fov 60\n\
             aperture 0.5\n\
             focus 7.5\n\
             background 0.1 0.2 0.3\n",
        );
        assert_eq!(scene.camera.look_from, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.camera.look_at, Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(scene.camera.up, Vec3::Z);
        assert_eq!(scene.camera.vfov, 60.0);
        assert_eq!(scene.camera.aperture, 0.5);
        assert_eq!(scene.camera.focus_dist, 7.5);
        assert_eq!(scene.background, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_comments_are_ignored() {
        let scene = parse(
            "# a scene\n\
             fov 30 # narrow\n\
             # fov 90\n",
        );
        assert_eq!(scene.camera.vfov, 30.0);
    }

    #[test]
    fn test_materials() {
        let scene = parse(
            "material lambert {{0.8, 0.1, 0.1}, {0, 0, 0}, 0, 0}\n\
             mat Metal 0.9 0.9 0.9 0 0 0 0.3 0\n\
             m d 1 1 1 0 0 0 0 1.5\n\
             m L 1 1 1 4 4 4\n\
             m glitter 1 1 1\n",
        );

        assert_eq!(scene.materials.len(), 5);
        assert_eq!(scene.materials[0], Material::lambert(Vec3::new(0.8, 0.1, 0.1)));
        assert_eq!(scene.materials[1].kind, MaterialKind::Metal { roughness: 0.3 });
        assert_eq!(scene.materials[2].kind, MaterialKind::Dielectric { ior: 1.5 });
        assert_eq!(scene.materials[3].emissive, Vec3::splat(4.0));
        assert_eq!(scene.materials[4].kind, MaterialKind::Invisible);
    }

    #[test]
    fn test_partial_material_keeps_defaults() {
        let scene = parse("material metal 0.2\n");
        let material = scene.materials[0];
        assert_eq!(material.albedo, Vec3::new(0.2, 0.5, 0.5));
        assert_eq!(material.emissive, Vec3::ZERO);
        assert_eq!(material.roughness(), 0.0);
    }

    #[test]
    fn test_primitives() {
        let scene = parse(
            "sphere 1 {0, -100.5, -1, 100}\n\
             s 0 1 2 3\n\
             triangle 2 {{0,0,0},{1,0,0},{0,1,0}}\n",
        );

        assert_eq!(scene.spheres.len(), 2);
        assert_eq!(scene.spheres[0].material, 1);
        assert_eq!(scene.spheres[0].center, Vec3::new(0.0, -100.5, -1.0));
        assert_eq!(scene.spheres[0].radius, 100.0);
        // Missing radius keeps the unit default
        assert_eq!(scene.spheres[1].radius, 1.0);

        assert_eq!(scene.triangles.len(), 1);
        assert_eq!(scene.triangles[0].material, 2);
        assert_eq!(scene.triangles[0].vertices[2], Vec3::Y);
    }

    #[test]
    fn test_malformed_numbers_keep_defaults() {
        let scene = parse("sphere 0 1 oops 3 4\nfov wide\n");
        assert_eq!(scene.spheres[0].center, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(scene.spheres[0].radius, 1.0);
        assert_eq!(scene.camera.vfov, 45.0);
    }

    #[test]
    fn test_malformed_index_skips_primitive() {
        let scene = parse("sphere x 0 0 0 1\n");
        assert!(scene.spheres.is_empty());
    }

    #[test]
    fn test_unknown_directive_skipped() {
        let scene = parse("teapot 1 2 3\nfov 50\n");
        assert_eq!(scene.camera.vfov, 50.0);
    }

    #[test]
    fn test_missing_argument_fails() {
        let err = parse_scene("fov 40\nsphere\n", None, 1.0).unwrap_err();
        match err {
            LoadError::MissingArgument { line, directive } => {
                assert_eq!(line, 2);
                assert_eq!(directive, "sphere");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse_scene("lookfrom", None, 1.0).is_err());
        assert!(parse_scene("model", None, 1.0).is_err());
    }

    #[test]
    fn test_missing_model_file_skipped() {
        let scene = parse("model /no/such/mesh.obj scale 2 2 2\n");
        assert!(scene.models.is_empty());
    }

    #[test]
    fn test_model_loads_relative_to_scene() {
        let dir = std::env::temp_dir().join(format!("octa_parser_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let scene_path = dir.join("scene.txt");
        fs::write(&scene_path, "m l 1 1 1\nmodel tri.obj scale 2 move 0 0 5\n").unwrap();

        let scene = load_scene(&scene_path, 1.0).unwrap();
        assert_eq!(scene.models.len(), 1);

        let model = &scene.models[0];
        assert_eq!(model.path, PathBuf::from("tri.obj"));
        assert_eq!(
            model.transforms,
            vec![
                ModelTransform::Scale(Vec3::new(2.0, 1.0, 1.0)),
                ModelTransform::Move(Vec3::new(0.0, 0.0, 5.0)),
            ]
        );
        assert_eq!(model.mesh.positions[1], Vec3::new(2.0, 0.0, 5.0));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_scene_file() {
        assert!(matches!(
            load_scene("/no/such/scene.txt", 1.0),
            Err(LoadError::Io(_))
        ));
    }
}

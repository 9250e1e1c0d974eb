//! `octa` - render scene files with the Octa path tracer.
//!
//! Every scene file given on the command line is loaded, built and rendered
//! with the same settings. Files that fail to load are skipped with a
//! warning; the run fails only if none of them load.

mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use octa_renderer::{render_frame, Blend, FrameBuffer, RenderSettings, RgbF32, Scene};

use crate::output::{save_image, OutputPlan};

/// octa - a Monte Carlo path tracer for scene files
#[derive(Parser, Debug)]
#[command(
    name = "octa",
    version,
    about = "Render scene files with a Monte Carlo path tracer",
    after_help = "EXAMPLES:\n  \
                  octa scenes/spheres.txt\n  \
                  octa scenes/spheres.txt -W 1280 -H 720 --spp 64 -o spheres.jpg\n  \
                  octa scenes/cube.txt -f 30 --seed 7 -o cube.png\n  \
                  octa scenes/glass.txt --settings final.json --autofocus"
)]
struct Cli {
    /// Scene files to render
    #[arg(required = true)]
    scenes: Vec<PathBuf>,

    /// Output image (.png, .jpg or .ppm); sequences go into a directory of the same name
    #[arg(short, long, default_value = "image.png")]
    output: PathBuf,

    /// JSON render settings; flags given on the command line override it
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Render threads, the main thread included
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Samples per pixel
    #[arg(short, long)]
    spp: Option<u32>,

    /// Maximum ray bounce depth
    #[arg(short, long)]
    depth: Option<u32>,

    /// Number of frames; more than one writes a numbered sequence
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,

    /// How each frame combines with the previous ones
    #[arg(long, value_enum)]
    blend: Option<CliBlend>,

    /// History weight for the exponential blend
    #[arg(long, default_value_t = 0.9)]
    smoothing: f32,

    /// Base random seed, for repeatable renders
    #[arg(long)]
    seed: Option<u64>,

    /// Multiplier on the sky color
    #[arg(long)]
    sky: Option<f32>,

    /// Disable direct sampling of emissive spheres
    #[arg(long)]
    no_light_sampling: bool,

    /// Focus the camera on whatever the image center shows
    #[arg(long)]
    autofocus: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliBlend {
    /// Every frame stands alone
    Replace,
    /// Running mean over all frames
    Average,
    /// Weighted history that fades older frames
    Exponential,
}

impl Cli {
    /// Settings file (or defaults) with command-line overrides applied.
    fn render_settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings '{}'", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid settings file '{}'", path.display()))?
            }
            None => RenderSettings::default(),
        };

        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(spp) = self.spp {
            settings.samples_per_pixel = spp;
        }
        if let Some(depth) = self.depth {
            settings.trace.max_depth = depth;
        }
        if let Some(sky) = self.sky {
            settings.trace.sky_intensity = sky;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.no_light_sampling {
            settings.trace.light_sampling = false;
        }

        match self.blend {
            Some(CliBlend::Replace) => settings.blend = Blend::Replace,
            Some(CliBlend::Average) => settings.blend = Blend::Average,
            Some(CliBlend::Exponential) => settings.blend = Blend::Exponential(self.smoothing),
            // Sequences refine progressively unless told otherwise
            None if self.frames > 1 && settings.blend == Blend::Replace => {
                settings.blend = Blend::Average;
            }
            None => {}
        }

        settings.validate()?;
        Ok(settings)
    }
}

/// Load and build every scene that can be; failures are logged and skipped.
fn load_scenes(paths: &[PathBuf], aspect: f32, autofocus: bool) -> Vec<(PathBuf, Scene)> {
    let mut scenes = Vec::new();

    for path in paths {
        let desc = match octa_core::load_scene(path, aspect) {
            Ok(desc) => desc,
            Err(e) => {
                log::warn!("Skipping '{}': {}", path.display(), e);
                continue;
            }
        };
        let mut scene = match Scene::from_description(&desc) {
            Ok(scene) => scene,
            Err(e) => {
                log::warn!("Skipping '{}': {}", path.display(), e);
                continue;
            }
        };

        if autofocus {
            match scene.autofocus() {
                Some(distance) => log::info!("Autofocus: focus distance {:.3}", distance),
                None => log::warn!("Autofocus found nothing at the image center, focus unchanged"),
            }
        }

        scenes.push((path.clone(), scene));
    }

    scenes
}

/// Render all frames of one scene and write them out.
fn render_scene(
    scene: &Scene,
    settings: &RenderSettings,
    frames: u32,
    plan: &OutputPlan,
) -> Result<()> {
    let mut buffer: FrameBuffer<RgbF32> = FrameBuffer::new(settings.width, settings.height);

    if frames == 1 {
        render_frame(scene, settings, 0, &mut buffer)?;
        return save_image(&buffer, &plan.still());
    }

    let dir = plan.sequence_dir();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;

    for frame in 0..frames {
        render_frame(scene, settings, frame, &mut buffer)?;
        save_image(&buffer, &plan.frame(frame))?;
    }
    Ok(())
}

fn scene_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.render_settings()?;
    let plan = OutputPlan::new(&cli.output)?;

    let scenes = load_scenes(&cli.scenes, settings.aspect(), cli.autofocus);
    if scenes.is_empty() {
        bail!("No valid path to scene file was found");
    }

    log::info!(
        "Rendering {} scene(s) at {}x{}, {} spp, {} thread(s), {} frame(s)",
        scenes.len(),
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        settings.threads,
        cli.frames
    );

    let start = Instant::now();
    let several = scenes.len() > 1;
    for (path, scene) in &scenes {
        let plan = if several {
            plan.with_suffix(&scene_name(path))
        } else {
            plan.clone()
        };
        render_scene(scene, &settings, cli.frames, &plan)
            .with_context(|| format!("Failed to render '{}'", path.display()))?;
    }
    log::info!("Done in {:.2?}", start.elapsed());

    Ok(())
}

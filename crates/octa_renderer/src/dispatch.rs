//! Row-range render dispatch.
//!
//! A frame is split into contiguous row ranges, one per thread. The calling
//! thread renders the last range itself while a rayon pool of `threads - 1`
//! workers takes the rest. Every range owns a disjoint slice of the target
//! buffer, so no locking is involved.
//!
//! Each image row draws from its own generator seeded by (seed, frame, row),
//! which makes output independent of the thread count.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framebuffer::{FrameBuffer, Pixel};
use crate::material::Color;
use crate::renderer::{linear_to_gamma, RayStats, TraceConfig, Tracer};
use crate::sampling::gen_f32;
use crate::scene::Scene;

/// Largest accepted image width.
pub const MAX_WIDTH: u32 = 3840;
/// Largest accepted image height.
pub const MAX_HEIGHT: u32 = 2160;
/// Largest accepted thread count.
pub const MAX_THREADS: usize = 128;

/// Errors that can occur while rendering a frame.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render settings: {0}")]
    InvalidSettings(String),

    #[error("Frame buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Failed to start render threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How a new frame combines with what the buffer already holds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blend {
    /// Overwrite the buffer
    #[default]
    Replace,
    /// Running mean over frames: frame `i` keeps `i / (i + 1)` of the history
    Average,
    /// Like `Average` scaled by a smoothing factor in [0, 1], so old frames fade
    Exponential(f32),
}

impl Blend {
    /// Weight of the previous buffer content for frame `frame`.
    pub fn lerp(&self, frame: u32) -> f32 {
        let history = frame as f32 / (frame as f32 + 1.0);
        match *self {
            Blend::Replace => 0.0,
            Blend::Average => history,
            Blend::Exponential(smoothing) => history * smoothing.clamp(0.0, 1.0),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel for anti-aliasing and noise
    pub samples_per_pixel: u32,
    /// Threads per frame, the calling thread included
    pub threads: usize,
    /// Base seed; None draws a fresh one every frame
    pub seed: Option<u64>,
    pub blend: Blend,
    #[serde(flatten)]
    pub trace: TraceConfig,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            samples_per_pixel: 4,
            threads: 4,
            seed: None,
            blend: Blend::Replace,
            trace: TraceConfig::default(),
        }
    }
}

impl RenderSettings {
    /// Reject settings no frame can be rendered with.
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |msg: String| Err(RenderError::InvalidSettings(msg));

        if self.width == 0 || self.width > MAX_WIDTH {
            return invalid(format!("width must be 1..={MAX_WIDTH}, got {}", self.width));
        }
        if self.height == 0 || self.height > MAX_HEIGHT {
            return invalid(format!("height must be 1..={MAX_HEIGHT}, got {}", self.height));
        }
        if self.threads == 0 || self.threads > MAX_THREADS {
            return invalid(format!("threads must be 1..={MAX_THREADS}, got {}", self.threads));
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples per pixel cannot be smaller than 1".to_string());
        }
        if self.trace.sky_intensity.is_nan() || self.trace.sky_intensity < 0.0 {
            return invalid(format!(
                "sky intensity must be non-negative, got {}",
                self.trace.sky_intensity
            ));
        }
        Ok(())
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Half-open range of image rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: u32,
    pub end: u32,
}

impl RowRange {
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Split `height` rows into `parts` contiguous ranges of `height / parts`
/// rows, the remainder going to the last range.
///
/// `parts` is clamped to `1..=height` so no range is empty.
pub fn partition_rows(height: u32, parts: usize) -> Vec<RowRange> {
    let parts = (parts.max(1) as u32).min(height.max(1));
    let chunk = height / parts;

    (0..parts)
        .map(|i| RowRange {
            start: i * chunk,
            end: if i + 1 == parts { height } else { (i + 1) * chunk },
        })
        .collect()
}

/// Timing and ray counts of one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub rays: RayStats,
    pub elapsed: Duration,
}

impl RenderStats {
    pub fn rays_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rays.total() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Per-frame values shared by every row job.
struct FrameContext<'a> {
    tracer: Tracer<'a>,
    width: u32,
    height: u32,
    samples_per_pixel: u32,
    seed: u64,
    frame: u32,
    lerp: f32,
}

/// One row range and the buffer slice it writes.
struct RowJob<'b, P> {
    range: RowRange,
    rows: &'b mut [P],
    stats: RayStats,
}

impl<P: Pixel> RowJob<'_, P> {
    fn run(&mut self, ctx: &FrameContext<'_>) {
        let width = ctx.width as usize;
        let camera = &ctx.tracer.scene().camera;
        let inv_samples = 1.0 / ctx.samples_per_pixel as f32;

        for (y, row) in (self.range.start..self.range.end).zip(self.rows.chunks_exact_mut(width)) {
            let mut rng = StdRng::seed_from_u64(row_seed(ctx.seed, ctx.frame, y));

            for (x, pixel) in row.iter_mut().enumerate() {
                let mut color = Color::ZERO;
                for _ in 0..ctx.samples_per_pixel {
                    let s = (x as f32 + gen_f32(&mut rng)) / ctx.width as f32;
                    let t = (y as f32 + gen_f32(&mut rng)) / ctx.height as f32;
                    let ray = camera.get_ray(s, t, &mut rng);
                    self.stats.primary += 1;
                    color += ctx.tracer.trace(&ray, 0, &mut rng, &mut self.stats);
                }

                let linear = color * inv_samples;
                let mut color = Color::new(
                    linear_to_gamma(linear.x),
                    linear_to_gamma(linear.y),
                    linear_to_gamma(linear.z),
                )
                .clamp(Color::ZERO, Color::ONE);
                if ctx.lerp > 0.0 {
                    color = pixel.to_color() * ctx.lerp + color * (1.0 - ctx.lerp);
                }
                *pixel = P::from_color(color);
            }
        }
    }
}

/// Seed of the generator for one image row.
fn row_seed(seed: u64, frame: u32, row: u32) -> u64 {
    // splitmix64 over the combined key
    let mut z = seed
        ^ (frame as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (row as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Render one frame of `scene` into `target`.
///
/// `frame` is the index within a progressive sequence; it selects the blend
/// weight and the random streams. Blocks until every row is written.
pub fn render_frame<P: Pixel>(
    scene: &Scene,
    settings: &RenderSettings,
    frame: u32,
    target: &mut FrameBuffer<P>,
) -> Result<RenderStats, RenderError> {
    settings.validate()?;

    let expected = settings.width as usize * settings.height as usize;
    if target.width() != settings.width || target.height() != settings.height {
        return Err(RenderError::BufferSize {
            expected,
            actual: target.pixels().len(),
        });
    }

    let start = Instant::now();
    let ctx = FrameContext {
        tracer: Tracer::new(scene, settings.trace),
        width: settings.width,
        height: settings.height,
        samples_per_pixel: settings.samples_per_pixel,
        seed: settings.seed.unwrap_or_else(rand::random),
        frame,
        lerp: settings.blend.lerp(frame),
    };

    let width = settings.width as usize;
    let mut rest = target.pixels_mut();
    let mut jobs: Vec<RowJob<'_, P>> = Vec::new();
    for range in partition_rows(settings.height, settings.threads) {
        let (rows, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * width);
        rest = tail;
        jobs.push(RowJob {
            range,
            rows,
            stats: RayStats::default(),
        });
    }

    if let Some((last, others)) = jobs.split_last_mut() {
        if others.is_empty() {
            last.run(&ctx);
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(others.len())
                .thread_name(|i| format!("octa-render-{i}"))
                .build()?;

            let ctx = &ctx;
            pool.in_place_scope(|scope| {
                for job in others.iter_mut() {
                    scope.spawn(move |_| job.run(ctx));
                }
                last.run(ctx);
            });
        }
    }

    let mut rays = RayStats::default();
    for job in &jobs {
        rays += job.stats;
    }
    let stats = RenderStats {
        rays,
        elapsed: start.elapsed(),
    };

    log::info!(
        "Frame {} rendered in {:.2?}: {} rays ({:.2} Mrays/s)",
        frame,
        stats.elapsed,
        stats.rays.total(),
        stats.rays_per_second() / 1.0e6
    );

    Ok(stats)
}

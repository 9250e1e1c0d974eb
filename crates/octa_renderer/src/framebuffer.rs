//! Caller-owned render targets.
//!
//! Buffers are row-major with row 0 at the bottom of the image. Writers that
//! expect a top-left origin flip rows on export.

use crate::dispatch::RenderError;
use crate::material::Color;

/// A pixel format the renderer can write.
///
/// Colors passed in are already gamma corrected and clamped to [0, 1].
pub trait Pixel: Copy + Default + Send + Sync {
    /// Channels per pixel
    const CHANNELS: usize;

    fn from_color(color: Color) -> Self;

    /// The stored color, used for blending with the next frame.
    fn to_color(&self) -> Color;

    /// 8-bit RGB for image export.
    fn to_rgb8(&self) -> [u8; 3] {
        let c = self.to_color();
        [to_u8(c.x), to_u8(c.y), to_u8(c.z)]
    }
}

/// 8-bit RGB, used for still and frame-sequence export
pub type Rgb8 = [u8; 3];
/// 8-bit RGBA with opaque alpha, used for display buffers
pub type Rgba8 = [u8; 4];
/// Float RGB, used as a progressive accumulation buffer
pub type RgbF32 = [f32; 3];

#[inline]
fn to_u8(x: f32) -> u8 {
    (255.0 * x.clamp(0.0, 1.0)) as u8
}

#[inline]
fn from_u8(x: u8) -> f32 {
    x as f32 / 255.0
}

impl Pixel for Rgb8 {
    const CHANNELS: usize = 3;

    fn from_color(color: Color) -> Self {
        [to_u8(color.x), to_u8(color.y), to_u8(color.z)]
    }

    fn to_color(&self) -> Color {
        Color::new(from_u8(self[0]), from_u8(self[1]), from_u8(self[2]))
    }

    fn to_rgb8(&self) -> [u8; 3] {
        *self
    }
}

impl Pixel for Rgba8 {
    const CHANNELS: usize = 4;

    fn from_color(color: Color) -> Self {
        [to_u8(color.x), to_u8(color.y), to_u8(color.z), 255]
    }

    fn to_color(&self) -> Color {
        Color::new(from_u8(self[0]), from_u8(self[1]), from_u8(self[2]))
    }

    fn to_rgb8(&self) -> [u8; 3] {
        [self[0], self[1], self[2]]
    }
}

impl Pixel for RgbF32 {
    const CHANNELS: usize = 3;

    fn from_color(color: Color) -> Self {
        color.to_array()
    }

    fn to_color(&self) -> Color {
        Color::from_array(*self)
    }
}

/// Fixed-size 2D pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer<P: Pixel> {
    width: u32,
    height: u32,
    pixels: Vec<P>,
}

impl<P: Pixel> FrameBuffer<P> {
    /// Create a new buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![P::default(); width as usize * height as usize],
        }
    }

    /// Wrap existing pixels; fails unless there are exactly `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<P>) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel at (x, y), with y = 0 the bottom row.
    pub fn get(&self, x: u32, y: u32) -> P {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, pixel: P) {
        let i = self.index(x, y);
        self.pixels[i] = pixel;
    }

    pub fn pixels(&self) -> &[P] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [P] {
        &mut self.pixels
    }

    /// Rows from the top of the image down, for writers with a top-left origin.
    pub fn rows_top_down(&self) -> impl Iterator<Item = &[P]> {
        self.pixels.chunks_exact(self.width.max(1) as usize).rev()
    }

    /// Average color over the whole buffer.
    pub fn mean(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        let sum: Color = self.pixels.iter().map(Pixel::to_color).sum();
        sum / self.pixels.len() as f32
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

//! Output naming and image export.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use octa_renderer::{FrameBuffer, Pixel};

/// Where the images of one render go.
///
/// A single frame is written to `<base>.<ext>`. A sequence of frames goes
/// into the directory `<base>/` as `<name>001.<ext>`, `<name>002.<ext>`, ...
/// where `<name>` is the last component of `<base>`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputPlan {
    base: PathBuf,
    extension: String,
}

impl OutputPlan {
    /// Check that `path` names an image format we can write.
    pub fn new(path: &Path) -> Result<Self> {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            bail!(
                "Output name '{}' must contain a file format like .png, .jpg or .ppm",
                path.display()
            );
        };

        match ImageFormat::from_extension(extension) {
            Some(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Pnm) => {}
            _ => bail!("Unsupported output format '.{extension}', use .png, .jpg or .ppm"),
        }

        Ok(Self {
            base: path.with_extension(""),
            extension: extension.to_string(),
        })
    }

    /// Same format, with `_suffix` appended to the name.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut name = self.base.as_os_str().to_os_string();
        name.push("_");
        name.push(suffix);
        Self {
            base: PathBuf::from(name),
            extension: self.extension.clone(),
        }
    }

    /// Path of a single still image.
    pub fn still(&self) -> PathBuf {
        let mut name = self.base.as_os_str().to_os_string();
        name.push(".");
        name.push(&self.extension);
        PathBuf::from(name)
    }

    /// Directory holding a frame sequence.
    pub fn sequence_dir(&self) -> &Path {
        &self.base
    }

    /// Path of frame `index` (0-based) of a sequence; files are numbered from 1.
    pub fn frame(&self, index: u32) -> PathBuf {
        let name = self
            .base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.base
            .join(format!("{}{:03}.{}", name, index + 1, self.extension))
    }
}

/// Write a frame buffer as an 8-bit RGB image, top row first.
pub fn save_image<P: Pixel>(buffer: &FrameBuffer<P>, path: &Path) -> Result<()> {
    let mut image = RgbImage::new(buffer.width(), buffer.height());
    for (y, row) in buffer.rows_top_down().enumerate() {
        for (x, pixel) in row.iter().enumerate() {
            image.put_pixel(x as u32, y as u32, Rgb(pixel.to_rgb8()));
        }
    }

    image
        .save(path)
        .with_context(|| format!("Failed to write image '{}'", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use octa_renderer::Rgb8;

    #[test]
    fn test_requires_known_extension() {
        assert!(OutputPlan::new(Path::new("image")).is_err());
        assert!(OutputPlan::new(Path::new("image.xyz")).is_err());
        assert!(OutputPlan::new(Path::new("image.png")).is_ok());
        assert!(OutputPlan::new(Path::new("image.jpg")).is_ok());
        assert!(OutputPlan::new(Path::new("image.ppm")).is_ok());
    }

    #[test]
    fn test_still_path() {
        let plan = OutputPlan::new(Path::new("renders/shot.jpg")).unwrap();
        assert_eq!(plan.still(), PathBuf::from("renders/shot.jpg"));

        let dotted = OutputPlan::new(Path::new("my.scene.ppm")).unwrap();
        assert_eq!(dotted.still(), PathBuf::from("my.scene.ppm"));
    }

    #[test]
    fn test_sequence_paths() {
        let plan = OutputPlan::new(Path::new("out/anim.png")).unwrap();
        assert_eq!(plan.sequence_dir(), Path::new("out/anim"));
        assert_eq!(plan.frame(0), PathBuf::from("out/anim/anim001.png"));
        assert_eq!(plan.frame(41), PathBuf::from("out/anim/anim042.png"));
    }

    #[test]
    fn test_suffix() {
        let plan = OutputPlan::new(Path::new("image.png")).unwrap().with_suffix("cornell");
        assert_eq!(plan.still(), PathBuf::from("image_cornell.png"));
        assert_eq!(plan.frame(2), PathBuf::from("image_cornell/image_cornell003.png"));
    }

    #[test]
    fn test_save_flips_rows() {
        let dir = std::env::temp_dir().join(format!("octa_cli_save_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("flip.png");

        let mut fb: FrameBuffer<Rgb8> = FrameBuffer::new(2, 2);
        // Bottom-left in the buffer
        fb.set(0, 0, [255, 0, 0]);
        save_image(&fb, &path).unwrap();

        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 1).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

//! PNG output and file path generation

use image::imageops::FilterType;
use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Save an RGBA image to a PNG file, creating parent directories as needed.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save_with_format(path, image::ImageFormat::Png)?;
    tracing::debug!(path = %path.display(), "wrote frame");
    Ok(())
}

/// Scale image by integer factor using nearest-neighbor interpolation.
///
/// A factor of 0 or 1 returns the image unchanged.
pub fn scale_image(image: RgbaImage, factor: u8) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor as u32, h * factor as u32, FilterType::Nearest)
}

/// Scale then save.
pub fn save_frame(image: RgbaImage, path: &Path, scale: u8) -> Result<(), OutputError> {
    save_png(&scale_image(image, scale), path)
}

/// Generate the output path for a rendered frame.
///
/// | Scenario | Output |
/// |----------|--------|
/// | No `-o` | `{input_stem}_{frame}.png` next to the input |
/// | `-o out.png`, single frame | `out.png` |
/// | `-o out.png`, several frames | `out_{frame}.png` |
/// | `-o dir/` | `dir/{frame}.png` |
pub fn generate_output_path(
    input: &Path,
    frame_name: &str,
    output_arg: Option<&Path>,
    is_single_frame: bool,
) -> PathBuf {
    match output_arg {
        Some(output) => {
            let is_dir = output.as_os_str().to_string_lossy().ends_with('/') || output.is_dir();

            if is_dir {
                output.join(format!("{}.png", frame_name))
            } else if is_single_frame {
                output.to_path_buf()
            } else {
                sibling(output, frame_name)
            }
        }
        None => sibling(input, frame_name),
    }
}

/// `{stem}_{frame}.png` in the directory of `path`.
fn sibling(path: &Path, frame_name: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let file = format!("{}_{}.png", stem, frame_name);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file),
        _ => PathBuf::from(file),
    }
}

/// Path of a chained frame: `{out}/{character}/{frame}.png`.
pub fn chain_frame_path(out_dir: &Path, character: &str, frame_name: &str) -> PathBuf {
    out_dir.join(character).join(format!("{}.png", frame_name))
}

//! Raster adapter: encoded image resources to and from in-memory RGBA buffers.
//!
//! Painted frames travel between recoloring stages as PNG bytes or `data:` URLs,
//! so both directions are supported here.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use thiserror::Error;

/// Fully transparent black.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Error type for raster conversions
#[derive(Debug, Error)]
pub enum RasterError {
    /// The bytes are not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    /// PNG encoding failed
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    /// Malformed `data:` URL
    #[error("invalid data URL: {0}")]
    DataUrl(String),
}

/// Decode any supported image format into RGBA8.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    let img = image::load_from_memory(bytes).map_err(RasterError::Decode)?;
    Ok(img.to_rgba8())
}

/// Open and decode an image file into RGBA8.
pub fn open_raster(path: &Path) -> Result<RgbaImage, RasterError> {
    let img = image::open(path).map_err(RasterError::Decode)?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(RasterError::Encode)?;
    Ok(bytes)
}

/// Encode an RGBA buffer as a `data:image/png;base64,...` URL.
pub fn to_png_data_url(image: &RgbaImage) -> Result<String, RasterError> {
    let bytes = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes)))
}

/// Whether `location` is a `data:` URL rather than a path.
pub fn is_data_url(location: &str) -> bool {
    location.starts_with("data:")
}

/// Extract the payload bytes of a base64 `data:` URL.
pub fn data_url_bytes(url: &str) -> Result<Vec<u8>, RasterError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RasterError::DataUrl("missing 'data:' prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RasterError::DataUrl("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(RasterError::DataUrl(format!("unsupported encoding in '{}'", header)));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| RasterError::DataUrl(format!("invalid base64 payload: {}", e)))
}

/// Decode a base64 image `data:` URL into RGBA8.
pub fn decode_data_url(url: &str) -> Result<RgbaImage, RasterError> {
    decode_raster(&data_url_bytes(url)?)
}

/// Copy of `pixel` with alpha forced to fully opaque.
pub fn opaque(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, _] = pixel.0;
    Rgba([r, g, b, 255])
}

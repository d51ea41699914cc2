use crate::error::TraceError;
use anyhow::{Context, Result};
use rgb::RGBA8;

/// Decoded RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<RGBA8>,
}

impl ImageData {
    /// Image of `width * height` copies of `color`.
    pub fn filled(width: u32, height: u32, color: RGBA8) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wraps a raw RGBA byte buffer (4 bytes per pixel).
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> std::result::Result<Self, TraceError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(TraceError::DimensionMismatch {
                len: bytes.len(),
                width: width as usize,
                height: height as usize,
            });
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();

        Ok(Self { width, height, pixels })
    }
}

/// Decodes any format the `image` crate understands.
pub fn load_image(path: &std::path::Path) -> Result<ImageData> {
    let img = image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let rgba = img.to_rgba8();

    let pixels: Vec<RGBA8> = rgba
        .pixels()
        .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
        .collect();

    Ok(ImageData {
        width: rgba.width(),
        height: rgba.height(),
        pixels,
    })
}

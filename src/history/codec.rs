//! Sparse pixel encoding used by history payloads.
//!
//! Only pixels with non-zero alpha are stored, one fixed-size record each:
//!
//! | bytes | field              |
//! |-------|--------------------|
//! | 0..2  | x, `u16` LE        |
//! | 2..4  | y, `u16` LE        |
//! | 4..8  | r, g, b, a         |
//!
//! Mostly empty layers, the common case for freshly painted strokes, shrink
//! to a few records.

use image::Rgba;

use crate::error::{EngineError, EngineResult};
use crate::surface::{self, MAX_DIMENSION, Surface};

pub const RECORD_LEN: usize = 8;

/// Encoded pixels of one surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedPixels(Vec<u8>);

impl CompressedPixels {
    /// Wraps raw bytes without validating them; validation happens on decode.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    /// Number of stored (non-transparent) pixels
    pub fn pixel_count(&self) -> usize {
        self.0.len() / RECORD_LEN
    }
}

/// Encodes every non-transparent pixel of `surface` in row-major order.
pub fn compress(surface: &Surface) -> CompressedPixels {
    debug_assert!(surface.width() <= MAX_DIMENSION && surface.height() <= MAX_DIMENSION);

    let visible = surface.pixels().filter(|p| p[3] != 0).count();
    let mut bytes = Vec::with_capacity(visible * RECORD_LEN);
    for (x, y, pixel) in surface.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bytes.extend_from_slice(&(x as u16).to_le_bytes());
        bytes.extend_from_slice(&(y as u16).to_le_bytes());
        bytes.extend_from_slice(&pixel.0);
    }
    CompressedPixels(bytes)
}

/// Rebuilds a `width`x`height` surface. Pixels without a record are transparent.
pub fn decompress(pixels: &CompressedPixels, width: u32, height: u32) -> EngineResult<Surface> {
    let bytes = pixels.as_bytes();
    if bytes.len() % RECORD_LEN != 0 {
        return Err(EngineError::MalformedDiff(format!(
            "length {} is not a multiple of {}",
            bytes.len(),
            RECORD_LEN
        )));
    }

    let mut surface = surface::allocate(width, height)?;
    for record in bytes.chunks_exact(RECORD_LEN) {
        let x = u16::from_le_bytes([record[0], record[1]]) as u32;
        let y = u16::from_le_bytes([record[2], record[3]]) as u32;
        if x >= width || y >= height {
            return Err(EngineError::MalformedDiff(format!(
                "pixel ({x}, {y}) outside {width}x{height}"
            )));
        }
        surface.put_pixel(x, y, Rgba([record[4], record[5], record[6], record[7]]));
    }
    Ok(surface)
}

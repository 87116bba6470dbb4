//! Raster surfaces and the small set of pixel operations the engine needs.
//!
//! A surface is a plain straight-alpha [`image::RgbaImage`]. Fully transparent
//! pixels are always stored as `[0, 0, 0, 0]`, the way a premultiplied canvas
//! reads them back; the history codec relies on that.

use std::io::Cursor;

use egui::{Color32, ColorImage};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::error::{EngineError, EngineResult};

pub type Surface = RgbaImage;

/// Largest width or height a surface may have (pixel-diff coordinates are `u16`).
pub const MAX_DIMENSION: u32 = u16::MAX as u32;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How painted pixels combine with what is already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// Paint over the destination
    #[default]
    SourceOver,
    /// Remove destination coverage where the source is opaque
    DestinationOut,
}

/// Allocates a fully transparent surface.
///
/// Zero or oversized dimensions, and buffers the allocator refuses, are
/// reported as [`EngineError::SurfaceAllocation`].
pub fn allocate(width: u32, height: u32) -> EngineResult<Surface> {
    let err = || EngineError::SurfaceAllocation { width, height };
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(err());
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(err)?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| err())?;
    buf.resize(len, 0);
    Surface::from_raw(width, height, buf).ok_or_else(err)
}

/// Copies `source` into a freshly allocated surface of the same size.
pub fn duplicate(source: &Surface) -> EngineResult<Surface> {
    let mut copy = allocate(source.width(), source.height())?;
    copy.copy_from_slice(source.as_raw());
    Ok(copy)
}

/// Returns a `width`x`height` copy of `source` anchored at the origin.
///
/// Content outside the new bounds is cropped, new area is transparent.
pub fn resized(source: &Surface, width: u32, height: u32) -> EngineResult<Surface> {
    let mut target = allocate(width, height)?;
    imageops::replace(&mut target, source, 0, 0);
    Ok(target)
}

pub fn clear(surface: &mut Surface) {
    surface.fill(0);
}

/// Clears `target` and writes `source` at the origin, cropping to `target`.
pub fn replace_contents(target: &mut Surface, source: &Surface) {
    if target.dimensions() == source.dimensions() {
        target.copy_from_slice(source.as_raw());
    } else {
        clear(target);
        imageops::replace(target, source, 0, 0);
    }
}

/// True when every pixel is fully transparent.
pub fn is_blank(surface: &Surface) -> bool {
    surface.pixels().all(|p| p[3] == 0)
}

/// Combines `src` into `dst` using straight-alpha math.
#[inline]
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, mode: CompositeMode) {
    let sa = src[3] as u32;
    if sa == 0 {
        return;
    }
    match mode {
        CompositeMode::SourceOver => {
            if sa == 255 {
                *dst = src;
                return;
            }
            let da = dst[3] as u32;
            // Scaled by 255 to stay in integers.
            let out_a = sa * 255 + da * (255 - sa);
            for c in 0..3 {
                let num = src[c] as u32 * sa * 255 + dst[c] as u32 * da * (255 - sa);
                dst[c] = ((num + out_a / 2) / out_a) as u8;
            }
            dst[3] = ((out_a + 127) / 255) as u8;
        }
        CompositeMode::DestinationOut => {
            let out_a = (dst[3] as u32 * (255 - sa) + 127) / 255;
            if out_a == 0 {
                *dst = TRANSPARENT;
            } else {
                dst[3] = out_a as u8;
            }
        }
    }
}

/// Composites `layers` bottom to top onto a transparent `width`x`height` surface.
pub fn composite<'a>(
    layers: impl IntoIterator<Item = &'a Surface>,
    width: u32,
    height: u32,
) -> EngineResult<Surface> {
    let mut target = allocate(width, height)?;
    for layer in layers {
        imageops::overlay(&mut target, layer, 0, 0);
    }
    Ok(target)
}

/// Composites `layers` at document size and scales the result to the export size.
pub fn export<'a>(
    layers: impl IntoIterator<Item = &'a Surface>,
    document_size: [u32; 2],
    export_size: [u32; 2],
) -> EngineResult<Surface> {
    let [width, height] = document_size;
    let flat = composite(layers, width, height)?;
    if export_size == document_size {
        return Ok(flat);
    }
    let [export_width, export_height] = export_size;
    // Validates the export size the same way every other surface is validated.
    allocate(export_width, export_height)?;
    Ok(imageops::resize(&flat, export_width, export_height, FilterType::Triangle))
}

/// Encodes a surface as PNG bytes.
pub fn encode_png(surface: &Surface) -> EngineResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(surface.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Converts a surface into an egui image, ready for `Context::load_texture`.
pub fn to_color_image(surface: &Surface) -> ColorImage {
    let size = [surface.width() as usize, surface.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, surface.as_raw())
}

/// Parses `#rrggbb` (the `#` is optional). The result is always opaque.
pub fn parse_hex_color(hex: &str) -> EngineResult<Rgba<u8>> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(EngineError::InvalidColor(hex.to_owned()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| EngineError::InvalidColor(hex.to_owned()))
    };
    Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

/// Converts an egui color picker value into a straight-alpha pixel.
pub fn color_from_egui(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

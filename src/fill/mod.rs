//! Bucket fill: 4-connected replacement of an exact color region.

pub mod worker;

pub use worker::{FillJob, FillResult, FillTask, spawn_fill};

use image::Rgba;

use crate::surface::{Surface, TRANSPARENT};

/// Fill colors with zero alpha are stored as all-zero pixels.
fn normalized(fill: Rgba<u8>) -> Rgba<u8> {
    if fill[3] == 0 { TRANSPARENT } else { fill }
}

/// Color under the seed, or `None` when the fill would change nothing.
fn target_color(surface: &Surface, x: u32, y: u32, fill: Rgba<u8>) -> Option<Rgba<u8>> {
    if x >= surface.width() || y >= surface.height() {
        return None;
    }
    let target = *surface.get_pixel(x, y);
    (target != fill).then_some(target)
}

/// Fills the region around (`x`, `y`) with `fill`. Returns whether any pixel changed.
pub fn flood_fill(surface: &mut Surface, x: u32, y: u32, fill: Rgba<u8>) -> bool {
    flood_fill_scanline(surface, x, y, fill)
}

/// Scanline fill: walks whole horizontal runs and seeds the rows above and
/// below from each run.
pub fn flood_fill_scanline(surface: &mut Surface, x: u32, y: u32, fill: Rgba<u8>) -> bool {
    let fill = normalized(fill);
    let Some(target) = target_color(surface, x, y, fill) else {
        return false;
    };
    let (width, height) = surface.dimensions();

    let mut stack = vec![(x, y)];
    while let Some((x, y)) = stack.pop() {
        if *surface.get_pixel(x, y) != target {
            continue;
        }

        let mut left = x;
        while left > 0 && *surface.get_pixel(left - 1, y) == target {
            left -= 1;
        }
        let mut right = x;
        while right + 1 < width && *surface.get_pixel(right + 1, y) == target {
            right += 1;
        }

        for run_x in left..=right {
            surface.put_pixel(run_x, y, fill);
        }
        for run_x in left..=right {
            if y > 0 && *surface.get_pixel(run_x, y - 1) == target {
                stack.push((run_x, y - 1));
            }
            if y + 1 < height && *surface.get_pixel(run_x, y + 1) == target {
                stack.push((run_x, y + 1));
            }
        }
    }
    true
}

/// Pixel-at-a-time fill with an explicit visited set. Slower than the
/// scanline variant, kept as a reference it must agree with.
pub fn flood_fill_stack(surface: &mut Surface, x: u32, y: u32, fill: Rgba<u8>) -> bool {
    let fill = normalized(fill);
    let Some(target) = target_color(surface, x, y, fill) else {
        return false;
    };
    let (width, height) = surface.dimensions();
    let stride = width as usize;

    let mut visited = vec![false; stride * height as usize];
    let mut stack = vec![(x, y)];
    visited[y as usize * stride + x as usize] = true;

    while let Some((x, y)) = stack.pop() {
        surface.put_pixel(x, y, fill);

        let mut visit = |nx: u32, ny: u32| {
            let index = ny as usize * stride + nx as usize;
            if !visited[index] && *surface.get_pixel(nx, ny) == target {
                visited[index] = true;
                stack.push((nx, ny));
            }
        };
        if x > 0 {
            visit(x - 1, y);
        }
        if x + 1 < width {
            visit(x + 1, y);
        }
        if y > 0 {
            visit(x, y - 1);
        }
        if y + 1 < height {
            visit(x, y + 1);
        }
    }
    true
}

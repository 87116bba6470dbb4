use egui::Pos2;
use image::Rgba;

use crate::surface::{CompositeMode, Surface, blend_pixel};

/// Color and width of the path being drawn. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba<u8>,
    pub width: f64,
}

/// An open path: points added with `line_to` but not yet stroked are pending.
#[derive(Debug, Clone)]
struct StrokePath {
    style: StrokeStyle,
    points: Vec<Pos2>,
    /// Index of the first point whose incoming segment has not been painted
    stroked_upto: usize,
}

/// Immediate-mode path rasterizer bound to a composite mode.
///
/// Mirrors the small part of a 2D canvas context the tools rely on: a
/// current path, `stroke()` and a global composite operation.
#[derive(Debug, Clone, Default)]
pub struct StrokeRenderer {
    composite: CompositeMode,
    path: Option<StrokePath>,
}

impl StrokeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn composite(&self) -> CompositeMode {
        self.composite
    }

    pub fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    pub fn reset_composite(&mut self) {
        self.composite = CompositeMode::SourceOver;
    }

    /// Drops any current path and starts a new one at `at`.
    pub fn begin_path(&mut self, style: StrokeStyle, at: Pos2) {
        self.path = Some(StrokePath {
            style,
            points: vec![at],
            stroked_upto: 1,
        });
    }

    pub fn line_to(&mut self, to: Pos2) {
        if let Some(path) = &mut self.path {
            path.points.push(to);
        }
    }

    /// Paints the segments added since the last `stroke` call.
    pub fn stroke(&mut self, surface: &mut Surface) {
        let composite = self.composite;
        let Some(path) = &mut self.path else {
            return;
        };
        for i in path.stroked_upto.max(1)..path.points.len() {
            let from = path.points[i - 1];
            let to = path.points[i];
            paint_segment(surface, from, to, &path.style, composite);
        }
        path.stroked_upto = path.points.len();
    }

    pub fn end_path(&mut self) {
        self.path = None;
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    pub fn current_style(&self) -> Option<StrokeStyle> {
        self.path.as_ref().map(|path| path.style)
    }
}

/// Paints a round-capped segment: every pixel whose center lies within half the
/// line width of the segment.
fn paint_segment(surface: &mut Surface, from: Pos2, to: Pos2, style: &StrokeStyle, composite: CompositeMode) {
    let radius = (style.width / 2.0).max(0.5);
    let (ax, ay) = (from.x as f64, from.y as f64);
    let (bx, by) = (to.x as f64, to.y as f64);

    let (width, height) = (surface.width() as i64, surface.height() as i64);
    let min_x = ((ax.min(bx) - radius).floor() as i64).max(0);
    let max_x = ((ax.max(bx) + radius).ceil() as i64).min(width - 1);
    let min_y = ((ay.min(by) - radius).floor() as i64).max(0);
    let max_y = ((ay.max(by) + radius).ceil() as i64).min(height - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let (dx, dy) = (bx - ax, by - ay);
    let length_sq = dx * dx + dy * dy;
    let radius_sq = radius * radius;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let t = if length_sq > 0.0 {
                (((px - ax) * dx + (py - ay) * dy) / length_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (cx, cy) = (ax + t * dx - px, ay + t * dy - py);
            if cx * cx + cy * cy <= radius_sq {
                blend_pixel(surface.get_pixel_mut(x as u32, y as u32), style.color, composite);
            }
        }
    }
}

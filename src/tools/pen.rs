use crate::input::PointerSample;
use crate::surface::{CompositeMode, Surface};

use super::{BrushSettings, BrushStroke, Tool, ToolResponse};

/// Paints pressure-sensitive strokes in the brush color.
#[derive(Debug, Clone)]
pub struct PenTool {
    stroke: BrushStroke,
}

impl Default for PenTool {
    fn default() -> Self {
        Self {
            stroke: BrushStroke::new(CompositeMode::SourceOver),
        }
    }
}

impl PenTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PenTool {
    fn name(&self) -> &'static str {
        "Pen"
    }

    fn activate(&mut self) {
        self.stroke.set_composite(CompositeMode::SourceOver);
    }

    fn deactivate(&mut self) {
        self.stroke.end();
    }

    fn is_drawing(&self) -> bool {
        self.stroke.is_drawing()
    }

    fn on_pointer_down(&mut self, sample: &PointerSample, brush: &BrushSettings) -> ToolResponse {
        if !sample.is_primary() {
            return ToolResponse::Ignored;
        }
        self.stroke.begin(sample, brush.color, brush);
        ToolResponse::StrokeStarted
    }

    fn on_pointer_move(&mut self, sample: &PointerSample, surface: &mut Surface, brush: &BrushSettings) -> ToolResponse {
        if self.stroke.extend(sample, surface, brush) {
            ToolResponse::Painted
        } else {
            ToolResponse::Ignored
        }
    }

    fn on_pointer_up(&mut self, sample: &PointerSample) -> ToolResponse {
        if sample.is_primary() && self.stroke.end() {
            ToolResponse::StrokeFinished
        } else {
            ToolResponse::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface;
    use egui::{PointerButton, Pos2};
    use image::Rgba;

    #[test]
    fn test_pen_paints_brush_color() {
        let mut surface = surface::allocate(10, 10).unwrap();
        let brush = BrushSettings {
            color: Rgba([0, 0, 255, 255]),
            size: 3.0,
            ..Default::default()
        };
        let mut pen = PenTool::new();

        let start = PointerSample::mouse(Pos2::new(1.5, 5.5));
        assert_eq!(pen.on_pointer_down(&start, &brush), ToolResponse::StrokeStarted);
        let end = PointerSample::mouse(Pos2::new(8.5, 5.5));
        assert_eq!(pen.on_pointer_move(&end, &mut surface, &brush), ToolResponse::Painted);
        assert_eq!(pen.on_pointer_up(&end), ToolResponse::StrokeFinished);

        assert_eq!(*surface.get_pixel(5, 5), Rgba([0, 0, 255, 255]));
        assert!(!pen.is_drawing());
    }

    #[test]
    fn test_secondary_button_is_ignored() {
        let mut pen = PenTool::new();
        let sample = PointerSample::mouse(Pos2::ZERO).with_button(PointerButton::Secondary);
        assert_eq!(pen.on_pointer_down(&sample, &BrushSettings::default()), ToolResponse::Ignored);
        assert!(!pen.is_drawing());
    }
}

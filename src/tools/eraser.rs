use image::Rgba;

use crate::input::PointerSample;
use crate::surface::{CompositeMode, Surface};

use super::{BrushSettings, BrushStroke, Tool, ToolResponse};

/// Any opaque color erases fully under `DestinationOut`.
const ERASE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Removes paint along pressure-sensitive strokes.
#[derive(Debug, Clone)]
pub struct EraserTool {
    stroke: BrushStroke,
}

impl Default for EraserTool {
    fn default() -> Self {
        Self {
            stroke: BrushStroke::new(CompositeMode::DestinationOut),
        }
    }
}

impl EraserTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn composite(&self) -> CompositeMode {
        self.stroke.composite()
    }
}

impl Tool for EraserTool {
    fn name(&self) -> &'static str {
        "Eraser"
    }

    fn activate(&mut self) {
        self.stroke.set_composite(CompositeMode::DestinationOut);
    }

    fn deactivate(&mut self) {
        self.stroke.end();
        self.stroke.reset_composite();
    }

    fn is_drawing(&self) -> bool {
        self.stroke.is_drawing()
    }

    fn on_pointer_down(&mut self, sample: &PointerSample, brush: &BrushSettings) -> ToolResponse {
        if !sample.is_primary() {
            return ToolResponse::Ignored;
        }
        self.stroke.begin(sample, ERASE_COLOR, brush);
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

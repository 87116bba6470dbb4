use crate::input::PointerSample;
use crate::surface::Surface;

use super::{BrushSettings, Tool, ToolResponse};

/// Fills the clicked region with the brush color.
///
/// The tool only turns a click into a fill request; whoever owns the layer
/// decides whether to fill in place or on a worker.
#[derive(Debug, Clone, Default)]
pub struct FillBucketTool;

impl FillBucketTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for FillBucketTool {
    fn name(&self) -> &'static str {
        "Fill"
    }

    fn deactivate(&mut self) {}

    fn is_drawing(&self) -> bool {
        false
    }

    fn on_pointer_down(&mut self, sample: &PointerSample, brush: &BrushSettings) -> ToolResponse {
        if !sample.is_primary() {
            return ToolResponse::Ignored;
        }
        match sample.pixel() {
            Some((x, y)) => ToolResponse::FillRequested {
                x,
                y,
                color: brush.color,
            },
            None => ToolResponse::Ignored,
        }
    }

    fn on_pointer_move(&mut self, _sample: &PointerSample, _surface: &mut Surface, _brush: &BrushSettings) -> ToolResponse {
        ToolResponse::Ignored
    }

    fn on_pointer_up(&mut self, _sample: &PointerSample) -> ToolResponse {
        ToolResponse::Ignored
    }
}

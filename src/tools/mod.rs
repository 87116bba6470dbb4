use image::Rgba;

use crate::input::PointerSample;
use crate::surface::Surface;

/// What the engine should do after handing a pointer sample to a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolResponse {
    /// The sample did not concern the tool
    Ignored,
    /// A stroke began; the layer should be snapshotted before it is painted
    StrokeStarted,
    /// New segments were painted onto the surface
    Painted,
    /// The stroke ended and can be recorded in history
    StrokeFinished,
    /// Fill the region around (`x`, `y`) with `color`
    FillRequested { x: u32, y: u32, color: Rgba<u8> },
}

/// Tool trait defines the interface for all painting tools
pub trait Tool {
    /// Return the name of the tool
    fn name(&self) -> &'static str;

    /// Called when the tool is selected.
    fn activate(&mut self) {
        // default: do nothing
    }

    /// Called when the tool is deselected. Must end any stroke in progress
    /// and restore the default composite mode.
    fn deactivate(&mut self);

    /// Whether a stroke is in progress
    fn is_drawing(&self) -> bool;

    /// Handle pointer press. Nothing is painted yet.
    fn on_pointer_down(&mut self, sample: &PointerSample, brush: &BrushSettings) -> ToolResponse;

    /// Handle pointer movement while a stroke is in progress.
    fn on_pointer_move(&mut self, sample: &PointerSample, surface: &mut Surface, brush: &BrushSettings) -> ToolResponse;

    /// Handle pointer release.
    fn on_pointer_up(&mut self, sample: &PointerSample) -> ToolResponse;
}

mod brush;
pub use brush::{BrushSettings, BrushStroke};

mod eraser;
pub use eraser::EraserTool;

mod fill_bucket;
pub use fill_bucket::FillBucketTool;

mod pen;
pub use pen::PenTool;

/// Enum representing all available tool types
/// This allows us to avoid using Box<dyn Tool> and simplifies memory management
#[derive(Debug, Clone)]
pub enum ToolType {
    Pen(PenTool),
    Eraser(EraserTool),
    Fill(FillBucketTool),
}

impl Default for ToolType {
    fn default() -> Self {
        Self::Pen(PenTool::new())
    }
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        match self {
            Self::Pen(tool) => tool.name(),
            Self::Eraser(tool) => tool.name(),
            Self::Fill(tool) => tool.name(),
        }
    }

    fn activate(&mut self) {
        match self {
            Self::Pen(tool) => tool.activate(),
            Self::Eraser(tool) => tool.activate(),
            Self::Fill(tool) => tool.activate(),
        }
    }

    fn deactivate(&mut self) {
        match self {
            Self::Pen(tool) => tool.deactivate(),
            Self::Eraser(tool) => tool.deactivate(),
            Self::Fill(tool) => tool.deactivate(),
        }
    }

    fn is_drawing(&self) -> bool {
        match self {
            Self::Pen(tool) => tool.is_drawing(),
            Self::Eraser(tool) => tool.is_drawing(),
            Self::Fill(tool) => tool.is_drawing(),
        }
    }

    fn on_pointer_down(&mut self, sample: &PointerSample, brush: &BrushSettings) -> ToolResponse {
        match self {
            Self::Pen(tool) => tool.on_pointer_down(sample, brush),
            Self::Eraser(tool) => tool.on_pointer_down(sample, brush),
            Self::Fill(tool) => tool.on_pointer_down(sample, brush),
        }
    }

    fn on_pointer_move(&mut self, sample: &PointerSample, surface: &mut Surface, brush: &BrushSettings) -> ToolResponse {
        match self {
            Self::Pen(tool) => tool.on_pointer_move(sample, surface, brush),
            Self::Eraser(tool) => tool.on_pointer_move(sample, surface, brush),
            Self::Fill(tool) => tool.on_pointer_move(sample, surface, brush),
        }
    }

    fn on_pointer_up(&mut self, sample: &PointerSample) -> ToolResponse {
        match self {
            Self::Pen(tool) => tool.on_pointer_up(sample),
            Self::Eraser(tool) => tool.on_pointer_up(sample),
            Self::Fill(tool) => tool.on_pointer_up(sample),
        }
    }
}

// Factory function to create a new tool of the specified type
pub fn new_tool(tool_type: &str) -> Option<ToolType> {
    match tool_type {
        "Pen" => Some(ToolType::Pen(PenTool::new())),
        "Eraser" => Some(ToolType::Eraser(EraserTool::new())),
        "Fill" => Some(ToolType::Fill(FillBucketTool::new())),
        _ => None,
    }
}

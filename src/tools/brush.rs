use egui::Pos2;
use image::Rgba;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::input::PointerSample;
use crate::pressure::{self, PressureState};
use crate::stroke::{StrokeRenderer, StrokeStyle};
use crate::surface::{self, CompositeMode, Surface};

/// Color and size picked in the toolbar, plus the pressure tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub color: Rgba<u8>,
    /// Line width at full pressure
    pub size: f64,
    pub max_pressure_step: f64,
    pub pressure_change_threshold: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, 255]),
            size: 5.0,
            max_pressure_step: pressure::DEFAULT_MAX_STEP,
            pressure_change_threshold: pressure::DEFAULT_CHANGE_THRESHOLD,
        }
    }
}

impl BrushSettings {
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        Ok(Self {
            color: surface::parse_hex_color(&config.default_color)?,
            size: config.default_brush_size,
            max_pressure_step: config.pressure_max_step,
            pressure_change_threshold: config.pressure_change_threshold,
        })
    }
}

/// One pressure-sensitive stroke from pointer down to pointer up.
///
/// Pen and eraser share this; they only differ in composite mode.
#[derive(Debug, Clone)]
pub struct BrushStroke {
    renderer: StrokeRenderer,
    pressure: PressureState,
    /// Set while a stroke is in progress
    last_point: Option<Pos2>,
}

impl BrushStroke {
    pub fn new(composite: CompositeMode) -> Self {
        let mut renderer = StrokeRenderer::new();
        renderer.set_composite(composite);
        Self {
            renderer,
            pressure: PressureState::default(),
            last_point: None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.last_point.is_some()
    }

    pub fn composite(&self) -> CompositeMode {
        self.renderer.composite()
    }

    pub fn set_composite(&mut self, mode: CompositeMode) {
        self.renderer.set_composite(mode);
    }

    pub fn reset_composite(&mut self) {
        self.renderer.reset_composite();
    }

    /// Width of the path currently being drawn
    pub fn current_width(&self) -> Option<f64> {
        self.renderer.current_style().map(|style| style.width)
    }

    /// Starts a path at the sample. Nothing is painted until the pointer moves.
    pub fn begin(&mut self, sample: &PointerSample, color: Rgba<u8>, brush: &BrushSettings) {
        self.pressure = PressureState::new(brush.max_pressure_step);
        let pressure = self.pressure.begin(sample.resolved_pressure());
        let style = StrokeStyle {
            color,
            width: pressure::line_width(pressure, brush.size),
        };
        self.renderer.begin_path(style, sample.position);
        self.last_point = Some(sample.position);
    }

    /// Extends the stroke to the sample and paints the new segment.
    ///
    /// A significant pressure change closes the current path at the sample
    /// and restarts it from the previous point with the new width.
    pub fn extend(&mut self, sample: &PointerSample, surface: &mut Surface, brush: &BrushSettings) -> bool {
        let Some(last_point) = self.last_point else {
            return false;
        };
        let Some(style) = self.renderer.current_style() else {
            return false;
        };

        let raw = sample.resolved_pressure();
        if let Some(pressure) = self.pressure.advance(raw, brush.pressure_change_threshold) {
            self.renderer.line_to(sample.position);
            self.renderer.stroke(surface);
            let style = StrokeStyle {
                width: pressure::line_width(pressure, brush.size),
                ..style
            };
            self.renderer.begin_path(style, last_point);
        }

        self.renderer.line_to(sample.position);
        self.renderer.stroke(surface);
        self.last_point = Some(sample.position);
        true
    }

    /// Stops accepting samples. Returns whether a stroke was in progress.
    pub fn end(&mut self) -> bool {
        let was_drawing = self.last_point.take().is_some();
        self.renderer.end_path();
        self.pressure.reset();
        was_drawing
    }
}

use egui::{PointerButton, Pos2};

use crate::pressure::PointerKind;

/// One pointer event in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Pos2,
    pub button: PointerButton,
    /// Raw device pressure, if the device reports one
    pub pressure: Option<f64>,
    pub kind: PointerKind,
}

impl PointerSample {
    /// A primary-button mouse sample without pressure
    pub fn mouse(position: Pos2) -> Self {
        Self {
            position,
            button: PointerButton::Primary,
            pressure: None,
            kind: PointerKind::Mouse,
        }
    }

    pub fn pen(position: Pos2, pressure: f64) -> Self {
        Self {
            position,
            button: PointerButton::Primary,
            pressure: Some(pressure),
            kind: PointerKind::Pen,
        }
    }

    pub fn touch(position: Pos2) -> Self {
        Self {
            kind: PointerKind::Touch,
            ..Self::mouse(position)
        }
    }

    pub fn with_button(self, button: PointerButton) -> Self {
        Self { button, ..self }
    }

    /// Tools only react to the primary button.
    pub fn is_primary(&self) -> bool {
        self.button == PointerButton::Primary
    }

    /// Pressure after device quirks are applied, before normalization
    pub fn resolved_pressure(&self) -> Option<f64> {
        self.kind.resolve_pressure(self.pressure)
    }

    /// Pixel under the pointer, or `None` left of or above the surface.
    pub fn pixel(&self) -> Option<(u32, u32)> {
        let (x, y) = (self.position.x.floor(), self.position.y.floor());
        if x < 0.0 || y < 0.0 || !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some((x as u32, y as u32))
    }
}

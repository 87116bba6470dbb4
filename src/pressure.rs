//! Pressure handling shared by the stroke tools.
//!
//! Devices report pressure in `0..=1`, but the values are noisy, sometimes out
//! of range and sometimes missing. Everything here works in `f64` so the
//! results are reproducible bit for bit.

use serde::{Deserialize, Serialize};

pub const MIN_PRESSURE: f64 = 0.1;
pub const MAX_PRESSURE: f64 = 1.0;
pub const DEFAULT_MAX_STEP: f64 = 0.3;
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.05;

/// What kind of device produced a pointer sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    /// Applies device quirks before [`normalize`].
    ///
    /// A pen touching with zero force means "as light as possible", not
    /// "unknown". Mice and touch screens report a fixed 0.5 while a button is
    /// held, which carries no information.
    pub fn resolve_pressure(self, raw: Option<f64>) -> Option<f64> {
        match (self, raw) {
            (Self::Pen, Some(p)) if p == 0.0 => Some(MIN_PRESSURE),
            (Self::Mouse | Self::Touch, Some(p)) if p == 0.5 => None,
            _ => raw,
        }
    }
}

/// Maps raw input to `[0.1, 1.0]`. Missing, zero or non-finite input means full pressure.
pub fn normalize(raw: Option<f64>) -> f64 {
    let pressure = match raw {
        Some(p) if p != 0.0 && p.is_finite() => p,
        _ => MAX_PRESSURE,
    };
    pressure.clamp(MIN_PRESSURE, MAX_PRESSURE)
}

/// Limits the change from `last` to at most `max_step`.
pub fn smooth(current: f64, last: f64, max_step: f64) -> f64 {
    let diff = current - last;
    if diff.abs() > max_step {
        if diff > 0.0 { last + max_step } else { last - max_step }
    } else {
        current
    }
}

/// Maps pressure `0.1..=1.0` linearly onto `1..=brush_size` pixels.
pub fn line_width(pressure: f64, brush_size: f64) -> f64 {
    if brush_size <= 1.0 {
        return 1.0;
    }
    let normalized = (pressure - MIN_PRESSURE) / (MAX_PRESSURE - MIN_PRESSURE);
    1.0 + normalized * (brush_size - 1.0)
}

/// Whether the width changed enough to start a new path segment.
pub fn significant_change(current: f64, last: f64, threshold: f64) -> bool {
    (current - last).abs() > threshold
}

/// Pressure carried between the samples of one stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureState {
    pub last_pressure: f64,
    max_step: f64,
}

impl Default for PressureState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEP)
    }
}

impl PressureState {
    pub fn new(max_step: f64) -> Self {
        Self {
            last_pressure: 0.0,
            max_step,
        }
    }

    /// First sample of a stroke: normalized, never smoothed.
    pub fn begin(&mut self, raw: Option<f64>) -> f64 {
        self.last_pressure = normalize(raw);
        self.last_pressure
    }

    /// Normalizes and smooths a follow-up sample without committing it.
    pub fn smoothed(&self, raw: Option<f64>) -> f64 {
        smooth(normalize(raw), self.last_pressure, self.max_step)
    }

    /// Follow-up sample of a stroke. Returns the new pressure, and commits it,
    /// only when it moved more than `threshold` away from the last committed one.
    pub fn advance(&mut self, raw: Option<f64>, threshold: f64) -> Option<f64> {
        let pressure = self.smoothed(raw);
        if significant_change(pressure, self.last_pressure, threshold) {
            self.last_pressure = pressure;
            Some(pressure)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.last_pressure = 0.0;
    }
}

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Tunables for a [`crate::PaintEngine`].
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// let config = layer_paint::EngineConfig::from_json(r#"{ "max_history": 20 }"#).unwrap();
/// assert_eq!(config.max_history, 20);
/// assert_eq!(config.offload_threshold_pixels, 100_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old configs
pub struct EngineConfig {
    /// Maximum number of undoable actions
    pub max_history: usize,
    /// Ceiling on the bytes held by history payloads
    pub max_history_bytes: usize,
    /// Surfaces with at least this many pixels fill on a worker
    pub offload_threshold_pixels: u64,
    /// Largest pressure change accepted between two samples
    pub pressure_max_step: f64,
    /// Pressure change that forces a new path segment
    pub pressure_change_threshold: f64,
    pub default_brush_size: f64,
    /// `#rrggbb`
    pub default_color: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            max_history_bytes: 256 * 1024 * 1024,
            offload_threshold_pixels: 100_000,
            pressure_max_step: crate::pressure::DEFAULT_MAX_STEP,
            pressure_change_threshold: crate::pressure::DEFAULT_CHANGE_THRESHOLD,
            default_brush_size: 5.0,
            default_color: "#000000".to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

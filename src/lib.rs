#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fill;
pub mod history;
pub mod id_generator;
pub mod input;
pub mod layer;
pub mod pressure;
pub mod renderer;
pub mod stroke;
pub mod surface;
pub mod tools;
pub mod util;

pub use config::EngineConfig;
pub use engine::{FillOutcome, PaintEngine};
pub use error::{EngineError, EngineResult};
pub use event::{EngineEvent, EventBus, EventHandler};
pub use history::{HistoryAction, HistoryManager, HistoryStatus};
pub use input::PointerSample;
pub use layer::{Layer, LayerId, LayerInfo, LayerManager, LayerMove, LayerSnapshot};
pub use pressure::PointerKind;
pub use renderer::Compositor;
pub use surface::Surface;
pub use tools::{BrushSettings, Tool, ToolType};

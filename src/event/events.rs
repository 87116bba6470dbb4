use crate::history::HistoryStatus;
use crate::layer::{LayerId, LayerInfo};

/// Notifications for whoever draws the UI around the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The layer list changed: added, removed, renamed, reordered or toggled.
    /// Carries the full list, bottom to top.
    LayersChanged(Vec<LayerInfo>),
    ActiveLayerChanged(Option<LayerId>),
    HistoryChanged(HistoryStatus),
    /// Layer pixels changed and the canvas should be recomposited
    RedrawRequested,
}

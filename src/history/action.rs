use crate::layer::{LayerId, LayerSnapshot};

use super::codec::CompressedPixels;

/// One reversible edit. Once recorded, an action is never modified.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Pixels of a layer changed through painting or filling
    Stroke {
        layer_id: LayerId,
        before: CompressedPixels,
        after: CompressedPixels,
        size: [u32; 2],
    },
    /// A layer was wiped
    ClearLayer {
        layer_id: LayerId,
        before: CompressedPixels,
        after: CompressedPixels,
        size: [u32; 2],
    },
    AddLayer {
        layer_id: LayerId,
        name: String,
        index: usize,
        size: [u32; 2],
    },
    DeleteLayer {
        snapshot: LayerSnapshot,
        index: usize,
    },
    ToggleVisibility {
        layer_id: LayerId,
        visible_before: bool,
    },
    ReorderLayer {
        layer_id: LayerId,
        old_visual_index: usize,
        new_visual_index: usize,
    },
    RenameLayer {
        layer_id: LayerId,
        old_name: String,
        new_name: String,
    },
}

impl HistoryAction {
    /// The layer the action is about
    pub fn layer_id(&self) -> LayerId {
        match self {
            Self::Stroke { layer_id, .. }
            | Self::ClearLayer { layer_id, .. }
            | Self::AddLayer { layer_id, .. }
            | Self::ToggleVisibility { layer_id, .. }
            | Self::ReorderLayer { layer_id, .. }
            | Self::RenameLayer { layer_id, .. } => *layer_id,
            Self::DeleteLayer { snapshot, .. } => snapshot.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stroke { .. } => "stroke",
            Self::ClearLayer { .. } => "clear layer",
            Self::AddLayer { .. } => "add layer",
            Self::DeleteLayer { .. } => "delete layer",
            Self::ToggleVisibility { .. } => "toggle visibility",
            Self::ReorderLayer { .. } => "reorder layer",
            Self::RenameLayer { .. } => "rename layer",
        }
    }

    /// Heap bytes held by the action, used to bound history memory.
    pub fn payload_bytes(&self) -> usize {
        match self {
            Self::Stroke { before, after, .. } | Self::ClearLayer { before, after, .. } => {
                before.byte_len() + after.byte_len()
            }
            Self::AddLayer { name, .. } => name.len(),
            Self::DeleteLayer { snapshot, .. } => snapshot.byte_len() + snapshot.name.len(),
            Self::ToggleVisibility { .. } | Self::ReorderLayer { .. } => 0,
            Self::RenameLayer { old_name, new_name, .. } => old_name.len() + new_name.len(),
        }
    }
}

use log::{error, warn};

use super::{HistoryAction, codec};
use crate::layer::{LayerId, LayerManager, LayerSnapshot};
use crate::surface;

/// Applies `action` to the layer stack, reversing it when `is_undo` is set.
///
/// Layers brought back by replay always match the stack's current size;
/// pixel diffs recorded at another size are cropped or extended from the
/// origin. Returns whether anything changed. Problems (a missing layer, an
/// undecodable diff) are logged and leave the stack untouched.
pub fn apply_action(layers: &mut LayerManager, action: &HistoryAction, is_undo: bool) -> bool {
    match action {
        HistoryAction::Stroke {
            layer_id,
            before,
            after,
            size,
        }
        | HistoryAction::ClearLayer {
            layer_id,
            before,
            after,
            size,
        } => {
            let pixels = if is_undo { before } else { after };
            restore_pixels(layers, *layer_id, pixels, *size)
        }

        HistoryAction::AddLayer { layer_id, name, index, .. } => {
            if is_undo {
                layers.delete_layer(*layer_id)
            } else {
                recreate_blank(layers, *layer_id, name, *index)
            }
        }

        HistoryAction::DeleteLayer { snapshot, index } => {
            let changed = if is_undo {
                match layers.add_layer_with_data(snapshot, Some(*index)) {
                    Ok(restored) => restored.is_some(),
                    Err(err) => {
                        error!("Failed to restore {}: {}", snapshot.id, err);
                        false
                    }
                }
            } else {
                layers.delete_layer(snapshot.id)
            };
            if changed {
                layers.mark_all_dirty();
            }
            changed
        }

        HistoryAction::ToggleVisibility {
            layer_id,
            visible_before,
        } => {
            let visible = if is_undo { *visible_before } else { !*visible_before };
            if !layers.set_visibility(*layer_id, visible) {
                warn!("Cannot replay visibility change: {} is gone", layer_id);
                return false;
            }
            true
        }

        HistoryAction::ReorderLayer {
            layer_id,
            old_visual_index,
            new_visual_index,
        } => {
            let target = if is_undo { *old_visual_index } else { *new_visual_index };
            if layers.reorder_layer(*layer_id, target).is_none() {
                return false;
            }
            layers.mark_all_dirty();
            true
        }

        HistoryAction::RenameLayer {
            layer_id,
            old_name,
            new_name,
        } => {
            if layers.find_layer(*layer_id).is_none() {
                warn!("Cannot replay rename: {} is gone", layer_id);
                return false;
            }
            let name = if is_undo { old_name } else { new_name };
            layers.rename_layer(*layer_id, name).is_some()
        }
    }
}

fn restore_pixels(
    layers: &mut LayerManager,
    layer_id: LayerId,
    pixels: &codec::CompressedPixels,
    [width, height]: [u32; 2],
) -> bool {
    if layers.find_layer(layer_id).is_none() {
        warn!("Cannot replay pixels: {} is gone", layer_id);
        return false;
    }
    let decoded = match codec::decompress(pixels, width, height) {
        Ok(decoded) => decoded,
        Err(err) => {
            error!("Skipping replay on {}: {}", layer_id, err);
            return false;
        }
    };
    match layers.surface_mut(layer_id) {
        Some(target) => {
            surface::replace_contents(target, &decoded);
            true
        }
        None => false,
    }
}

/// The layer comes back at the current document size, which may differ from
/// the size it was first added at.
fn recreate_blank(layers: &mut LayerManager, id: LayerId, name: &str, index: usize) -> bool {
    let [width, height] = layers.size();
    let surface = match surface::allocate(width, height) {
        Ok(surface) => surface,
        Err(err) => {
            error!("Cannot recreate {}: {}", id, err);
            return false;
        }
    };
    let snapshot = LayerSnapshot {
        id,
        name: name.to_owned(),
        visible: true,
        surface,
    };
    match layers.add_layer_with_data(&snapshot, Some(index)) {
        Ok(Some(_)) => {
            layers.set_active_layer(id);
            true
        }
        Ok(None) => false,
        Err(err) => {
            error!("Cannot recreate {}: {}", id, err);
            false
        }
    }
}

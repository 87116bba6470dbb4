use std::collections::HashMap;

use log::{debug, warn};

use super::{Layer, LayerId, LayerMove, LayerSnapshot};
use crate::error::EngineResult;
use crate::id_generator::IdGenerator;
use crate::surface::{self, Surface};

/// Owns every layer of a document and keeps the stack consistent.
///
/// After any structural change the z-indices are exactly `0..len()` and there
/// is always at least one layer. Layers brought back from snapshots are
/// fitted to the current document size.
#[derive(Debug)]
pub struct LayerManager {
    layers: HashMap<LayerId, Layer>,
    /// Bottom to top
    order: Vec<LayerId>,
    active: Option<LayerId>,
    ids: IdGenerator,
    /// Document size every surface is kept at
    size: [u32; 2],
    /// Last revision handed out
    revision: u64,
    /// Layers with an offloaded operation in flight, with the revision the
    /// operation started from
    pending: HashMap<LayerId, u64>,
}

impl LayerManager {
    /// Creates a manager holding a single "Background" layer.
    pub fn new(width: u32, height: u32) -> EngineResult<Self> {
        let mut manager = Self {
            layers: HashMap::new(),
            order: Vec::new(),
            active: None,
            ids: IdGenerator::new(),
            size: [width, height],
            revision: 0,
            pending: HashMap::new(),
        };
        manager.add_layer(Some("Background"), width, height)?;
        Ok(manager)
    }

    /// Inserts a blank layer directly above the active layer (or on top when
    /// nothing is active) and makes it active.
    pub fn add_layer(&mut self, name: Option<&str>, width: u32, height: u32) -> EngineResult<&Layer> {
        let surface = surface::allocate(width, height)?;
        let insert_at = self
            .active
            .and_then(|id| self.find_layer_index(id))
            .map_or(self.order.len(), |index| index + 1);

        let id = self.ids.next_id();
        let revision = self.next_revision();
        let name = name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Layer {}", self.order.len() + 1));
        debug!("Adding {} ({:?}) at z-index {}", id, name, insert_at);

        self.order.insert(insert_at, id);
        self.layers.insert(id, Layer::new(id, name, surface, insert_at, revision));
        self.renumber();
        self.active = Some(id);
        Ok(&self.layers[&id])
    }

    /// Removes a layer. The last remaining layer can never be deleted.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.order.len() <= 1 {
            warn!("Cannot delete the last layer");
            return false;
        }
        let Some(index) = self.find_layer_index(id) else {
            warn!("Cannot delete unknown {}", id);
            return false;
        };

        self.order.remove(index);
        self.layers.remove(&id);
        self.pending.remove(&id);
        self.renumber();
        if self.active == Some(id) {
            self.active = self.order.last().copied();
        }
        debug!("Deleted {}", id);
        true
    }

    /// Brings a layer back from a snapshot, keeping its id.
    ///
    /// Returns `Ok(None)` if a layer with that id already exists. The pixels
    /// are copied, the snapshot stays untouched. A snapshot taken at another
    /// document size is cropped or extended from the origin.
    pub fn add_layer_with_data(
        &mut self,
        snapshot: &LayerSnapshot,
        index: Option<usize>,
    ) -> EngineResult<Option<&Layer>> {
        if self.layers.contains_key(&snapshot.id) {
            warn!("Cannot restore {}: a layer with that id exists", snapshot.id);
            return Ok(None);
        }
        let [width, height] = self.size;
        let surface = if snapshot.surface.dimensions() == (width, height) {
            surface::duplicate(&snapshot.surface)?
        } else {
            debug!("Fitting {} to {}x{}", snapshot.id, width, height);
            surface::resized(&snapshot.surface, width, height)?
        };
        let insert_at = match index {
            Some(index) if index <= self.order.len() => index,
            _ => self.order.len(),
        };

        self.ids.observe(snapshot.id);
        let revision = self.next_revision();
        let mut layer = Layer::new(snapshot.id, snapshot.name.clone(), surface, insert_at, revision);
        layer.visible = snapshot.visible;
        self.order.insert(insert_at, snapshot.id);
        self.layers.insert(snapshot.id, layer);
        self.renumber();
        if self.active.is_none() {
            self.active = Some(snapshot.id);
        }
        debug!("Restored {} at z-index {}", snapshot.id, insert_at);
        Ok(self.layers.get(&snapshot.id))
    }

    /// Deep copy of a layer, for history.
    pub fn snapshot(&self, id: LayerId) -> Option<LayerSnapshot> {
        self.layers.get(&id).map(|layer| LayerSnapshot {
            id,
            name: layer.name.clone(),
            visible: layer.visible,
            surface: layer.surface.clone(),
        })
    }

    /// Selects the active layer. Unknown ids are ignored.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if self.layers.contains_key(&id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.and_then(|id| self.layers.get(&id))
    }

    pub fn active_layer_id(&self) -> Option<LayerId> {
        self.active
    }

    /// All layers, bottom to top.
    pub fn layers(&self) -> Vec<&Layer> {
        self.order.iter().map(|id| &self.layers[id]).collect()
    }

    pub fn find_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Visual index (equal to the z-index) of a layer
    pub fn find_layer_index(&self, id: LayerId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Flips visibility, returning the previous value.
    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<bool> {
        let Some(layer) = self.layers.get_mut(&id) else {
            warn!("Cannot toggle visibility of unknown {}", id);
            return None;
        };
        let before = layer.visible;
        layer.visible = !before;
        layer.touch();
        Some(before)
    }

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> bool {
        match self.layers.get_mut(&id) {
            Some(layer) => {
                layer.visible = visible;
                layer.touch();
                true
            }
            None => false,
        }
    }

    /// Renames a layer, returning the old name. Unknown ids and unchanged
    /// names give `None`.
    pub fn rename_layer(&mut self, id: LayerId, new_name: &str) -> Option<String> {
        let Some(layer) = self.layers.get_mut(&id) else {
            warn!("Cannot rename unknown {}", id);
            return None;
        };
        if layer.name == new_name {
            return None;
        }
        Some(std::mem::replace(&mut layer.name, new_name.to_owned()))
    }

    /// Moves a layer to `new_visual_index` (clamped to the top) and renumbers
    /// the stack.
    pub fn reorder_layer(&mut self, id: LayerId, new_visual_index: usize) -> Option<LayerMove> {
        let Some(old_visual_index) = self.find_layer_index(id) else {
            warn!("Cannot reorder unknown {}", id);
            return None;
        };
        let new_visual_index = new_visual_index.min(self.order.len() - 1);

        let moved = self.order.remove(old_visual_index);
        self.order.insert(new_visual_index, moved);
        self.renumber();
        Some(LayerMove {
            old_visual_index,
            new_visual_index,
        })
    }

    /// Reallocates every surface, keeping content anchored at the origin.
    ///
    /// Either every layer is resized or, on allocation failure, none is.
    pub fn resize_all(&mut self, width: u32, height: u32) -> EngineResult<()> {
        let resized = self
            .order
            .iter()
            .map(|id| surface::resized(&self.layers[id].surface, width, height).map(|s| (*id, s)))
            .collect::<EngineResult<Vec<_>>>()?;
        for (id, surface) in resized {
            if let Some(target) = self.surface_mut(id) {
                *target = surface;
            }
        }
        self.size = [width, height];
        debug!("Resized {} layers to {}x{}", self.order.len(), width, height);
        Ok(())
    }

    /// Document size every layer surface has
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn surface(&self, id: LayerId) -> Option<&Surface> {
        self.layers.get(&id).map(|layer| &layer.surface)
    }

    /// Mutable pixels of a layer. Borrowing them marks the layer dirty and
    /// gives it a fresh revision.
    pub fn surface_mut(&mut self, id: LayerId) -> Option<&mut Surface> {
        if !self.layers.contains_key(&id) {
            return None;
        }
        let revision = self.next_revision();
        self.layers.get_mut(&id).map(|layer| layer.surface_mut(revision))
    }

    pub fn mark_dirty(&mut self, id: LayerId) -> bool {
        match self.layers.get_mut(&id) {
            Some(layer) => {
                layer.touch();
                true
            }
            None => false,
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for layer in self.layers.values_mut() {
            layer.touch();
        }
    }

    /// Dirty layers, bottom to top.
    pub fn dirty_layers(&self) -> Vec<LayerId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.layers[id].dirty)
            .collect()
    }

    pub fn clear_dirty_flags(&mut self) {
        for layer in self.layers.values_mut() {
            layer.dirty = false;
        }
    }

    /// Flags a layer as having an operation in flight and returns the
    /// revision it starts from. `None` if the layer is unknown or already
    /// flagged.
    pub fn begin_pending(&mut self, id: LayerId) -> Option<u64> {
        let revision = self.layers.get(&id)?.revision;
        if self.pending.contains_key(&id) {
            return None;
        }
        self.pending.insert(id, revision);
        Some(revision)
    }

    /// Clears the flag set by the operation that started at `revision`.
    /// Flags owned by a later operation are left alone.
    pub fn end_pending(&mut self, id: LayerId, revision: u64) -> bool {
        if self.pending.get(&id) != Some(&revision) {
            return false;
        }
        self.pending.remove(&id);
        true
    }

    pub fn is_pending(&self, id: LayerId) -> bool {
        self.pending.contains_key(&id)
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn renumber(&mut self) {
        for (z_index, id) in self.order.iter().enumerate() {
            if let Some(layer) = self.layers.get_mut(id) {
                layer.z_index = z_index;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const W: u32 = 8;
    const H: u32 = 6;

    fn manager() -> LayerManager {
        LayerManager::new(W, H).unwrap()
    }

    fn add(manager: &mut LayerManager, name: &str) -> LayerId {
        manager.add_layer(Some(name), W, H).unwrap().id()
    }

    fn names(manager: &LayerManager) -> Vec<String> {
        manager.layers().iter().map(|l| l.name().to_owned()).collect()
    }

    fn assert_contiguous(manager: &LayerManager) {
        for (index, layer) in manager.layers().iter().enumerate() {
            assert_eq!(layer.z_index(), index);
        }
    }

    #[test]
    fn test_starts_with_background() {
        let manager = manager();
        assert_eq!(names(&manager), ["Background"]);
        let background = manager.layers()[0];
        assert_eq!(background.z_index(), 0);
        assert_eq!(manager.active_layer_id(), Some(background.id()));
        assert_eq!(background.size(), [W, H]);
    }

    #[test]
    fn test_add_layer_goes_above_active() {
        let mut manager = manager();
        let background = manager.layers()[0].id();
        let layer1 = add(&mut manager, "Layer 1");
        assert_eq!(manager.find_layer(layer1).unwrap().z_index(), 1);

        manager.set_active_layer(background);
        let layer2 = add(&mut manager, "Layer 2");

        assert_eq!(manager.find_layer(background).unwrap().z_index(), 0);
        assert_eq!(manager.find_layer(layer2).unwrap().z_index(), 1);
        assert_eq!(manager.find_layer(layer1).unwrap().z_index(), 2);
        assert_eq!(manager.active_layer_id(), Some(layer2));
        assert_contiguous(&manager);
    }

    #[test]
    fn test_add_layer_in_the_middle_of_a_stack() {
        let mut manager = manager();
        let layer1 = add(&mut manager, "Layer 1");
        add(&mut manager, "Layer 2");
        add(&mut manager, "Layer 3");
        manager.set_active_layer(layer1);
        add(&mut manager, "Layer 4");

        assert_eq!(
            names(&manager),
            ["Background", "Layer 1", "Layer 4", "Layer 2", "Layer 3"]
        );
        assert_contiguous(&manager);
    }

    #[test]
    fn test_default_names() {
        let mut manager = manager();
        let id = manager.add_layer(None, W, H).unwrap().id();
        assert_eq!(manager.find_layer(id).unwrap().name(), "Layer 2");
    }

    #[test]
    fn test_add_layer_allocation_failure() {
        let mut manager = manager();
        assert!(manager.add_layer(None, 0, H).is_err());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_unknown_active_layer_is_ignored() {
        let mut manager = manager();
        let before = manager.active_layer_id();
        assert!(!manager.set_active_layer(LayerId(999)));
        assert_eq!(manager.active_layer_id(), before);
    }

    #[test]
    fn test_cannot_delete_last_layer() {
        let mut manager = manager();
        let only = manager.layers()[0].id();
        assert!(!manager.delete_layer(only));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.layers()[0].id(), only);
    }

    #[test]
    fn test_delete_active_promotes_top() {
        let mut manager = manager();
        let layer1 = add(&mut manager, "Layer 1");
        let layer2 = add(&mut manager, "Layer 2");
        manager.set_active_layer(layer1);

        assert!(manager.delete_layer(layer1));
        assert_eq!(manager.active_layer_id(), Some(layer2));
        assert_eq!(names(&manager), ["Background", "Layer 2"]);
        assert_contiguous(&manager);
        assert!(!manager.delete_layer(layer1));
    }

    #[test]
    fn test_delete_inactive_keeps_selection() {
        let mut manager = manager();
        let background = manager.layers()[0].id();
        let layer1 = add(&mut manager, "Layer 1");
        assert!(manager.delete_layer(background));
        assert_eq!(manager.active_layer_id(), Some(layer1));
        assert_eq!(manager.find_layer(layer1).unwrap().z_index(), 0);
    }

    #[test]
    fn test_restore_snapshot() {
        let mut manager = manager();
        let layer1 = add(&mut manager, "Layer 1");
        add(&mut manager, "Layer 2");
        manager
            .surface_mut(layer1)
            .unwrap()
            .put_pixel(1, 1, Rgba([1, 2, 3, 255]));
        manager.toggle_visibility(layer1);

        let snapshot = manager.snapshot(layer1).unwrap();
        let index = manager.find_layer_index(layer1);
        assert!(manager.delete_layer(layer1));

        let restored = manager.add_layer_with_data(&snapshot, index).unwrap().unwrap();
        assert_eq!(restored.id(), layer1);
        assert_eq!(restored.z_index(), 1);
        assert!(!restored.is_visible());
        assert_eq!(*restored.surface().get_pixel(1, 1), Rgba([1, 2, 3, 255]));
        // Refused while the id is taken.
        assert!(manager.add_layer_with_data(&snapshot, index).unwrap().is_none());

        assert_eq!(names(&manager), ["Background", "Layer 1", "Layer 2"]);
        assert_contiguous(&manager);

        // The restored surface is a copy.
        manager.surface_mut(layer1).unwrap().put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        assert_eq!(*snapshot.surface.get_pixel(1, 1), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_restore_with_invalid_index_appends() {
        let mut manager = manager();
        let layer1 = add(&mut manager, "Layer 1");
        let snapshot = manager.snapshot(layer1).unwrap();
        manager.delete_layer(layer1);
        let restored = manager.add_layer_with_data(&snapshot, Some(42)).unwrap().unwrap();
        assert_eq!(restored.z_index(), 1);
    }

    #[test]
    fn test_restored_ids_are_not_reissued() {
        let mut manager = manager();
        let snapshot = LayerSnapshot {
            id: LayerId(40),
            name: "Imported".to_owned(),
            visible: true,
            surface: surface::allocate(W, H).unwrap(),
        };
        manager.add_layer_with_data(&snapshot, None).unwrap();
        let next = add(&mut manager, "Next");
        assert!(next > LayerId(40));
    }

    #[test]
    fn test_reorder_to_bottom() {
        let mut manager = manager();
        add(&mut manager, "A");
        let b = add(&mut manager, "B");
        add(&mut manager, "C");

        let change = manager.reorder_layer(b, 0).unwrap();
        assert_eq!(
            change,
            LayerMove {
                old_visual_index: 2,
                new_visual_index: 0
            }
        );
        assert_eq!(names(&manager), ["B", "Background", "A", "C"]);
        assert_contiguous(&manager);
    }

    #[test]
    fn test_reorder_same_position_and_unknown() {
        let mut manager = manager();
        let a = add(&mut manager, "A");
        let change = manager.reorder_layer(a, 1).unwrap();
        assert_eq!(change.old_visual_index, change.new_visual_index);
        assert_eq!(names(&manager), ["Background", "A"]);
        assert!(manager.reorder_layer(LayerId(77), 0).is_none());
    }

    #[test]
    fn test_reorder_clamps_to_top() {
        let mut manager = manager();
        let background = manager.layers()[0].id();
        add(&mut manager, "A");
        let change = manager.reorder_layer(background, 10).unwrap();
        assert_eq!(change.new_visual_index, 1);
        assert_eq!(names(&manager), ["A", "Background"]);
    }

    #[test]
    fn test_rename() {
        let mut manager = manager();
        let id = manager.layers()[0].id();
        assert_eq!(manager.rename_layer(id, "Paper"), Some("Background".to_owned()));
        assert_eq!(manager.rename_layer(id, "Paper"), None);
        assert_eq!(manager.rename_layer(LayerId(5), "Nope"), None);
        assert_eq!(names(&manager), ["Paper"]);
    }

    #[test]
    fn test_toggle_visibility() {
        let mut manager = manager();
        let id = manager.layers()[0].id();
        assert_eq!(manager.toggle_visibility(id), Some(true));
        assert!(!manager.find_layer(id).unwrap().is_visible());
        assert_eq!(manager.toggle_visibility(id), Some(false));
        assert_eq!(manager.toggle_visibility(LayerId(9)), None);
    }

    #[test]
    fn test_resize_all_preserves_content() {
        let mut manager = manager();
        let id = manager.layers()[0].id();
        manager
            .surface_mut(id)
            .unwrap()
            .put_pixel(2, 2, Rgba([9, 8, 7, 255]));
        manager.clear_dirty_flags();

        manager.resize_all(3, 3).unwrap();
        let surface = manager.surface(id).unwrap();
        assert_eq!(surface.dimensions(), (3, 3));
        assert_eq!(*surface.get_pixel(2, 2), Rgba([9, 8, 7, 255]));
        assert_eq!(manager.dirty_layers(), [id]);

        assert!(manager.resize_all(0, 3).is_err());
        assert_eq!(manager.surface(id).unwrap().dimensions(), (3, 3));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut manager = manager();
        let background = manager.layers()[0].id();
        let a = add(&mut manager, "A");
        assert_eq!(manager.dirty_layers(), [background, a]);

        manager.clear_dirty_flags();
        assert!(manager.dirty_layers().is_empty());

        let revision = manager.find_layer(a).unwrap().revision();
        manager.mark_dirty(a);
        assert_eq!(manager.dirty_layers(), [a]);
        assert_eq!(manager.find_layer(a).unwrap().revision(), revision);

        manager.surface_mut(a);
        let painted = manager.find_layer(a).unwrap().revision();
        assert!(painted > revision);

        let background_revision = manager.find_layer(background).unwrap().revision();
        manager.surface_mut(background);
        assert!(manager.find_layer(background).unwrap().revision() > painted);
        assert!(background_revision < painted);

        manager.mark_all_dirty();
        assert_eq!(manager.dirty_layers().len(), 2);
    }

    #[test]
    fn test_pending_flags() {
        let mut manager = manager();
        let a = add(&mut manager, "A");
        let started = manager.begin_pending(a).unwrap();
        assert_eq!(started, manager.find_layer(a).unwrap().revision());
        assert!(manager.begin_pending(a).is_none());
        assert!(manager.is_pending(a));
        assert!(!manager.end_pending(a, started + 1));
        assert!(manager.is_pending(a));
        assert!(manager.end_pending(a, started));
        assert!(!manager.is_pending(a));
        assert!(manager.begin_pending(LayerId(100)).is_none());

        manager.begin_pending(a);
        manager.delete_layer(a);
        assert!(!manager.is_pending(a));
    }

    #[test]
    fn test_restored_layer_gets_a_fresh_revision_and_pending_flag() {
        let mut manager = manager();
        let a = add(&mut manager, "A");
        let first = manager.begin_pending(a).unwrap();
        let snapshot = manager.snapshot(a).unwrap();
        manager.delete_layer(a);
        manager.add_layer_with_data(&snapshot, None).unwrap();

        assert_ne!(manager.find_layer(a).unwrap().revision(), first);
        let second = manager.begin_pending(a).unwrap();
        assert!(!manager.end_pending(a, first));
        assert!(manager.is_pending(a));
        assert!(manager.end_pending(a, second));
    }

    #[test]
    fn test_restore_fits_snapshot_to_document_size() {
        let mut manager = manager();
        let a = add(&mut manager, "A");
        manager.surface_mut(a).unwrap().put_pixel(1, 1, Rgba([5, 6, 7, 255]));
        let snapshot = manager.snapshot(a).unwrap();
        manager.delete_layer(a);

        manager.resize_all(W * 2, H * 2).unwrap();
        assert_eq!(manager.size(), [W * 2, H * 2]);
        let restored = manager.add_layer_with_data(&snapshot, None).unwrap().unwrap();
        assert_eq!(restored.size(), [W * 2, H * 2]);
        assert_eq!(*restored.surface().get_pixel(1, 1), Rgba([5, 6, 7, 255]));
        assert_eq!(snapshot.surface.dimensions(), (W, H));
    }
}

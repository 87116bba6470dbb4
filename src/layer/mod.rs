mod manager;

pub use manager::LayerManager;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::surface::Surface;
use crate::util::time;

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// One named, independently paintable surface in the document's stack.
///
/// Layers are owned by the [`LayerManager`]; everything else only sees them
/// through short-lived borrows.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    surface: Surface,
    visible: bool,
    z_index: usize,
    dirty: bool,
    last_modified: f64,
    /// Drawn from the manager's counter whenever the pixels change, so no two
    /// pixel states share a revision, even across delete and restore
    revision: u64,
}

impl Layer {
    fn new(id: LayerId, name: String, surface: Surface, z_index: usize, revision: u64) -> Self {
        Self {
            id,
            name,
            surface,
            visible: true,
            z_index,
            dirty: true,
            last_modified: time::now_secs(),
            revision,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Position in paint order, 0 is the bottom
    pub fn z_index(&self) -> usize {
        self.z_index
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_modified(&self) -> f64 {
        self.last_modified
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn size(&self) -> [u32; 2] {
        [self.surface.width(), self.surface.height()]
    }

    pub fn info(&self) -> LayerInfo {
        LayerInfo {
            id: self.id,
            name: self.name.clone(),
            visible: self.visible,
            z_index: self.z_index,
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.last_modified = time::now_secs();
    }

    fn surface_mut(&mut self, revision: u64) -> &mut Surface {
        self.touch();
        self.revision = revision;
        &mut self.surface
    }
}

/// A deep copy of a layer, kept by history to bring a deleted layer back.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub surface: Surface,
}

impl LayerSnapshot {
    /// Bytes held by the pixel copy
    pub fn byte_len(&self) -> usize {
        self.surface.as_raw().len()
    }
}

/// What a layer list in the UI needs to know about a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub z_index: usize,
}

/// Visual positions of a layer before and after a reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMove {
    pub old_visual_index: usize,
    pub new_visual_index: usize,
}

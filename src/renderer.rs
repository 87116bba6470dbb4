use egui::ColorImage;
use log::debug;

use crate::error::EngineResult;
use crate::layer::LayerManager;
use crate::surface::{self, Surface};

/// Flattens the visible layers for display, recompositing only when a layer
/// changed since the last frame.
#[derive(Debug, Default)]
pub struct Compositor {
    frame: Option<Surface>,
    /// Bumped on every recomposite, usable as a texture cache key
    version: u64,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the flattened document, rebuilding it if any layer is dirty or
    /// the document size changed. Clears the layers' dirty flags.
    pub fn render(&mut self, layers: &mut LayerManager, size: [u32; 2]) -> EngineResult<&Surface> {
        let [width, height] = size;
        let stale = self
            .frame
            .as_ref()
            .is_none_or(|frame| frame.dimensions() != (width, height) || !layers.dirty_layers().is_empty());

        let frame = match self.frame.take() {
            Some(frame) if !stale => frame,
            _ => {
                let frame = surface::composite(
                    layers.layers().into_iter().filter(|l| l.is_visible()).map(|l| l.surface()),
                    width,
                    height,
                )?;
                layers.clear_dirty_flags();
                self.version += 1;
                debug!("Recomposited frame {}", self.version);
                frame
            }
        };
        Ok(self.frame.insert(frame))
    }

    /// Like [`render`](Self::render), converted for `egui::Context::load_texture`.
    pub fn render_color_image(&mut self, layers: &mut LayerManager, size: [u32; 2]) -> EngineResult<ColorImage> {
        self.render(layers, size).map(surface::to_color_image)
    }

    /// Forces the next render to recomposite.
    pub fn invalidate(&mut self) {
        self.frame = None;
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

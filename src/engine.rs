use egui::ColorImage;
use image::Rgba;
use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, EventBus};
use crate::fill::{self, FillJob, FillResult, FillTask};
use crate::history::{self, CompressedPixels, HistoryAction, HistoryManager, HistoryStatus};
use crate::input::PointerSample;
use crate::layer::{Layer, LayerId, LayerInfo, LayerManager};
use crate::renderer::Compositor;
use crate::surface::{self, Surface};
use crate::tools::{BrushSettings, Tool, ToolResponse, ToolType};

/// A stroke between pointer down and pointer up
#[derive(Debug)]
struct ActiveStroke {
    layer_id: LayerId,
    before: CompressedPixels,
}

/// How a bucket fill went
#[derive(Debug)]
#[must_use]
pub enum FillOutcome {
    /// Seed outside the layer, or the region already has the fill color
    Unchanged,
    /// Filled in place and recorded in history
    Applied,
    /// Running on a worker. Await the task and pass the result to
    /// [`PaintEngine::finish_fill`].
    Pending(FillTask),
}

/// The layered painting engine an application embeds.
///
/// Owns the layer stack, the undo history and the current tool. Every
/// mutation is followed by the matching [`EngineEvent`]s on [`events`](Self::events).
#[derive(Debug)]
pub struct PaintEngine {
    config: EngineConfig,
    layers: LayerManager,
    history: HistoryManager,
    tool: ToolType,
    brush: BrushSettings,
    stroke: Option<ActiveStroke>,
    compositor: Compositor,
    events: EventBus,
}

impl PaintEngine {
    pub fn new(width: u32, height: u32) -> EngineResult<Self> {
        Self::with_config(width, height, EngineConfig::default())
    }

    pub fn with_config(width: u32, height: u32, config: EngineConfig) -> EngineResult<Self> {
        let brush = BrushSettings::from_config(&config)?;
        let layers = LayerManager::new(width, height)?;
        let history = HistoryManager::new(config.max_history, config.max_history_bytes);
        let mut tool = ToolType::default();
        tool.activate();
        info!("Created {}x{} document", width, height);
        Ok(Self {
            config,
            layers,
            history,
            tool,
            brush,
            stroke: None,
            compositor: Compositor::new(),
            events: EventBus::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Document size in pixels
    pub fn size(&self) -> [u32; 2] {
        self.layers.size()
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn tool(&self) -> &ToolType {
        &self.tool
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.active_layer()
    }

    pub fn layer_infos(&self) -> Vec<LayerInfo> {
        self.layers.layers().iter().map(|layer| layer.info()).collect()
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    // --- Tool settings ---

    /// Switches tools. A stroke in progress is finished and recorded first.
    pub fn set_tool(&mut self, mut tool: ToolType) {
        self.commit_stroke();
        self.tool.deactivate();
        tool.activate();
        debug!("Tool changed from {} to {}", self.tool.name(), tool.name());
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.brush.color = color;
    }

    /// Sets the brush color from `#rrggbb`.
    pub fn set_color_hex(&mut self, hex: &str) -> EngineResult<()> {
        self.brush.color = surface::parse_hex_color(hex)?;
        Ok(())
    }

    pub fn set_brush_size(&mut self, size: f64) {
        if size.is_finite() && size > 0.0 {
            self.brush.size = size;
        } else {
            warn!("Ignoring brush size {}", size);
        }
    }

    // --- Pointer input ---

    /// Routes a pointer press to the current tool.
    ///
    /// Returns a task when the press started an offloaded fill. Fails with
    /// [`EngineError::LayerBusy`] while the active layer has a fill in flight.
    pub fn pointer_down(&mut self, sample: &PointerSample) -> EngineResult<Option<FillTask>> {
        let layer_id = self.active_layer_id()?;
        if self.layers.is_pending(layer_id) {
            return Err(EngineError::LayerBusy(layer_id));
        }
        self.commit_stroke();

        match self.tool.on_pointer_down(sample, &self.brush) {
            ToolResponse::StrokeStarted => {
                let before = self.compress_layer(layer_id)?;
                self.stroke = Some(ActiveStroke { layer_id, before });
                Ok(None)
            }
            ToolResponse::FillRequested { x, y, color } => match self.fill_at(x, y, color)? {
                FillOutcome::Pending(task) => Ok(Some(task)),
                FillOutcome::Applied | FillOutcome::Unchanged => Ok(None),
            },
            ToolResponse::Ignored | ToolResponse::Painted | ToolResponse::StrokeFinished => Ok(None),
        }
    }

    /// Extends the current stroke. Returns whether anything was painted.
    pub fn pointer_move(&mut self, sample: &PointerSample) -> bool {
        let Some(layer_id) = self.stroke.as_ref().map(|stroke| stroke.layer_id) else {
            return false;
        };
        if !self.tool.is_drawing() {
            return false;
        }
        let Some(target) = self.layers.surface_mut(layer_id) else {
            return false;
        };
        let painted = self.tool.on_pointer_move(sample, target, &self.brush) == ToolResponse::Painted;
        if painted {
            self.events.emit(EngineEvent::RedrawRequested);
        }
        painted
    }

    /// Ends the current stroke. Returns whether it was recorded in history.
    pub fn pointer_up(&mut self, sample: &PointerSample) -> bool {
        match self.tool.on_pointer_up(sample) {
            ToolResponse::StrokeFinished => self.commit_stroke(),
            _ => false,
        }
    }

    /// Records the stroke in progress, if it changed any pixel.
    fn commit_stroke(&mut self) -> bool {
        if self.tool.is_drawing() {
            // Pointer never came up: end the tool's path here.
            self.tool.deactivate();
            self.tool.activate();
        }
        let Some(ActiveStroke { layer_id, before }) = self.stroke.take() else {
            return false;
        };
        let Some(current) = self.layers.surface(layer_id) else {
            warn!("Dropping stroke: {} is gone", layer_id);
            return false;
        };
        let after = history::compress(current);
        if after == before {
            debug!("Stroke on {} changed nothing", layer_id);
            return false;
        }
        let size = layer_size(current);
        self.history.add_history(HistoryAction::Stroke {
            layer_id,
            before,
            after,
            size,
        });
        self.emit_history();
        true
    }

    // --- Fill ---

    /// Bucket-fills the active layer at (`x`, `y`).
    ///
    /// Layers of at least `offload_threshold_pixels` pixels are filled on a
    /// worker; the layer stays busy until the result is handed back.
    pub fn fill_at(&mut self, x: u32, y: u32, color: Rgba<u8>) -> EngineResult<FillOutcome> {
        let layer_id = self.active_layer_id()?;
        if self.layers.is_pending(layer_id) {
            return Err(EngineError::LayerBusy(layer_id));
        }
        self.commit_stroke();

        let layer = self.layers.find_layer(layer_id).ok_or(EngineError::LayerNotFound(layer_id))?;
        let [width, height] = layer.size();
        if u64::from(width) * u64::from(height) >= self.config.offload_threshold_pixels {
            let pixels = surface::duplicate(layer.surface())?;
            let revision = self.layers.begin_pending(layer_id).ok_or(EngineError::LayerBusy(layer_id))?;
            let job = FillJob {
                layer_id,
                revision,
                pixels,
                x,
                y,
                color,
            };
            return match fill::spawn_fill(job) {
                Ok(task) => Ok(FillOutcome::Pending(task)),
                Err(err) => {
                    self.layers.end_pending(layer_id, revision);
                    Err(err)
                }
            };
        }

        let mut pixels = surface::duplicate(layer.surface())?;
        if !fill::flood_fill(&mut pixels, x, y, color) {
            return Ok(FillOutcome::Unchanged);
        }
        self.apply_pixels(layer_id, pixels);
        Ok(FillOutcome::Applied)
    }

    /// Applies the result of an offloaded fill. Returns whether it was applied.
    ///
    /// The result is discarded if its layer was deleted, resized or painted
    /// on since the fill started.
    pub fn finish_fill(&mut self, result: FillResult) -> bool {
        let layer_id = result.layer_id;
        self.layers.end_pending(layer_id, result.revision);

        let Some(layer) = self.layers.find_layer(layer_id) else {
            warn!("Discarding fill: {} is gone", layer_id);
            return false;
        };
        if layer.revision() != result.revision || layer.surface().dimensions() != result.pixels.dimensions() {
            warn!("Discarding fill: {} changed while filling", layer_id);
            return false;
        }
        if !result.changed {
            return false;
        }
        self.apply_pixels(layer_id, result.pixels);
        true
    }

    /// Awaits an offloaded fill and applies it.
    pub async fn complete_fill(&mut self, task: FillTask) -> EngineResult<bool> {
        let (layer_id, revision) = (task.layer_id(), task.revision());
        match task.await {
            Ok(result) => Ok(self.finish_fill(result)),
            Err(err) => {
                self.layers.end_pending(layer_id, revision);
                Err(err)
            }
        }
    }

    /// Gives up on an offloaded fill and frees its layer.
    pub fn abandon_fill(&mut self, task: FillTask) {
        debug!("Abandoning fill on {}", task.layer_id());
        self.layers.end_pending(task.layer_id(), task.revision());
    }

    /// Replaces a layer's pixels and records the change as a stroke.
    fn apply_pixels(&mut self, layer_id: LayerId, pixels: Surface) {
        let Some(target) = self.layers.surface_mut(layer_id) else {
            return;
        };
        let before = history::compress(target);
        let after = history::compress(&pixels);
        let size = layer_size(&pixels);
        *target = pixels;

        self.history.add_history(HistoryAction::Stroke {
            layer_id,
            before,
            after,
            size,
        });
        self.events.emit(EngineEvent::RedrawRequested);
        self.emit_history();
    }

    // --- Layers ---

    /// Adds a blank layer above the active one and selects it.
    pub fn add_layer(&mut self, name: Option<&str>) -> EngineResult<LayerId> {
        self.commit_stroke();
        let [width, height] = self.layers.size();
        let layer = self.layers.add_layer(name, width, height)?;
        let action = HistoryAction::AddLayer {
            layer_id: layer.id(),
            name: layer.name().to_owned(),
            index: layer.z_index(),
            size: [width, height],
        };
        let id = layer.id();
        self.history.add_history(action);
        self.emit_structure();
        Ok(id)
    }

    /// Deletes a layer. The last layer cannot be deleted.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        self.commit_stroke();
        let (Some(snapshot), Some(index)) = (self.layers.snapshot(id), self.layers.find_layer_index(id)) else {
            warn!("Cannot delete unknown {}", id);
            return false;
        };
        if !self.layers.delete_layer(id) {
            return false;
        }
        self.layers.mark_all_dirty();
        self.history.add_history(HistoryAction::DeleteLayer { snapshot, index });
        self.emit_structure();
        true
    }

    pub fn rename_layer(&mut self, id: LayerId, new_name: &str) -> bool {
        let Some(old_name) = self.layers.rename_layer(id, new_name) else {
            return false;
        };
        self.history.add_history(HistoryAction::RenameLayer {
            layer_id: id,
            old_name,
            new_name: new_name.to_owned(),
        });
        self.emit_layers();
        self.emit_history();
        true
    }

    /// Moves a layer to `new_visual_index` (0 is the bottom).
    pub fn reorder_layer(&mut self, id: LayerId, new_visual_index: usize) -> bool {
        let Some(change) = self.layers.reorder_layer(id, new_visual_index) else {
            return false;
        };
        if change.old_visual_index == change.new_visual_index {
            return false;
        }
        self.layers.mark_all_dirty();
        self.history.add_history(HistoryAction::ReorderLayer {
            layer_id: id,
            old_visual_index: change.old_visual_index,
            new_visual_index: change.new_visual_index,
        });
        self.emit_layers();
        self.emit_history();
        self.events.emit(EngineEvent::RedrawRequested);
        true
    }

    pub fn toggle_visibility(&mut self, id: LayerId) -> bool {
        let Some(visible_before) = self.layers.toggle_visibility(id) else {
            return false;
        };
        self.history.add_history(HistoryAction::ToggleVisibility {
            layer_id: id,
            visible_before,
        });
        self.emit_layers();
        self.emit_history();
        self.events.emit(EngineEvent::RedrawRequested);
        true
    }

    /// Selects the layer tools paint on. Not recorded in history.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        self.commit_stroke();
        if !self.layers.set_active_layer(id) {
            warn!("Cannot select unknown {}", id);
            return false;
        }
        self.events.emit(EngineEvent::ActiveLayerChanged(Some(id)));
        true
    }

    /// Wipes the active layer. Returns false if it was already empty.
    pub fn clear_active_layer(&mut self) -> EngineResult<bool> {
        let layer_id = self.active_layer_id()?;
        if self.layers.is_pending(layer_id) {
            return Err(EngineError::LayerBusy(layer_id));
        }
        self.commit_stroke();

        let layer = self.layers.find_layer(layer_id).ok_or(EngineError::LayerNotFound(layer_id))?;
        if surface::is_blank(layer.surface()) {
            return Ok(false);
        }
        let before = history::compress(layer.surface());
        let size = layer.size();
        if let Some(target) = self.layers.surface_mut(layer_id) {
            surface::clear(target);
        }
        self.history.add_history(HistoryAction::ClearLayer {
            layer_id,
            before,
            after: CompressedPixels::default(),
            size,
        });
        self.events.emit(EngineEvent::RedrawRequested);
        self.emit_history();
        Ok(true)
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.replay(true)
    }

    pub fn redo(&mut self) -> bool {
        self.replay(false)
    }

    fn replay(&mut self, undo: bool) -> bool {
        self.commit_stroke();
        let layers = &mut self.layers;
        let apply = |action: &HistoryAction, is_undo: bool| {
            history::apply_action(layers, action, is_undo);
        };
        let replayed = if undo {
            self.history.undo(apply)
        } else {
            self.history.redo(apply)
        };
        if replayed {
            self.emit_structure();
        }
        replayed
    }

    /// Drops all undo and redo steps.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.emit_history();
    }

    // --- Document ---

    /// Resizes every layer, keeping content anchored at the top left corner.
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        self.commit_stroke();
        self.layers.resize_all(width, height)?;
        info!("Resized document to {}x{}", width, height);
        self.events.emit(EngineEvent::RedrawRequested);
        Ok(())
    }

    /// Flattens the visible layers, scaled to `width`x`height`.
    pub fn export(&self, width: u32, height: u32) -> EngineResult<Surface> {
        surface::export(self.visible_surfaces(), self.layers.size(), [width, height])
    }

    /// [`export`](Self::export), encoded as PNG.
    pub fn export_png(&self, width: u32, height: u32) -> EngineResult<Vec<u8>> {
        surface::encode_png(&self.export(width, height)?)
    }

    /// The flattened document for display. Only recomposited when a layer changed.
    pub fn render(&mut self) -> EngineResult<&Surface> {
        let size = self.layers.size();
        self.compositor.render(&mut self.layers, size)
    }

    pub fn render_color_image(&mut self) -> EngineResult<ColorImage> {
        let size = self.layers.size();
        self.compositor.render_color_image(&mut self.layers, size)
    }

    /// Changes with every recomposite; lets callers skip texture uploads.
    pub fn frame_version(&self) -> u64 {
        self.compositor.version()
    }

    // --- Helpers ---

    fn visible_surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.layers
            .layers()
            .into_iter()
            .filter(|layer| layer.is_visible())
            .map(Layer::surface)
    }

    fn active_layer_id(&self) -> EngineResult<LayerId> {
        self.layers.active_layer_id().ok_or(EngineError::NoActiveLayer)
    }

    fn compress_layer(&self, id: LayerId) -> EngineResult<CompressedPixels> {
        self.layers
            .surface(id)
            .map(history::compress)
            .ok_or(EngineError::LayerNotFound(id))
    }

    fn emit_layers(&self) {
        self.events.emit(EngineEvent::LayersChanged(self.layer_infos()));
    }

    fn emit_history(&self) {
        self.events.emit(EngineEvent::HistoryChanged(self.history.status()));
    }

    /// Everything a structural change can affect
    fn emit_structure(&self) {
        self.emit_layers();
        self.events
            .emit(EngineEvent::ActiveLayerChanged(self.layers.active_layer_id()));
        self.emit_history();
        self.events.emit(EngineEvent::RedrawRequested);
    }
}

fn layer_size(surface: &Surface) -> [u32; 2] {
    [surface.width(), surface.height()]
}

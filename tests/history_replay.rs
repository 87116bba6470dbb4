use egui::Pos2;
use image::Rgba;
use layer_paint::history::{self, HistoryAction};
use layer_paint::surface;
use layer_paint::{EngineConfig, PaintEngine, PointerSample};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Draws a horizontal stroke with the current tool and color
fn draw_line(engine: &mut PaintEngine, from: Pos2, to: Pos2) {
    engine.pointer_down(&PointerSample::mouse(from)).unwrap();
    engine.pointer_move(&PointerSample::mouse(to));
    engine.pointer_up(&PointerSample::mouse(to));
}

#[test]
fn test_count_bound_evicts_oldest_stroke() {
    init_logger();
    let mut engine = PaintEngine::new(16, 16).unwrap();
    for i in 0..101u32 {
        engine.set_color(Rgba([i as u8, 0, 0, 255]));
        draw_line(&mut engine, Pos2::new(1.0, 8.0), Pos2::new(14.0, 8.0));
    }
    let history = engine.history();
    assert_eq!(history.undo_len(), 100);

    // The first stroke, painted on a blank layer, is the one that went.
    let oldest = history.undo_actions().next().unwrap();
    match oldest {
        HistoryAction::Stroke { before, .. } => assert!(before.byte_len() > 0),
        other => panic!("unexpected {}", other.name()),
    }
}

#[test]
fn test_byte_bound_limits_memory() {
    let config = EngineConfig {
        max_history_bytes: 4096,
        ..Default::default()
    };
    let mut engine = PaintEngine::with_config(32, 32, config).unwrap();
    for i in 0..20u32 {
        engine.set_color(Rgba([0, i as u8, 0, 255]));
        draw_line(&mut engine, Pos2::new(2.0, 16.0), Pos2::new(30.0, 16.0));
    }
    let history = engine.history();
    assert!(history.undo_len() >= 1);
    assert!(history.undo_len() < 20);
    assert!(history.memory_usage() <= 4096 || history.undo_len() == 1);
}

#[test]
fn test_stroke_undo_redo_is_bytewise() {
    let mut engine = PaintEngine::new(12, 12).unwrap();
    let id = engine.active_layer().unwrap().id();
    engine.set_color(Rgba([10, 20, 30, 255]));
    draw_line(&mut engine, Pos2::new(1.0, 1.0), Pos2::new(10.0, 10.0));
    let painted = engine.layers().surface(id).unwrap().clone();
    assert!(!surface::is_blank(&painted));

    assert!(engine.undo());
    assert!(surface::is_blank(engine.layers().surface(id).unwrap()));
    assert!(engine.redo());
    assert_eq!(engine.layers().surface(id).unwrap(), &painted);
}

#[test]
fn test_add_undo_redo_is_bytewise() {
    init_logger();
    let mut engine = PaintEngine::new(20, 20).unwrap();
    draw_line(&mut engine, Pos2::new(0.0, 0.0), Pos2::new(19.0, 19.0));
    let added = engine.add_layer(Some("Ink")).unwrap();
    engine.set_color(Rgba([0, 0, 255, 255]));
    draw_line(&mut engine, Pos2::new(0.0, 19.0), Pos2::new(19.0, 0.0));

    let layers_before: Vec<_> = engine
        .layers()
        .layers()
        .iter()
        .map(|layer| (layer.id(), layer.surface().clone()))
        .collect();
    let export_before = engine.export(20, 20).unwrap();

    // Stroke, then the layer itself.
    assert!(engine.undo());
    assert!(engine.undo());
    assert!(engine.layers().find_layer(added).is_none());
    assert!(engine.redo());
    assert!(engine.redo());

    let layers_after: Vec<_> = engine
        .layers()
        .layers()
        .iter()
        .map(|layer| (layer.id(), layer.surface().clone()))
        .collect();
    assert_eq!(layers_after, layers_before);
    assert_eq!(engine.export(20, 20).unwrap(), export_before);
}

#[test]
fn test_new_edit_drops_redo() {
    let mut engine = PaintEngine::new(8, 8).unwrap();
    draw_line(&mut engine, Pos2::new(1.0, 1.0), Pos2::new(6.0, 1.0));
    engine.undo();
    assert!(engine.history_status().can_redo);

    engine.add_layer(None).unwrap();
    assert!(!engine.history_status().can_redo);
    assert!(!engine.redo());
}

#[test]
fn test_clear_layer_round_trip() {
    let mut engine = PaintEngine::new(8, 8).unwrap();
    let id = engine.active_layer().unwrap().id();
    assert!(!engine.clear_active_layer().unwrap());

    draw_line(&mut engine, Pos2::new(1.0, 4.0), Pos2::new(6.0, 4.0));
    let painted = engine.layers().surface(id).unwrap().clone();
    assert!(engine.clear_active_layer().unwrap());
    assert!(surface::is_blank(engine.layers().surface(id).unwrap()));
    assert!(matches!(
        engine.history().undo_actions().last(),
        Some(HistoryAction::ClearLayer { .. })
    ));

    assert!(engine.undo());
    assert_eq!(engine.layers().surface(id).unwrap(), &painted);
    assert!(engine.redo());
    assert!(surface::is_blank(engine.layers().surface(id).unwrap()));
}

#[test]
fn test_codec_round_trip_on_painted_layer() {
    let mut engine = PaintEngine::new(40, 30).unwrap();
    engine.set_color(Rgba([200, 100, 50, 255]));
    draw_line(&mut engine, Pos2::new(3.0, 3.0), Pos2::new(37.0, 27.0));
    engine.set_tool(layer_paint::tools::new_tool("Eraser").unwrap());
    draw_line(&mut engine, Pos2::new(3.0, 27.0), Pos2::new(37.0, 3.0));

    let layer = engine.active_layer().unwrap().surface();
    let restored = history::decompress(&history::compress(layer), 40, 30).unwrap();
    assert_eq!(&restored, layer);
}

#[test]
fn test_clear_history() {
    let mut engine = PaintEngine::new(8, 8).unwrap();
    draw_line(&mut engine, Pos2::new(1.0, 1.0), Pos2::new(6.0, 1.0));
    engine.clear_history();
    assert!(!engine.history_status().can_undo);
    assert_eq!(engine.history().memory_usage(), 0);
}

#[test]
fn test_stroke_replay_after_growing() {
    init_logger();
    let mut engine = PaintEngine::new(10, 10).unwrap();
    let id = engine.active_layer().unwrap().id();
    engine.set_color(Rgba([200, 0, 0, 255]));
    draw_line(&mut engine, Pos2::new(1.0, 5.0), Pos2::new(8.0, 5.0));
    let painted = engine.layers().surface(id).unwrap().clone();

    engine.resize(20, 16).unwrap();
    assert!(engine.undo());
    let layer = engine.layers().surface(id).unwrap();
    assert_eq!(layer.dimensions(), (20, 16));
    assert!(surface::is_blank(layer));

    assert!(engine.redo());
    let layer = engine.layers().surface(id).unwrap();
    assert_eq!(layer.dimensions(), (20, 16));
    assert_eq!(layer, &surface::resized(&painted, 20, 16).unwrap());
}

#[test]
fn test_stroke_replay_after_shrinking() {
    let mut engine = PaintEngine::new(10, 10).unwrap();
    let id = engine.active_layer().unwrap().id();
    engine.set_color(Rgba([0, 0, 200, 255]));
    draw_line(&mut engine, Pos2::new(1.0, 2.0), Pos2::new(8.0, 2.0));
    let first = engine.layers().surface(id).unwrap().clone();
    engine.set_color(Rgba([200, 0, 0, 255]));
    draw_line(&mut engine, Pos2::new(1.0, 7.0), Pos2::new(8.0, 7.0));
    let second = engine.layers().surface(id).unwrap().clone();

    engine.resize(5, 5).unwrap();
    assert!(engine.undo());
    let layer = engine.layers().surface(id).unwrap();
    assert_eq!(layer.dimensions(), (5, 5));
    assert_eq!(layer, &surface::resized(&first, 5, 5).unwrap());

    assert!(engine.undo());
    assert!(surface::is_blank(engine.layers().surface(id).unwrap()));

    assert!(engine.redo());
    assert!(engine.redo());
    let layer = engine.layers().surface(id).unwrap();
    assert_eq!(layer.dimensions(), (5, 5));
    assert_eq!(layer, &surface::resized(&second, 5, 5).unwrap());
}

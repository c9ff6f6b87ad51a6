//! Headless inkpad: render a document to a PNG.
//!
//! `inkpad [DOCUMENT.json] [OUTPUT.png]`
//!
//! Without a document, a small demo scene is drawn through the built-in tools instead.

use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use inkpad::config::Preferences;
use inkpad::render::ManualFrames;
use inkpad::tools::PointerBatch;
use inkpad::Editor;
use inkpad_core::document::DocumentRecord;
use inkpad_core::store::InMemoryStore;
use inkpad_core::{DrawingDocument, ShapeHandlerRegistry};

const DEFAULT_OUTPUT: &str = "inkpad.png";

fn read_document(
    path: &std::path::Path,
    registry: &ShapeHandlerRegistry,
) -> AnyResult<DrawingDocument> {
    let text = std::fs::read_to_string(path)?;
    let record: DocumentRecord = serde_json::from_str(&text)?;
    Ok(DrawingDocument::from_record(record, registry)?)
}

fn demo_scene(editor: &mut Editor) -> AnyResult<()> {
    let drag = |editor: &mut Editor, tool: &str, points: &[[f32; 2]]| -> AnyResult<()> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Ok(());
        };
        editor.activate_tool(tool)?;
        editor.pointer_down(*first);
        editor.pointer_move(points);
        editor.pointer_up(*last);
        Ok(())
    };
    let marigold = inkpad_core::color::Color::from_rgba8(0xf4, 0xc4, 0x30, 0xff);
    editor.settings_mut().fill = Some(marigold);
    drag(editor, "rect", &[[80.0, 80.0], [640.0, 420.0]])?;
    drag(editor, "ellipse", &[[900.0, 200.0], [1400.0, 700.0]])?;
    editor.settings_mut().fill = None;

    let wave: PointerBatch = (0..=64)
        .map(|idx| {
            let x = 100.0 + idx as f32 * 27.0;
            [x, 860.0 + (x / 90.0).sin() * 80.0]
        })
        .collect();
    editor.settings_mut().stroke.width = 12.0;
    drag(editor, "pen", wave.as_slice())?;
    drag(editor, "eraser", &[[300.0, 60.0], [320.0, 460.0]])?;
    drag(editor, "stamp", &[[1650.0, 180.0]])?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        if let Err(e) = simple_logging::log_to_file("log.out", log::LevelFilter::Debug) {
            eprintln!("failed to open log.out, logging disabled: {e}");
        }
    }

    let mut args = std::env::args_os().skip(1).map(std::path::PathBuf::from);
    let document_path = args.next();
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.into());

    let preferences = Preferences::load_or_default();
    if let Err(e) = preferences.save() {
        log::warn!("Failed to save preferences:\n{e:?}");
    }

    let registry = ShapeHandlerRegistry::standard();
    let document = match &document_path {
        Some(path) => read_document(path, &registry)
            .with_context(|| format!("failed to open document {path:?}"))?,
        None => DrawingDocument::default(),
    };
    log::info!("loaded {} shapes", document.len());

    let store = Arc::new(InMemoryStore::new(document));
    let frames = ManualFrames::new();
    let mut editor = Editor::with_registries(
        store,
        &preferences,
        Box::new(frames.clone()),
        Arc::new(registry),
        Arc::new(inkpad::render::DrawRegistry::standard()),
    );
    if document_path.is_none() {
        demo_scene(&mut editor)?;
    }

    // Run frames until the scheduler settles, baking in between.
    loop {
        editor.bake_pending().await;
        let due = frames.take_pending();
        if due.is_empty() {
            break;
        }
        for handle in due {
            editor.on_frame(handle);
        }
    }

    let frame = editor
        .raster()
        .frame()
        .context("no frame was rendered")?;
    frame
        .save_png(&output)
        .with_context(|| format!("failed to write {output:?}"))?;
    log::info!("wrote {output:?}");

    editor.teardown();
    Ok(())
}

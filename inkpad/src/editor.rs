//! # Editor
//!
//! Wires a store to everything that edits and shows it: the undo history, the tools, and a raster session.
//! The [`EditorContext`] is the runtime tools act through. It owns no interaction state of its own.

use std::sync::Arc;

use inkpad_core::commands::{Command, CommandError};
use inkpad_core::geometry::Aabb;
use inkpad_core::history::CommandManager;
use inkpad_core::shape::{Shape, Stroke};
use inkpad_core::store::Store;
use inkpad_core::{IdGenerator, ShapeHandlerRegistry, ShapeId, ZIndex};

use crate::config::Preferences;
use crate::render::scheduler::{FrameHandle, FrameScheduler};
use crate::render::tiles::BakeReport;
use crate::render::{DrawRegistry, RasterSession, Viewport};
use crate::tools::{
    InterruptReason, SharedSettings, ToolError, ToolHost, ToolOptions, ToolRuntime,
};

pub struct EditorContext {
    history: CommandManager,
    store: Arc<dyn Store>,
    ids: IdGenerator,
    shapes: Arc<ShapeHandlerRegistry>,
    settings: SharedSettings,
    options: ToolOptions,
    raster: RasterSession,
}
impl EditorContext {
    /// Normalize the payload of every shape the command introduces.
    fn canonicalize(&self, command: Command) -> Command {
        match command {
            Command::AddShape(shape) => Command::AddShape(Arc::new(
                self.shapes.canonicalize(Arc::unwrap_or_clone(shape)),
            )),
            Command::ClearCanvas(sentinel) => Command::ClearCanvas(Arc::new(
                self.shapes.canonicalize(Arc::unwrap_or_clone(sentinel)),
            )),
            Command::Batch(commands) => Command::batch(
                commands
                    .into_vec()
                    .into_iter()
                    .map(|command| self.canonicalize(command)),
            ),
            other => other,
        }
    }
}
impl ToolRuntime for EditorContext {
    fn generate_shape_id(&self, prefix: &str) -> ShapeId {
        self.ids.generate(prefix)
    }
    fn next_z_index(&self) -> ZIndex {
        self.store.doc().next_z_index()
    }
    fn next_z_index_in_layer(&self) -> ZIndex {
        self.store
            .doc()
            .next_z_index_in_layer(self.settings.layer.as_ref())
    }
    fn shared_settings(&self) -> SharedSettings {
        self.settings.clone()
    }
    fn options(&self) -> ToolOptions {
        self.options.clone()
    }
    fn set_draft(&mut self, tool_id: &'static str, shape: Shape) {
        self.raster.set_draft(tool_id, shape);
    }
    fn clear_draft(&mut self) {
        self.raster.clear_draft();
    }
    fn set_preview(&mut self, dirty_bounds_hint: Option<Aabb>) {
        self.raster.set_preview(dirty_bounds_hint);
    }
    fn commit(&mut self, command: Command) -> Result<(), CommandError> {
        let command = self.canonicalize(command);
        self.history.apply(command)
    }
}

pub struct Editor {
    tools: ToolHost,
    context: EditorContext,
}
impl Editor {
    /// An editor over `store` with the built-in tools and shape kinds.
    pub fn new(
        store: Arc<dyn Store>,
        preferences: &Preferences,
        frames: Box<dyn FrameScheduler>,
    ) -> Self {
        Self::with_registries(
            store,
            preferences,
            frames,
            Arc::new(ShapeHandlerRegistry::standard()),
            Arc::new(DrawRegistry::standard()),
        )
    }
    pub fn with_registries(
        store: Arc<dyn Store>,
        preferences: &Preferences,
        frames: Box<dyn FrameScheduler>,
        shapes: Arc<ShapeHandlerRegistry>,
        draw: Arc<DrawRegistry>,
    ) -> Self {
        let viewport = Viewport {
            size: store.doc().size(),
            pixel_ratio: preferences.pixel_ratio,
            background: preferences.background,
        };
        let raster = RasterSession::new(
            store.as_ref(),
            viewport,
            preferences.tile_size,
            preferences.debug,
            frames,
            shapes.clone(),
            draw,
        );
        let settings = SharedSettings {
            stroke: Stroke {
                color: preferences.pen.color,
                width: preferences.pen.width,
                ..Stroke::default()
            },
            ..SharedSettings::default()
        };
        Self {
            tools: ToolHost::with_builtin_tools(),
            context: EditorContext {
                history: CommandManager::new(store.clone())
                    .with_depth_limit(preferences.history_depth),
                store,
                ids: IdGenerator::new(),
                shapes,
                settings,
                options: ToolOptions::default(),
                raster,
            },
        }
    }
    #[must_use]
    pub fn tools(&self) -> &ToolHost {
        &self.tools
    }
    #[must_use]
    pub fn history(&self) -> &CommandManager {
        &self.context.history
    }
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.context.store
    }
    #[must_use]
    pub fn raster(&self) -> &RasterSession {
        &self.context.raster
    }
    pub fn raster_mut(&mut self) -> &mut RasterSession {
        &mut self.context.raster
    }
    pub fn settings_mut(&mut self) -> &mut SharedSettings {
        &mut self.context.settings
    }
    pub fn options_mut(&mut self) -> &mut ToolOptions {
        &mut self.context.options
    }
    pub fn activate_tool(&mut self, id: &str) -> Result<(), ToolError> {
        self.tools.activate(id, &mut self.context)
    }
    pub fn pointer_down(&mut self, position: [f32; 2]) {
        self.tools.pointer_down(&mut self.context, position);
    }
    pub fn pointer_move(&mut self, samples: &[[f32; 2]]) {
        self.tools.pointer_move(&mut self.context, samples);
    }
    pub fn pointer_up(&mut self, position: [f32; 2]) {
        self.tools.pointer_up(&mut self.context, position);
    }
    pub fn pointer_cancel(&mut self) {
        self.tools.pointer_cancel(&mut self.context);
    }
    pub fn interrupt(&mut self, reason: InterruptReason) {
        self.tools.interrupt(&mut self.context, reason);
    }
    /// Apply a command as if a tool had committed it.
    pub fn commit(&mut self, command: Command) -> Result<(), CommandError> {
        self.context.commit(command)
    }
    pub fn undo(&mut self) -> bool {
        self.context.history.undo()
    }
    pub fn redo(&mut self) -> bool {
        self.context.history.redo()
    }
    /// Supersede everything drawn so far with a clear sentinel on top of the topmost layer.
    pub fn clear_canvas(&mut self) -> Result<(), CommandError> {
        let doc = self.context.store.doc();
        let layer = doc.topmost_layer().cloned();
        let mut sentinel = Shape::clear_sentinel(
            self.context.generate_shape_id("clear"),
            doc.next_z_index_in_layer(layer.as_ref()),
        );
        sentinel.layer_id = layer;
        self.context.commit(Command::clear_canvas(sentinel))
    }
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        self.context.raster.on_frame(handle)
    }
    pub async fn bake_pending(&mut self) -> BakeReport {
        self.context.raster.bake_pending().await
    }
    /// Drop the active tool's gesture and stop rendering.
    pub fn teardown(&mut self) {
        self.tools.deactivate(&mut self.context);
        self.context.raster.teardown();
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::Editor;
    use crate::config::Preferences;
    use crate::render::scheduler::ManualFrames;
    use crate::tools::{InterruptReason, ToolPhase};
    use inkpad_core::layer::DrawingLayer;
    use inkpad_core::shape::{BoxKind, BoxedGeometry, Geometry, ShapeKind};
    use inkpad_core::store::{InMemoryStore, Store};
    use inkpad_core::{DrawingDocument, ZIndex};

    fn editor() -> (Editor, Arc<InMemoryStore>, ManualFrames) {
        let store = Arc::new(InMemoryStore::new(DrawingDocument::new([128, 128])));
        let frames = ManualFrames::new();
        let preferences = Preferences {
            tile_size: 64,
            ..Preferences::default()
        };
        let editor = Editor::new(store.clone(), &preferences, Box::new(frames.clone()));
        (editor, store, frames)
    }
    fn drag(editor: &mut Editor, tool: &str, from: [f32; 2], to: [f32; 2]) {
        editor.activate_tool(tool).unwrap();
        editor.pointer_down(from);
        editor.pointer_move(&[to]);
        editor.pointer_up(to);
    }

    #[test]
    fn rect_then_ellipse_undo_redo() {
        let (mut editor, store, _) = editor();
        drag(&mut editor, "rect", [10.0, 10.0], [40.0, 30.0]);
        drag(&mut editor, "ellipse", [50.0, 50.0], [20.0, 20.0]);
        let kinds = |store: &InMemoryStore| -> Vec<BoxKind> {
            store
                .doc()
                .ordered_shapes()
                .iter()
                .filter_map(|shape| match &shape.geometry {
                    Geometry::Boxed(boxed) => Some(boxed.kind),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(kinds(&store), [BoxKind::Rect, BoxKind::Ellipse]);
        assert!(editor.undo());
        assert_eq!(kinds(&store), [BoxKind::Rect]);
        assert!(editor.redo());
        assert_eq!(kinds(&store), [BoxKind::Rect, BoxKind::Ellipse]);
        // Dragged up and left, but stored normalized.
        let doc = store.doc();
        let ordered = doc.ordered_shapes();
        let ellipse = ordered.iter().last().unwrap();
        assert_eq!(
            ellipse.geometry,
            Geometry::Boxed(BoxedGeometry {
                kind: BoxKind::Ellipse,
                width: 30.0,
                height: 30.0
            })
        );
        assert_eq!(ellipse.transform.translation, [20.0, 20.0]);
    }
    #[test]
    fn clear_canvas_tops_the_document() {
        let (mut editor, store, _) = editor();
        drag(&mut editor, "pen", [0.0, 0.0], [10.0, 10.0]);
        editor.clear_canvas().unwrap();
        let doc = store.doc();
        let ordered = doc.ordered_shapes();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered.iter().last().unwrap().kind(), ShapeKind::Clear);
        assert!(editor.undo());
        assert_eq!(store.doc().len(), 1);
    }
    #[tokio::test]
    async fn clear_canvas_covers_named_layers() {
        let mut document = DrawingDocument::new([128, 128]);
        document.insert_layer(DrawingLayer::drawing("ink".into(), ZIndex::first()));
        let store = Arc::new(InMemoryStore::new(document));
        let frames = ManualFrames::new();
        let preferences = Preferences {
            tile_size: 64,
            ..Preferences::default()
        };
        let mut editor = Editor::new(store.clone(), &preferences, Box::new(frames.clone()));
        editor.settings_mut().layer = Some("ink".into());
        drag(&mut editor, "rect", [10.0, 10.0], [40.0, 30.0]);
        editor.clear_canvas().unwrap();

        let doc = store.doc();
        let ordered = doc.ordered_shapes();
        let top = ordered.iter().last().unwrap();
        assert_eq!(top.kind(), ShapeKind::Clear);
        assert_eq!(top.layer_id.as_ref().map(|id| id.as_str()), Some("ink"));

        editor.bake_pending().await;
        for handle in frames.take_pending() {
            editor.on_frame(handle);
        }
        let frame = editor.raster().frame().unwrap();
        let pixel = frame.pixel(20, 20).unwrap();
        let background = crate::render::draw::to_skia(preferences.background).to_color_u8();
        assert_eq!(pixel.red(), background.red());
        assert_eq!(pixel.green(), background.green());
    }
    #[tokio::test]
    async fn drafts_stay_out_of_the_document() {
        let (mut editor, store, frames) = editor();
        editor.bake_pending().await;
        editor.activate_tool("pen").unwrap();
        editor.pointer_down([4.0, 4.0]);
        editor.pointer_move(&[[30.0, 30.0], [60.0, 12.0]]);

        let drafts = editor.raster().hot_layer().drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].shape.kind(), ShapeKind::Pen);
        assert_eq!(store.doc().ordered_shapes().len(), 0);
        // Nothing was marked for baking either.
        assert_eq!(editor.bake_pending().await.baked, 0);
        assert_eq!(editor.raster().tiles().dirty_count(), 0);
        for handle in frames.take_pending() {
            editor.on_frame(handle);
        }

        editor.pointer_up([60.0, 12.0]);
        assert!(editor.raster().hot_layer().drafts().is_empty());
        assert_eq!(store.doc().ordered_shapes().len(), 1);
        assert!(editor.bake_pending().await.baked > 0);
    }
    #[test]
    fn interrupt_mid_gesture() {
        let (mut editor, store, _) = editor();
        editor.activate_tool("pen").unwrap();
        editor.pointer_down([0.0, 0.0]);
        editor.pointer_move(&[[5.0, 5.0], [9.0, 2.0]]);
        assert!(editor.raster().hot_layer().is_active());
        editor.interrupt(InterruptReason::WindowBlur);
        assert_eq!(editor.tools().phase(), ToolPhase::Idle);
        assert!(!editor.raster().hot_layer().is_active());
        assert!(store.doc().is_empty());
        assert!(!editor.history().can_undo());
    }
    #[tokio::test]
    async fn committed_stroke_is_baked() {
        let (mut editor, _, frames) = editor();
        drag(&mut editor, "rect", [10.0, 10.0], [40.0, 30.0]);
        for handle in frames.take_pending() {
            editor.on_frame(handle);
        }
        let report = editor.bake_pending().await;
        assert_eq!(report.baked, 4);
        editor.teardown();
        assert!(frames.pending().is_empty());
    }
}

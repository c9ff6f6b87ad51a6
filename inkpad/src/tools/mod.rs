//! # Tools
//!
//! Tools are the way the user's pointer creates shapes. A [`Tool`] is a strategy: activating it produces a
//! [`ToolSession`] holding all of the interaction state, and the [`ToolHost`] drives that session with pointer
//! events through a small state machine:
//!
//! `Idle -> Drafting -> (committed | cancelled) -> Idle`
//!
//! While drafting, a session shows its progress as a *draft* shape through the [`ToolRuntime`]. Drafts are never
//! part of the document - they live in the hot layer until the tool commits a command or gives up.

mod boxed;
mod pen;
mod stamp;

pub use boxed::BoxedTool;
pub use pen::PenTool;
pub use stamp::StampTool;

use inkpad_core::color::Color;
use inkpad_core::commands::{Command, CommandError};
use inkpad_core::geometry::Aabb;
use inkpad_core::id::{LayerId, ShapeId};
use inkpad_core::shape::{Shape, Stroke};
use inkpad_core::ZIndex;

/// A batch of pointer positions in document space, as delivered by one input frame.
pub type PointerBatch = smallvec::SmallVec<[[f32; 2]; 8]>;

/// An in-progress shape owned by a tool. Never stored in the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    pub tool_id: &'static str,
    pub shape: Shape,
    pub temporary: bool,
}

/// Style shared between all tools, set by the toolbar.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SharedSettings {
    pub stroke: Stroke,
    pub fill: Option<Color>,
    /// Layer new shapes are created in. None for the base layer.
    pub layer: Option<LayerId>,
}

/// Settings for individual tools.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOptions {
    /// Catalog name placed by the stamp tool.
    pub stamp: String,
    pub stamp_size: f32,
}
impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            stamp: "star".to_owned(),
            stamp_size: 48.0,
        }
    }
}

/// Which parts of [`SharedSettings`] a tool honors, so the toolbar can hide the rest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct StyleSupport {
    pub stroke: bool,
    pub fill: bool,
}

/// Everything a tool may do to the outside world.
pub trait ToolRuntime {
    fn generate_shape_id(&self, prefix: &str) -> ShapeId;
    /// A z-index above every shape in the document.
    fn next_z_index(&self) -> ZIndex;
    /// A z-index above every shape in the active layer.
    fn next_z_index_in_layer(&self) -> ZIndex;
    fn shared_settings(&self) -> SharedSettings;
    fn options(&self) -> ToolOptions;
    /// Replace the draft of `tool_id`. Each call fully supersedes the previous draft.
    fn set_draft(&mut self, tool_id: &'static str, shape: Shape);
    fn clear_draft(&mut self);
    /// Report the document area the draft changed, for the debug overlay.
    fn set_preview(&mut self, dirty_bounds_hint: Option<Aabb>);
    fn commit(&mut self, command: Command) -> Result<(), CommandError>;
}

pub trait Tool: Send + Sync {
    fn id(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn style_support(&self) -> StyleSupport;
    fn activate(&self, runtime: &mut dyn ToolRuntime) -> Box<dyn ToolSession>;
}

/// Interaction state of an activated tool.
pub trait ToolSession {
    fn pointer_down(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]);
    fn pointer_move(&mut self, runtime: &mut dyn ToolRuntime, samples: &[[f32; 2]]);
    /// Finish the gesture, committing its result if it isn't degenerate.
    fn pointer_up(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]);
    /// Abandon the gesture without committing.
    fn pointer_cancel(&mut self, runtime: &mut dyn ToolRuntime);
    /// Called when the host is transitioning away from this tool.
    fn exit(&mut self, runtime: &mut dyn ToolRuntime) {
        runtime.clear_draft();
    }
}

/// Why a gesture was force-cancelled.
#[derive(strum::Display, Copy, Clone, PartialEq, Eq, Debug)]
#[strum(serialize_all = "kebab-case")]
pub enum InterruptReason {
    LostCapture,
    WindowBlur,
    DocumentHidden,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ToolPhase {
    Idle,
    Drafting,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("no tool registered with id {0:?}")]
    UnknownTool(String),
}

struct ActiveTool {
    id: &'static str,
    session: Box<dyn ToolSession>,
}

/// Owns the registered tools and runs the pointer state machine for whichever is active.
pub struct ToolHost {
    tools: Vec<std::sync::Arc<dyn Tool>>,
    active: Option<ActiveTool>,
    phase: ToolPhase,
}
impl Default for ToolHost {
    fn default() -> Self {
        Self::new()
    }
}
impl ToolHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            active: None,
            phase: ToolPhase::Idle,
        }
    }
    /// A host with pen, eraser, rectangle, ellipse, and stamp tools.
    #[must_use]
    pub fn with_builtin_tools() -> Self {
        let mut host = Self::new();
        host.register(std::sync::Arc::new(PenTool::pen()));
        host.register(std::sync::Arc::new(PenTool::eraser()));
        host.register(std::sync::Arc::new(BoxedTool::rect()));
        host.register(std::sync::Arc::new(BoxedTool::ellipse()));
        host.register(std::sync::Arc::new(StampTool));
        host
    }
    /// Register a tool, replacing any with the same id.
    pub fn register(&mut self, tool: std::sync::Arc<dyn Tool>) {
        self.tools.retain(|existing| existing.id() != tool.id());
        self.tools.push(tool);
    }
    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> + '_ {
        self.tools.iter().map(AsRef::as_ref)
    }
    #[must_use]
    pub fn active_id(&self) -> Option<&'static str> {
        self.active.as_ref().map(|active| active.id)
    }
    #[must_use]
    pub fn phase(&self) -> ToolPhase {
        self.phase
    }
    /// Switch tools. The previous session is exited first, clearing its draft.
    pub fn activate(&mut self, id: &str, runtime: &mut dyn ToolRuntime) -> Result<(), ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.id() == id)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(id.to_owned()))?;
        self.deactivate(runtime);
        log::debug!("activating tool {id}");
        self.active = Some(ActiveTool {
            id: tool.id(),
            session: tool.activate(runtime),
        });
        Ok(())
    }
    pub fn deactivate(&mut self, runtime: &mut dyn ToolRuntime) {
        if let Some(mut active) = self.active.take() {
            active.session.exit(runtime);
        }
        // Exit must leave nothing behind, whatever the session did.
        runtime.clear_draft();
        runtime.set_preview(None);
        self.phase = ToolPhase::Idle;
    }
    pub fn pointer_down(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if self.phase == ToolPhase::Drafting {
            // A second pointer while one is down. Single-pointer tools ignore it.
            log::trace!("ignoring pointer down while drafting");
            return;
        }
        self.phase = ToolPhase::Drafting;
        active.session.pointer_down(runtime, position);
    }
    pub fn pointer_move(&mut self, runtime: &mut dyn ToolRuntime, samples: &[[f32; 2]]) {
        if self.phase != ToolPhase::Drafting || samples.is_empty() {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.session.pointer_move(runtime, samples);
        }
    }
    pub fn pointer_up(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        if self.phase != ToolPhase::Drafting {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.session.pointer_up(runtime, position);
        }
        self.finish(runtime);
    }
    pub fn pointer_cancel(&mut self, runtime: &mut dyn ToolRuntime) {
        if self.phase != ToolPhase::Drafting {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.session.pointer_cancel(runtime);
        }
        self.finish(runtime);
    }
    /// Force-cancel whatever gesture is in progress.
    pub fn interrupt(&mut self, runtime: &mut dyn ToolRuntime, reason: InterruptReason) {
        if self.phase == ToolPhase::Drafting {
            log::debug!("gesture interrupted: {reason}");
        }
        self.pointer_cancel(runtime);
    }
    fn finish(&mut self, runtime: &mut dyn ToolRuntime) {
        runtime.clear_draft();
        runtime.set_preview(None);
        self.phase = ToolPhase::Idle;
    }
}

#[cfg(test)]
pub(crate) mod test {
    use inkpad_core::commands::{Command, CommandError, CommandConsumer, DoUndo};
    use inkpad_core::geometry::Aabb;
    use inkpad_core::{DrawingDocument, IdGenerator, ShapeId, ZIndex};

    use super::{InterruptReason, SharedSettings, ToolHost, ToolOptions, ToolPhase, ToolRuntime};
    use inkpad_core::shape::Shape;

    /// Records everything a tool does, applying commits to a plain document.
    pub(crate) struct RecordingRuntime {
        pub ids: IdGenerator,
        pub document: DrawingDocument,
        pub draft: Option<Shape>,
        pub preview: Option<Aabb>,
        pub commits: usize,
        /// Whether a draft was still showing at each commit.
        pub draft_at_commit: Vec<bool>,
        pub settings: SharedSettings,
        pub options: ToolOptions,
    }
    impl RecordingRuntime {
        pub fn new() -> Self {
            Self {
                ids: IdGenerator::with_session("t"),
                document: DrawingDocument::default(),
                draft: None,
                preview: None,
                commits: 0,
                draft_at_commit: Vec::new(),
                settings: SharedSettings::default(),
                options: ToolOptions::default(),
            }
        }
    }
    impl ToolRuntime for RecordingRuntime {
        fn generate_shape_id(&self, prefix: &str) -> ShapeId {
            self.ids.generate(prefix)
        }
        fn next_z_index(&self) -> ZIndex {
            self.document.next_z_index()
        }
        fn next_z_index_in_layer(&self) -> ZIndex {
            self.document
                .next_z_index_in_layer(self.settings.layer.as_ref())
        }
        fn shared_settings(&self) -> SharedSettings {
            self.settings.clone()
        }
        fn options(&self) -> ToolOptions {
            self.options.clone()
        }
        fn set_draft(&mut self, _: &'static str, shape: Shape) {
            self.draft = Some(shape);
        }
        fn clear_draft(&mut self) {
            self.draft = None;
        }
        fn set_preview(&mut self, hint: Option<Aabb>) {
            self.preview = hint;
        }
        fn commit(&mut self, mut command: Command) -> Result<(), CommandError> {
            command.execute(&mut self.document)?;
            self.commits += 1;
            self.draft_at_commit.push(self.draft.is_some());
            // Exercise the consumer too, to be sure the recorded command is undoable.
            let mut scratch = self.document.clone();
            scratch.apply(DoUndo::Undo(&command))?;
            Ok(())
        }
    }

    #[test]
    fn stroke_lifecycle() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        host.activate("pen", &mut runtime).unwrap();

        host.pointer_down(&mut runtime, [10.0, 10.0]);
        host.pointer_move(&mut runtime, &[[20.0, 10.0], [30.0, 15.0]]);
        assert_eq!(host.phase(), ToolPhase::Drafting);
        // Drafts never reach the document.
        assert!(runtime.draft.is_some());
        assert!(runtime.document.is_empty());
        assert!(runtime.preview.is_some());

        host.pointer_up(&mut runtime, [40.0, 20.0]);
        assert_eq!(host.phase(), ToolPhase::Idle);
        assert!(runtime.draft.is_none());
        assert_eq!(runtime.document.len(), 1);
    }
    #[test]
    fn draft_outlives_the_commit() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        for tool in ["pen", "eraser", "rect", "ellipse", "stamp"] {
            host.activate(tool, &mut runtime).unwrap();
            host.pointer_down(&mut runtime, [10.0, 10.0]);
            host.pointer_move(&mut runtime, &[[30.0, 25.0]]);
            host.pointer_up(&mut runtime, [40.0, 30.0]);
            assert!(runtime.draft.is_none(), "{tool} left its draft behind");
        }
        // The shape is committed while its draft still shows, then the draft goes.
        assert_eq!(runtime.draft_at_commit, [true; 5]);
    }
    #[test]
    fn cancel_mid_stroke_commits_nothing() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        host.activate("pen", &mut runtime).unwrap();
        host.pointer_down(&mut runtime, [0.0, 0.0]);
        host.pointer_move(&mut runtime, &[[50.0, 50.0]]);
        host.pointer_cancel(&mut runtime);
        assert!(runtime.document.is_empty());
        assert!(runtime.draft.is_none());
        assert_eq!(runtime.commits, 0);
    }
    #[test]
    fn interrupt_and_switch_clear_drafts() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        host.activate("rect", &mut runtime).unwrap();
        host.pointer_down(&mut runtime, [0.0, 0.0]);
        host.pointer_move(&mut runtime, &[[50.0, 50.0]]);
        host.interrupt(&mut runtime, InterruptReason::WindowBlur);
        assert!(runtime.draft.is_none());
        assert_eq!(host.phase(), ToolPhase::Idle);

        host.pointer_down(&mut runtime, [0.0, 0.0]);
        host.pointer_move(&mut runtime, &[[50.0, 50.0]]);
        host.activate("ellipse", &mut runtime).unwrap();
        assert!(runtime.draft.is_none());
        assert_eq!(host.phase(), ToolPhase::Idle);
        assert!(runtime.document.is_empty());
        // Stray events after the switch are ignored.
        host.pointer_up(&mut runtime, [9.0, 9.0]);
        assert!(runtime.document.is_empty());
    }
    #[test]
    fn unknown_tool() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        assert!(host.activate("lasso", &mut runtime).is_err());
        assert_eq!(host.active_id(), None);
        // No active tool - events are dropped.
        host.pointer_down(&mut runtime, [0.0, 0.0]);
        assert_eq!(host.phase(), ToolPhase::Idle);
    }
}

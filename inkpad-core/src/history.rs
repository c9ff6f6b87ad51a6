//! # Undo history
//!
//! [`CommandManager`] applies commands against the store's *current* snapshot through the injected
//! [`Transact`], and keeps linear undo and redo stacks. Undo never rolls the document back to an older
//! revision - it applies the recorded inverse as a new edit, so edits merged in from other replicas survive it.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::commands::{Command, CommandConsumer, CommandError, DoUndo};
use crate::store::{EventKind, Store, StoreEvent};
use crate::transact::{LocalTransact, Transact};

/// Default number of undo steps kept.
pub const DEFAULT_DEPTH: usize = 256;

pub struct CommandManager {
    store: Arc<dyn Store>,
    transact: Arc<dyn Transact>,
    /// Oldest at the front, so trimming is cheap.
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    depth: usize,
}
impl CommandManager {
    /// A manager using in-process transactions.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_transact(store, Arc::new(LocalTransact))
    }
    #[must_use]
    pub fn with_transact(store: Arc<dyn Store>, transact: Arc<dyn Transact>) -> Self {
        Self {
            store,
            transact,
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: DEFAULT_DEPTH,
        }
    }
    /// Limit the undo stack, dropping the oldest entries beyond `depth`. Zero disables undo entirely.
    #[must_use]
    pub fn with_depth_limit(mut self, depth: usize) -> Self {
        self.depth = depth;
        self.trim();
        self
    }
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
    /// Execute a new command, making it the most recent undo step and discarding anything redoable.
    ///
    /// On error nothing is emitted and the history is unchanged.
    pub fn apply(&mut self, mut command: Command) -> Result<(), CommandError> {
        let current = self.store.doc();
        let mut result = Ok(());
        let next = self
            .transact
            .change(&current, &mut |draft| result = command.execute(draft));
        result?;
        log::debug!("apply {}", command.kind());
        self.store.apply_action(StoreEvent {
            kind: command.kind(),
            action: Some(command.clone()),
            snapshot: Arc::new(next),
        });
        self.undo.push_back(command);
        self.trim();
        self.redo.clear();
        Ok(())
    }
    /// Undo the most recent command. False if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(command) = self.undo.pop_back() else {
            return false;
        };
        if self.replay(&command, EventKind::Undo) {
            self.redo.push(command);
        }
        true
    }
    /// Redo the most recently undone command. False if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(command) = self.redo.pop() else {
            return false;
        };
        if self.replay(&command, EventKind::Redo) {
            self.undo.push_back(command);
            self.trim();
        }
        true
    }
    /// Apply a recorded command in either direction as a fresh edit. A command that no longer fits the
    /// document (eg. redoing an edit of a shape another replica deleted) is dropped from history.
    fn replay(&mut self, command: &Command, kind: EventKind) -> bool {
        let current = self.store.doc();
        let mut result = Ok(());
        let next = self.transact.change(&current, &mut |draft| {
            let step = if kind == EventKind::Undo {
                DoUndo::Undo(command)
            } else {
                DoUndo::Do(command)
            };
            result = draft.apply(step);
        });
        if let Err(err) = result {
            log::warn!("{kind} of {} failed, dropping from history: {err}", command.kind());
            return false;
        }
        log::debug!("{kind} {}", command.kind());
        self.store.apply_action(StoreEvent {
            kind,
            action: Some(command.clone()),
            snapshot: Arc::new(next),
        });
        true
    }
    fn trim(&mut self) {
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }
    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }
    /// Forget all history. The document is left as-is.
    pub fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::CommandManager;
    use crate::commands::{Command, ShapePatch};
    use crate::document::DrawingDocument;
    use crate::geometry::Transform;
    use crate::id::ShapeId;
    use crate::shape::{BoxKind, BoxedGeometry, Geometry, Shape};
    use crate::store::{InMemoryStore, Store, StoreEvent};
    use crate::zindex::ZIndex;

    fn boxed(id: &str, kind: BoxKind, z: &str) -> Shape {
        Shape::new(
            id.into(),
            Geometry::Boxed(BoxedGeometry {
                kind,
                width: 10.0,
                height: 10.0,
            }),
        )
        .with_z_index(ZIndex::new(z).unwrap())
    }
    fn manager() -> (Arc<InMemoryStore>, CommandManager) {
        let store = Arc::new(InMemoryStore::default());
        let manager = CommandManager::new(store.clone());
        (store, manager)
    }
    fn ordered_ids(store: &InMemoryStore) -> Vec<String> {
        let doc = store.doc();
        let ids = doc.ordered_shapes().ids();
        ids.iter().map(|id| id.to_string()).collect()
    }
    /// Shape content without the temporal counter, which undo doesn't rewind.
    fn shape_set(doc: &DrawingDocument) -> Vec<Shape> {
        doc.ordered_shapes().iter().map(|s| (**s).clone()).collect()
    }

    #[test]
    fn add_undo_redo_scenario() {
        let (store, mut manager) = manager();
        manager
            .apply(Command::add_shape(boxed("rect", BoxKind::Rect, "a0")))
            .unwrap();
        manager
            .apply(Command::add_shape(boxed("circle", BoxKind::Ellipse, "a1")))
            .unwrap();
        assert_eq!(ordered_ids(&store), ["rect", "circle"]);
        assert!(manager.undo());
        assert_eq!(ordered_ids(&store), ["rect"]);
        assert!(manager.redo());
        assert_eq!(ordered_ids(&store), ["rect", "circle"]);
    }
    #[test]
    fn empty_stacks() {
        let (_, mut manager) = manager();
        assert!(!manager.undo());
        assert!(!manager.redo());
        assert!(!manager.can_undo());
    }
    #[test]
    fn new_commit_clears_redo() {
        let (_, mut manager) = manager();
        manager
            .apply(Command::add_shape(boxed("a", BoxKind::Rect, "a0")))
            .unwrap();
        manager.undo();
        assert_eq!(manager.redo_count(), 1);
        manager
            .apply(Command::add_shape(boxed("b", BoxKind::Rect, "a0")))
            .unwrap();
        assert!(!manager.can_redo());
    }
    #[test]
    fn failed_apply_changes_nothing() {
        let (store, mut manager) = manager();
        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let _subscription = {
            let events = events.clone();
            store.subscribe(Arc::new(move |event: &StoreEvent| {
                events.lock().push(event.kind);
            }))
        };
        assert!(manager
            .apply(Command::delete_shape("missing".into()))
            .is_err());
        assert!(events.lock().is_empty());
        assert!(!manager.can_undo());

        manager
            .apply(Command::add_shape(boxed("a", BoxKind::Rect, "a0")))
            .unwrap();
        manager.undo();
        manager.redo();
        let names: Vec<_> = events.lock().iter().map(|k| k.as_ref().to_owned()).collect();
        assert_eq!(names, ["add-shape", "undo", "redo"]);
    }
    #[test]
    fn depth_limit_drops_oldest() {
        let (store, manager) = manager();
        let mut manager = manager.with_depth_limit(2);
        for (id, z) in [("a", "a0"), ("b", "a1"), ("c", "a2")] {
            manager
                .apply(Command::add_shape(boxed(id, BoxKind::Rect, z)))
                .unwrap();
        }
        assert_eq!(manager.undo_count(), 2);
        while manager.undo() {}
        assert_eq!(ordered_ids(&store), ["a"]);
    }
    #[test]
    fn undo_after_remote_edit_is_last_writer_wins() {
        let (store, mut manager) = manager();
        manager
            .apply(Command::add_shape(boxed("a", BoxKind::Rect, "a0")))
            .unwrap();
        manager
            .apply(Command::update_shape(
                "a".into(),
                ShapePatch {
                    transform: Some(Transform::from_translation([10.0, 0.0])),
                    ..ShapePatch::default()
                },
            ))
            .unwrap();
        // Remote replica restyles and moves the same shape.
        store.merge_remote(|doc| {
            let shape = doc.shape_mut(&"a".into()).unwrap();
            shape.transform.translation = [99.0, 0.0];
            shape.style.fill = Some(crate::color::Color::WHITE);
        });
        assert!(manager.undo());
        let doc = store.doc();
        let shape = doc.shape(&ShapeId::from("a")).unwrap();
        // Our field is restored, theirs is untouched.
        assert_eq!(shape.transform.translation, [0.0, 0.0]);
        assert_eq!(shape.style.fill, Some(crate::color::Color::WHITE));
    }
    #[test]
    fn redo_of_vanished_shape_is_dropped() {
        let (store, mut manager) = manager();
        manager
            .apply(Command::add_shape(boxed("a", BoxKind::Rect, "a0")))
            .unwrap();
        manager.apply(Command::delete_shape("a".into())).unwrap();
        manager.undo();
        store.merge_remote(|doc| {
            doc.remove(&"a".into());
        });
        // Redo of the delete no longer applies.
        assert!(manager.redo());
        assert_eq!(manager.undo_count(), 1);
        assert!(!manager.can_redo());
    }

    mod property {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u8),
            Delete(u8),
            Move(u8, f32),
        }
        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..6).prop_map(Op::Add),
                (0u8..6).prop_map(Op::Delete),
                (0u8..6, -100.0f32..100.0).prop_map(|(id, x)| Op::Move(id, x)),
            ]
        }

        proptest! {
            #[test]
            fn undo_all_then_redo_all(ops in proptest::collection::vec(op(), 1..24)) {
                let (store, mut manager) = manager();
                let before = shape_set(&store.doc());
                let mut applied = 0;
                for op in ops {
                    let command = match op {
                        Op::Add(id) => Command::add_shape(boxed(&format!("s{id}"), BoxKind::Rect, "a0")),
                        Op::Delete(id) => Command::delete_shape(format!("s{id}").into()),
                        Op::Move(id, x) => Command::update_shape(
                            format!("s{id}").into(),
                            ShapePatch { transform: Some(Transform::from_translation([x, 0.0])), ..ShapePatch::default() },
                        ),
                    };
                    // Commands invalid for the current state are refused and leave no history.
                    if manager.apply(command).is_ok() {
                        applied += 1;
                    }
                }
                let after = shape_set(&store.doc());
                for _ in 0..applied {
                    prop_assert!(manager.undo());
                }
                prop_assert!(!manager.undo());
                prop_assert_eq!(shape_set(&store.doc()), before);
                for _ in 0..applied {
                    prop_assert!(manager.redo());
                }
                prop_assert_eq!(shape_set(&store.doc()), after);
            }
        }
    }
}

//! # Commands
//!
//! Commands are the way the document is modified. Every committed edit is described as a command, which
//! carries enough information to be undone - an update remembers the values it overwrote, a delete remembers
//! the shape it removed. Those snapshots are filled in by [`Command::execute`] the first time the command runs.

use std::sync::Arc;

use crate::document::DrawingDocument;
use crate::geometry::Transform;
use crate::id::{LayerId, ShapeId};
use crate::shape::{Geometry, Interactions, Shape, Style};
use crate::store::EventKind;
use crate::zindex::ZIndex;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("command constructed for a state that does not match the current state")]
    MismatchedState,
    #[error("resource referenced by the command is not found")]
    UnknownResource,
    #[error("a shape with id {0} already exists")]
    DuplicateId(ShapeId),
}
pub trait CommandConsumer<C> {
    /// Apply a single command. If this generates an error,
    /// the state of `self` should *not* be relied upon - callers apply against a draft and discard it.
    fn apply(&mut self, command: DoUndo<'_, C>) -> Result<(), CommandError>;
}

/// A partial update of a shape. `None` fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapePatch {
    pub geometry: Option<Geometry>,
    pub style: Option<Style>,
    pub transform: Option<Transform>,
    pub z_index: Option<ZIndex>,
    /// `Some(None)` moves the shape to the base layer.
    pub layer_id: Option<Option<LayerId>>,
    pub interactions: Option<Interactions>,
}
impl ShapePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
    pub fn apply_to(&self, shape: &mut Shape) {
        if let Some(geometry) = &self.geometry {
            shape.geometry = geometry.clone();
        }
        if let Some(style) = self.style {
            shape.style = style;
        }
        if let Some(transform) = self.transform {
            shape.transform = transform;
        }
        if let Some(z_index) = &self.z_index {
            shape.z_index = z_index.clone();
        }
        if let Some(layer_id) = &self.layer_id {
            shape.layer_id = layer_id.clone();
        }
        if let Some(interactions) = self.interactions {
            shape.interactions = interactions;
        }
    }
    /// The current values in `shape` of every field this patch would set.
    #[must_use]
    pub fn snapshot_of(&self, shape: &Shape) -> Self {
        Self {
            geometry: self.geometry.as_ref().map(|_| shape.geometry.clone()),
            style: self.style.map(|_| shape.style),
            transform: self.transform.map(|_| shape.transform),
            z_index: self.z_index.as_ref().map(|_| shape.z_index.clone()),
            layer_id: self.layer_id.as_ref().map(|_| shape.layer_id.clone()),
            interactions: self.interactions.map(|_| shape.interactions),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    AddShape(Arc<Shape>),
    UpdateShape {
        id: ShapeId,
        patch: ShapePatch,
        /// Values overwritten by `patch`, captured on first execution.
        previous: Option<ShapePatch>,
    },
    DeleteShape {
        id: ShapeId,
        /// The removed shape, captured on first execution.
        removed: Option<Arc<Shape>>,
    },
    /// Insert a clear sentinel, hiding everything below it in paint order.
    ClearCanvas(Arc<Shape>),
    /// Many commands treated as one, as far as the user can tell. Undone in reverse.
    Batch(Box<[Command]>),
}
impl Command {
    #[must_use]
    pub fn add_shape(shape: Shape) -> Self {
        Self::AddShape(Arc::new(shape))
    }
    #[must_use]
    pub fn update_shape(id: ShapeId, patch: ShapePatch) -> Self {
        Self::UpdateShape {
            id,
            patch,
            previous: None,
        }
    }
    #[must_use]
    pub fn delete_shape(id: ShapeId) -> Self {
        Self::DeleteShape { id, removed: None }
    }
    #[must_use]
    pub fn clear_canvas(sentinel: Shape) -> Self {
        Self::ClearCanvas(Arc::new(sentinel))
    }
    pub fn batch(commands: impl IntoIterator<Item = Command>) -> Self {
        Self::Batch(commands.into_iter().collect())
    }
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AddShape(_) => EventKind::AddShape,
            Self::UpdateShape { .. } => EventKind::UpdateShape,
            Self::DeleteShape { .. } => EventKind::DeleteShape,
            Self::ClearCanvas(_) => EventKind::ClearCanvas,
            Self::Batch(_) => EventKind::Batch,
        }
    }
    /// Run the command forward for the first time, recording whatever it needs to be undone later.
    /// New shapes without a temporal order are given the document's next one.
    pub fn execute(&mut self, document: &mut DrawingDocument) -> Result<(), CommandError> {
        match self {
            Self::AddShape(shape) | Self::ClearCanvas(shape) => {
                if shape.temporal_order == 0 {
                    Arc::make_mut(shape).temporal_order = document.next_temporal_order();
                }
            }
            Self::UpdateShape {
                id,
                patch,
                previous,
            } => {
                let current = document.shape(id).ok_or(CommandError::UnknownResource)?;
                *previous = Some(patch.snapshot_of(current));
            }
            Self::DeleteShape { id, removed } => {
                *removed = Some(
                    document
                        .shape(id)
                        .cloned()
                        .ok_or(CommandError::UnknownResource)?,
                );
            }
            Self::Batch(commands) => {
                // Members must see the effects of those before them.
                for command in commands.iter_mut() {
                    command.execute(document)?;
                }
                return Ok(());
            }
        }
        document.apply(DoUndo::Do(&*self))
    }
}

#[derive(PartialEq, Eq)]
pub enum DoUndo<'c, T> {
    Do(&'c T),
    Undo(&'c T),
}
/// Forward application is strict: it refuses to add a duplicate or touch a missing shape.
///
/// Undo is a forward edit against whatever the document currently holds, and resolves conflicts with
/// other replicas as last-writer-wins per field: the undone fields are written back unconditionally, a shape
/// removed elsewhere in the meantime stays removed, and a deleted shape is restored over anything reusing its id.
impl CommandConsumer<Command> for DrawingDocument {
    fn apply(&mut self, command: DoUndo<'_, Command>) -> Result<(), CommandError> {
        match command {
            DoUndo::Do(Command::AddShape(shape) | Command::ClearCanvas(shape)) => {
                if self.contains(&shape.id) {
                    return Err(CommandError::DuplicateId(shape.id.clone()));
                }
                self.insert(shape.clone());
                Ok(())
            }
            DoUndo::Undo(Command::AddShape(shape) | Command::ClearCanvas(shape)) => {
                if self.remove(&shape.id).is_none() {
                    log::debug!("undo add: {} already removed", shape.id);
                }
                Ok(())
            }
            DoUndo::Do(Command::UpdateShape { id, patch, .. }) => {
                let shape = self.shape_mut(id).ok_or(CommandError::UnknownResource)?;
                patch.apply_to(shape);
                Ok(())
            }
            DoUndo::Undo(Command::UpdateShape { id, previous, .. }) => {
                let previous = previous.as_ref().ok_or(CommandError::MismatchedState)?;
                match self.shape_mut(id) {
                    Some(shape) => previous.apply_to(shape),
                    None => log::debug!("undo update: {id} was removed, nothing to restore"),
                }
                Ok(())
            }
            DoUndo::Do(Command::DeleteShape { id, .. }) => self
                .remove(id)
                .map(|_| ())
                .ok_or(CommandError::UnknownResource),
            DoUndo::Undo(Command::DeleteShape { removed, .. }) => {
                let removed = removed.as_ref().ok_or(CommandError::MismatchedState)?;
                if self.insert(removed.clone()).is_some() {
                    log::debug!("undo delete: {} overwrote a newer shape", removed.id);
                }
                Ok(())
            }
            DoUndo::Do(Command::Batch(commands)) => commands
                .iter()
                .try_for_each(|command| self.apply(DoUndo::Do(command))),
            DoUndo::Undo(Command::Batch(commands)) => commands
                .iter()
                .rev()
                .try_for_each(|command| self.apply(DoUndo::Undo(command))),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{Command, CommandConsumer, CommandError, DoUndo, ShapePatch};
    use crate::document::DrawingDocument;
    use crate::geometry::Transform;
    use crate::shape::{Geometry, PenGeometry, Shape};

    fn pen(id: &str) -> Shape {
        Shape::new(
            id.into(),
            Geometry::Pen(PenGeometry {
                points: vec![[0.0, 0.0], [1.0, 1.0]],
            }),
        )
    }
    fn moved(to: [f32; 2]) -> ShapePatch {
        ShapePatch {
            transform: Some(Transform::from_translation(to)),
            ..ShapePatch::default()
        }
    }

    #[test]
    fn execute_records_snapshots() {
        let mut document = DrawingDocument::default();
        let mut add = Command::add_shape(pen("a"));
        add.execute(&mut document).unwrap();
        let Command::AddShape(shape) = &add else {
            unreachable!()
        };
        assert_eq!(shape.temporal_order, 1);

        let mut update = Command::update_shape("a".into(), moved([3.0, 4.0]));
        update.execute(&mut document).unwrap();
        let Command::UpdateShape { previous, .. } = &update else {
            unreachable!()
        };
        assert_eq!(previous.as_ref().unwrap(), &moved([0.0, 0.0]));

        document.apply(DoUndo::Undo(&update)).unwrap();
        assert!(document.shape(&"a".into()).unwrap().transform.is_identity());
    }
    #[test]
    fn strict_forward() {
        let mut document = DrawingDocument::default();
        document.insert(Arc::new(pen("a")));
        assert_eq!(
            Command::add_shape(pen("a")).execute(&mut document),
            Err(CommandError::DuplicateId("a".into()))
        );
        assert_eq!(
            Command::delete_shape("b".into()).execute(&mut document),
            Err(CommandError::UnknownResource)
        );
        // Undo of a command never executed has nothing to restore.
        assert_eq!(
            document.apply(DoUndo::Undo(&Command::delete_shape("a".into()))),
            Err(CommandError::MismatchedState)
        );
    }
    #[test]
    fn batch_undoes_in_reverse() {
        let mut document = DrawingDocument::default();
        let mut batch = Command::batch([
            Command::add_shape(pen("a")),
            Command::update_shape("a".into(), moved([1.0, 0.0])),
            Command::update_shape("a".into(), moved([2.0, 0.0])),
        ]);
        batch.execute(&mut document).unwrap();
        assert_eq!(
            document.shape(&"a".into()).unwrap().transform.translation,
            [2.0, 0.0]
        );
        document.apply(DoUndo::Undo(&batch)).unwrap();
        assert!(document.is_empty());
        document.apply(DoUndo::Do(&batch)).unwrap();
        assert_eq!(
            document.shape(&"a".into()).unwrap().transform.translation,
            [2.0, 0.0]
        );
    }
    #[test]
    fn undo_tolerates_remote_removal() {
        let mut document = DrawingDocument::default();
        Command::add_shape(pen("a"))
            .execute(&mut document)
            .unwrap();
        let mut update = Command::update_shape("a".into(), moved([5.0, 5.0]));
        update.execute(&mut document).unwrap();
        // Another replica deletes it.
        document.remove(&"a".into());
        document.apply(DoUndo::Undo(&update)).unwrap();
        assert!(document.is_empty());
    }
    #[test]
    fn patch_snapshot_only_touched_fields() {
        let shape = pen("a");
        let patch = moved([1.0, 1.0]);
        let snapshot = patch.snapshot_of(&shape);
        assert!(snapshot.geometry.is_none());
        assert_eq!(snapshot.transform, Some(Transform::IDENTITY));
        assert!(ShapePatch::default().is_empty());
    }
}

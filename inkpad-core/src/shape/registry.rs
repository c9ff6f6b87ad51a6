//! # Shape handler registry
//!
//! Maps a [`ShapeKind`] to the bundle of capabilities for that kind. Every operation that needs to know
//! what a shape *is* goes through here, so adding a kind means registering a handler, not hunting down matches.

use super::{Geometry, Shape, ShapeKind};
use crate::geometry::{to_local, Aabb};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

#[derive(Copy, Clone)]
pub struct GeometryHandler {
    /// Bounds in shape-local space, including stroke width. None for shapes with no area.
    pub local_bounds: fn(&Shape) -> Option<Aabb>,
    /// Normalize the payload without changing what is drawn (eg. flip negative sizes).
    pub canonicalize: fn(Shape) -> Shape,
}
#[derive(Copy, Clone)]
pub struct HitHandler {
    /// Test a point already mapped into shape-local space.
    pub hit_test_local: fn(&Shape, [f32; 2]) -> bool,
}
#[derive(Copy, Clone)]
pub struct SelectionHandler {
    /// Whether the kind resizes when the shape carries no override.
    pub resizable_by_default: bool,
    pub rotatable_by_default: bool,
    /// Resize the local geometry to `[width, height]`, keeping the local top-left fixed.
    pub resize: fn(&Shape, [f32; 2]) -> Shape,
    /// Resize along one axis only.
    pub axis_resize: fn(&Shape, Axis, f32) -> Shape,
}
#[derive(Copy, Clone)]
pub struct SerializationHandler {
    pub to_json: fn(&Geometry) -> serde_json::Value,
    pub from_json: fn(serde_json::Value) -> Result<Geometry, serde_json::Error>,
}

/// Capability bundle for one shape kind.
#[derive(Copy, Clone)]
pub struct ShapeHandler {
    pub kind: ShapeKind,
    pub geometry: GeometryHandler,
    pub shape: HitHandler,
    pub selection: SelectionHandler,
    pub serialization: SerializationHandler,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no handler registered for {0} shapes")]
    UnknownKind(ShapeKind),
    #[error("shape does not allow resizing")]
    NotResizable,
}

#[derive(Clone, Default)]
pub struct ShapeHandlerRegistry {
    handlers: hashbrown::HashMap<ShapeKind, ShapeHandler>,
}
impl ShapeHandlerRegistry {
    /// A registry with no handlers at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
    /// A registry with every built-in kind registered.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(super::pen::HANDLER);
        registry.register(super::boxed::HANDLER);
        registry.register(super::stamp::HANDLER);
        registry.register(super::clear::HANDLER);
        registry
    }
    /// Insert a handler, returning the one it replaced.
    pub fn register(&mut self, handler: ShapeHandler) -> Option<ShapeHandler> {
        self.handlers.insert(handler.kind, handler)
    }
    pub fn unregister(&mut self, kind: ShapeKind) -> Option<ShapeHandler> {
        self.handlers.remove(&kind)
    }
    #[must_use]
    pub fn get(&self, kind: ShapeKind) -> Option<&ShapeHandler> {
        self.handlers.get(&kind)
    }
    #[must_use]
    pub fn handler_for(&self, shape: &Shape) -> Option<&ShapeHandler> {
        self.get(shape.kind())
    }
    /// Axis-aligned bounds in document space under the shape's full transform.
    /// None for shapes with no area, or of an unregistered kind.
    #[must_use]
    pub fn bounds(&self, shape: &Shape) -> Option<Aabb> {
        let local = (self.handler_for(shape)?.geometry.local_bounds)(shape)?;
        Some(shape.transform.matrix().apply_aabb(&local))
    }
    /// Whether a document-space point touches the shape.
    #[must_use]
    pub fn hit_test(&self, shape: &Shape, point: [f32; 2]) -> bool {
        let Some(handler) = self.handler_for(shape) else {
            return false;
        };
        // Singular transforms squash the shape to nothing - nothing to hit.
        let Some(local) = to_local(&shape.transform, point) else {
            return false;
        };
        (handler.shape.hit_test_local)(shape, local)
    }
    /// Normalize a shape's payload. Shapes of unknown kind pass through untouched.
    #[must_use]
    pub fn canonicalize(&self, shape: Shape) -> Shape {
        match self.handler_for(&shape) {
            Some(handler) => (handler.geometry.canonicalize)(shape),
            None => shape,
        }
    }
    pub fn can_resize(&self, shape: &Shape) -> Result<bool, SelectionError> {
        let handler = self
            .handler_for(shape)
            .ok_or(SelectionError::UnknownKind(shape.kind()))?;
        Ok(shape
            .interactions
            .resizable
            .unwrap_or(handler.selection.resizable_by_default))
    }
    pub fn can_rotate(&self, shape: &Shape) -> Result<bool, SelectionError> {
        let handler = self
            .handler_for(shape)
            .ok_or(SelectionError::UnknownKind(shape.kind()))?;
        Ok(shape
            .interactions
            .rotatable
            .unwrap_or(handler.selection.rotatable_by_default))
    }
    pub fn resize(&self, shape: &Shape, size: [f32; 2]) -> Result<Shape, SelectionError> {
        let handler = self.resizable_handler(shape)?;
        Ok((handler.selection.resize)(shape, size))
    }
    pub fn axis_resize(
        &self,
        shape: &Shape,
        axis: Axis,
        length: f32,
    ) -> Result<Shape, SelectionError> {
        let handler = self.resizable_handler(shape)?;
        Ok((handler.selection.axis_resize)(shape, axis, length))
    }
    fn resizable_handler(&self, shape: &Shape) -> Result<&ShapeHandler, SelectionError> {
        if !self.can_resize(shape)? {
            return Err(SelectionError::NotResizable);
        }
        self.handler_for(shape)
            .ok_or(SelectionError::UnknownKind(shape.kind()))
    }
}

/// Resize on one axis by way of a full resize, keeping the other axis' current local extent.
pub(super) fn axis_resize_via(
    resize: fn(&Shape, [f32; 2]) -> Shape,
    local_size: [f32; 2],
    shape: &Shape,
    axis: Axis,
    length: f32,
) -> Shape {
    let size = match axis {
        Axis::X => [length, local_size[1]],
        Axis::Y => [local_size[0], length],
    };
    resize(shape, size)
}

//! # Shapes
//!
//! The closed set of things a drawing is made of. Each kind's behavior (bounds, hit testing, resizing,
//! JSON payload) lives in its own module and is reached through the [`registry::ShapeHandlerRegistry`],
//! so code outside this module never matches on the geometry payload.

pub mod boxed;
pub mod clear;
pub mod json;
pub mod pen;
pub mod registry;
pub mod stamp;

use crate::color::Color;
use crate::geometry::Transform;
use crate::id::{LayerId, ShapeId};
use crate::zindex::ZIndex;

pub use boxed::{BoxKind, BoxedGeometry};
pub use pen::PenGeometry;
pub use registry::ShapeHandlerRegistry;
pub use stamp::StampGeometry;

/// Type tag of a shape, as written in the `"type"` field of its JSON.
#[derive(
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
    strum::Display,
    PartialEq,
    Eq,
    Copy,
    Clone,
    Hash,
    Debug,
)]
#[strum(serialize_all = "lowercase")]
pub enum ShapeKind {
    Pen,
    Boxed,
    Stamp,
    /// Sentinel which supersedes everything painted before it. Has no geometry.
    Clear,
}

/// Kind-specific payload of a shape, in shape-local space.
#[derive(Clone, PartialEq, Debug)]
pub enum Geometry {
    Pen(PenGeometry),
    Boxed(BoxedGeometry),
    Stamp(StampGeometry),
    Clear,
}
impl Geometry {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Pen(_) => ShapeKind::Pen,
            Self::Boxed(_) => ShapeKind::Boxed,
            Self::Stamp(_) => ShapeKind::Stamp,
            Self::Clear => ShapeKind::Clear,
        }
    }
}

/// How a stroke's pixels combine with what is already painted.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Composite {
    #[default]
    SourceOver,
    /// Erase - removes coverage from everything painted earlier in the same surface.
    DestinationOut,
}
impl Composite {
    fn is_default(&self) -> bool {
        *self == Self::SourceOver
    }
}

#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    #[serde(default, skip_serializing_if = "Composite::is_default")]
    pub composite: Composite,
}
impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 4.0,
            composite: Composite::SourceOver,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}
impl Style {
    /// Width the stroke extends past the geometry on each side.
    #[must_use]
    pub fn half_stroke_width(&self) -> f32 {
        self.stroke.map_or(0.0, |stroke| stroke.width.abs() / 2.0)
    }
}

/// Per-shape overrides of what selection may do with it. `None` defers to the kind's default.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Interactions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotatable: Option<bool>,
}
impl Interactions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resizable.is_none() && self.rotatable.is_none()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Shape {
    pub id: ShapeId,
    pub geometry: Geometry,
    pub style: Style,
    pub transform: Transform,
    pub z_index: ZIndex,
    /// Layer this shape paints into, or None for the document's base layer.
    pub layer_id: Option<LayerId>,
    /// Tie-break for equal z-indices, assigned from the document's counter.
    pub temporal_order: u64,
    pub interactions: Interactions,
}
impl Shape {
    /// A shape with default style and placement.
    #[must_use]
    pub fn new(id: ShapeId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            style: Style::default(),
            transform: Transform::IDENTITY,
            z_index: ZIndex::default(),
            layer_id: None,
            temporal_order: 0,
            interactions: Interactions::default(),
        }
    }
    /// The sentinel which visually clears everything below it in paint order.
    #[must_use]
    pub fn clear_sentinel(id: ShapeId, z_index: ZIndex) -> Self {
        Self {
            z_index,
            ..Self::new(id, Geometry::Clear)
        }
    }
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }
    #[must_use]
    pub fn is_clear(&self) -> bool {
        matches!(self.geometry, Geometry::Clear)
    }
    #[must_use]
    pub fn with_style(self, style: Style) -> Self {
        Self { style, ..self }
    }
    #[must_use]
    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }
    #[must_use]
    pub fn with_z_index(self, z_index: ZIndex) -> Self {
        Self { z_index, ..self }
    }
    #[must_use]
    pub fn in_layer(self, layer_id: LayerId) -> Self {
        Self {
            layer_id: Some(layer_id),
            ..self
        }
    }
}

/// Panic for a handler given another kind's payload. This is always a programming error -
/// the registry only routes shapes to the handler registered for their own kind.
#[track_caller]
fn wrong_geometry(expected: ShapeKind, got: &Geometry) -> ! {
    panic!(
        "{expected} handler received {} geometry",
        got.kind().as_ref()
    )
}

//! Stamps: a named glyph or emoji drawn into a square of side `size`, centred on the local origin.

use super::registry::{
    Axis, GeometryHandler, HitHandler, SelectionHandler, SerializationHandler, ShapeHandler,
};
use super::{wrong_geometry, Geometry, Shape, ShapeKind};
use crate::geometry::Aabb;

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct StampGeometry {
    /// Name of the stamp in the renderer's catalog.
    pub stamp: String,
    pub size: f32,
}
impl StampGeometry {
    #[must_use]
    pub fn local_box(&self) -> Aabb {
        let half = self.size.abs() / 2.0;
        Aabb::from_corners([-half, -half], [half, half])
    }
}

pub const HANDLER: ShapeHandler = ShapeHandler {
    kind: ShapeKind::Stamp,
    geometry: GeometryHandler {
        local_bounds,
        canonicalize,
    },
    shape: HitHandler {
        hit_test_local: hit_test,
    },
    selection: SelectionHandler {
        resizable_by_default: true,
        rotatable_by_default: true,
        resize,
        axis_resize,
    },
    serialization: SerializationHandler {
        to_json,
        from_json,
    },
};

#[track_caller]
fn expect(geometry: &Geometry) -> &StampGeometry {
    match geometry {
        Geometry::Stamp(stamp) => stamp,
        other => wrong_geometry(ShapeKind::Stamp, other),
    }
}

fn local_bounds(shape: &Shape) -> Option<Aabb> {
    Some(expect(&shape.geometry).local_box())
}

fn hit_test(shape: &Shape, point: [f32; 2]) -> bool {
    expect(&shape.geometry).local_box().contains(point)
}

fn canonicalize(mut shape: Shape) -> Shape {
    match &mut shape.geometry {
        Geometry::Stamp(stamp) => stamp.size = stamp.size.abs(),
        other => wrong_geometry(ShapeKind::Stamp, other),
    }
    shape
}

/// Stamps stay square, so the larger requested side wins.
fn resize(shape: &Shape, size: [f32; 2]) -> Shape {
    let stamp = expect(&shape.geometry);
    Shape {
        geometry: Geometry::Stamp(StampGeometry {
            stamp: stamp.stamp.clone(),
            size: size[0].abs().max(size[1].abs()),
        }),
        ..shape.clone()
    }
}

fn axis_resize(shape: &Shape, _axis: Axis, length: f32) -> Shape {
    resize(shape, [length, length])
}

fn to_json(geometry: &Geometry) -> serde_json::Value {
    serde_json::to_value(expect(geometry)).unwrap_or_default()
}

fn from_json(value: serde_json::Value) -> Result<Geometry, serde_json::Error> {
    Ok(Geometry::Stamp(serde_json::from_value(value)?))
}

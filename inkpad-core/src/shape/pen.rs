//! Freehand strokes - a polyline drawn with the shape's stroke style.

use super::registry::{
    axis_resize_via, Axis, GeometryHandler, HitHandler, SelectionHandler, SerializationHandler,
    ShapeHandler,
};
use super::{wrong_geometry, Geometry, Shape, ShapeKind};
use crate::geometry::{distance_sq_to_segment, Aabb};

/// Extra slop around thin strokes, so a hairline can still be picked.
const HIT_TOLERANCE: f32 = 0.5;

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PenGeometry {
    pub points: Vec<[f32; 2]>,
}
impl PenGeometry {
    /// Total length of the polyline.
    #[must_use]
    pub fn arc_length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| {
                let d = [pair[1][0] - pair[0][0], pair[1][1] - pair[0][1]];
                (d[0] * d[0] + d[1] * d[1]).sqrt()
            })
            .sum()
    }
    /// Whether the stroke covers more than a single spot.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        match self.points.first() {
            None => true,
            Some(first) => self.points.iter().all(|p| p == first),
        }
    }
}

pub const HANDLER: ShapeHandler = ShapeHandler {
    kind: ShapeKind::Pen,
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
fn expect(geometry: &Geometry) -> &PenGeometry {
    match geometry {
        Geometry::Pen(pen) => pen,
        other => wrong_geometry(ShapeKind::Pen, other),
    }
}

fn local_bounds(shape: &Shape) -> Option<Aabb> {
    let pen = expect(&shape.geometry);
    Some(Aabb::from_points(&pen.points)?.outset(shape.style.half_stroke_width()))
}

fn hit_test(shape: &Shape, point: [f32; 2]) -> bool {
    let pen = expect(&shape.geometry);
    let reach = shape.style.half_stroke_width() + HIT_TOLERANCE;
    let reach_sq = reach * reach;
    match pen.points.as_slice() {
        [] => false,
        [only] => distance_sq_to_segment(point, *only, *only) <= reach_sq,
        points => points
            .windows(2)
            .any(|pair| distance_sq_to_segment(point, pair[0], pair[1]) <= reach_sq),
    }
}

fn canonicalize(mut shape: Shape) -> Shape {
    match &mut shape.geometry {
        Geometry::Pen(pen) => pen.points.dedup(),
        other => wrong_geometry(ShapeKind::Pen, other),
    }
    shape
}

/// Scale the points about the top-left of their extent so the extent becomes `size`.
fn resize(shape: &Shape, size: [f32; 2]) -> Shape {
    let pen = expect(&shape.geometry);
    let Some(extent) = Aabb::from_points(&pen.points) else {
        return shape.clone();
    };
    // A flat axis can't be stretched - leave it alone rather than divide by zero.
    let factor = |new: f32, old: f32| if old > 0.0 { new / old } else { 1.0 };
    let fx = factor(size[0], extent.width());
    let fy = factor(size[1], extent.height());
    let points = pen
        .points
        .iter()
        .map(|p| {
            [
                extent.min[0] + (p[0] - extent.min[0]) * fx,
                extent.min[1] + (p[1] - extent.min[1]) * fy,
            ]
        })
        .collect();
    Shape {
        geometry: Geometry::Pen(PenGeometry { points }),
        ..shape.clone()
    }
}

fn axis_resize(shape: &Shape, axis: Axis, length: f32) -> Shape {
    let pen = expect(&shape.geometry);
    let extent = Aabb::from_points(&pen.points).map_or([0.0; 2], |e| [e.width(), e.height()]);
    axis_resize_via(resize, extent, shape, axis, length)
}

fn to_json(geometry: &Geometry) -> serde_json::Value {
    // Serializing plain floats can't fail.
    serde_json::to_value(expect(geometry)).unwrap_or_default()
}

fn from_json(value: serde_json::Value) -> Result<Geometry, serde_json::Error> {
    Ok(Geometry::Pen(serde_json::from_value(value)?))
}

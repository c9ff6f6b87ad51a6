//! Primitives defined by a box - rectangles and ellipses. The box spans local `(0,0)..(width,height)`.

use super::registry::{
    axis_resize_via, Axis, GeometryHandler, HitHandler, SelectionHandler, SerializationHandler,
    ShapeHandler,
};
use super::{wrong_geometry, Geometry, Shape, ShapeKind};
use crate::geometry::Aabb;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxKind {
    Rect,
    Ellipse,
}

#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct BoxedGeometry {
    pub kind: BoxKind,
    pub width: f32,
    pub height: f32,
}
impl BoxedGeometry {
    #[must_use]
    pub fn local_box(&self) -> Aabb {
        Aabb::from_corners([0.0, 0.0], [self.width, self.height])
    }
    /// Zero area - nothing would be drawn but a stroke outline collapsed to a line.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

pub const HANDLER: ShapeHandler = ShapeHandler {
    kind: ShapeKind::Boxed,
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
fn expect(geometry: &Geometry) -> &BoxedGeometry {
    match geometry {
        Geometry::Boxed(boxed) => boxed,
        other => wrong_geometry(ShapeKind::Boxed, other),
    }
}

fn local_bounds(shape: &Shape) -> Option<Aabb> {
    let boxed = expect(&shape.geometry);
    Some(boxed.local_box().outset(shape.style.half_stroke_width()))
}

fn hit_test(shape: &Shape, point: [f32; 2]) -> bool {
    let boxed = expect(&shape.geometry);
    let reach = shape.style.half_stroke_width();
    let local = boxed.local_box();
    match boxed.kind {
        BoxKind::Rect => local.outset(reach).contains(point),
        BoxKind::Ellipse => {
            let [cx, cy] = local.center();
            let rx = local.width() / 2.0 + reach;
            let ry = local.height() / 2.0 + reach;
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            let dx = (point[0] - cx) / rx;
            let dy = (point[1] - cy) / ry;
            dx * dx + dy * dy <= 1.0
        }
    }
}

/// Flip negative extents into the transform's origin, so the box always spans positive local space.
fn canonicalize(mut shape: Shape) -> Shape {
    let boxed = match &mut shape.geometry {
        Geometry::Boxed(boxed) => boxed,
        other => wrong_geometry(ShapeKind::Boxed, other),
    };
    // Local point p maps to p - (w, 0) in the flipped box, so the pivot moves the same way.
    if boxed.width < 0.0 {
        shape.transform.origin[0] -= boxed.width;
        boxed.width = -boxed.width;
    }
    if boxed.height < 0.0 {
        shape.transform.origin[1] -= boxed.height;
        boxed.height = -boxed.height;
    }
    shape
}

fn resize(shape: &Shape, size: [f32; 2]) -> Shape {
    let boxed = expect(&shape.geometry);
    Shape {
        geometry: Geometry::Boxed(BoxedGeometry {
            width: size[0],
            height: size[1],
            ..*boxed
        }),
        ..shape.clone()
    }
}

fn axis_resize(shape: &Shape, axis: Axis, length: f32) -> Shape {
    let boxed = expect(&shape.geometry);
    axis_resize_via(resize, [boxed.width, boxed.height], shape, axis, length)
}

fn to_json(geometry: &Geometry) -> serde_json::Value {
    serde_json::to_value(expect(geometry)).unwrap_or_default()
}

fn from_json(value: serde_json::Value) -> Result<Geometry, serde_json::Error> {
    Ok(Geometry::Boxed(serde_json::from_value(value)?))
}

#[cfg(test)]
mod test {
    use super::{BoxKind, BoxedGeometry, HANDLER};
    use crate::geometry::Transform;
    use crate::shape::{Geometry, Shape};

    fn boxed(kind: BoxKind, width: f32, height: f32) -> Shape {
        Shape::new(
            "box".into(),
            Geometry::Boxed(BoxedGeometry {
                kind,
                width,
                height,
            }),
        )
    }

    #[test]
    fn ellipse_hits_inside_only() {
        let ellipse = boxed(BoxKind::Ellipse, 20.0, 10.0);
        let hit = HANDLER.shape.hit_test_local;
        assert!(hit(&ellipse, [10.0, 5.0]));
        assert!(hit(&ellipse, [19.0, 5.0]));
        // Inside the box, outside the ellipse.
        assert!(!hit(&ellipse, [1.0, 1.0]));
        assert!(hit(&boxed(BoxKind::Rect, 20.0, 10.0), [1.0, 1.0]));
    }
    #[test]
    fn canonicalize_preserves_placement() {
        let shape = boxed(BoxKind::Rect, -10.0, 5.0).with_transform(Transform {
            translation: [100.0, 0.0],
            ..Transform::IDENTITY
        });
        let before = shape.transform.matrix().apply_aabb(&crate::geometry::Aabb::from_corners(
            [0.0, 0.0],
            [-10.0, 5.0],
        ));
        let canonical = (HANDLER.geometry.canonicalize)(shape);
        let Geometry::Boxed(geometry) = canonical.geometry else {
            unreachable!()
        };
        assert_eq!(geometry.width, 10.0);
        let after = canonical.transform.matrix().apply_aabb(&geometry.local_box());
        assert_eq!(before, after);
    }
    #[test]
    fn degenerate() {
        let Geometry::Boxed(geometry) = boxed(BoxKind::Rect, 0.0, 5.0).geometry else {
            unreachable!()
        };
        assert!(geometry.is_degenerate());
    }
}

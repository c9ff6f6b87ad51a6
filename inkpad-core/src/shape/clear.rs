//! The clear sentinel. Occupies a slot in paint order but has no area, so it can't be hit, selected, or resized.

use super::registry::{
    Axis, GeometryHandler, HitHandler, SelectionHandler, SerializationHandler, ShapeHandler,
};
use super::{wrong_geometry, Geometry, Shape, ShapeKind};
use crate::geometry::Aabb;

pub const HANDLER: ShapeHandler = ShapeHandler {
    kind: ShapeKind::Clear,
    geometry: GeometryHandler {
        local_bounds,
        canonicalize,
    },
    shape: HitHandler {
        hit_test_local: hit_test,
    },
    selection: SelectionHandler {
        resizable_by_default: false,
        rotatable_by_default: false,
        resize,
        axis_resize,
    },
    serialization: SerializationHandler {
        to_json,
        from_json,
    },
};

#[track_caller]
fn expect(geometry: &Geometry) {
    if !matches!(geometry, Geometry::Clear) {
        wrong_geometry(ShapeKind::Clear, geometry)
    }
}

fn local_bounds(shape: &Shape) -> Option<Aabb> {
    expect(&shape.geometry);
    None
}
fn hit_test(shape: &Shape, _: [f32; 2]) -> bool {
    expect(&shape.geometry);
    false
}
fn canonicalize(shape: Shape) -> Shape {
    expect(&shape.geometry);
    shape
}
fn resize(shape: &Shape, _: [f32; 2]) -> Shape {
    expect(&shape.geometry);
    shape.clone()
}
fn axis_resize(shape: &Shape, _: Axis, _: f32) -> Shape {
    resize(shape, [0.0; 2])
}
fn to_json(geometry: &Geometry) -> serde_json::Value {
    expect(geometry);
    serde_json::Value::Object(serde_json::Map::new())
}
/// Accepts `{}` or `null`. Anything else is a payload meant for another kind.
fn from_json(value: serde_json::Value) -> Result<Geometry, serde_json::Error> {
    match value {
        serde_json::Value::Null => Ok(Geometry::Clear),
        serde_json::Value::Object(map) if map.is_empty() => Ok(Geometry::Clear),
        other => Err(serde::de::Error::custom(format!(
            "clear shapes carry no geometry, got {other}"
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::HANDLER;
    use crate::shape::Geometry;

    #[test]
    fn json_payload() {
        assert_eq!(
            (HANDLER.serialization.to_json)(&Geometry::Clear),
            serde_json::json!({})
        );
        assert_eq!(
            (HANDLER.serialization.from_json)(serde_json::Value::Null).unwrap(),
            Geometry::Clear
        );
        assert!((HANDLER.serialization.from_json)(serde_json::json!({"points": []})).is_err());
    }
}

//! Persisted form of a shape.
//!
//! The envelope fields are plain serde, while the `geometry` payload is opaque JSON produced and consumed
//! by the kind's [`SerializationHandler`](super::registry::SerializationHandler).

use super::registry::ShapeHandlerRegistry;
use super::{Interactions, Shape, ShapeKind, Style};
use crate::geometry::Transform;
use crate::id::{LayerId, ShapeId};
use crate::zindex::ZIndex;

#[derive(thiserror::Error, Debug)]
pub enum ShapeJsonError {
    #[error("unknown shape type {0:?}")]
    UnknownType(String),
    #[error("no handler registered for {0} shapes")]
    Unregistered(ShapeKind),
    #[error("bad {kind} geometry: {source}")]
    Payload {
        kind: ShapeKind,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Malformed(#[from] serde_json::Error),
}

/// `{id, type, geometry, style, transform?, zIndex, layerId?, temporalOrder?, interactions?}`
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: serde_json::Value,
    #[serde(default)]
    pub style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    pub z_index: ZIndex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<LayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_order: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Interactions>,
}

impl ShapeHandlerRegistry {
    pub fn to_record(&self, shape: &Shape) -> Result<ShapeRecord, ShapeJsonError> {
        let kind = shape.kind();
        let handler = self.get(kind).ok_or(ShapeJsonError::Unregistered(kind))?;
        Ok(ShapeRecord {
            id: shape.id.clone(),
            kind: kind.as_ref().to_owned(),
            geometry: (handler.serialization.to_json)(&shape.geometry),
            style: shape.style,
            transform: (!shape.transform.is_identity()).then_some(shape.transform),
            z_index: shape.z_index.clone(),
            layer_id: shape.layer_id.clone(),
            temporal_order: Some(shape.temporal_order),
            interactions: (!shape.interactions.is_empty()).then_some(shape.interactions),
        })
    }
    pub fn from_record(&self, record: ShapeRecord) -> Result<Shape, ShapeJsonError> {
        let kind: ShapeKind = record
            .kind
            .parse()
            .map_err(|_| ShapeJsonError::UnknownType(record.kind.clone()))?;
        let handler = self.get(kind).ok_or(ShapeJsonError::Unregistered(kind))?;
        let geometry = (handler.serialization.from_json)(record.geometry)
            .map_err(|source| ShapeJsonError::Payload { kind, source })?;
        Ok(Shape {
            id: record.id,
            geometry,
            style: record.style,
            transform: record.transform.unwrap_or_default(),
            z_index: record.z_index,
            layer_id: record.layer_id,
            temporal_order: record.temporal_order.unwrap_or_default(),
            interactions: record.interactions.unwrap_or_default(),
        })
    }
    pub fn to_json(&self, shape: &Shape) -> Result<serde_json::Value, ShapeJsonError> {
        Ok(serde_json::to_value(self.to_record(shape)?)?)
    }
    pub fn from_json(&self, value: serde_json::Value) -> Result<Shape, ShapeJsonError> {
        self.from_record(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod test {
    use super::ShapeJsonError;
    use crate::color::Color;
    use crate::geometry::Transform;
    use crate::shape::{
        BoxKind, BoxedGeometry, Composite, Geometry, PenGeometry, Shape, ShapeHandlerRegistry,
        StampGeometry, Stroke, Style,
    };
    use crate::zindex::ZIndex;

    fn sample_shapes() -> Vec<Shape> {
        let mut eraser = Shape::new(
            "pen_1".into(),
            Geometry::Pen(PenGeometry {
                points: vec![[0.0, 0.0], [10.5, -3.25]],
            }),
        )
        .with_style(Style {
            stroke: Some(Stroke {
                color: Color::WHITE,
                width: 12.0,
                composite: Composite::DestinationOut,
            }),
            fill: None,
        })
        .in_layer("layer_1".into());
        eraser.temporal_order = 7;
        eraser.interactions.rotatable = Some(false);

        let ellipse = Shape::new(
            "boxed_1".into(),
            Geometry::Boxed(BoxedGeometry {
                kind: BoxKind::Ellipse,
                width: 40.0,
                height: 20.0,
            }),
        )
        .with_style(Style {
            stroke: None,
            fill: Some(Color::from_rgba8(255, 0, 0, 128)),
        })
        .with_transform(Transform {
            translation: [5.0, 6.0],
            rotation: 0.5,
            scale: [2.0, 2.0],
            origin: [20.0, 10.0],
        })
        .with_z_index(ZIndex::new("a05").unwrap());

        let stamp = Shape::new(
            "stamp_1".into(),
            Geometry::Stamp(StampGeometry {
                stamp: "star".into(),
                size: 32.0,
            }),
        );
        let clear = Shape::clear_sentinel("clear_1".into(), ZIndex::new("b").unwrap());
        vec![eraser, ellipse, stamp, clear]
    }

    #[test]
    fn round_trip_every_kind() {
        let registry = ShapeHandlerRegistry::standard();
        for shape in sample_shapes() {
            let value = registry.to_json(&shape).unwrap();
            // Through text too, as it would be persisted.
            let text = serde_json::to_string(&value).unwrap();
            let parsed = registry
                .from_json(serde_json::from_str(&text).unwrap())
                .unwrap();
            assert_eq!(parsed, shape);
        }
    }
    #[test]
    fn optional_fields_omitted() {
        let registry = ShapeHandlerRegistry::standard();
        let shape = &sample_shapes()[2];
        let value = registry.to_json(shape).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "stamp_1",
                "type": "stamp",
                "geometry": {"stamp": "star", "size": 32.0},
                "style": {},
                "zIndex": "a0",
                "temporalOrder": 0,
            })
        );
    }
    #[test]
    fn minimal_record_fills_defaults() {
        let registry = ShapeHandlerRegistry::standard();
        let shape = registry
            .from_json(serde_json::json!({
                "id": "r",
                "type": "boxed",
                "geometry": {"kind": "rect", "width": 1.0, "height": 2.0},
                "zIndex": "a1",
            }))
            .unwrap();
        assert_eq!(shape.transform, Transform::IDENTITY);
        assert_eq!(shape.temporal_order, 0);
    }
    #[test]
    fn rejects_bad_input() {
        let registry = ShapeHandlerRegistry::standard();
        let unknown = registry.from_json(serde_json::json!({
            "id": "x", "type": "hexagon", "geometry": {}, "zIndex": "a0",
        }));
        assert!(matches!(unknown, Err(ShapeJsonError::UnknownType(t)) if t == "hexagon"));

        let mismatched = registry.from_json(serde_json::json!({
            "id": "x", "type": "pen", "geometry": {"stamp": "star", "size": 1.0}, "zIndex": "a0",
        }));
        assert!(matches!(mismatched, Err(ShapeJsonError::Payload { .. })));
    }
}

//! Layers group shapes for paint ordering. A shape's layer key sorts before its own z-index.

use crate::id::LayerId;
use crate::zindex::ZIndex;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    Drawing,
    /// Holds a single raster image beneath the drawing.
    Image,
}

/// Reference to an externally stored image, with its placement size in document units.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageRef {
    pub source: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingLayer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub z_index: ZIndex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}
impl DrawingLayer {
    #[must_use]
    pub fn drawing(id: LayerId, z_index: ZIndex) -> Self {
        Self {
            id,
            kind: LayerKind::Drawing,
            z_index,
            image: None,
        }
    }
    #[must_use]
    pub fn image(id: LayerId, z_index: ZIndex, image: ImageRef) -> Self {
        Self {
            id,
            kind: LayerKind::Image,
            z_index,
            image: Some(image),
        }
    }
}

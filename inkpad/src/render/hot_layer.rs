//! The hot layer: in-progress drafts, redrawn over the tile mosaic on every frame while a tool is drafting.
//! Drafts never reach the tile cache.

use inkpad_core::color::Color;
use inkpad_core::geometry::Aabb;
use inkpad_core::shape::{Composite, Shape};

use super::draw::{to_skia, DrawRegistry};
use crate::config::DebugOverlays;
use crate::tools::Draft;

/// Erasing would punch through the composited frame, so erasers preview as this instead.
const ERASER_PREVIEW: Color = Color::from_rgba8(128, 128, 128, 128);
const GRID_COLOR: Color = Color::from_rgba8(0, 128, 255, 160);
const HINT_COLOR: Color = Color::from_rgba8(255, 0, 200, 200);

#[derive(Default)]
pub struct HotLayer {
    drafts: Vec<Draft>,
    preview: Option<Aabb>,
    overlays: DebugOverlays,
}
impl HotLayer {
    #[must_use]
    pub fn new(overlays: DebugOverlays) -> Self {
        Self {
            overlays,
            ..Default::default()
        }
    }
    /// Replace the draft belonging to `tool_id`.
    pub fn set_draft(&mut self, tool_id: &'static str, shape: Shape) {
        let draft = Draft {
            tool_id,
            shape,
            temporary: true,
        };
        match self.drafts.iter_mut().find(|d| d.tool_id == tool_id) {
            Some(existing) => *existing = draft,
            None => self.drafts.push(draft),
        }
    }
    /// Drop every draft and the preview hint. Returns whether there was anything to drop.
    pub fn clear(&mut self) -> bool {
        let had_any = self.is_active() || self.preview.is_some();
        self.drafts.clear();
        self.preview = None;
        had_any
    }
    pub fn set_preview(&mut self, hint: Option<Aabb>) {
        self.preview = hint;
    }
    #[must_use]
    pub fn preview(&self) -> Option<Aabb> {
        self.preview
    }
    #[must_use]
    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.drafts.is_empty()
    }
    pub fn set_overlays(&mut self, overlays: DebugOverlays) {
        self.overlays = overlays;
    }
    /// Draw the drafts, and any enabled overlays, over the frame. Draws nothing when no draft exists.
    ///
    /// `tile_bounds` is consulted only for the tile grid overlay.
    pub fn render(
        &self,
        frame: &mut tiny_skia::Pixmap,
        base: tiny_skia::Transform,
        draw: &DrawRegistry,
        tile_bounds: impl IntoIterator<Item = Aabb>,
    ) {
        if !self.is_active() {
            return;
        }
        for draft in &self.drafts {
            draw.draw(frame, &preview_shape(&draft.shape), base);
        }
        if self.overlays.tile_grid {
            for bounds in tile_bounds {
                outline(frame, &bounds, GRID_COLOR, base);
            }
        }
        if self.overlays.preview_hint {
            if let Some(hint) = &self.preview {
                outline(frame, hint, HINT_COLOR, base);
            }
        }
    }
}

fn preview_shape(shape: &Shape) -> std::borrow::Cow<'_, Shape> {
    match shape.style.stroke {
        Some(stroke) if stroke.composite == Composite::DestinationOut => {
            let mut preview = shape.clone();
            if let Some(stroke) = preview.style.stroke.as_mut() {
                stroke.color = ERASER_PREVIEW;
                stroke.composite = Composite::SourceOver;
            }
            std::borrow::Cow::Owned(preview)
        }
        _ => std::borrow::Cow::Borrowed(shape),
    }
}

fn outline(frame: &mut tiny_skia::Pixmap, bounds: &Aabb, color: Color, base: tiny_skia::Transform) {
    let Some(rect) =
        tiny_skia::Rect::from_ltrb(bounds.min[0], bounds.min[1], bounds.max[0], bounds.max[1])
    else {
        return;
    };
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(to_skia(color));
    let stroke = tiny_skia::Stroke {
        width: 1.0,
        ..tiny_skia::Stroke::default()
    };
    frame.stroke_path(
        &tiny_skia::PathBuilder::from_rect(rect),
        &paint,
        &stroke,
        base,
        None,
    );
}

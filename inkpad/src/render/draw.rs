//! Per-kind rasterization onto a [`tiny_skia::Pixmap`].
//!
//! Looked up by [`ShapeKind`] like the shape handlers, so renderers never match on geometry themselves.
//! A kind with no draw function is logged and skipped; the rest of the pass goes on without it.

use inkpad_core::color::Color;
use inkpad_core::shape::{BoxKind, Composite, Geometry, Shape, ShapeKind};

/// Draw `shape` into the pixmap. `base` maps document space to pixels.
pub type DrawFn = fn(&mut tiny_skia::Pixmap, &Shape, tiny_skia::Transform);

#[derive(Clone, Default)]
pub struct DrawRegistry {
    draws: hashbrown::HashMap<ShapeKind, DrawFn>,
}
impl DrawRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(ShapeKind::Pen, draw_pen);
        registry.register(ShapeKind::Boxed, draw_boxed);
        registry.register(ShapeKind::Stamp, draw_stamp);
        // Superseding earlier shapes is the baker's job, the sentinel itself paints nothing.
        registry.register(ShapeKind::Clear, |_, _, _| ());
        registry
    }
    pub fn register(&mut self, kind: ShapeKind, draw: DrawFn) -> Option<DrawFn> {
        self.draws.insert(kind, draw)
    }
    pub fn unregister(&mut self, kind: ShapeKind) -> Option<DrawFn> {
        self.draws.remove(&kind)
    }
    /// Draw one shape. False if its kind has no draw function.
    pub fn draw(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        shape: &Shape,
        base: tiny_skia::Transform,
    ) -> bool {
        let Some(draw) = self.draws.get(&shape.kind()) else {
            log::warn!("no draw function for {} shape {}, skipping", shape.kind(), shape.id);
            return false;
        };
        draw(pixmap, shape, base);
        true
    }
}

#[must_use]
pub fn to_skia(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_array();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn shape_transform(shape: &Shape, base: tiny_skia::Transform) -> tiny_skia::Transform {
    let [sx, ky, kx, sy, tx, ty] = shape.transform.matrix().to_row();
    base.pre_concat(tiny_skia::Transform::from_row(sx, ky, kx, sy, tx, ty))
}

fn paint(color: Color, composite: Composite) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    paint.blend_mode = match composite {
        Composite::SourceOver => tiny_skia::BlendMode::SourceOver,
        Composite::DestinationOut => tiny_skia::BlendMode::DestinationOut,
    };
    paint
}

fn skia_stroke(width: f32) -> tiny_skia::Stroke {
    tiny_skia::Stroke {
        width,
        line_cap: tiny_skia::LineCap::Round,
        line_join: tiny_skia::LineJoin::Round,
        ..tiny_skia::Stroke::default()
    }
}

fn draw_pen(pixmap: &mut tiny_skia::Pixmap, shape: &Shape, base: tiny_skia::Transform) {
    let Geometry::Pen(pen) = &shape.geometry else {
        return;
    };
    let Some(stroke) = shape.style.stroke else {
        return;
    };
    let transform = shape_transform(shape, base);
    let paint = paint(stroke.color, stroke.composite);
    match pen.points.as_slice() {
        [] => (),
        // A lone point is a dot as wide as the stroke.
        [[x, y]] => {
            if let Some(dot) = tiny_skia::PathBuilder::from_circle(*x, *y, stroke.width / 2.0) {
                pixmap.fill_path(&dot, &paint, tiny_skia::FillRule::Winding, transform, None);
            }
        }
        [first, rest @ ..] => {
            let mut builder = tiny_skia::PathBuilder::new();
            builder.move_to(first[0], first[1]);
            for point in rest {
                builder.line_to(point[0], point[1]);
            }
            if let Some(path) = builder.finish() {
                pixmap.stroke_path(&path, &paint, &skia_stroke(stroke.width), transform, None);
            }
        }
    }
}

fn draw_boxed(pixmap: &mut tiny_skia::Pixmap, shape: &Shape, base: tiny_skia::Transform) {
    let Geometry::Boxed(boxed) = &shape.geometry else {
        return;
    };
    let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, boxed.width, boxed.height) else {
        return;
    };
    let path = match boxed.kind {
        BoxKind::Rect => Some(tiny_skia::PathBuilder::from_rect(rect)),
        BoxKind::Ellipse => tiny_skia::PathBuilder::from_oval(rect),
    };
    let Some(path) = path else {
        return;
    };
    let transform = shape_transform(shape, base);
    if let Some(fill) = shape.style.fill {
        let paint = paint(fill, Composite::SourceOver);
        pixmap.fill_path(&path, &paint, tiny_skia::FillRule::Winding, transform, None);
    }
    if let Some(stroke) = shape.style.stroke {
        let paint = paint(stroke.color, stroke.composite);
        pixmap.stroke_path(&path, &paint, &skia_stroke(stroke.width), transform, None);
    }
}

/// Outline for a stamp of the given catalog name, centred on the origin. Unknown names draw a diamond.
fn stamp_path(name: &str, size: f32) -> Option<tiny_skia::Path> {
    let radius = size.abs() / 2.0;
    match name {
        "dot" => tiny_skia::PathBuilder::from_circle(0.0, 0.0, radius),
        "square" => tiny_skia::Rect::from_xywh(-radius, -radius, size.abs(), size.abs())
            .map(tiny_skia::PathBuilder::from_rect),
        "star" => {
            let mut builder = tiny_skia::PathBuilder::new();
            for idx in 0..10 {
                let r = if idx % 2 == 0 { radius } else { radius * 0.4 };
                let angle = std::f32::consts::PI * idx as f32 / 5.0 - std::f32::consts::FRAC_PI_2;
                let (sin, cos) = angle.sin_cos();
                if idx == 0 {
                    builder.move_to(r * cos, r * sin);
                } else {
                    builder.line_to(r * cos, r * sin);
                }
            }
            builder.close();
            builder.finish()
        }
        _ => {
            let mut builder = tiny_skia::PathBuilder::new();
            builder.move_to(0.0, -radius);
            builder.line_to(radius, 0.0);
            builder.line_to(0.0, radius);
            builder.line_to(-radius, 0.0);
            builder.close();
            builder.finish()
        }
    }
}

fn draw_stamp(pixmap: &mut tiny_skia::Pixmap, shape: &Shape, base: tiny_skia::Transform) {
    let Geometry::Stamp(stamp) = &shape.geometry else {
        return;
    };
    let Some(path) = stamp_path(&stamp.stamp, stamp.size) else {
        return;
    };
    let color = shape.style.fill.unwrap_or(Color::BLACK);
    pixmap.fill_path(
        &path,
        &paint(color, Composite::SourceOver),
        tiny_skia::FillRule::Winding,
        shape_transform(shape, base),
        None,
    );
}

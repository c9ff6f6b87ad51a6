//! Drag out a rectangle or ellipse from corner to corner.

use inkpad_core::commands::Command;
use inkpad_core::geometry::{Aabb, Transform};
use inkpad_core::shape::{BoxKind, BoxedGeometry, Geometry, Shape, Style};
use inkpad_core::{ShapeId, ZIndex};

use super::{StyleSupport, Tool, ToolRuntime, ToolSession};

pub struct BoxedTool {
    kind: BoxKind,
}
impl BoxedTool {
    #[must_use]
    pub fn rect() -> Self {
        Self {
            kind: BoxKind::Rect,
        }
    }
    #[must_use]
    pub fn ellipse() -> Self {
        Self {
            kind: BoxKind::Ellipse,
        }
    }
}
impl Tool for BoxedTool {
    fn id(&self) -> &'static str {
        match self.kind {
            BoxKind::Rect => "rect",
            BoxKind::Ellipse => "ellipse",
        }
    }
    fn label(&self) -> &'static str {
        match self.kind {
            BoxKind::Rect => "Rectangle",
            BoxKind::Ellipse => "Ellipse",
        }
    }
    fn style_support(&self) -> StyleSupport {
        StyleSupport {
            stroke: true,
            fill: true,
        }
    }
    fn activate(&self, _: &mut dyn ToolRuntime) -> Box<dyn ToolSession> {
        Box::new(BoxedSession {
            tool_id: self.id(),
            kind: self.kind,
            drag: None,
        })
    }
}

struct Drag {
    id: ShapeId,
    z_index: ZIndex,
    anchor: [f32; 2],
    corner: [f32; 2],
}

struct BoxedSession {
    tool_id: &'static str,
    kind: BoxKind,
    drag: Option<Drag>,
}
impl BoxedSession {
    /// The dragged box, normalized so its size is never negative whichever way the user dragged.
    fn shape(&self, runtime: &dyn ToolRuntime, drag: &Drag) -> (Shape, Aabb) {
        let settings = runtime.shared_settings();
        let extent = Aabb::from_corners(drag.anchor, drag.corner);
        let mut shape = Shape::new(
            drag.id.clone(),
            Geometry::Boxed(BoxedGeometry {
                kind: self.kind,
                width: extent.width(),
                height: extent.height(),
            }),
        )
        .with_style(Style {
            stroke: Some(settings.stroke),
            fill: settings.fill,
        })
        .with_transform(Transform::from_translation(extent.min))
        .with_z_index(drag.z_index.clone());
        shape.layer_id = settings.layer;
        (shape, extent.outset(settings.stroke.width / 2.0))
    }
}
impl ToolSession for BoxedSession {
    fn pointer_down(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        // Nothing to show until the pointer moves.
        self.drag = Some(Drag {
            id: runtime.generate_shape_id(self.tool_id),
            z_index: runtime.next_z_index_in_layer(),
            anchor: position,
            corner: position,
        });
    }
    fn pointer_move(&mut self, runtime: &mut dyn ToolRuntime, samples: &[[f32; 2]]) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        // Only the latest position matters.
        if let Some(last) = samples.last() {
            drag.corner = *last;
        }
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        let (shape, hint) = self.shape(&*runtime, drag);
        runtime.set_preview(Some(hint));
        runtime.set_draft(self.tool_id, shape);
    }
    fn pointer_up(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        let Some(mut drag) = self.drag.take() else {
            return;
        };
        drag.corner = position;
        let (shape, _) = self.shape(&*runtime, &drag);
        if matches!(&shape.geometry, Geometry::Boxed(boxed) if boxed.is_degenerate()) {
            log::trace!("discarding zero-area {}", self.tool_id);
        } else if let Err(err) = runtime.commit(Command::add_shape(shape)) {
            log::warn!("{} commit failed: {err}", self.tool_id);
        }
        runtime.clear_draft();
    }
    fn pointer_cancel(&mut self, runtime: &mut dyn ToolRuntime) {
        self.drag = None;
        runtime.clear_draft();
    }
}

#[cfg(test)]
mod test {
    use crate::tools::test::RecordingRuntime;
    use crate::tools::ToolHost;
    use inkpad_core::color::Color;
    use inkpad_core::shape::{BoxKind, BoxedGeometry, Geometry};

    #[test]
    fn drag_up_and_left_normalizes() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        runtime.settings.fill = Some(Color::WHITE);
        host.activate("ellipse", &mut runtime).unwrap();
        host.pointer_down(&mut runtime, [50.0, 40.0]);
        host.pointer_move(&mut runtime, &[[30.0, 30.0], [10.0, 20.0]]);
        let draft = runtime.draft.clone().unwrap();
        assert_eq!(draft.transform.translation, [10.0, 20.0]);
        host.pointer_up(&mut runtime, [10.0, 20.0]);

        let shape = runtime.document.shapes().next().unwrap();
        assert_eq!(
            shape.geometry,
            Geometry::Boxed(BoxedGeometry {
                kind: BoxKind::Ellipse,
                width: 40.0,
                height: 20.0
            })
        );
        assert_eq!(shape.style.fill, Some(Color::WHITE));
    }
    #[test]
    fn zero_area_is_filtered() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        host.activate("rect", &mut runtime).unwrap();
        host.pointer_down(&mut runtime, [0.0, 0.0]);
        host.pointer_move(&mut runtime, &[[30.0, 0.0]]);
        host.pointer_up(&mut runtime, [30.0, 0.0]);
        assert_eq!(runtime.commits, 0);
    }
}

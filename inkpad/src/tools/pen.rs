//! Freehand pen and eraser. The eraser is a pen whose stroke removes what is beneath it.

use inkpad_core::commands::Command;
use inkpad_core::geometry::{Aabb, Transform};
use inkpad_core::shape::{Composite, Geometry, PenGeometry, Shape, Style};
use inkpad_core::{ShapeId, ZIndex};

use super::{StyleSupport, Tool, ToolRuntime, ToolSession};

pub struct PenTool {
    eraser: bool,
}
impl PenTool {
    #[must_use]
    pub fn pen() -> Self {
        Self { eraser: false }
    }
    #[must_use]
    pub fn eraser() -> Self {
        Self { eraser: true }
    }
}
impl Tool for PenTool {
    fn id(&self) -> &'static str {
        if self.eraser {
            "eraser"
        } else {
            "pen"
        }
    }
    fn label(&self) -> &'static str {
        if self.eraser {
            "Eraser"
        } else {
            "Pen"
        }
    }
    fn style_support(&self) -> StyleSupport {
        StyleSupport {
            stroke: true,
            fill: false,
        }
    }
    fn activate(&self, _: &mut dyn ToolRuntime) -> Box<dyn ToolSession> {
        Box::new(PenSession {
            tool_id: self.id(),
            eraser: self.eraser,
            stroke: None,
        })
    }
}

struct InProgress {
    id: ShapeId,
    z_index: ZIndex,
    /// Document-space position of the first sample. Points are stored relative to it.
    anchor: [f32; 2],
    points: Vec<[f32; 2]>,
}

struct PenSession {
    tool_id: &'static str,
    eraser: bool,
    stroke: Option<InProgress>,
}
impl PenSession {
    fn push(stroke: &mut InProgress, position: [f32; 2]) {
        let local = [
            position[0] - stroke.anchor[0],
            position[1] - stroke.anchor[1],
        ];
        // Consecutive duplicates add nothing to the polyline.
        if stroke.points.last() != Some(&local) {
            stroke.points.push(local);
        }
    }
    fn shape(&self, runtime: &dyn ToolRuntime, stroke: &InProgress) -> Shape {
        let settings = runtime.shared_settings();
        let mut style_stroke = settings.stroke;
        if self.eraser {
            style_stroke.composite = Composite::DestinationOut;
        }
        let mut shape = Shape::new(
            stroke.id.clone(),
            Geometry::Pen(PenGeometry {
                points: stroke.points.clone(),
            }),
        )
        .with_style(Style {
            stroke: Some(style_stroke),
            fill: None,
        })
        .with_transform(Transform::from_translation(stroke.anchor))
        .with_z_index(stroke.z_index.clone());
        shape.layer_id = settings.layer;
        shape
    }
}
impl ToolSession for PenSession {
    fn pointer_down(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        let stroke = InProgress {
            id: runtime.generate_shape_id(self.tool_id),
            z_index: runtime.next_z_index_in_layer(),
            anchor: position,
            points: vec![[0.0, 0.0]],
        };
        let draft = self.shape(&*runtime, &stroke);
        runtime.set_draft(self.tool_id, draft);
        self.stroke = Some(stroke);
    }
    fn pointer_move(&mut self, runtime: &mut dyn ToolRuntime, samples: &[[f32; 2]]) {
        let Some(mut stroke) = self.stroke.take() else {
            return;
        };
        let [ax, ay] = stroke.anchor;
        let before = stroke.points.last().map(|p| [p[0] + ax, p[1] + ay]);
        for sample in samples {
            Self::push(&mut stroke, *sample);
        }
        // Only the new segments changed.
        let half = runtime.shared_settings().stroke.width / 2.0;
        let hint =
            Aabb::from_points(before.iter().chain(samples)).map(|bounds| bounds.outset(half));
        runtime.set_preview(hint);
        let draft = self.shape(&*runtime, &stroke);
        runtime.set_draft(self.tool_id, draft);
        self.stroke = Some(stroke);
    }
    fn pointer_up(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        let Some(mut stroke) = self.stroke.take() else {
            return;
        };
        Self::push(&mut stroke, position);
        let shape = self.shape(&*runtime, &stroke);
        // A click without movement would draw nothing useful.
        if matches!(&shape.geometry, Geometry::Pen(pen) if pen.is_degenerate()) {
            log::trace!("discarding degenerate {} stroke", self.tool_id);
        } else if let Err(err) = runtime.commit(Command::add_shape(shape)) {
            log::warn!("{} commit failed: {err}", self.tool_id);
        }
        runtime.clear_draft();
    }
    fn pointer_cancel(&mut self, runtime: &mut dyn ToolRuntime) {
        self.stroke = None;
        runtime.clear_draft();
    }
    fn exit(&mut self, runtime: &mut dyn ToolRuntime) {
        self.pointer_cancel(runtime);
    }
}

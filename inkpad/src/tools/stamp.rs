//! Place a stamp where the pointer is released. The draft follows the pointer while it is down.

use inkpad_core::commands::Command;
use inkpad_core::geometry::Transform;
use inkpad_core::shape::{Geometry, Shape, StampGeometry, Style};
use inkpad_core::{ShapeId, ZIndex};

use super::{StyleSupport, Tool, ToolRuntime, ToolSession};

pub struct StampTool;
impl Tool for StampTool {
    fn id(&self) -> &'static str {
        "stamp"
    }
    fn label(&self) -> &'static str {
        "Stamp"
    }
    fn style_support(&self) -> StyleSupport {
        StyleSupport {
            stroke: false,
            fill: true,
        }
    }
    fn activate(&self, _: &mut dyn ToolRuntime) -> Box<dyn ToolSession> {
        Box::new(StampSession { placing: None })
    }
}

struct StampSession {
    placing: Option<(ShapeId, ZIndex)>,
}
impl StampSession {
    fn shape(runtime: &dyn ToolRuntime, id: ShapeId, z_index: ZIndex, at: [f32; 2]) -> Shape {
        let options = runtime.options();
        let settings = runtime.shared_settings();
        let mut shape = Shape::new(
            id,
            Geometry::Stamp(StampGeometry {
                stamp: options.stamp,
                size: options.stamp_size,
            }),
        )
        .with_style(Style {
            stroke: None,
            fill: Some(settings.fill.unwrap_or(settings.stroke.color)),
        })
        .with_transform(Transform::from_translation(at))
        .with_z_index(z_index);
        shape.layer_id = settings.layer;
        shape
    }
    fn show(&self, runtime: &mut dyn ToolRuntime, at: [f32; 2]) {
        if let Some((id, z_index)) = &self.placing {
            let draft = Self::shape(&*runtime, id.clone(), z_index.clone(), at);
            runtime.set_draft("stamp", draft);
        }
    }
}
impl ToolSession for StampSession {
    fn pointer_down(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        self.placing = Some((
            runtime.generate_shape_id("stamp"),
            runtime.next_z_index_in_layer(),
        ));
        self.show(runtime, position);
    }
    fn pointer_move(&mut self, runtime: &mut dyn ToolRuntime, samples: &[[f32; 2]]) {
        if let Some(last) = samples.last() {
            self.show(runtime, *last);
        }
    }
    fn pointer_up(&mut self, runtime: &mut dyn ToolRuntime, position: [f32; 2]) {
        let Some((id, z_index)) = self.placing.take() else {
            return;
        };
        let shape = Self::shape(&*runtime, id, z_index, position);
        if runtime.options().stamp_size <= 0.0 {
            log::trace!("discarding zero-size stamp");
        } else if let Err(err) = runtime.commit(Command::add_shape(shape)) {
            log::warn!("stamp commit failed: {err}");
        }
        runtime.clear_draft();
    }
    fn pointer_cancel(&mut self, runtime: &mut dyn ToolRuntime) {
        self.placing = None;
        runtime.clear_draft();
    }
}

#[cfg(test)]
mod test {
    use crate::tools::test::RecordingRuntime;
    use crate::tools::ToolHost;
    use inkpad_core::shape::{Geometry, StampGeometry};

    #[test]
    fn click_places_stamp() {
        let mut host = ToolHost::with_builtin_tools();
        let mut runtime = RecordingRuntime::new();
        runtime.options.stamp = "heart".to_owned();
        host.activate("stamp", &mut runtime).unwrap();
        host.pointer_down(&mut runtime, [10.0, 10.0]);
        assert!(runtime.draft.is_some());
        host.pointer_up(&mut runtime, [12.0, 10.0]);
        let shape = runtime.document.shapes().next().unwrap();
        assert_eq!(
            shape.geometry,
            Geometry::Stamp(StampGeometry {
                stamp: "heart".into(),
                size: 48.0
            })
        );
        assert_eq!(shape.transform.translation, [12.0, 10.0]);
    }
}

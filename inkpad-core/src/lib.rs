pub mod color;
pub mod commands;
pub mod document;
pub mod geometry;
pub mod history;
pub mod id;
pub mod layer;
pub mod shape;
pub mod store;
pub mod transact;
pub mod zindex;

pub use document::{DirtyState, DrawingDocument};
pub use id::{IdGenerator, LayerId, ShapeId};
pub use shape::{Shape, ShapeHandlerRegistry};
pub use zindex::ZIndex;

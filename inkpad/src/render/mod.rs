//! CPU rendering of a document: tiles for committed shapes, a hot layer for drafts, and the frame scheduling
//! that composites the two.

pub mod draw;
pub mod hot_layer;
pub mod identity;
pub mod scheduler;
pub mod session;
pub mod tiles;

pub use draw::DrawRegistry;
pub use identity::{RenderIdentity, Viewport};
pub use scheduler::{FrameHandle, FrameScheduler, ManualFrames};
pub use session::RasterSession;

//! Frame scheduling for a raster session.
//!
//! Rendering never happens synchronously in response to an edit. Instead a change requests a frame, and the
//! frame callback decides whether a render pass is due:
//!
//! `Idle -> ModelRequested -> Anticipatory -> Idle`
//!
//! A requested frame renders and then asks for one more, anticipatory, frame. Changes landing between the
//! request and the callback get picked up by it. If nothing else arrived by then, the scheduler goes idle and
//! stops requesting frames until the next change.

use std::sync::Arc;

/// Token for a requested frame callback.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameHandle(pub u64);

/// Source of frame callbacks, such as a display's vsync. The owner calls
/// [`RenderScheduler::on_frame`] with the handle when the frame comes due.
pub trait FrameScheduler: Send {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Default)]
struct ManualQueue {
    next: u64,
    pending: Vec<FrameHandle>,
}

/// A frame source driven by hand, for tests and headless rendering.
/// Clones share one queue, so the driver can keep a copy after handing one to a scheduler.
#[derive(Clone, Default)]
pub struct ManualFrames {
    queue: Arc<parking_lot::Mutex<ManualQueue>>,
}
impl ManualFrames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Frames requested and not yet cancelled or taken.
    #[must_use]
    pub fn pending(&self) -> Vec<FrameHandle> {
        self.queue.lock().pending.clone()
    }
    /// Take every pending frame, as if they all came due now.
    pub fn take_pending(&self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.queue.lock().pending)
    }
}
impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameHandle {
        let mut queue = self.queue.lock();
        let handle = FrameHandle(queue.next);
        queue.next += 1;
        queue.pending.push(handle);
        handle
    }
    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.lock().pending.retain(|pending| *pending != handle);
    }
}

#[derive(strum::AsRefStr, Copy, Clone, PartialEq, Eq, Debug)]
pub enum RenderState {
    Idle,
    ModelRequested,
    Anticipatory,
}

pub struct RenderScheduler {
    frames: Box<dyn FrameScheduler>,
    state: RenderState,
    /// At most one frame is in flight at a time.
    outstanding: Option<FrameHandle>,
    torn_down: bool,
}
impl RenderScheduler {
    #[must_use]
    pub fn new(frames: Box<dyn FrameScheduler>) -> Self {
        Self {
            frames,
            state: RenderState::Idle,
            outstanding: None,
            torn_down: false,
        }
    }
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state
    }
    #[must_use]
    pub fn outstanding(&self) -> Option<FrameHandle> {
        self.outstanding
    }
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
    /// Something visible changed. Ignored after teardown.
    pub fn request_render(&mut self) {
        if self.torn_down {
            return;
        }
        self.state = RenderState::ModelRequested;
        if self.outstanding.is_none() {
            self.outstanding = Some(self.frames.request_frame());
        }
    }
    /// A frame came due. Returns whether a render pass should run now.
    ///
    /// Handles other than the outstanding one are stale (cancelled, or fired after teardown) and ignored.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.torn_down || self.outstanding != Some(handle) {
            log::trace!("ignoring stale frame {handle:?}");
            return false;
        }
        self.outstanding = None;
        match self.state {
            RenderState::ModelRequested => {
                self.state = RenderState::Anticipatory;
                self.outstanding = Some(self.frames.request_frame());
                true
            }
            RenderState::Anticipatory => {
                self.state = RenderState::Idle;
                false
            }
            RenderState::Idle => false,
        }
    }
    /// Cancel any outstanding frame. No frame renders after this.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.outstanding.take() {
            self.frames.cancel_frame(handle);
        }
        self.state = RenderState::Idle;
        self.torn_down = true;
    }
}
impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}

#[cfg(test)]
mod test {
    use super::{FrameHandle, ManualFrames, RenderScheduler, RenderState};

    fn scheduler() -> (RenderScheduler, ManualFrames) {
        let frames = ManualFrames::new();
        (RenderScheduler::new(Box::new(frames.clone())), frames)
    }
    /// Fire every pending frame, returning how many render passes ran.
    fn tick(scheduler: &mut RenderScheduler, frames: &ManualFrames) -> usize {
        frames
            .take_pending()
            .into_iter()
            .filter(|handle| scheduler.on_frame(*handle))
            .count()
    }

    #[test]
    fn one_anticipatory_frame_then_idle() {
        let (mut scheduler, frames) = scheduler();
        assert_eq!(scheduler.state(), RenderState::Idle);
        assert!(frames.pending().is_empty());

        scheduler.request_render();
        // Coalesced into the same frame.
        scheduler.request_render();
        assert_eq!(frames.pending().len(), 1);
        assert_eq!(scheduler.state(), RenderState::ModelRequested);

        assert_eq!(tick(&mut scheduler, &frames), 1);
        assert_eq!(scheduler.state(), RenderState::Anticipatory);
        assert_eq!(frames.pending().len(), 1);

        assert_eq!(tick(&mut scheduler, &frames), 0);
        assert_eq!(scheduler.state(), RenderState::Idle);
        // No idle render loop.
        assert!(frames.pending().is_empty());
    }
    #[test]
    fn change_during_anticipatory_renders_again() {
        let (mut scheduler, frames) = scheduler();
        scheduler.request_render();
        tick(&mut scheduler, &frames);
        scheduler.request_render();
        assert_eq!(frames.pending().len(), 1);
        assert_eq!(tick(&mut scheduler, &frames), 1);
        assert_eq!(scheduler.state(), RenderState::Anticipatory);
    }
    #[test]
    fn teardown_cancels_and_ignores_stale() {
        let (mut scheduler, frames) = scheduler();
        scheduler.request_render();
        let handle = frames.pending()[0];
        scheduler.teardown();
        assert!(frames.pending().is_empty());
        assert!(!scheduler.on_frame(handle));
        scheduler.request_render();
        assert!(frames.pending().is_empty());
        assert!(!scheduler.on_frame(FrameHandle(99)));
    }
}

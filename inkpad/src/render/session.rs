//! # Raster session
//!
//! Binds one store to one viewport. Committed shapes are baked into the [`TileCache`], drafts go to the
//! [`HotLayer`], and every due frame composites the two into a single frame buffer.
//!
//! The session learns about document changes by listening to the store. A listener only stashes the new
//! snapshot and asks for a frame; the frame callback diffs it against the last synced revision and schedules the
//! touched tiles. Baking happens separately, through [`RasterSession::bake_pending`].

use std::sync::Arc;

use inkpad_core::store::{Store, StoreEvent, Subscription};
use inkpad_core::{DirtyState, DrawingDocument, ShapeHandlerRegistry};

use super::draw::{to_skia, DrawRegistry};
use super::hot_layer::HotLayer;
use super::identity::Viewport;
use super::scheduler::{FrameHandle, FrameScheduler, RenderScheduler, RenderState};
use super::tiles::{BakeReport, TileCache};
use crate::config::DebugOverlays;

type PendingSnapshot = Arc<parking_lot::Mutex<Option<Arc<DrawingDocument>>>>;

pub struct RasterSession {
    subscription: Option<Subscription>,
    /// Newest snapshot seen by the listener and not yet synced.
    pending: PendingSnapshot,
    /// The revision the tile cache was last scheduled against.
    document: Arc<DrawingDocument>,
    tiles: TileCache,
    hot: HotLayer,
    scheduler: Arc<parking_lot::Mutex<RenderScheduler>>,
    draw: Arc<DrawRegistry>,
    viewport: Viewport,
    frame: Option<tiny_skia::Pixmap>,
}
impl RasterSession {
    pub fn new(
        store: &dyn Store,
        viewport: Viewport,
        tile_size: u32,
        overlays: DebugOverlays,
        frames: Box<dyn FrameScheduler>,
        shapes: Arc<ShapeHandlerRegistry>,
        draw: Arc<DrawRegistry>,
    ) -> Self {
        let scheduler = Arc::new(parking_lot::Mutex::new(RenderScheduler::new(frames)));
        let pending = PendingSnapshot::default();
        let subscription = {
            let pending = pending.clone();
            let scheduler = scheduler.clone();
            store.subscribe(Arc::new(move |event: &StoreEvent| {
                log::trace!("{} event, scheduling render", event.kind);
                *pending.lock() = Some(event.snapshot.clone());
                scheduler.lock().request_render();
            }))
        };
        let tiles = TileCache::new(tile_size, &viewport, shapes, draw.clone());
        tiles.ensure_tiles_for_viewport(viewport.size);
        let session = Self {
            subscription: Some(subscription),
            pending,
            document: store.doc(),
            tiles,
            hot: HotLayer::new(overlays),
            scheduler,
            draw,
            viewport,
            frame: None,
        };
        session.scheduler.lock().request_render();
        session
    }
    #[must_use]
    pub fn document(&self) -> &Arc<DrawingDocument> {
        &self.document
    }
    #[must_use]
    pub fn tiles(&self) -> &TileCache {
        &self.tiles
    }
    #[must_use]
    pub fn hot_layer(&self) -> &HotLayer {
        &self.hot
    }
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.scheduler.lock().state()
    }
    /// The last composited frame.
    #[must_use]
    pub fn frame(&self) -> Option<&tiny_skia::Pixmap> {
        self.frame.as_ref()
    }
    pub fn set_draft(&mut self, tool_id: &'static str, shape: inkpad_core::Shape) {
        self.hot.set_draft(tool_id, shape);
        self.request_render();
    }
    pub fn clear_draft(&mut self) {
        // Still need a frame to wipe the old draft off screen.
        if self.hot.clear() {
            self.request_render();
        }
    }
    pub fn set_preview(&mut self, hint: Option<inkpad_core::geometry::Aabb>) {
        self.hot.set_preview(hint);
    }
    pub fn set_overlays(&mut self, overlays: DebugOverlays) {
        self.hot.set_overlays(overlays);
        self.request_render();
    }
    /// Change viewport parameters. Tiles are invalidated if the render identity changed.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.tiles.set_viewport(&viewport);
        self.tiles.ensure_tiles_for_viewport(viewport.size);
        self.request_render();
    }
    pub fn request_render(&self) {
        self.scheduler.lock().request_render();
    }
    /// A frame came due. Returns whether it rendered.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        // Release the scheduler before rendering, the store listener may want it.
        let due = self.scheduler.lock().on_frame(handle);
        if due {
            self.render_pass();
        }
        due
    }
    /// Sync with the store, then composite a frame.
    pub fn render_pass(&mut self) {
        self.sync_document();
        self.composite();
    }
    /// Bake every dirty tile against the newest synced revision. Requests a frame if anything changed.
    pub async fn bake_pending(&mut self) -> BakeReport {
        self.sync_document();
        let document = self.document.clone();
        let report = self.tiles.bake_pending_tiles(&document).await;
        if report.baked > 0 {
            self.request_render();
        }
        report
    }
    /// Stop listening and cancel outstanding frames. Drafts are discarded.
    pub fn teardown(&mut self) {
        self.subscription = None;
        self.scheduler.lock().teardown();
        self.hot.clear();
        *self.pending.lock() = None;
    }

    /// Schedule bakes for whatever changed between the synced revision and the pending one.
    fn sync_document(&mut self) {
        let Some(next) = self.pending.lock().take() else {
            return;
        };
        let dirty = DirtyState::diff(&self.document, &next);
        if !dirty.is_empty() {
            log::trace!(
                "{} shapes dirty, {} deleted",
                dirty.dirty.len(),
                dirty.deleted.len()
            );
        }
        for id in &dirty.dirty {
            // Both where it was and where it is now.
            if let Some(old) = self.document.shape(id) {
                self.tiles.update_touched_tiles_for_shape(old);
            }
            if let Some(new) = next.shape(id) {
                self.tiles.update_touched_tiles_for_shape(new);
            }
        }
        for id in &dirty.deleted {
            if let Some(old) = self.document.shape(id) {
                self.tiles.update_touched_tiles_for_shape(old);
            }
        }
        self.document = next;
    }
    fn composite(&mut self) {
        let [width, height] = self.viewport.pixel_size();
        let resized = self
            .frame
            .as_ref()
            .map_or(true, |frame| frame.width() != width || frame.height() != height);
        if resized {
            self.frame = tiny_skia::Pixmap::new(width, height);
        }
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("failed to allocate {width}x{height} frame");
            return;
        };
        frame.fill(to_skia(self.viewport.background));
        let ratio = self.viewport.pixel_ratio;
        let tile_size = self.tiles.tile_size() as f32;
        let baked = self.tiles.baked_tiles();
        for (key, pixels) in &baked {
            let x = (key.x as f32 * tile_size * ratio).round() as i32;
            let y = (key.y as f32 * tile_size * ratio).round() as i32;
            frame.draw_pixmap(
                x,
                y,
                tiny_skia::Pixmap::as_ref(pixels),
                &tiny_skia::PixmapPaint::default(),
                tiny_skia::Transform::identity(),
                None,
            );
        }
        let tiles = &self.tiles;
        self.hot.render(
            frame,
            tiny_skia::Transform::from_scale(ratio, ratio),
            &self.draw,
            baked.iter().map(|(key, _)| tiles.tile_bounds(*key)),
        );
    }
}
impl Drop for RasterSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

//! # Tile cache
//!
//! The committed document is rasterized into fixed-size square tiles, addressed by integer coordinates in document
//! space. A tile is rebaked only when something inside it changed, and is shared with the compositor behind an
//! [`Arc`] - a bake renders into a private buffer and swaps it in whole, so a frame never sees half a tile.
//!
//! Every tile carries a generation, bumped whenever it is marked dirty. A bake finishing for an older generation
//! than the tile's current one has been superseded, and its pixels are thrown away.

use std::sync::Arc;

use inkpad_core::color::Color;
use inkpad_core::geometry::Aabb;
use inkpad_core::shape::Shape;
use inkpad_core::{DrawingDocument, ShapeHandlerRegistry, ShapeId};

use super::draw::{to_skia, DrawRegistry};
use super::identity::{RenderIdentity, Viewport};

pub const DEFAULT_TILE_SIZE: u32 = 256;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TileKey {
    pub x: i32,
    pub y: i32,
}

struct Tile {
    pixels: Option<Arc<tiny_skia::Pixmap>>,
    /// Identity `pixels` were baked under.
    identity: Option<RenderIdentity>,
    dirty: bool,
    generation: u64,
}
impl Tile {
    fn new() -> Self {
        Self {
            pixels: None,
            identity: None,
            dirty: true,
            generation: 0,
        }
    }
    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }
}

struct TileState {
    identity: RenderIdentity,
    viewport: Viewport,
    tiles: hashbrown::HashMap<TileKey, Tile>,
}
impl TileState {
    /// Mark an existing tile dirty. Keys with no tile are left alone, they're created on demand.
    fn mark(&mut self, key: TileKey) {
        if let Some(tile) = self.tiles.get_mut(&key) {
            tile.mark_dirty();
        }
    }
}

/// Outcome of one [`TileCache::bake_pending_tiles`] pass.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct BakeReport {
    pub baked: usize,
    /// No buffer could be allocated. These tiles stay dirty.
    pub failed: usize,
    /// Marked dirty again while baking, so the result was discarded.
    pub superseded: usize,
}

pub struct TileCache {
    tile_size: u32,
    shapes: Arc<ShapeHandlerRegistry>,
    draw: Arc<DrawRegistry>,
    state: parking_lot::Mutex<TileState>,
}
impl TileCache {
    #[must_use]
    pub fn new(
        tile_size: u32,
        viewport: &Viewport,
        shapes: Arc<ShapeHandlerRegistry>,
        draw: Arc<DrawRegistry>,
    ) -> Self {
        Self {
            tile_size: tile_size.max(1),
            shapes,
            draw,
            state: parking_lot::Mutex::new(TileState {
                identity: RenderIdentity::of(viewport),
                viewport: *viewport,
                tiles: hashbrown::HashMap::new(),
            }),
        }
    }
    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
    #[must_use]
    pub fn identity(&self) -> RenderIdentity {
        self.state.lock().identity.clone()
    }
    /// Edge length of a baked tile in device pixels.
    #[must_use]
    pub fn tile_pixels(&self) -> u32 {
        let ratio = self.state.lock().viewport.pixel_ratio;
        tile_pixels(self.tile_size, ratio)
    }
    /// Adopt new viewport parameters. If the render identity changed, every tile is invalidated.
    /// Returns whether it did.
    pub fn set_viewport(&self, viewport: &Viewport) -> bool {
        let identity = RenderIdentity::of(viewport);
        let mut state = self.state.lock();
        state.viewport = *viewport;
        if state.identity == identity {
            return false;
        }
        log::debug!("render identity {} -> {identity}, invalidating", state.identity);
        state.identity = identity;
        state.tiles.values_mut().for_each(Tile::mark_dirty);
        true
    }
    #[must_use]
    pub fn tile_bounds(&self, key: TileKey) -> Aabb {
        let size = self.tile_size as f32;
        Aabb::from_xywh(key.x as f32 * size, key.y as f32 * size, size, size)
    }
    /// Keys of every tile overlapping `bounds`.
    pub fn keys_touching(&self, bounds: &Aabb) -> impl Iterator<Item = TileKey> {
        let (min, max) = self.key_range(bounds);
        keys_between(min, max)
    }
    /// Corner keys of the tiles overlapping `bounds`, inclusive.
    fn key_range(&self, bounds: &Aabb) -> (TileKey, TileKey) {
        let size = self.tile_size as f32;
        let cell = |v: f32| (v / size).floor() as i32;
        (
            TileKey {
                x: cell(bounds.min[0]),
                y: cell(bounds.min[1]),
            },
            TileKey {
                x: cell(bounds.max[0]),
                y: cell(bounds.max[1]),
            },
        )
    }
    /// Create the tiles covering a viewport at the document origin. New tiles start dirty.
    pub fn ensure_tiles_for_viewport(&self, size: [u32; 2]) {
        let columns = size_in_tiles(size[0], self.tile_size);
        let rows = size_in_tiles(size[1], self.tile_size);
        let mut state = self.state.lock();
        for y in 0..rows {
            for x in 0..columns {
                state
                    .tiles
                    .entry(TileKey { x, y })
                    .or_insert_with(Tile::new);
            }
        }
    }
    /// Mark every existing tile under the shape as needing a bake. Clear sentinels touch everything.
    ///
    /// Only the viewport's grid is considered, so a huge shape costs no more than the viewport does.
    pub fn update_touched_tiles_for_shape(&self, shape: &Shape) {
        if shape.is_clear() {
            self.schedule_bake_for_clear();
            return;
        }
        let Some(bounds) = self.shapes.bounds(shape) else {
            return;
        };
        let (min, max) = self.key_range(&bounds);
        let mut state = self.state.lock();
        let columns = size_in_tiles(state.viewport.size[0], self.tile_size);
        let rows = size_in_tiles(state.viewport.size[1], self.tile_size);
        let min = TileKey {
            x: min.x.max(0),
            y: min.y.max(0),
        };
        let max = TileKey {
            x: max.x.min(columns - 1),
            y: max.y.min(rows - 1),
        };
        for key in keys_between(min, max) {
            state.mark(key);
        }
    }
    /// Mark the tiles under each listed shape, as placed in `document`. Ids missing from it are ignored.
    pub fn schedule_bake_for_shapes<'a>(
        &self,
        document: &DrawingDocument,
        ids: impl IntoIterator<Item = &'a ShapeId>,
    ) {
        for id in ids {
            if let Some(shape) = document.shape(id) {
                self.update_touched_tiles_for_shape(shape);
            }
        }
    }
    /// Mark every existing tile dirty.
    pub fn schedule_bake_for_clear(&self) {
        self.state
            .lock()
            .tiles
            .values_mut()
            .for_each(Tile::mark_dirty);
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().tiles.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.state.lock().tiles.values().filter(|t| t.dirty).count()
    }
    /// None if the tile doesn't exist.
    #[must_use]
    pub fn is_dirty(&self, key: TileKey) -> Option<bool> {
        self.state.lock().tiles.get(&key).map(|t| t.dirty)
    }
    /// Last baked pixels of a tile, if they were baked under the current identity.
    /// May be stale in content while a rebake is pending.
    #[must_use]
    pub fn pixels(&self, key: TileKey) -> Option<Arc<tiny_skia::Pixmap>> {
        let state = self.state.lock();
        let tile = state.tiles.get(&key)?;
        (tile.identity.as_ref() == Some(&state.identity))
            .then(|| tile.pixels.clone())
            .flatten()
    }
    /// Every tile with current pixels, in key order.
    #[must_use]
    pub fn baked_tiles(&self) -> Vec<(TileKey, Arc<tiny_skia::Pixmap>)> {
        let state = self.state.lock();
        let mut tiles: Vec<_> = state
            .tiles
            .iter()
            .filter(|(_, tile)| tile.identity.as_ref() == Some(&state.identity))
            .filter_map(|(key, tile)| Some((*key, tile.pixels.clone()?)))
            .collect();
        tiles.sort_unstable_by_key(|(key, _)| *key);
        tiles
    }

    /// Bake every dirty tile from the committed `document`, yielding between tiles.
    pub async fn bake_pending_tiles(&self, document: &DrawingDocument) -> BakeReport {
        let (mut jobs, identity, viewport) = {
            let state = self.state.lock();
            let jobs: Vec<(TileKey, u64)> = state
                .tiles
                .iter()
                .filter(|(_, tile)| tile.dirty)
                .map(|(key, tile)| (*key, tile.generation))
                .collect();
            (jobs, state.identity.clone(), state.viewport)
        };
        let mut report = BakeReport::default();
        if jobs.is_empty() {
            return report;
        }
        jobs.sort_unstable();
        let paint_list = self.paint_list(document);

        for (key, generation) in jobs {
            let Some(pixmap) = self.bake_tile(key, &paint_list, &viewport) else {
                log::warn!("failed to allocate tile {key:?}, leaving it dirty");
                report.failed += 1;
                continue;
            };
            {
                let mut state = self.state.lock();
                let identity_current = state.identity == identity;
                match state.tiles.get_mut(&key) {
                    Some(tile) if identity_current && tile.generation == generation => {
                        tile.pixels = Some(Arc::new(pixmap));
                        tile.identity = Some(identity.clone());
                        tile.dirty = false;
                        report.baked += 1;
                    }
                    _ => report.superseded += 1,
                }
            }
            tokio::task::yield_now().await;
        }
        log::debug!(
            "baked {} tiles ({} failed, {} superseded)",
            report.baked,
            report.failed,
            report.superseded
        );
        report
    }
    /// Shapes still visible in paint order, with their bounds. Everything up to the last clear is superseded.
    fn paint_list(&self, document: &DrawingDocument) -> Vec<(Arc<Shape>, Aabb)> {
        let ordered = document.ordered_shapes();
        let shapes: Vec<&Arc<Shape>> = ordered.iter().collect();
        let start = shapes
            .iter()
            .rposition(|shape| shape.is_clear())
            .map_or(0, |clear| clear + 1);
        shapes[start..]
            .iter()
            .filter_map(|shape| {
                if self.shapes.handler_for(shape).is_none() {
                    log::warn!("unknown {} shape {}, skipping", shape.kind(), shape.id);
                    return None;
                }
                Some(((*shape).clone(), self.shapes.bounds(shape)?))
            })
            .collect()
    }
    fn bake_tile(
        &self,
        key: TileKey,
        paint_list: &[(Arc<Shape>, Aabb)],
        viewport: &Viewport,
    ) -> Option<tiny_skia::Pixmap> {
        let pixels = tile_pixels(self.tile_size, viewport.pixel_ratio);
        let mut pixmap = tiny_skia::Pixmap::new(pixels, pixels)?;
        pixmap.fill(to_skia(viewport.background));
        let bounds = self.tile_bounds(key);
        let base = tiny_skia::Transform::from_scale(viewport.pixel_ratio, viewport.pixel_ratio)
            .pre_translate(-bounds.min[0], -bounds.min[1]);
        for (shape, shape_bounds) in paint_list {
            if shape_bounds.intersects(&bounds) {
                self.draw.draw(&mut pixmap, shape, base);
            }
        }
        Some(pixmap)
    }
}

/// Row-major keys in the inclusive rectangle. Empty if `min` isn't below and left of `max`.
fn keys_between(min: TileKey, max: TileKey) -> impl Iterator<Item = TileKey> {
    (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| TileKey { x, y }))
}
fn tile_pixels(tile_size: u32, pixel_ratio: f32) -> u32 {
    (tile_size as f32 * pixel_ratio).ceil() as u32
}
fn size_in_tiles(length: u32, tile_size: u32) -> i32 {
    i32::try_from(length.div_ceil(tile_size)).unwrap_or(i32::MAX)
}

/// Background-only pixels, as a freshly cleared tile would have.
#[must_use]
pub fn blank_tile(pixels: u32, background: Color) -> Option<tiny_skia::Pixmap> {
    let mut pixmap = tiny_skia::Pixmap::new(pixels, pixels)?;
    pixmap.fill(to_skia(background));
    Some(pixmap)
}

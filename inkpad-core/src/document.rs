//! # Drawing document
//!
//! The committed state of a drawing: every shape keyed by id, the layers they paint into, and the canvas size.
//! Snapshots are cheap to clone - shapes are shared behind [`Arc`], so a new revision only reallocates the
//! shapes it touched. That sharing is also what makes [`DirtyState::diff`] fast.

use std::cell::OnceCell;
use std::sync::Arc;

use crate::id::{LayerId, ShapeId};
use crate::layer::DrawingLayer;
use crate::shape::{json::ShapeRecord, Shape, ShapeHandlerRegistry};
use crate::zindex::ZIndex;

#[derive(Clone, Debug, PartialEq)]
pub struct DrawingDocument {
    shapes: hashbrown::HashMap<ShapeId, Arc<Shape>>,
    layers: hashbrown::HashMap<LayerId, DrawingLayer>,
    /// Canvas size in document units.
    size: [u32; 2],
    /// Next temporal order to hand out. Zero is reserved for "unassigned".
    temporal_counter: u64,
}
impl Default for DrawingDocument {
    fn default() -> Self {
        Self::new([1920, 1080])
    }
}
impl DrawingDocument {
    #[must_use]
    pub fn new(size: [u32; 2]) -> Self {
        Self {
            shapes: hashbrown::HashMap::new(),
            layers: hashbrown::HashMap::new(),
            size,
            temporal_counter: 1,
        }
    }
    #[must_use]
    pub fn size(&self) -> [u32; 2] {
        self.size
    }
    pub fn set_size(&mut self, size: [u32; 2]) {
        self.size = size;
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
    #[must_use]
    pub fn shape(&self, id: &ShapeId) -> Option<&Arc<Shape>> {
        self.shapes.get(id)
    }
    #[must_use]
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.contains_key(id)
    }
    /// All shapes, in no particular order. See [`Self::ordered_shapes`] for paint order.
    pub fn shapes(&self) -> impl Iterator<Item = &Arc<Shape>> + '_ {
        self.shapes.values()
    }
    /// Insert or replace a shape by id, returning the one it replaced.
    /// The temporal counter is advanced past the shape's order, so later shapes always sort after it.
    pub fn insert(&mut self, shape: Arc<Shape>) -> Option<Arc<Shape>> {
        self.temporal_counter = self.temporal_counter.max(shape.temporal_order + 1);
        self.shapes.insert(shape.id.clone(), shape)
    }
    pub fn remove(&mut self, id: &ShapeId) -> Option<Arc<Shape>> {
        self.shapes.remove(id)
    }
    /// Mutable access to a shape. Clones it out of the shared snapshot if needed.
    pub fn shape_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id).map(Arc::make_mut)
    }
    #[must_use]
    pub fn temporal_counter(&self) -> u64 {
        self.temporal_counter
    }
    /// Claim the next temporal order.
    pub fn next_temporal_order(&mut self) -> u64 {
        let order = self.temporal_counter;
        self.temporal_counter += 1;
        order
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&DrawingLayer> {
        self.layers.get(id)
    }
    pub fn layers(&self) -> impl Iterator<Item = &DrawingLayer> + '_ {
        self.layers.values()
    }
    /// The layer painting above all others, or None if only the base layer exists.
    #[must_use]
    pub fn topmost_layer(&self) -> Option<&LayerId> {
        self.layers
            .values()
            .max_by(|a, b| (&a.z_index, &a.id).cmp(&(&b.z_index, &b.id)))
            .map(|layer| &layer.id)
    }
    pub fn insert_layer(&mut self, layer: DrawingLayer) -> Option<DrawingLayer> {
        self.layers.insert(layer.id.clone(), layer)
    }
    /// Remove a layer. Shapes still referencing it fall back to the base layer's position.
    pub fn remove_layer(&mut self, id: &LayerId) -> Option<DrawingLayer> {
        self.layers.remove(id)
    }
    /// Z-index of the layer a shape paints into. `None` for the base layer, which sorts below every other.
    fn layer_z(&self, layer: Option<&LayerId>) -> Option<&ZIndex> {
        layer
            .and_then(|id| self.layers.get(id))
            .map(|layer| &layer.z_index)
    }
    fn paint_key<'s>(&'s self, shape: &'s Shape) -> PaintKey<'s> {
        (
            self.layer_z(shape.layer_id.as_ref()),
            &shape.z_index,
            shape.temporal_order,
            shape.id.as_str(),
        )
    }

    /// Shapes in paint order, bottom first. Sorting is deferred until first iterated,
    /// and the sequence may be iterated any number of times.
    #[must_use]
    pub fn ordered_shapes(&self) -> OrderedShapes<'_> {
        OrderedShapes {
            document: self,
            sorted: OnceCell::new(),
        }
    }
    /// A z-index above every shape in the document.
    #[must_use]
    pub fn next_z_index(&self) -> ZIndex {
        self.shapes
            .values()
            .map(|shape| &shape.z_index)
            .max()
            .map_or_else(ZIndex::first, ZIndex::after)
    }
    /// A z-index above every shape in the given layer (`None` for the base layer).
    #[must_use]
    pub fn next_z_index_in_layer(&self, layer: Option<&LayerId>) -> ZIndex {
        self.shapes
            .values()
            .filter(|shape| shape.layer_id.as_ref() == layer)
            .map(|shape| &shape.z_index)
            .max()
            .map_or_else(ZIndex::first, ZIndex::after)
    }

    pub fn to_record(
        &self,
        registry: &ShapeHandlerRegistry,
    ) -> Result<DocumentRecord, crate::shape::json::ShapeJsonError> {
        let shapes = self
            .ordered_shapes()
            .iter()
            .map(|shape| registry.to_record(shape))
            .collect::<Result<_, _>>()?;
        let mut layers: Vec<_> = self.layers.values().cloned().collect();
        layers.sort_by(|a, b| (&a.z_index, &a.id).cmp(&(&b.z_index, &b.id)));
        Ok(DocumentRecord {
            size: self.size,
            layers,
            shapes,
        })
    }
    /// Rebuild a document from its record. Shapes sharing an id keep the first occurrence.
    pub fn from_record(
        record: DocumentRecord,
        registry: &ShapeHandlerRegistry,
    ) -> Result<Self, crate::shape::json::ShapeJsonError> {
        let mut document = Self::new(record.size);
        for layer in record.layers {
            document.insert_layer(layer);
        }
        for shape in record.shapes {
            let shape = registry.from_record(shape)?;
            if document.contains(&shape.id) {
                log::warn!("duplicate shape id {} in document, skipping", shape.id);
                continue;
            }
            document.insert(Arc::new(shape));
        }
        Ok(document)
    }
}

type PaintKey<'s> = (Option<&'s ZIndex>, &'s ZIndex, u64, &'s str);

/// Persisted form of a whole document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentRecord {
    pub size: [u32; 2],
    #[serde(default)]
    pub layers: Vec<DrawingLayer>,
    pub shapes: Vec<ShapeRecord>,
}

/// Lazily sorted view of a document's shapes in paint order.
pub struct OrderedShapes<'doc> {
    document: &'doc DrawingDocument,
    sorted: OnceCell<Vec<&'doc Arc<Shape>>>,
}
impl<'doc> OrderedShapes<'doc> {
    fn sorted(&self) -> &[&'doc Arc<Shape>] {
        self.sorted.get_or_init(|| {
            let document = self.document;
            let mut shapes: Vec<_> = document.shapes.values().collect();
            // Keys are unique by id, so this is a total order and stability is moot.
            shapes.sort_unstable_by(|a, b| document.paint_key(a).cmp(&document.paint_key(b)));
            shapes
        })
    }
    /// Iterate from the bottom. Each call starts over.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'doc Arc<Shape>> + ExactSizeIterator + '_ {
        self.sorted().iter().copied()
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.document.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }
    /// Ids in paint order.
    #[must_use]
    pub fn ids(&self) -> Vec<ShapeId> {
        self.iter().map(|shape| shape.id.clone()).collect()
    }
}

/// Which shapes differ between two revisions of a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtyState {
    /// Added or changed shapes, by id in the newer revision.
    pub dirty: hashbrown::HashSet<ShapeId>,
    /// Shapes present before and absent now.
    pub deleted: hashbrown::HashSet<ShapeId>,
}
impl DirtyState {
    #[must_use]
    pub fn diff(previous: &DrawingDocument, current: &DrawingDocument) -> Self {
        let mut state = Self::default();
        for (id, shape) in &current.shapes {
            let changed = match previous.shapes.get(id) {
                None => true,
                // Same allocation means no revision touched it. Otherwise compare contents,
                // as a transaction may have cloned a shape without changing it.
                Some(old) => !Arc::ptr_eq(old, shape) && old != shape,
            };
            // A moved layer repaints everything in it, even untouched shapes.
            let layer_moved = shape.layer_id.as_ref().is_some_and(|layer| {
                previous.layers.get(layer).map(|l| &l.z_index)
                    != current.layers.get(layer).map(|l| &l.z_index)
            });
            if changed || layer_moved {
                state.dirty.insert(id.clone());
            }
        }
        state.deleted.extend(
            previous
                .shapes
                .keys()
                .filter(|id| !current.shapes.contains_key(*id))
                .cloned(),
        );
        state
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.deleted.is_empty()
    }
}

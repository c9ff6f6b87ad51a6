//! # IDs
//! Shapes and layers are addressed by string IDs, namespaced by a marker type via `StringID<T>`.
//! They are strings rather than integers as they are persisted and exchanged with remote replicas,
//! which allocate IDs of their own concurrently.
//!
//! To get a fresh ID, ask the session's [`IdGenerator`]. IDs from a generator embed a per-session nonce,
//! so two replicas generating with the same prefix never collide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// ID that is unique within a document and across every replica editing it.
/// IDs with different namespaces may share a value but should not be considered equal.
pub struct StringID<T: 'static> {
    id: Arc<str>,
    // Namespace marker
    _phantom: std::marker::PhantomData<fn() -> T>,
}
pub struct ShapeMarker;
pub struct LayerMarker;
pub type ShapeId = StringID<ShapeMarker>;
pub type LayerId = StringID<LayerMarker>;

impl<T> StringID<T> {
    /// Wrap an existing string as an ID, eg. one read back from JSON or a remote replica.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            _phantom: std::marker::PhantomData,
        }
    }
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }
}
// Derives would place bounds on T, which is only ever a marker.
impl<T> Clone for StringID<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}
impl<T> PartialEq for StringID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T> Eq for StringID<T> {}
impl<T> PartialOrd for StringID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for StringID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T> std::hash::Hash for StringID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl<T> std::borrow::Borrow<str> for StringID<T> {
    fn borrow(&self) -> &str {
        &self.id
    }
}
impl<T> From<&str> for StringID<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl<T> From<String> for StringID<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
impl<T> std::fmt::Display for StringID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}
impl<T> std::fmt::Debug for StringID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({:?})",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or_default(),
            &*self.id
        )
    }
}
impl<T> serde::Serialize for StringID<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}
impl<'de, T> serde::Deserialize<'de> for StringID<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Session-scoped ID allocator.
///
/// Not a process-wide server - every editing session owns one, and tests may construct
/// their own with a fixed session name for predictable output.
pub struct IdGenerator {
    session: String,
    next: AtomicU64,
}
impl IdGenerator {
    /// Create a generator with a random session nonce.
    #[must_use]
    pub fn new() -> Self {
        // First block of a v4 uuid is plenty to separate concurrent sessions.
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self::with_session(&uuid[..8])
    }
    #[must_use]
    pub fn with_session(session: &str) -> Self {
        Self {
            session: session.to_owned(),
            next: AtomicU64::new(1),
        }
    }
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }
    /// Allocate an ID of the form `{prefix}_{session}_{counter}`.
    pub fn generate<T>(&self, prefix: &str) -> StringID<T> {
        // Order doesn't matter, it only needs to be unique.
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        StringID::new(format!("{prefix}_{}_{n:x}", self.session))
    }
    /// Allocate many IDs at once with the same prefix.
    pub fn many<'a, T: 'static>(
        &'a self,
        prefix: &'a str,
        count: usize,
    ) -> impl ExactSizeIterator<Item = StringID<T>> + 'a {
        let start = self.next.fetch_add(count as u64, Ordering::Relaxed);
        (0..count).map(move |idx| {
            StringID::new(format!("{prefix}_{}_{:x}", self.session, start + idx as u64))
        })
    }
}
impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::{IdGenerator, ShapeId};

    #[test]
    fn generated_ids_unique() {
        let ids = IdGenerator::with_session("test");
        let mut v: Vec<ShapeId> = ids.many("pen", 512).collect();
        v.push(ids.generate("pen"));
        v.push(ids.generate("pen"));

        let length_before = v.len();
        v.sort_unstable();
        v.dedup();
        assert_eq!(length_before, v.len(), "had duplicate ids");
    }
    #[test]
    fn sessions_do_not_collide() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();
        let a_id: ShapeId = a.generate("rect");
        let b_id: ShapeId = b.generate("rect");
        assert_ne!(a.session(), b.session());
        assert_ne!(a_id, b_id);
    }
    #[test]
    fn format_and_serde() {
        let ids = IdGenerator::with_session("s1");
        let id: ShapeId = ids.generate("stamp");
        assert_eq!(id.as_str(), "stamp_s1_1");

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"stamp_s1_1\"");
        let back: ShapeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

//! Map collections backing map values.
//!
//! [`LtMap`] wraps the `im` crate's persistent hash map so snapshots are
//! O(1) clones with structural sharing. [`MapRef`] is the single owning
//! handle that scripts mutate in place: every clone of a `MapRef` sees the
//! same entries.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

use crate::value::Value;

// =============================================================================
// LtMap
// =============================================================================

/// Persistent hash map with structural sharing.
#[derive(Clone)]
pub struct LtMap<K, V>(im::HashMap<K, V>)
where
    K: Clone + Eq + Hash,
    V: Clone;

impl<K: Clone + Eq + Hash, V: Clone> LtMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(im::HashMap::new())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.get(key)
    }

    /// Returns true if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.contains_key(key)
    }

    /// Returns a new map with the key-value pair inserted.
    #[must_use]
    pub fn update(&self, key: K, value: V) -> Self {
        Self(self.0.update(key, value))
    }

    /// Returns a new map with the key removed.
    #[must_use]
    pub fn without<Q>(&self, key: &Q) -> Self
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self(self.0.without(key))
    }

    /// Inserts in place, returning the previous value for the key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.0.insert(key, value)
    }

    /// Removes in place, returning the value that was stored for the key.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.remove(key)
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter()
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.keys()
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.values()
    }
}

impl<K: Clone + Eq + Hash, V: Clone> Default for LtMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for LtMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Clone + Eq + Hash, V: Clone + PartialEq> PartialEq for LtMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K: Clone + Eq + Hash, V: Clone> FromIterator<(K, V)> for LtMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(im::HashMap::from_iter(iter))
    }
}

// =============================================================================
// MapRef
// =============================================================================

type MapCell = RefCell<LtMap<Arc<str>, Value>>;

/// Pairs of maps whose comparison is still in progress.
pub(crate) type InProgress = Vec<(*const MapCell, *const MapCell)>;

/// Shared handle to a mutable string-keyed map.
///
/// Cloning a `MapRef` clones the handle, not the entries. Execution is
/// single-threaded, so the handle is `Rc<RefCell<..>>` and therefore `!Send`.
/// Borrows are never held across calls into the VM.
#[derive(Clone, Default)]
pub struct MapRef(Rc<MapCell>);

impl MapRef {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing persistent map.
    #[must_use]
    pub fn from_map(map: LtMap<Arc<str>, Value>) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        RefCell::borrow(&self.0).len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        RefCell::borrow(&self.0).is_empty()
    }

    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        RefCell::borrow(&self.0).get(key).cloned()
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        RefCell::borrow(&self.0).contains_key(key)
    }

    /// Inserts or overwrites an entry, returning the previous value.
    pub fn insert(&self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Option<Value> {
        let (key, value) = (key.into(), value.into());
        RefCell::borrow_mut(&self.0).insert(key, value)
    }

    /// Removes an entry, returning the value that was stored.
    pub fn remove(&self, key: &str) -> Option<Value> {
        RefCell::borrow_mut(&self.0).remove(key)
    }

    /// Returns an O(1) persistent snapshot of the current entries.
    ///
    /// Later mutations through the handle do not affect the snapshot.
    #[must_use]
    pub fn snapshot(&self) -> LtMap<Arc<str>, Value> {
        RefCell::borrow(&self.0).clone()
    }

    /// Borrows the entries for the duration of the guard.
    #[must_use]
    pub fn entries(&self) -> Ref<'_, LtMap<Arc<str>, Value>> {
        RefCell::borrow(&self.0)
    }

    /// Returns the entries sorted by key.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<(Arc<str>, Value)> {
        let mut entries: Vec<_> = RefCell::borrow(&self.0)
            .iter()
            .map(|(k, v)| (Arc::clone(k), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Returns true if both handles point at the same map.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl MapRef {
    /// Compares entries pairwise.
    ///
    /// A pair already on `seen` is assumed equal, so maps that contain
    /// themselves or each other compare in finite time.
    pub(crate) fn eq_with(&self, other: &Self, seen: &mut InProgress, numeric: bool) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let pair = (Rc::as_ptr(&self.0), Rc::as_ptr(&other.0));
        if seen.contains(&pair) {
            return true;
        }
        let (a, b) = (RefCell::borrow(&self.0), RefCell::borrow(&other.0));
        if a.len() != b.len() {
            return false;
        }
        seen.push(pair);
        let equal = a
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|w| v.eq_with(w, seen, numeric)));
        seen.pop();
        equal
    }
}

impl PartialEq for MapRef {
    fn eq(&self, other: &Self) -> bool {
        self.eq_with(other, &mut InProgress::new(), false)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Map(self.clone()))
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>> FromIterator<(K, V)> for MapRef {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

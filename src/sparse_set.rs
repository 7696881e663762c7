//! Sparse set with O(1) insert, membership and swap-remove.
//!
//! Members live in a dense `Vec`; a hash index maps each member to its dense
//! slot. Removal moves the last dense member into the vacated slot, so the
//! relative order of the remaining members is not preserved.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Set of stable-identity items (entity ids, handles) backed by a dense array
#[derive(Debug, Clone)]
pub struct SparseSet<V> {
    dense: Vec<V>,
    sparse: FxHashMap<V, usize>,
}

impl<V: Hash + Eq + Clone> SparseSet<V> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: FxHashMap::default(),
        }
    }

    /// Create an empty set with room for `capacity` members
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Insert `item`. Returns false if it was already present.
    pub fn add(&mut self, item: V) -> bool {
        if self.sparse.contains_key(&item) {
            return false;
        }
        self.sparse.insert(item.clone(), self.dense.len());
        self.dense.push(item);
        true
    }

    /// Remove `item` by swapping the last member into its slot.
    /// Returns false if it was not present.
    pub fn remove(&mut self, item: &V) -> bool {
        let Some(index) = self.sparse.remove(item) else {
            return false;
        };

        self.dense.swap_remove(index);

        // Re-point the member that was moved into `index`
        if let Some(moved) = self.dense.get(index) {
            if let Some(slot) = self.sparse.get_mut(moved) {
                *slot = index;
            }
        }
        true
    }

    /// Membership test
    #[inline]
    pub fn has(&self, item: &V) -> bool {
        self.sparse.contains_key(item)
    }

    /// Number of members
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Dense slot of `item`, if present
    pub fn index_of(&self, item: &V) -> Option<usize> {
        self.sparse.get(item).copied()
    }

    /// Member stored in the first dense slot
    pub fn first(&self) -> Option<&V> {
        self.dense.first()
    }

    /// Dense backing slice, in insertion order modulo swap-removals
    pub fn values(&self) -> &[V] {
        &self.dense
    }

    /// Iterate members from the last dense slot to the first
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.dense.iter().rev(),
        }
    }

    /// Visit every member in iteration order
    pub fn for_each<F: FnMut(&V)>(&self, f: F) {
        self.iter().for_each(f);
    }

    /// Remove every member, always taking the last dense slot so no
    /// swap happens and nothing is skipped.
    pub fn clear(&mut self) {
        while let Some(last) = self.dense.last().cloned() {
            self.remove(&last);
        }
    }
}

impl<V: Hash + Eq + Clone> Default for SparseSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Hash + Eq + Clone> FromIterator<V> for SparseSet<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut set = SparseSet::new();
        set.extend(iter);
        set
    }
}

impl<V: Hash + Eq + Clone> Extend<V> for SparseSet<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for item in iter {
            self.add(item);
        }
    }
}

impl<'a, V: Hash + Eq + Clone> IntoIterator for &'a SparseSet<V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Reverse dense-order iterator over a [`SparseSet`]
pub struct Iter<'a, V> {
    inner: std::iter::Rev<std::slice::Iter<'a, V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

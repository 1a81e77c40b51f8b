//! Staged, in-memory diffs over a [`StateAccess`] base.
//!
//! The parallel executor (spec §4.5) runs each dependency level's lanes
//! against their own [`StateOverlay`], then merges the resulting
//! [`StateChangeSet`]s back onto the base in `(level, lane_id, tx_index)`
//! order. This is the teacher's `StateOverlay`/`MergingIterator` shape,
//! narrowed to the flat byte-keyed model GTOS state uses instead of the
//! teacher's tree-node addressing.

use std::collections::{BTreeMap, BTreeSet};

use gtos_types::error::ExecutionError;

use crate::accessor::StateAccess;

/// Extends [`StateAccess`] with an ordered prefix scan, needed for
/// namespaced-KV listing and validator-registry enumeration.
pub trait StateIterate: StateAccess {
    /// Returns all live `(key, value)` pairs whose key starts with `prefix`,
    /// sorted by key.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, ExecutionError>;
}

/// The net effect of an overlay: keys inserted/updated and keys deleted,
/// relative to the overlay's base.
#[derive(Debug, Clone, Default)]
pub struct StateChangeSet {
    /// Keys written (inserted or updated), in the order they were applied.
    pub inserts: StateInserts,
    /// Keys removed.
    pub deletes: StateDeletes,
}

/// Newtype over the insert half of a [`StateChangeSet`].
#[derive(Debug, Clone, Default)]
pub struct StateInserts(pub Vec<(Vec<u8>, Vec<u8>)>);

/// Newtype over the delete half of a [`StateChangeSet`].
#[derive(Debug, Clone, Default)]
pub struct StateDeletes(pub Vec<Vec<u8>>);

impl StateChangeSet {
    /// `true` iff this changeset touches no keys at all.
    pub fn is_empty(&self) -> bool {
        self.inserts.0.is_empty() && self.deletes.0.is_empty()
    }
}

/// A staged read/write view over a `base`, recording writes locally until
/// explicitly merged.
pub struct StateOverlay<B> {
    base: B,
    inserts: BTreeMap<Vec<u8>, Vec<u8>>,
    deletes: BTreeSet<Vec<u8>>,
}

impl<B: StateAccess> StateOverlay<B> {
    /// Wraps `base` in a fresh, empty overlay.
    pub fn new(base: B) -> Self {
        StateOverlay {
            base,
            inserts: BTreeMap::new(),
            deletes: BTreeSet::new(),
        }
    }

    /// Drops the overlay, returning the untouched base.
    pub fn into_base(self) -> B {
        self.base
    }

    /// Borrows the base, e.g. to read values unaffected by this overlay.
    pub fn base(&self) -> &B {
        &self.base
    }

    /// `true` iff no writes have been staged.
    pub fn is_clean(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Snapshots the staged writes as a [`StateChangeSet`], without
    /// consuming the overlay.
    pub fn changes(&self) -> StateChangeSet {
        StateChangeSet {
            inserts: StateInserts(
                self.inserts
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            deletes: StateDeletes(self.deletes.iter().cloned().collect()),
        }
    }

    /// Applies a previously-produced [`StateChangeSet`] onto `base` directly,
    /// in insert-then-delete order. Used by the block processor to merge a
    /// completed dependency level's lanes back onto the authoritative store.
    pub fn apply_changes(base: &mut B, changes: &StateChangeSet) -> Result<(), ExecutionError> {
        for (k, v) in &changes.inserts.0 {
            base.put(k, v.clone())?;
        }
        for k in &changes.deletes.0 {
            base.delete(k)?;
        }
        Ok(())
    }
}

impl<B: StateAccess> StateAccess for StateOverlay<B> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecutionError> {
        if self.deletes.contains(key) {
            return Ok(None);
        }
        if let Some(v) = self.inserts.get(key) {
            return Ok(Some(v.clone()));
        }
        self.base.get(key)
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), ExecutionError> {
        self.deletes.remove(key);
        self.inserts.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), ExecutionError> {
        self.inserts.remove(key);
        self.deletes.insert(key.to_vec());
        Ok(())
    }
}

impl<B: StateIterate> StateIterate for StateOverlay<B> {
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, ExecutionError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .base
            .scan_prefix(prefix)?
            .into_iter()
            .filter(|(k, _)| !self.deletes.contains(k))
            .collect();
        for (k, v) in self.inserts.range(prefix.to_vec()..) {
            if !k.starts_with(prefix) {
                break;
            }
            merged.insert(k.clone(), v.clone());
        }
        Ok(merged.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemStore(BTreeMap<Vec<u8>, Vec<u8>>);

    impl StateAccess for MemStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecutionError> {
            Ok(self.0.get(key).cloned())
        }
        fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), ExecutionError> {
            self.0.insert(key.to_vec(), value);
            Ok(())
        }
        fn delete(&mut self, key: &[u8]) -> Result<(), ExecutionError> {
            self.0.remove(key);
            Ok(())
        }
    }

    impl StateIterate for MemStore {
        fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, ExecutionError> {
            Ok(self
                .0
                .range(prefix.to_vec()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }
    }

    #[test]
    fn overlay_shadows_base_without_mutating_it() {
        let mut base = MemStore::default();
        base.put(b"a", vec![1]).unwrap();
        let mut overlay = StateOverlay::new(base);
        overlay.put(b"a", vec![2]).unwrap();
        overlay.put(b"b", vec![3]).unwrap();
        assert_eq!(overlay.get(b"a").unwrap(), Some(vec![2]));
        assert_eq!(overlay.base().get(b"a").unwrap(), Some(vec![1]));
        assert_eq!(overlay.get(b"b").unwrap(), Some(vec![3]));
    }

    #[test]
    fn delete_shadows_base_value() {
        let mut base = MemStore::default();
        base.put(b"a", vec![1]).unwrap();
        let mut overlay = StateOverlay::new(base);
        overlay.delete(b"a").unwrap();
        assert_eq!(overlay.get(b"a").unwrap(), None);
        assert_eq!(overlay.base().get(b"a").unwrap(), Some(vec![1]));
    }

    #[test]
    fn apply_changes_merges_onto_base() {
        let mut base = MemStore::default();
        base.put(b"a", vec![1]).unwrap();
        let mut overlay = StateOverlay::new(MemStore::default());
        overlay.put(b"a", vec![9]).unwrap();
        overlay.put(b"c", vec![7]).unwrap();
        let changes = overlay.changes();
        StateOverlay::apply_changes(&mut base, &changes).unwrap();
        assert_eq!(base.get(b"a").unwrap(), Some(vec![9]));
        assert_eq!(base.get(b"c").unwrap(), Some(vec![7]));
    }

    #[test]
    fn scan_prefix_merges_base_and_overlay() {
        let mut base = MemStore::default();
        base.put(b"kv\0a", vec![1]).unwrap();
        base.put(b"kv\0b", vec![2]).unwrap();
        let mut overlay = StateOverlay::new(base);
        overlay.put(b"kv\0b", vec![20]).unwrap();
        overlay.put(b"kv\0c", vec![3]).unwrap();
        let scanned = overlay.scan_prefix(b"kv\0").unwrap();
        assert_eq!(
            scanned,
            vec![
                (b"kv\0a".to_vec(), vec![1]),
                (b"kv\0b".to_vec(), vec![20]),
                (b"kv\0c".to_vec(), vec![3]),
            ]
        );
    }
}

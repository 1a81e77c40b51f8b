//! State root commitment.
//!
//! The spec fixes only that a `state_root` exists and that re-execution on
//! import must reproduce it exactly (spec §4.8) — it never mandates a
//! particular tree algorithm. The teacher's pluggable IAVL/verkle/KZG state
//! trees exist to serve a VM that needs inclusion/non-membership proofs for
//! light clients; GTOS has no VM and no light-client proof surface, so this
//! crate keeps only the teacher's `HashCommitmentScheme` leaf/branch
//! hashing idiom (0x00/0x01-prefixed domain separation) and applies it as a
//! flat ordered accumulator over the full state key space, recomputed each
//! block. See `DESIGN.md` for why the tree machinery was dropped.

use gtos_crypto::hash::keccak256;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;
const EMPTY_ROOT: [u8; 32] = [0u8; 32];

fn leaf_hash(key: &[u8], value: &[u8]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(1 + key.len() + value.len());
    buf.push(LEAF_PREFIX);
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    keccak256(&buf)
}

fn combine(acc: [u8; 32], leaf: [u8; 32]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(1 + 64);
    buf.push(NODE_PREFIX);
    buf.extend_from_slice(&acc);
    buf.extend_from_slice(&leaf);
    keccak256(&buf)
}

/// Computes the state root over `entries`, which MUST already be sorted by
/// key (e.g. a `BTreeMap`'s iteration order) for the result to be
/// reproducible across nodes.
pub fn compute_state_root<'a, I>(entries: I) -> [u8; 32]
where
    I: IntoIterator<Item = (&'a Vec<u8>, &'a Vec<u8>)>,
{
    let mut acc = EMPTY_ROOT;
    for (key, value) in entries {
        acc = combine(acc, leaf_hash(key, value));
    }
    acc
}

/// The same leaf/branch accumulator as [`compute_state_root`], applied to a
/// fixed-order sequence instead of a sorted key space — used by the block
/// processor for `transactions_root`/`receipts_root` (spec §4.8), which
/// commit to list order rather than key order.
pub fn compute_list_root<I>(items: I) -> [u8; 32]
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let mut acc = EMPTY_ROOT;
    for (index, item) in items.into_iter().enumerate() {
        acc = combine(acc, leaf_hash(&(index as u64).to_be_bytes(), &item));
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_state_has_zero_root() {
        let entries: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        assert_eq!(compute_state_root(entries.iter()), EMPTY_ROOT);
    }

    #[test]
    fn root_is_order_independent_of_insertion() {
        let mut a: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        a.insert(b"x".to_vec(), vec![1]);
        a.insert(b"a".to_vec(), vec![2]);

        let mut b: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        b.insert(b"a".to_vec(), vec![2]);
        b.insert(b"x".to_vec(), vec![1]);

        assert_eq!(compute_state_root(a.iter()), compute_state_root(b.iter()));
    }

    #[test]
    fn differing_value_changes_root() {
        let mut a: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        a.insert(b"a".to_vec(), vec![1]);
        let mut b: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        b.insert(b"a".to_vec(), vec![2]);
        assert_ne!(compute_state_root(a.iter()), compute_state_root(b.iter()));
    }
}

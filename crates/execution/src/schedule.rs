//! Dependency-level / lane scheduling (spec §4.5). Transactions are grouped
//! into levels such that any two transactions sharing a touched key never
//! land in the same level; within a level, lanes are simply the
//! transaction's position in ascending `tx_index` order, so the merge order
//! `(level, lane_id, tx_index)` reduces to ascending `tx_index` within a
//! level (one lane per transaction).

use std::collections::HashMap;

use crate::access::AccessSet;

/// One dependency level: transaction indices that may run concurrently
/// against disjoint state, in ascending `tx_index` order.
#[derive(Debug, Clone, Default)]
pub struct Level {
    /// Original `tx_index` values assigned to this level, in lane order.
    pub tx_indices: Vec<usize>,
}

/// Builds the level schedule for a block's transactions from their access
/// sets (spec §4.5). Transactions from the same sender always share a
/// dependency edge through that sender's `account_key`, so same-sender
/// transactions are never placed in the same level — preserving nonce order.
pub fn build_schedule(access_sets: &[AccessSet]) -> Vec<Level> {
    let mut last_level_for_key: HashMap<Vec<u8>, usize> = HashMap::new();
    let mut level_of_tx = vec![0usize; access_sets.len()];

    for (tx_index, set) in access_sets.iter().enumerate() {
        let level = set
            .0
            .iter()
            .filter_map(|k| last_level_for_key.get(k))
            .copied()
            .max()
            .map_or(0, |prev| prev + 1);
        level_of_tx[tx_index] = level;
        for k in &set.0 {
            last_level_for_key.insert(k.clone(), level);
        }
    }

    let max_level = level_of_tx.iter().copied().max().unwrap_or(0);
    let mut levels: Vec<Level> = (0..=max_level).map(|_| Level::default()).collect();
    for (tx_index, level) in level_of_tx.into_iter().enumerate() {
        if let Some(l) = levels.get_mut(level) {
            l.tx_indices.push(tx_index);
        }
    }
    levels.retain(|l| !l.tx_indices.is_empty());
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(keys: &[&[u8]]) -> AccessSet {
        AccessSet(keys.iter().map(|k| k.to_vec()).collect::<BTreeSet<_>>())
    }

    #[test]
    fn disjoint_transactions_share_one_level() {
        let sets = vec![set(&[b"a"]), set(&[b"b"]), set(&[b"c"])];
        let schedule = build_schedule(&sets);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].tx_indices, vec![0, 1, 2]);
    }

    #[test]
    fn conflicting_transactions_split_into_successive_levels() {
        let sets = vec![set(&[b"a"]), set(&[b"a"]), set(&[b"a"])];
        let schedule = build_schedule(&sets);
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].tx_indices, vec![0]);
        assert_eq!(schedule[1].tx_indices, vec![1]);
        assert_eq!(schedule[2].tx_indices, vec![2]);
    }

    #[test]
    fn mixed_conflicts_preserve_per_key_ordering() {
        // tx0 and tx2 touch "a" (must order 0 before 2); tx1 is disjoint.
        let sets = vec![set(&[b"a"]), set(&[b"b"]), set(&[b"a"])];
        let schedule = build_schedule(&sets);
        let level_of = |idx: usize| schedule.iter().position(|l| l.tx_indices.contains(&idx)).unwrap();
        assert!(level_of(0) < level_of(2));
    }

    #[test]
    fn empty_schedule_for_no_transactions() {
        let schedule = build_schedule(&[]);
        assert!(schedule.is_empty());
    }
}

//! Fixed-watermark retention (spec §4.9).
//!
//! GTOS's retention window is a constant, `retain_blocks`, fixed at genesis
//! — unlike the teacher's configurable horizon/finality-cutoff
//! `RetentionManager`, there is no separate "finalized" cursor to track.
//! `oldest_available` is a pure function of `head`, recomputed on every
//! block import.

use std::sync::atomic::{AtomicU64, Ordering};

use gtos_types::error::HistoryPrunedError;

use crate::pins::StateVersionPins;

/// `max(0, head - retain_blocks + 1)`, the lowest block number whose body
/// is still guaranteed to be retrievable.
pub fn oldest_available(head: u64, retain_blocks: u64) -> u64 {
    head.saturating_sub(retain_blocks.saturating_sub(1))
}

/// Rejects a numeric query for `requested` with a `history_pruned` outcome
/// iff it targets a block below the watermark. Tag-based queries
/// (latest/safe/finalized) never call this.
pub fn check_height_available(
    requested: u64,
    head: u64,
    retain_blocks: u64,
) -> Result<(), HistoryPrunedError> {
    let watermark = oldest_available(head, retain_blocks);
    if requested < watermark {
        return Err(HistoryPrunedError {
            retain_blocks,
            oldest_available_block: watermark,
            requested_block: requested,
            head_block: head,
        });
    }
    Ok(())
}

/// A set of block heights whose bodies are safe to prune right now, and the
/// heights excluded from that set because of an outstanding pin.
#[derive(Debug, Clone, Default)]
pub struct PrunePlan {
    /// Bodies strictly below this height (and at or above the previous
    /// watermark) are eligible for removal.
    pub cutoff_height: u64,
    /// Heights below `cutoff_height` that must NOT be pruned this round
    /// because a [`crate::pins::PinGuard`] is outstanding on them.
    pub excluded_heights: Vec<u64>,
}

impl PrunePlan {
    /// `true` iff `height` is excluded from this plan's prune set.
    pub fn excludes(&self, height: u64) -> bool {
        self.excluded_heights.contains(&height)
    }

    /// The heights this plan actually prunes: `[0, cutoff_height)` minus
    /// `excluded_heights`.
    pub fn heights_to_prune(&self) -> Vec<u64> {
        (0..self.cutoff_height)
            .filter(|h| !self.excludes(*h))
            .collect()
    }
}

/// Tracks `head` and the network's fixed `retain_blocks`, producing
/// [`PrunePlan`]s as the chain advances.
pub struct RetentionManager {
    retain_blocks: u64,
    head: AtomicU64,
    pins: StateVersionPins,
}

impl RetentionManager {
    /// A manager for a chain whose retention window is `retain_blocks`
    /// blocks (spec genesis constant, typically 200).
    pub fn new(retain_blocks: u64) -> Self {
        RetentionManager {
            retain_blocks,
            head: AtomicU64::new(0),
            pins: StateVersionPins::new(),
        }
    }

    /// The pin table backing this manager, clonable and shareable with
    /// readers that need to hold a height open past its watermark.
    pub fn pins(&self) -> &StateVersionPins {
        &self.pins
    }

    /// The fixed retention window size.
    pub fn retain_blocks(&self) -> u64 {
        self.retain_blocks
    }

    /// The current chain head this manager has observed.
    pub fn head(&self) -> u64 {
        self.head.load(Ordering::SeqCst)
    }

    /// Records a new chain head, monotonically.
    pub fn advance_head(&self, new_head: u64) {
        self.head.fetch_max(new_head, Ordering::SeqCst);
    }

    /// The current watermark: `max(0, head - retain_blocks + 1)`.
    pub fn oldest_available(&self) -> u64 {
        oldest_available(self.head(), self.retain_blocks)
    }

    /// Rejects `requested` with `history_pruned` iff it is below the
    /// current watermark.
    pub fn check_available(&self, requested: u64) -> Result<(), HistoryPrunedError> {
        check_height_available(requested, self.head(), self.retain_blocks)
    }

    /// Builds a [`PrunePlan`] for the current watermark, excluding any
    /// pinned heights below it.
    pub fn plan(&self) -> PrunePlan {
        let cutoff = self.oldest_available();
        let excluded = (0..cutoff)
            .filter(|h| self.pins.is_pinned(*h))
            .collect();
        PrunePlan {
            cutoff_height: cutoff,
            excluded_heights: excluded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_is_zero_before_retain_window_fills() {
        assert_eq!(oldest_available(50, 200), 0);
    }

    #[test]
    fn watermark_follows_head_once_window_fills() {
        assert_eq!(oldest_available(500, 200), 301);
    }

    #[test]
    fn check_height_available_rejects_below_watermark() {
        let err = check_height_available(100, 500, 200).unwrap_err();
        assert_eq!(err.oldest_available_block, 301);
        assert_eq!(err.requested_block, 100);
        assert_eq!(err.head_block, 500);
    }

    #[test]
    fn check_height_available_accepts_at_or_above_watermark() {
        assert!(check_height_available(301, 500, 200).is_ok());
        assert!(check_height_available(500, 500, 200).is_ok());
    }

    #[test]
    fn plan_excludes_pinned_heights_below_cutoff() {
        let mgr = RetentionManager::new(200);
        mgr.advance_head(500);
        let guard = mgr.pins().pin(100);
        let plan = mgr.plan();
        assert_eq!(plan.cutoff_height, 301);
        assert!(plan.excludes(100));
        assert!(!plan.excludes(50));
        drop(guard);
    }
}

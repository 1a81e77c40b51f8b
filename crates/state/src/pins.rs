//! Reference-counted height pins.
//!
//! Ported from the teacher's `StateVersionPins`/`PinGuard`: callers (RPC
//! handlers, snapshot readers) that need a block's body to stay available
//! past its retention watermark take a pin for the duration of the read.
//! The retention manager (`retention.rs`) excludes pinned heights from its
//! prune plan even when they fall below `oldest_available`.

use std::sync::Arc;

use dashmap::DashMap;

/// Shared pin-count table, keyed by block height.
#[derive(Clone, Default)]
pub struct StateVersionPins {
    counts: Arc<DashMap<u64, u64>>,
}

impl StateVersionPins {
    /// An empty pin table.
    pub fn new() -> Self {
        StateVersionPins::default()
    }

    /// Pins `height`, returning a guard that unpins on drop.
    pub fn pin(&self, height: u64) -> PinGuard {
        *self.counts.entry(height).or_insert(0) += 1;
        PinGuard {
            pins: self.clone(),
            height,
        }
    }

    /// `true` iff `height` currently has at least one outstanding pin.
    pub fn is_pinned(&self, height: u64) -> bool {
        self.counts.get(&height).is_some_and(|c| *c > 0)
    }

    /// The lowest currently-pinned height, if any.
    pub fn min_pinned_height(&self) -> Option<u64> {
        self.counts
            .iter()
            .filter(|e| *e.value() > 0)
            .map(|e| *e.key())
            .min()
    }

    fn unpin(&self, height: u64) {
        if let Some(mut entry) = self.counts.get_mut(&height) {
            *entry = entry.saturating_sub(1);
            if *entry == 0 {
                drop(entry);
                self.counts.remove(&height);
            }
        }
    }
}

/// RAII guard for one outstanding pin on a height; unpins on drop.
pub struct PinGuard {
    pins: StateVersionPins,
    height: u64,
}

impl PinGuard {
    /// The pinned height.
    pub fn height(&self) -> u64 {
        self.height
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.pins.unpin(self.height);
    }
}

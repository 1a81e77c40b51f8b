#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! Account/code/KV state storage, staged overlays, pins, retention, and the
//! state-root commitment (spec §3 DATA MODEL, §4.6 TTL PRIMITIVES, §4.9
//! RETENTION & HISTORY-PRUNE).
//!
//! This crate owns the node's "current state" view: a flat, byte-keyed
//! store ([`store::BTreeMapStore`]) with a typed account/code/KV layer
//! ([`store::GtosStateStore`]) on top, a staged-overlay mechanism the
//! parallel executor uses per dependency level ([`overlay::StateOverlay`]),
//! and the fixed-watermark retention bookkeeping (spec §4.9).

/// The byte-keyed read/write seam every state view implements.
pub mod accessor;
/// State root commitment over the full state key space.
pub mod commitment;
/// Staged, in-memory diffs over a [`accessor::StateAccess`] base.
pub mod overlay;
/// Reference-counted height pins, used to keep pruned heights alive for
/// in-flight readers.
pub mod pins;
/// Fixed-watermark retention and prune planning (spec §4.9).
pub mod retention;
/// The canonical in-memory store and typed account/code/KV accessors.
pub mod store;

pub use accessor::StateAccess;
pub use commitment::{compute_list_root, compute_state_root};
pub use overlay::{StateChangeSet, StateDeletes, StateInserts, StateIterate, StateOverlay};
pub use pins::{PinGuard, StateVersionPins};
pub use retention::{check_height_available, oldest_available, PrunePlan, RetentionManager};
pub use store::{BTreeMapStore, GtosStateStore};

#[cfg(test)]
mod tests {
    #[test]
    fn state_canary() {}
}

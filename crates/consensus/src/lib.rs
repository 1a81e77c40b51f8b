#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! DPoS slot clock, validator rotation, header verification and the
//! bounded snapshot cache for the GTOS node (spec §4.1, §4.2).
//!
//! [`verify_and_apply_header`] is the crate's single entry point: given a
//! resolved parent header and the snapshot derived through it, it runs the
//! full `admit` → `cascade` → `seal` → `apply` pipeline and returns the
//! snapshot the chain should cache at the new header's hash.

pub mod cache;
pub mod header_ops;
pub mod slot;
pub mod verify;

pub use cache::{HeaderSource, SnapshotCache};
pub use header_ops::{apply_header, genesis_snapshot, header_hash, recover_seal_signer};
pub use verify::verify_header;

use gtos_types::app::{Address, BlockHeader, Snapshot};
use gtos_types::config::ChainConfig;
use gtos_types::error::ConsensusError;

/// Runs the full per-header verification and snapshot-application
/// pipeline: `admit` → `cascade` → `seal` (via [`verify_header`]), then
/// `apply` (via [`header_ops::apply_header`]). Returns the snapshot the
/// caller should cache at `hdr`'s hash alongside the imported block.
pub fn verify_and_apply_header(
    hdr: &BlockHeader,
    parent: &BlockHeader,
    snapshot: &Snapshot,
    now_ms: u64,
    cfg: &ChainConfig,
) -> Result<Snapshot, ConsensusError> {
    let signer = verify_header(hdr, parent, snapshot, now_ms, cfg)?;
    let is_epoch_block = hdr.number != 0 && hdr.number % cfg.epoch == 0;
    apply_header(snapshot, hdr, signer, is_epoch_block, cfg.seal_signer_type)
}

/// Recovers the address that sealed `hdr` without re-running the full
/// verification pipeline, for callers that already trust the header (e.g.
/// replaying a locally-produced chain).
pub fn signer_of(hdr: &BlockHeader, cfg: &ChainConfig) -> Result<Address, ConsensusError> {
    cache::signer_of(hdr, cfg)
}

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

//! Pure-Rust persistent storage (redb + epoch sharding) for GTOS state
//! backends: a [`traits::NodeStore`] abstraction and a redb-backed
//! [`RedbEpochStore`] implementing epoch-sharded VERSIONS/CHANGES/NODES/REFS
//! tables, block bodies/headers, and the ROOT_INDEX/HEAD/EPOCH_MANIFEST
//! bookkeeping needed to answer retention queries (spec §4.9).

pub mod metrics;
pub mod redb_epoch_store;
pub mod traits;
pub mod wal;

pub use redb_epoch_store::RedbEpochStore;
pub use traits::{
    be32, be64, CommitInput, Epoch, Height, NodeHash, NodeStore, PruneStats, RootHash,
    StorageError,
};

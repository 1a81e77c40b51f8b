//! Durable, epoch-sharded, content-addressed node store contract. This is
//! the storage-facing half of what the teacher kept in a separate `ioi-api`
//! crate; GTOS folds it directly into `gtos-storage` since nothing else in
//! this workspace needs the trait independent of its one implementation.

use async_trait::async_trait;
use gtos_types::app::Block;
use thiserror::Error;

/// An epoch identifier, derived from block height.
pub type Epoch = u64;
/// A block height.
pub type Height = u64;

/// A 32-byte state root hash, committing to one version of the state tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootHash(pub [u8; 32]);

impl std::fmt::Debug for RootHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RootHash({})", hex::encode(self.0))
    }
}

/// A 32-byte content-addressed hash of a state tree node's canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHash(pub [u8; 32]);

impl std::fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeHash({})", hex::encode(self.0))
    }
}

/// Encodes a `u64` big-endian, for ordered key scans.
#[inline]
pub fn be64(x: u64) -> [u8; 8] {
    x.to_be_bytes()
}
/// Encodes a `u32` big-endian.
#[inline]
pub fn be32(x: u32) -> [u8; 4] {
    x.to_be_bytes()
}

/// Errors from the durable storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A generic error from the underlying backend (redb).
    #[error("backend error: {0}")]
    Backend(String),
    /// Failed to serialize data for storage.
    #[error("encode error: {0}")]
    Encode(String),
    /// Failed to deserialize data from storage.
    #[error("decode error: {0}")]
    Decode(String),
    /// The requested key or item was not present.
    #[error("not found")]
    NotFound,
}

/// Minimal input to atomically commit one block's state delta.
#[derive(Debug, Clone)]
pub struct CommitInput {
    /// The block height being committed.
    pub height: Height,
    /// The state root for this height.
    pub root: RootHash,
    /// Every unique node hash referenced by the state at this height.
    pub unique_nodes_for_height: Vec<NodeHash>,
    /// Full bytes of nodes introduced to this epoch for the first time.
    pub new_nodes: Vec<(NodeHash, Vec<u8>)>,
}

/// Statistics from a completed pruning operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PruneStats {
    /// Number of distinct block heights pruned.
    pub heights_pruned: usize,
    /// Number of state tree nodes garbage collected.
    pub nodes_deleted: usize,
}

/// A durable, epoch-sharded, content-addressed node store.
///
/// Abstracts the underlying backend (`redb`) and provides crash-safe
/// commit/prune operations for versioned state-tree data and block bodies.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// The size of a state-history epoch in blocks; constant for the store's lifetime.
    fn epoch_size(&self) -> u64;

    /// The epoch id containing `height` (`height / epoch_size`).
    fn epoch_of(&self, height: u64) -> u64;

    /// Raw canonical bytes of `node` within `epoch`.
    fn get_node(&self, epoch: u64, node: NodeHash) -> Result<Option<Vec<u8>>, StorageError>;

    /// Current head of the chain (latest committed height and its epoch).
    fn head(&self) -> Result<(Height, Epoch), StorageError>;

    /// The block height for a given state root, if committed.
    fn height_for_root(&self, root: RootHash) -> Result<Option<Height>, StorageError>;

    /// The state root for a given block height, if committed.
    fn root_for_height(&self, height: Height) -> Result<Option<RootHash>, StorageError>;

    /// Marks an epoch as sealed, preventing further writes to it.
    fn seal_epoch(&self, epoch: Epoch) -> Result<(), StorageError>;

    /// Whether `epoch` has been sealed.
    fn is_sealed(&self, epoch: Epoch) -> Result<bool, StorageError>;

    /// Atomically, crash-safely commits one block's state changes.
    async fn commit_block(&self, input: CommitInput) -> Result<(), StorageError>;

    /// Prunes up to `limit` historical state versions below `cutoff_height`,
    /// skipping any height present in `excluded_heights`.
    fn prune_batch(
        &self,
        cutoff_height: Height,
        excluded_heights: &[Height],
        limit: usize,
    ) -> Result<PruneStats, StorageError>;

    /// Atomically drops an entire sealed epoch.
    fn drop_sealed_epoch(&self, epoch: Epoch) -> Result<(), StorageError>;

    /// Stores a block's serialized bytes at its height.
    async fn put_block(&self, height: u64, block_bytes: &[u8]) -> Result<(), StorageError>;

    /// Fetches a block by height.
    fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, StorageError>;

    /// Fetches a contiguous range of blocks starting at `start`.
    fn get_blocks_range(
        &self,
        start: u64,
        limit: u32,
        max_bytes: u32,
    ) -> Result<Vec<Block>, StorageError>;

    /// Deletes a block's body below the retention watermark, keeping its
    /// header-derived commitments intact (spec §4.9: bodies are pruned,
    /// headers and current state are preserved).
    fn prune_block_body(&self, height: u64) -> Result<(), StorageError>;
}

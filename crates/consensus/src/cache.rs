//! The bounded snapshot cache (spec §4.2): hash → snapshot, backed by a
//! persistent checkpoint at epoch blocks and an ancestor-walk-then-replay
//! fallback on a cache miss.

use std::num::NonZeroUsize;

use lru::LruCache;

use gtos_state::accessor::StateAccess;
use gtos_types::app::{Address, BlockHeader};
use gtos_types::config::ChainConfig;
use gtos_types::error::ConsensusError;
use gtos_types::keys::snapshot_checkpoint_key;

use crate::header_ops::{apply_header, genesis_snapshot, recover_seal_signer};

pub use gtos_types::app::Snapshot;

/// Default bound on the number of in-memory snapshots kept (spec §4.2).
pub const DEFAULT_CAPACITY: usize = 128;

/// Resolves ancestor headers by hash. The cache has no header store of its
/// own; callers supply one (e.g. backed by the block database) so this
/// crate stays free of storage-layer concerns.
pub trait HeaderSource {
    /// Returns the header with this hash, if known.
    fn header_by_hash(&self, hash: &[u8; 32]) -> Result<Option<BlockHeader>, ConsensusError>;
}

/// Bounded LRU cache of derived [`Snapshot`]s, keyed by the hash of the
/// block each snapshot was derived through. Every value handed out is an
/// owned clone — mutating it (via [`apply_header`]) never disturbs a
/// snapshot another verifier thread is concurrently reading out of the
/// cache (spec §4.2).
pub struct SnapshotCache {
    cache: LruCache<[u8; 32], Snapshot>,
}

impl SnapshotCache {
    /// Builds a cache bounded at `capacity` entries (falls back to 1 if
    /// `capacity` is zero — callers wanting the spec default should pass
    /// [`DEFAULT_CAPACITY`]).
    pub fn new(capacity: usize) -> Self {
        let bounded = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(bounded),
        }
    }

    /// A direct cache hit, if present — does not fall back to disk or to
    /// ancestor replay.
    pub fn peek(&mut self, hash: &[u8; 32]) -> Option<Snapshot> {
        self.cache.get(hash).cloned()
    }

    fn insert(&mut self, snapshot: Snapshot) {
        self.cache.put(snapshot.hash, snapshot);
    }

    /// Resolves the snapshot derived through `target_hash`: an in-memory
    /// hit, a persisted checkpoint, or an ancestor walk back to one of
    /// those (or to genesis) followed by a forward replay (spec §4.2).
    /// Read-only with respect to persistent storage — call
    /// [`Self::persist_checkpoint`] separately once the caller decides to
    /// commit an epoch boundary.
    pub fn resolve<S: StateAccess, H: HeaderSource>(
        &mut self,
        state: &S,
        headers: &H,
        target_hash: [u8; 32],
        cfg: &ChainConfig,
    ) -> Result<Snapshot, ConsensusError> {
        if let Some(snap) = self.peek(&target_hash) {
            return Ok(snap);
        }

        let mut path: Vec<BlockHeader> = Vec::new();
        let mut cursor = target_hash;
        let base = loop {
            if let Some(snap) = self.peek(&cursor) {
                break snap;
            }
            if let Some(snap) = self.load_checkpoint(state, &cursor)? {
                break snap;
            }
            let hdr = headers
                .header_by_hash(&cursor)?
                .ok_or(ConsensusError::UnknownParent)?;
            if hdr.number == 0 {
                let snap = genesis_snapshot(&hdr, cfg.period_ms, cfg.seal_signer_type)?;
                path.push(hdr);
                break snap;
            }
            let parent_hash = hdr.parent_hash;
            path.push(hdr);
            cursor = parent_hash;
        };

        let mut current = base;
        self.insert(current.clone());
        for hdr in path.into_iter().rev() {
            if hdr.number == 0 {
                // genesis itself is the base snapshot already; nothing to replay.
                continue;
            }
            let is_genesis = false;
            let is_epoch = hdr.number % cfg.epoch == 0;
            let signer = recover_seal_signer(&hdr, cfg.seal_signer_type, is_genesis, is_epoch)?;
            current = apply_header(&current, &hdr, signer, is_epoch, cfg.seal_signer_type)?;
            self.insert(current.clone());
        }

        Ok(current)
    }

    /// Persists `snapshot` as the checkpoint for its own hash. Callers
    /// invoke this after successfully importing an epoch block, so a later
    /// restart can resume an ancestor walk from disk instead of genesis.
    pub fn persist_checkpoint<S: StateAccess>(
        &self,
        state: &mut S,
        snapshot: &Snapshot,
    ) -> Result<(), ConsensusError> {
        let bytes = gtos_system::encode_checkpoint(snapshot)
            .map_err(|e| ConsensusError::StorageError(e.to_string()))?;
        state
            .put(&snapshot_checkpoint_key(&snapshot.hash), bytes)
            .map_err(|e| ConsensusError::StorageError(e.to_string()))?;
        Ok(())
    }

    fn load_checkpoint<S: StateAccess>(
        &self,
        state: &S,
        hash: &[u8; 32],
    ) -> Result<Option<Snapshot>, ConsensusError> {
        let raw = state
            .get(&snapshot_checkpoint_key(hash))
            .map_err(|e| ConsensusError::StorageError(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(bytes) => {
                let snap: Snapshot = gtos_system::decode_checkpoint(&bytes)
                    .map_err(|e| ConsensusError::StorageError(e.to_string()))?;
                Ok(Some(snap))
            }
        }
    }
}

/// Recovers the signer that would have sealed `hdr`, for callers (e.g. the
/// block processor) that already hold a verified header and only need the
/// signer to record against a resolved snapshot.
pub fn signer_of(hdr: &BlockHeader, cfg: &ChainConfig) -> Result<Address, ConsensusError> {
    let is_genesis = hdr.number == 0;
    let is_epoch = !is_genesis && hdr.number % cfg.epoch == 0;
    recover_seal_signer(hdr, cfg.seal_signer_type, is_genesis, is_epoch)
}

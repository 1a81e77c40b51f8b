//! The GTOS error taxonomy (spec §6 RPC codes, §7 propagation tiers).

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error,
/// so the RPC-visible code set of spec §6 round-trips through a structured
/// error instead of a parallel string-matching layer.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Tier 1: admission-time faults (spec §7). Reported to the submitter; no
/// state effect.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The envelope could not be decoded, or was a rejected legacy shape.
    #[error("malformed transaction envelope: {0}")]
    MalformedEnvelope(String),
    /// `signer_type` is not one of the five admissible algorithms.
    #[error("unsupported signer algorithm")]
    UnsupportedSigner,
    /// `nonce` is less than or equal to the account's current nonce.
    #[error("nonce too low: have {current}, got {provided}")]
    NonceTooLow {
        /// Account's current nonce.
        current: u64,
        /// Nonce carried by the rejected transaction.
        provided: u64,
    },
    /// `gas` is below the computed intrinsic cost.
    #[error("gas below intrinsic cost: intrinsic {intrinsic}, provided {provided}")]
    GasBelowIntrinsic {
        /// Computed intrinsic gas cost.
        intrinsic: u64,
        /// Gas limit carried by the rejected transaction.
        provided: u64,
    },
    /// The signature did not verify against the account's bound signer.
    #[error("invalid signer")]
    InvalidSigner,
    /// A UNO proof bundle's shape did not match the expected layout for its action.
    #[error("malformed UNO proof bundle: {0}")]
    MalformedProofShape(String),
    /// A code payload exceeded [`crate::MAX_CODE_PAYLOAD_BYTES`].
    #[error("code payload too large: {0} bytes")]
    CodeTooLarge(usize),
    /// A TTL delta was zero, negative, or otherwise out of the admissible range.
    #[error("invalid TTL: {0}")]
    InvalidTtl(String),
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope(_) => "not_supported",
            Self::UnsupportedSigner => "invalid_signer",
            Self::NonceTooLow { .. } => "not_supported",
            Self::GasBelowIntrinsic { .. } => "not_supported",
            Self::InvalidSigner => "invalid_signer",
            Self::MalformedProofShape(_) => "not_supported",
            Self::CodeTooLarge(_) => "code_too_large",
            Self::InvalidTtl(_) => "invalid_ttl",
        }
    }
}

/// Tier 2: block-apply faults (spec §7). Either consumes gas and produces a
/// failed receipt, or — when the fault is consensus-critical — rejects the
/// transaction with zero state writes. The choice is fixed per variant and
/// identical on pool and executor paths.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Public balance insufficient for the attempted debit.
    #[error("insufficient balance")]
    InsufficientBalance,
    /// A UNO proof failed transcript verification.
    #[error("UNO proof verification failed")]
    ProofVerificationFailed,
    /// The transaction failed admission (signature, nonce, or gas floor)
    /// when re-checked at block-application time.
    #[error("transaction failed admission")]
    InvalidSigner,
    /// `uno_version` would overflow `u64`; consensus-critical, zero writes.
    #[error("UNO version counter overflow")]
    UnoVersionOverflow,
    /// A live code entry exists and has not yet expired.
    #[error("code entry still active, cannot overwrite")]
    CodeStillActive,
    /// The requested entry has expired and is therefore not found.
    #[error("entry expired")]
    Expired,
    /// Destination account/entry not found.
    #[error("not found")]
    NotFound,
    /// A registry-touching system action lacked permission to act.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Underlying storage/state-backend failure.
    #[error("state backend error: {0}")]
    StateBackend(String),
}

impl ErrorCode for ExecutionError {
    fn code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "not_supported",
            Self::ProofVerificationFailed => "invalid_signer",
            Self::InvalidSigner => "invalid_signer",
            Self::UnoVersionOverflow => "not_supported",
            Self::CodeStillActive => "not_supported",
            Self::Expired => "expired",
            Self::NotFound => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::StateBackend(_) => "not_supported",
        }
    }
}

/// Tier 3: header-verification faults (spec §7). Fatal for the header; the
/// block is not imported. `FutureBlock` is the one non-fatal, retryable
/// outcome (spec §4.1, §7).
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// `hdr.time > now + 3*period_ms`; the peer may retry after clock convergence.
    #[error("header time too far in the future")]
    FutureBlock,
    /// Parent header could not be resolved.
    #[error("unknown parent")]
    UnknownParent,
    /// `hdr.time < parent.time + period_ms`, or time predates genesis.
    #[error("non-monotonic header time")]
    NonMonotonicTime,
    /// `slot(hdr) <= slot(parent)`.
    #[error("non-increasing slot")]
    NonIncreasingSlot,
    /// Recovered signer does not match `coinbase`, or is not in the active validator set.
    #[error("invalid seal signer")]
    InvalidSigner,
    /// Signer is within the recents window for its slot.
    #[error("signer recently signed")]
    RecentlySigned,
    /// `difficulty` does not match the expected in-turn/out-of-turn outcome.
    #[error("difficulty mismatch")]
    DifficultyMismatch,
    /// `extra_data` length or shape did not match its block class.
    #[error("malformed extra-data: {0}")]
    MalformedExtraData(String),
    /// `uncle_hash` non-empty or `mix_digest` non-zero.
    #[error("malformed header layout")]
    MalformedLayout,
    /// Post-state root produced by re-execution did not match the header's `state_root`.
    #[error("state root mismatch")]
    StateRootMismatch,
    /// The active validator set at an epoch boundary was empty (liveness failure).
    #[error("empty validator set at epoch boundary")]
    EmptyValidatorSet,
    /// The snapshot checkpoint store failed to read or write a checkpoint.
    #[error("snapshot checkpoint storage error: {0}")]
    StorageError(String),
}

impl ErrorCode for ConsensusError {
    fn code(&self) -> &'static str {
        match self {
            Self::FutureBlock => "not_supported",
            Self::UnknownParent => "not_found",
            Self::NonMonotonicTime => "not_supported",
            Self::NonIncreasingSlot => "not_supported",
            Self::InvalidSigner => "invalid_signer",
            Self::RecentlySigned => "invalid_signer",
            Self::DifficultyMismatch => "not_supported",
            Self::MalformedExtraData(_) => "not_supported",
            Self::MalformedLayout => "not_supported",
            Self::StateRootMismatch => "not_supported",
            Self::EmptyValidatorSet => "retention_unavailable",
            Self::StorageError(_) => "not_supported",
        }
    }
}

/// A numeric-query target older than the retention watermark (spec §4.9).
/// Tag-based queries (`latest`/`safe`/`finalized`) never raise this.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("history pruned: requested {requested_block}, oldest available {oldest_available_block}")]
pub struct HistoryPrunedError {
    /// The network's fixed retention window size.
    pub retain_blocks: u64,
    /// `max(0, head - retain_blocks + 1)` at the time of the query.
    pub oldest_available_block: u64,
    /// The block number the caller asked for.
    pub requested_block: u64,
    /// The chain head at the time of the query.
    pub head_block: u64,
}

impl ErrorCode for HistoryPrunedError {
    fn code(&self) -> &'static str {
        "history_pruned"
    }
}

/// The top-level aggregate error, one variant per propagation tier plus the
/// retention gate, mirroring the per-subsystem-then-aggregate shape used
/// throughout the workspace.
#[derive(Error, Debug)]
pub enum GtosError {
    /// See [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// See [`ExecutionError`].
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// See [`ConsensusError`].
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    /// See [`HistoryPrunedError`].
    #[error(transparent)]
    HistoryPruned(#[from] HistoryPrunedError),
}

impl ErrorCode for GtosError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Execution(e) => e.code(),
            Self::Consensus(e) => e.code(),
            Self::HistoryPruned(e) => e.code(),
        }
    }
}

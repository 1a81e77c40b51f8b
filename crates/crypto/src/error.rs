//! Local error type for the `gtos-crypto` crate.

use thiserror::Error;

/// Failures from signature verification or UNO primitive operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Public key or signature bytes did not match the algorithm's expected length.
    #[error("invalid key/signature length: expected {expected}, got {got}")]
    InvalidLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },
    /// A key or signature failed to parse (malformed curve point, etc).
    #[error("malformed key or signature: {0}")]
    Malformed(String),
    /// Signature verification failed.
    #[error("signature verification failed")]
    VerificationFailed,
    /// A Bulletproofs range proof failed to verify.
    #[error("range proof verification failed")]
    RangeProofFailed,
    /// An operation was attempted with an unsupported algorithm in this context.
    #[error("unsupported algorithm for this operation")]
    UnsupportedAlgorithm,
}

//! Per-algorithm signature verification, dispatched by
//! [`gtos_types::app::SignerType`] (spec §4.3).
//!
//! Verification must be byte-equivalent between pool admission and block
//! application: both call sites go through [`verify`] against the same
//! `(public_value, message, signature)` triple, so there is exactly one
//! code path per algorithm in the whole workspace.

mod bls;
mod ed25519;
mod schnorr;
mod secp256k1;
mod secp256r1;

use gtos_types::app::SignerType;

use crate::error::CryptoError;

/// Verifies `signature` over `message` under `public_value`, dispatching to
/// the verifier selected by `signer_type`.
pub fn verify(
    signer_type: SignerType,
    public_value: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    match signer_type {
        SignerType::Secp256k1 => secp256k1::verify(public_value, message, signature),
        SignerType::Schnorr => schnorr::verify(public_value, message, signature),
        SignerType::Secp256r1 => secp256r1::verify(public_value, message, signature),
        SignerType::Ed25519 => ed25519::verify(public_value, message, signature),
        SignerType::Bls12_381 => bls::verify(public_value, message, signature),
        // ElGamal is a UNO encryption key, never a transaction-signing key.
        SignerType::ElGamal => Err(CryptoError::UnsupportedAlgorithm),
    }
}

/// Recovers the signer address from a secp256k1 seal (spec §4.1's
/// `ecrecover`): a 65-byte `(r, s, recovery_id)` seal over `sealhash(hdr)`.
/// Returns the Keccak-256-derived address the way account addresses are
/// derived elsewhere in the workspace. Ed25519 seals have no recovery —
/// the consensus layer instead looks up the candidate signer's bound
/// public key (`header.coinbase`) and calls [`verify`] directly.
pub fn ecrecover_address(message: &[u8], seal: &[u8]) -> Result<[u8; 32], CryptoError> {
    secp256k1::recover_address(message, seal)
}

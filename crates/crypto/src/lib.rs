//! # GTOS Cryptography
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! Signature verification for the five admissible signer algorithms
//! (spec §4.3) and the Ristretto255 group/Pedersen/ElGamal/Merlin
//! primitives that back the UNO subsystem (spec §4.7).

/// Hash functions (SHA-256, Keccak-256) used for header/tx/code hashing.
pub mod hash;
/// Signature verification, dispatched by [`gtos_types::app::SignerType`].
pub mod sign;
/// Ristretto255 group, Pedersen commitments, twisted ElGamal, Merlin transcripts.
pub mod uno;

/// Local error type for this crate.
pub mod error;

#[cfg(test)]
mod tests {
    #[test]
    fn crypto_canary() {}
}

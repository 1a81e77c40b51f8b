//! secp256r1 (NIST P-256) ECDSA verification.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};

use crate::error::CryptoError;

/// Verifies a 64-byte `(r, s)` ECDSA signature against a SEC1 public key.
pub fn verify(public_value: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_value)
        .map_err(|e| CryptoError::Malformed(format!("secp256r1 pubkey: {e}")))?;
    let sig = Signature::try_from(signature)
        .map_err(|e| CryptoError::Malformed(format!("secp256r1 signature: {e}")))?;
    verifying_key
        .verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

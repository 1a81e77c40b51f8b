//! Ed25519 verification.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::CryptoError;

/// Verifies a 64-byte signature against a 32-byte Ed25519 public key.
pub fn verify(public_value: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key_bytes: [u8; 32] = public_value
        .try_into()
        .map_err(|_| CryptoError::InvalidLength {
            expected: 32,
            got: public_value.len(),
        })?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| CryptoError::Malformed(format!("ed25519 pubkey: {e}")))?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| CryptoError::InvalidLength {
            expected: 64,
            got: signature.len(),
        })?;
    let sig = Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

//! BIP-340 Schnorr verification over secp256k1, x-only 32-byte keys.

use k256::schnorr::{Signature, VerifyingKey};
use k256::schnorr::signature::Verifier;

use crate::error::CryptoError;

/// Verifies a 64-byte BIP-340 signature against a 32-byte x-only public key.
pub fn verify(public_value: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    if public_value.len() != 32 {
        return Err(CryptoError::InvalidLength {
            expected: 32,
            got: public_value.len(),
        });
    }
    let verifying_key = VerifyingKey::from_bytes(public_value)
        .map_err(|e| CryptoError::Malformed(format!("schnorr pubkey: {e}")))?;
    let sig = Signature::try_from(signature)
        .map_err(|e| CryptoError::Malformed(format!("schnorr signature: {e}")))?;
    verifying_key
        .verify(message, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

//! secp256k1 ECDSA verification and seal recovery.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::error::CryptoError;
use crate::hash::keccak256;

/// Verifies a 64-byte `(r, s)` ECDSA signature (or a 65-byte seal with a
/// trailing recovery byte, which is simply ignored for plain verification)
/// against a SEC1-compressed or uncompressed public key.
pub fn verify(public_value: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_value)
        .map_err(|e| CryptoError::Malformed(format!("secp256k1 pubkey: {e}")))?;
    let sig_bytes = &signature[..64.min(signature.len())];
    let sig = Signature::try_from(sig_bytes)
        .map_err(|e| CryptoError::Malformed(format!("secp256k1 signature: {e}")))?;
    let digest = keccak256(message);
    verifying_key
        .verify_prehash(&digest, &sig)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Recovers the 32-byte address (Keccak-256 of the uncompressed public key,
/// right 32 bytes) from a 65-byte `(r, s, recovery_id)` seal.
pub fn recover_address(message: &[u8], seal: &[u8]) -> Result<[u8; 32], CryptoError> {
    if seal.len() != 65 {
        return Err(CryptoError::InvalidLength {
            expected: 65,
            got: seal.len(),
        });
    }
    let sig = Signature::try_from(&seal[..64])
        .map_err(|e| CryptoError::Malformed(format!("seal signature: {e}")))?;
    let recovery_id = RecoveryId::from_byte(seal[64])
        .ok_or_else(|| CryptoError::Malformed("invalid recovery id".to_string()))?;
    let digest = keccak256(message);
    let recovered = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| CryptoError::VerificationFailed)?;
    let uncompressed = recovered.to_encoded_point(false);
    let address_source = &uncompressed.as_bytes()[1..];
    let digest = keccak256(address_source);
    let mut address = [0u8; 32];
    address.copy_from_slice(&digest);
    Ok(address)
}

//! SHA-256 and Keccak-256 hashing via `dcrypt`, the teacher's own hashing
//! dependency, narrowed here to its `algorithms::hash` module (see
//! `DESIGN.md`: the signing/KEM modules of `dcrypt` are unused — every
//! signer algorithm in this crate uses a dedicated single-purpose crate).

use dcrypt::algorithms::hash::sha2::Sha256 as DcryptSha256;
use dcrypt::algorithms::hash::HashFunction as DcryptHashFunction;
use dcrypt::algorithms::ByteSerializable;

use crate::error::CryptoError;

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Result<[u8; 32], CryptoError> {
    let digest = DcryptSha256::digest(data)
        .map_err(|e| CryptoError::Malformed(format!("sha256: {e:?}")))?;
    digest
        .to_bytes()
        .try_into()
        .map_err(|v: Vec<u8>| CryptoError::InvalidLength {
            expected: 32,
            got: v.len(),
        })
}

/// Keccak-256 of `data`, used for the validator registry's slot derivation
/// (spec §6) and code-entry hashing.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&out);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_32_bytes() {
        assert_eq!(sha256(b"hello").unwrap().len(), 32);
    }

    #[test]
    fn keccak256_differs_from_sha256() {
        assert_ne!(keccak256(b"hello"), sha256(b"hello").unwrap());
    }
}

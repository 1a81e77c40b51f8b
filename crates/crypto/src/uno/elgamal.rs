//! Twisted ElGamal over Ristretto255 (spec §4.7). Each account's encrypted
//! balance is `(commitment, handle)`: `commitment = v*G + r*H` (a Pedersen
//! commitment to the value) and `handle = r*PK` (an ElGamal encryption of
//! the same blinding factor under the recipient's public key), so the
//! receiver can recover `v*G = commitment - handle/sk` and the sender's
//! proof can bind the two without revealing `v` or `r`.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::RngCore;

use super::pedersen::generators;
use crate::error::CryptoError;

/// An ElGamal secret key (a scalar).
#[derive(Clone)]
pub struct ElGamalSecretKey(Scalar);

/// An ElGamal public key (a Ristretto point), the `signer_value` carried by
/// an account whose `signer_type` is `ElGamal` (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElGamalPublicKey(pub CompressedRistretto);

/// An ElGamal key pair.
pub struct ElGamalKeyPair {
    /// Public half.
    pub public: ElGamalPublicKey,
    /// Secret half.
    pub secret: ElGamalSecretKey,
}

impl ElGamalKeyPair {
    /// Generates a fresh key pair.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 64];
        OsRng.fill_bytes(&mut bytes);
        let secret = Scalar::from_bytes_mod_order_wide(&bytes);
        let (_, h) = generators();
        let public = (h * secret).compress();
        ElGamalKeyPair {
            public: ElGamalPublicKey(public),
            secret: ElGamalSecretKey(secret),
        }
    }
}

/// A twisted-ElGamal ciphertext: the 32-byte commitment and 32-byte handle
/// stored in an account's `UnoTriple` (spec §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    /// Pedersen commitment to the plaintext value.
    pub commitment: CompressedRistretto,
    /// ElGamal handle binding the commitment's blinding factor to a public key.
    pub handle: CompressedRistretto,
}

impl ElGamalCiphertext {
    /// Encrypts `value` under `public_key`, drawing a fresh blinding factor.
    pub fn encrypt(value: u64, public_key: &ElGamalPublicKey) -> Result<(Self, Scalar), CryptoError> {
        let mut bytes = [0u8; 64];
        OsRng.fill_bytes(&mut bytes);
        let blinding = Scalar::from_bytes_mod_order_wide(&bytes);
        let ct = Self::encrypt_with_blinding(value, blinding, public_key)?;
        Ok((ct, blinding))
    }

    /// Encrypts `value` under `public_key` using an explicit blinding
    /// factor (used when a proof must reference a known opening, e.g. the
    /// homomorphic transfer delta applied to a receiver's account).
    pub fn encrypt_with_blinding(
        value: u64,
        blinding: Scalar,
        public_key: &ElGamalPublicKey,
    ) -> Result<Self, CryptoError> {
        let (g, h) = generators();
        let pk = public_key
            .0
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid ElGamal public key".to_string()))?;
        let commitment = g * Scalar::from(value) + h * blinding;
        let handle = pk * blinding;
        Ok(ElGamalCiphertext {
            commitment: commitment.compress(),
            handle: handle.compress(),
        })
    }

    /// Homomorphically adds a delta ciphertext (used for TRANSFER's receiver
    /// side: `receiver_prev ⊕ delta_receiver`, spec §4.7).
    pub fn homomorphic_add(&self, delta: &ElGamalCiphertext) -> Result<Self, CryptoError> {
        let c1 = self
            .commitment
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment".to_string()))?;
        let c2 = delta
            .commitment
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment".to_string()))?;
        let h1 = self
            .handle
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid handle".to_string()))?;
        let h2 = delta
            .handle
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid handle".to_string()))?;
        Ok(ElGamalCiphertext {
            commitment: (c1 + c2).compress(),
            handle: (h1 + h2).compress(),
        })
    }

    /// Homomorphically subtracts a delta ciphertext (sender-side decrease).
    pub fn homomorphic_sub(&self, delta: &ElGamalCiphertext) -> Result<Self, CryptoError> {
        let c1 = self
            .commitment
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment".to_string()))?;
        let c2 = delta
            .commitment
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment".to_string()))?;
        let h1 = self
            .handle
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid handle".to_string()))?;
        let h2 = delta
            .handle
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid handle".to_string()))?;
        Ok(ElGamalCiphertext {
            commitment: (c1 - c2).compress(),
            handle: (h1 - h2).compress(),
        })
    }
}

impl ElGamalSecretKey {
    /// Recovers `v*G` from a ciphertext this key can decrypt; callers then
    /// solve the discrete log for small `v` (BSGS, spec §4.7 notes the
    /// 1-UNO-per-unit convention keeps this range tractable).
    pub fn recover_value_point(&self, ct: &ElGamalCiphertext) -> Result<RistrettoPoint, CryptoError> {
        let commitment = ct
            .commitment
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment".to_string()))?;
        let handle = ct
            .handle
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid handle".to_string()))?;
        let sk_inv = self.0.invert();
        Ok(commitment - handle * sk_inv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homomorphic_add_then_sub_is_identity() {
        let keys = ElGamalKeyPair::generate();
        let (a, _) = ElGamalCiphertext::encrypt(10, &keys.public).unwrap();
        let (b, _) = ElGamalCiphertext::encrypt(5, &keys.public).unwrap();
        let added = a.homomorphic_add(&b).unwrap();
        let back = added.homomorphic_sub(&b).unwrap();
        assert_eq!(back.commitment, a.commitment);
        assert_eq!(back.handle, a.handle);
    }
}

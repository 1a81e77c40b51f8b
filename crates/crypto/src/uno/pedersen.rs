//! Pedersen commitments over Ristretto255, grounded on the same
//! commitment-scheme idiom the teacher uses for its k256-backed Pedersen
//! primitive, re-based onto the curve group UNO actually specifies.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

/// Fixed generators shared by every Pedersen commitment in this workspace:
/// `G` for the value, `H` for the blinding factor, both nothing-up-my-sleeve
/// hash-derived points independent of the Ristretto basepoint relationship.
pub fn generators() -> (RistrettoPoint, RistrettoPoint) {
    use curve25519_dalek::ristretto::RistrettoPoint as RP;
    let g = RP::hash_from_bytes::<sha2::Sha512>(b"gtos-uno-pedersen-G-v1");
    let h = RP::hash_from_bytes::<sha2::Sha512>(b"gtos-uno-pedersen-H-v1");
    (g, h)
}

/// A Pedersen commitment `C = v*G + r*H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedersenCommitment(pub CompressedRistretto);

/// The opening (value, blinding factor) for a [`PedersenCommitment`].
#[derive(Debug, Clone, Copy)]
pub struct PedersenOpening {
    /// Committed value.
    pub value: u64,
    /// Blinding scalar.
    pub blinding: Scalar,
}

impl PedersenOpening {
    /// Draws a fresh random blinding factor for `value`.
    pub fn random(value: u64) -> Self {
        let mut bytes = [0u8; 64];
        OsRng.fill_bytes(&mut bytes);
        PedersenOpening {
            value,
            blinding: Scalar::from_bytes_mod_order_wide(&bytes),
        }
    }

    /// Commits to this opening.
    pub fn commit(&self) -> PedersenCommitment {
        let (g, h) = generators();
        let point = g * Scalar::from(self.value) + h * self.blinding;
        PedersenCommitment(point.compress())
    }
}

impl PedersenCommitment {
    /// Homomorphically adds two commitments: `commit(a) + commit(b) == commit(a+b)`.
    pub fn add(&self, other: &PedersenCommitment) -> Result<PedersenCommitment, CryptoError> {
        let a = self
            .0
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment point".to_string()))?;
        let b = other
            .0
            .decompress()
            .ok_or_else(|| CryptoError::Malformed("invalid commitment point".to_string()))?;
        Ok(PedersenCommitment((a + b).compress()))
    }

    /// Verifies that `opening` is a valid opening of this commitment.
    pub fn verify_opening(&self, opening: &PedersenOpening) -> bool {
        opening.commit().0 == self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_verifies_against_its_own_commitment() {
        let opening = PedersenOpening::random(42);
        let commitment = opening.commit();
        assert!(commitment.verify_opening(&opening));
    }

    #[test]
    fn homomorphic_add_matches_sum_of_values() {
        let a = PedersenOpening::random(10);
        let b = PedersenOpening::random(30);
        let ca = a.commit();
        let cb = b.commit();
        let summed = ca.add(&cb).unwrap();

        let combined = PedersenOpening {
            value: 40,
            blinding: a.blinding + b.blinding,
        };
        assert!(summed.verify_opening(&combined));
    }
}

//! Configuration related to the consensus engine's signer algorithm.

use serde::{Deserialize, Serialize};

use crate::app::SignerType;

/// The signer algorithm genesis mandates for header sealing (spec §6:
/// `seal_signer_type`). Only the two algorithms with a defined seal length
/// are admissible here.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SealSignerType {
    /// secp256k1, 65-byte seal.
    Secp256k1,
    /// Ed25519, 64-byte seal.
    Ed25519,
}

impl SealSignerType {
    /// The seal length this algorithm requires on the wire (spec §3/§6).
    pub fn seal_len(self) -> usize {
        match self {
            SealSignerType::Secp256k1 => 65,
            SealSignerType::Ed25519 => 64,
        }
    }

    /// The corresponding [`SignerType`] used by `gtos-crypto`'s verifier dispatch.
    pub fn as_signer_type(self) -> SignerType {
        match self {
            SealSignerType::Secp256k1 => SignerType::Secp256k1,
            SealSignerType::Ed25519 => SignerType::Ed25519,
        }
    }
}

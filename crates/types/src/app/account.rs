//! Account, code and namespaced-KV entries (spec §3 DATA MODEL).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A 32-byte account address.
pub type Address = [u8; 32];

/// The signature algorithm a signer is bound to.
///
/// `Schnorr` is BIP-340 over secp256k1 with x-only 32-byte keys; `ElGamal`
/// is the Ristretto255 key used exclusively by the UNO subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub enum SignerType {
    /// secp256k1 ECDSA.
    Secp256k1,
    /// BIP-340 Schnorr over secp256k1, x-only keys.
    Schnorr,
    /// secp256r1 (NIST P-256) ECDSA.
    Secp256r1,
    /// Ed25519.
    Ed25519,
    /// BLS12-381, compressed G1 public key / compressed G2 signature.
    Bls12_381,
    /// Twisted ElGamal over Ristretto255 (UNO signer binding only).
    ElGamal,
}

impl SignerType {
    /// Expected seal length for header sealing, where applicable (spec §3/§6).
    pub fn seal_len(self) -> Option<usize> {
        match self {
            SignerType::Secp256k1 => Some(65),
            SignerType::Ed25519 => Some(64),
            _ => None,
        }
    }
}

/// The signer an account is bound to. Defaults to the account's own address
/// when unset (spec §4.3): verification then checks the signature recovers
/// to the account address itself.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SignerBinding {
    /// Signature algorithm.
    pub algorithm: SignerType,
    /// The raw public value (encoding is algorithm-specific).
    pub public_value: Vec<u8>,
    /// `true` if this binding was never explicitly set by the account owner.
    pub defaulted: bool,
}

impl SignerBinding {
    /// The implicit binding for an account that has never rotated its signer:
    /// the default verifier recovers to the account's own address.
    pub fn defaulted(address: Address) -> Self {
        SignerBinding {
            algorithm: SignerType::Secp256k1,
            public_value: address.to_vec(),
            defaulted: true,
        }
    }
}

/// The encrypted-balance ciphertext triple held by a UNO-enabled account
/// (spec §4.7). Absent means the account holds no encrypted balance.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UnoTriple {
    /// 32-byte Pedersen-style commitment to the encrypted balance.
    pub ct_commitment: [u8; 32],
    /// 32-byte ephemeral ElGamal handle.
    pub ct_handle: [u8; 32],
    /// Strictly-increasing version counter.
    pub version: u64,
}

/// An account entry (spec §3). Created on first credit; never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Account {
    /// The account's own address.
    pub address: Address,
    /// Monotonic replay-protection nonce.
    pub nonce: u64,
    /// Public balance, unsigned 256-bit (stored as 32 big-endian bytes).
    pub balance: [u8; 32],
    /// Current signer binding.
    pub signer: SignerBinding,
    /// Encrypted-balance triple, present only once the account has shielded.
    pub uno: Option<UnoTriple>,
}

impl Account {
    /// A freshly-created account with zero balance and a defaulted signer.
    pub fn new(address: Address) -> Self {
        Account {
            address,
            nonce: 0,
            balance: [0u8; 32],
            signer: SignerBinding::defaulted(address),
            uno: None,
        }
    }
}

/// A code entry (spec §3/§4.6): one per account, TTL-bounded, immutable
/// while live.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct CodeEntry {
    /// Opaque payload, at most [`crate::MAX_CODE_PAYLOAD_BYTES`] bytes.
    pub payload: Vec<u8>,
    /// Block number at which this entry was written.
    pub created_block: u64,
    /// Block number at which this entry becomes expired (exclusive upper bound).
    pub expire_block: u64,
    /// Hash of `payload`.
    pub code_hash: [u8; 32],
}

impl CodeEntry {
    /// `true` iff this entry is still readable at `current_block`.
    pub fn is_active(&self, current_block: u64) -> bool {
        current_block < self.expire_block
    }
}

/// A namespaced KV entry (spec §3/§4.6), keyed by `(owner, namespace, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct KvEntry {
    /// Stored value bytes.
    pub value: Vec<u8>,
    /// Block number at which this entry was written.
    pub created_block: u64,
    /// Block number at which this entry becomes expired (exclusive upper bound).
    pub expire_block: u64,
}

impl KvEntry {
    /// `true` iff this entry is still readable at `current_block`.
    pub fn is_active(&self, current_block: u64) -> bool {
        current_block < self.expire_block
    }
}

//! Block header and the snapshot it feeds (spec §3, §4.1, §4.2).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::account::Address;

/// Sealed-block difficulty: 2 if the signer was the expected in-turn
/// proposer for its slot, 1 otherwise (spec §4.1).
pub const DIFFICULTY_IN_TURN: u64 = 2;
/// Out-of-turn difficulty.
pub const DIFFICULTY_OUT_OF_TURN: u64 = 1;

/// 32-byte vanity prefix carried by every header's extra-data.
pub const VANITY_LEN: usize = 32;
/// Width of an address as carried in extra-data and everywhere else.
pub const ADDRESS_LEN: usize = 32;

/// A block header (spec §3). `mix_digest` must be zero and `uncle_hash`
/// must be empty; both fields are carried for wire compatibility with the
/// verification state machine in spec §4.1 but never populated.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of the parent header.
    pub parent_hash: [u8; 32],
    /// Block number.
    pub number: u64,
    /// Unix milliseconds at which this header was sealed.
    pub time: u64,
    /// 1 (out-of-turn) or 2 (in-turn).
    pub difficulty: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Gas actually consumed by this block's transactions.
    pub gas_used: u64,
    /// Root hash of the post-state trie.
    pub state_root: [u8; 32],
    /// Root hash of the receipts for this block.
    pub receipts_root: [u8; 32],
    /// Root hash of the transaction list for this block.
    pub transactions_root: [u8; 32],
    /// The proposer's reward/identity address.
    pub coinbase: Address,
    /// Must be all-zero; carried for layout parity with the verification state machine.
    pub mix_digest: [u8; 32],
    /// Must be empty; carried for layout parity with the verification state machine.
    pub uncle_hash: Vec<u8>,
    /// Extra-data: vanity, optional validator list, optional seal (see [`ExtraData`]).
    pub extra_data: Vec<u8>,
}

/// The three admissible shapes of header extra-data (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraData {
    /// Genesis block: vanity followed by the initial validator set, unsealed.
    Genesis {
        /// 32-byte vanity prefix.
        vanity: [u8; 32],
        /// Initial validator addresses.
        validators: Vec<Address>,
    },
    /// A non-epoch, non-genesis block: vanity followed by the seal.
    NonEpoch {
        /// 32-byte vanity prefix.
        vanity: [u8; 32],
        /// Algorithm-dependent seal bytes.
        seal: Vec<u8>,
    },
    /// An epoch block: vanity, the re-embedded validator set, then the seal.
    Epoch {
        /// 32-byte vanity prefix.
        vanity: [u8; 32],
        /// Re-embedded validator set for the new epoch.
        validators: Vec<Address>,
        /// Algorithm-dependent seal bytes.
        seal: Vec<u8>,
    },
}

/// Error decoding or encoding an [`ExtraData`] layout.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtraDataError {
    /// The extra-data buffer was shorter than the 32-byte vanity prefix.
    #[error("extra-data shorter than vanity prefix")]
    TooShort,
    /// The validator-list region was not a whole multiple of 32 bytes.
    #[error("validator list region is not a multiple of {ADDRESS_LEN} bytes")]
    MisalignedValidatorList,
}

impl ExtraData {
    /// Decodes extra-data according to block class (spec §3).
    ///
    /// `is_genesis` selects the unsealed genesis layout; `is_epoch` selects
    /// the validator-list-bearing layout; `seal_len` is the expected seal
    /// width for the configured signer algorithm.
    pub fn decode(
        raw: &[u8],
        is_genesis: bool,
        is_epoch: bool,
        seal_len: usize,
    ) -> Result<Self, ExtraDataError> {
        if raw.len() < VANITY_LEN {
            return Err(ExtraDataError::TooShort);
        }
        let mut vanity = [0u8; VANITY_LEN];
        vanity.copy_from_slice(&raw[..VANITY_LEN]);
        let rest = &raw[VANITY_LEN..];

        if is_genesis {
            let validators = decode_validator_list(rest)?;
            return Ok(ExtraData::Genesis { vanity, validators });
        }
        if is_epoch {
            if rest.len() < seal_len {
                return Err(ExtraDataError::MisalignedValidatorList);
            }
            let (validators_raw, seal_raw) = rest.split_at(rest.len() - seal_len);
            let validators = decode_validator_list(validators_raw)?;
            return Ok(ExtraData::Epoch {
                vanity,
                validators,
                seal: seal_raw.to_vec(),
            });
        }
        Ok(ExtraData::NonEpoch {
            vanity,
            seal: rest.to_vec(),
        })
    }

    /// Encodes back to the wire layout; inverse of [`ExtraData::decode`].
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ExtraData::Genesis { vanity, validators } => {
                let mut out = vanity.to_vec();
                for v in validators {
                    out.extend_from_slice(v);
                }
                out
            }
            ExtraData::NonEpoch { vanity, seal } => {
                let mut out = vanity.to_vec();
                out.extend_from_slice(seal);
                out
            }
            ExtraData::Epoch {
                vanity,
                validators,
                seal,
            } => {
                let mut out = vanity.to_vec();
                for v in validators {
                    out.extend_from_slice(v);
                }
                out.extend_from_slice(seal);
                out
            }
        }
    }
}

impl BlockHeader {
    /// The exact byte form a seal is signed over (spec §4.1): this header
    /// with its `extra_data` seal bytes stripped, so the seal never signs
    /// itself. Proposer and verifier both sign/verify over this encoding —
    /// pass it as `message` to [`crate`]-level signature primitives, which
    /// hash it internally per algorithm; do not hash it again here.
    pub fn sealing_preimage(
        &self,
        is_genesis: bool,
        is_epoch: bool,
        seal_len: usize,
    ) -> Result<Vec<u8>, ExtraDataError> {
        let extra = ExtraData::decode(&self.extra_data, is_genesis, is_epoch, seal_len)?;
        let unsealed_extra = match &extra {
            ExtraData::Genesis { .. } => extra.encode(),
            ExtraData::NonEpoch { vanity, .. } => {
                ExtraData::NonEpoch { vanity: *vanity, seal: Vec::new() }.encode()
            }
            ExtraData::Epoch { vanity, validators, .. } => ExtraData::Epoch {
                vanity: *vanity,
                validators: validators.clone(),
                seal: Vec::new(),
            }
            .encode(),
        };
        let unsealed = BlockHeader {
            extra_data: unsealed_extra,
            ..self.clone()
        };
        Ok(unsealed.encode())
    }

    /// `keccak256(sealing_preimage)` — a stable identity for the unsealed
    /// header, used where a fixed-width hash is needed (e.g. bookkeeping),
    /// not as the signed message itself.
    pub fn sealhash(
        &self,
        is_genesis: bool,
        is_epoch: bool,
        seal_len: usize,
    ) -> Result<[u8; 32], ExtraDataError> {
        Ok(crate::keys::gtos_keccak256(&self.sealing_preimage(is_genesis, is_epoch, seal_len)?))
    }
}

fn decode_validator_list(raw: &[u8]) -> Result<Vec<Address>, ExtraDataError> {
    if raw.len() % ADDRESS_LEN != 0 {
        return Err(ExtraDataError::MisalignedValidatorList);
    }
    Ok(raw
        .chunks_exact(ADDRESS_LEN)
        .map(|c| {
            let mut a = [0u8; ADDRESS_LEN];
            a.copy_from_slice(c);
            a
        })
        .collect())
}

/// The consensus layer's cached view derived from headers (spec §3, §4.2).
/// All mutation produces a new owned value; a `Snapshot` handed to a
/// verifier thread is never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Snapshot {
    /// Block number this snapshot was derived through.
    pub number: u64,
    /// Hash of the block this snapshot was derived through.
    pub hash: [u8; 32],
    /// Active validator set, sorted ascending by address.
    pub validators: Vec<Address>,
    /// Slot number -> signer, bounded to the recents window `|V|/3 + 1`.
    pub recents: BTreeMap<u64, Address>,
    /// Cached genesis timestamp (Unix milliseconds).
    pub genesis_time: u64,
    /// Cached slot period, in milliseconds.
    pub period_ms: u64,
}

impl Snapshot {
    /// `|V|/3 + 1`, the width of the recents window (spec §4.1).
    pub fn recents_limit(&self) -> usize {
        self.validators.len() / 3 + 1
    }

    /// `true` iff `signer` may not sign again at `current_slot` because it
    /// signed too recently (spec §4.1).
    pub fn is_recently_signed(&self, signer: &Address, current_slot: u64) -> bool {
        let limit = self.recents_limit() as u64;
        self.recents.iter().any(|(slot, addr)| {
            addr == signer && current_slot.saturating_sub(*slot) < limit
        })
    }

    /// Evicts recents entries that have fallen outside the window, keyed by
    /// slot number so a rotation after a skipped slot is never falsely
    /// blocked (spec §4.1). Entries with pre-migration (block-number) keys
    /// self-evict because they are always smaller than any post-migration
    /// slot number.
    pub fn evict_stale_recents(&mut self, current_slot: u64) {
        let limit = self.recents_limit() as u64;
        self.recents
            .retain(|slot, _| current_slot.saturating_sub(*slot) < limit);
    }
}

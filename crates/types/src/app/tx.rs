//! The transaction envelope (spec §4.3, §6). Only one envelope shape is
//! accepted; legacy/access-list envelopes have no representation here and
//! are rejected at the decode boundary in `gtos-tx`.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::account::{Address, SignerType};

/// A typed signer transaction: the only admissible envelope.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SignerTransaction {
    /// Explicit chain identity; never inferred from the signature.
    pub chain_id: u64,
    /// Explicit sender; never derived implicitly from the signature alone.
    pub from: Address,
    /// Replay-protection nonce, must equal the account's current nonce.
    pub nonce: u64,
    /// Gas limit.
    pub gas: u64,
    /// Gas price.
    pub gas_price: u128,
    /// Destination; `None` selects the code-TTL router (nil-`to` convention).
    pub to: Option<Address>,
    /// Value to transfer (public-balance denominated), 32 big-endian bytes.
    pub value: [u8; 32],
    /// Call data: either a routed action payload or raw code/KV bytes.
    pub data: Vec<u8>,
    /// Which algorithm verifies `signature`.
    pub signer_type: SignerType,
    /// Algorithm-specific signature encoding.
    pub signature: Vec<u8>,
}

impl SignerTransaction {
    /// The preimage signed over: every field except the signature itself,
    /// SCALE-encoded. Both pool admission and block application hash this
    /// exact preimage, so the two call sites stay byte-equivalent.
    pub fn signing_preimage(&self) -> Vec<u8> {
        let unsigned = UnsignedView {
            chain_id: self.chain_id,
            from: self.from,
            nonce: self.nonce,
            gas: self.gas,
            gas_price: self.gas_price,
            to: self.to,
            value: self.value,
            data: &self.data,
            signer_type: self.signer_type,
        };
        unsigned.encode()
    }
}

#[derive(Encode)]
struct UnsignedView<'a> {
    chain_id: u64,
    from: Address,
    nonce: u64,
    gas: u64,
    gas_price: u128,
    to: Option<Address>,
    value: [u8; 32],
    data: &'a [u8],
    signer_type: SignerType,
}

/// System-action addresses and routing sentinels fixed by spec §4.4.
pub mod routing {
    use super::Address;

    /// `to = system_action_address` dispatches to the system handler.
    pub const SYSTEM_ACTION_ADDRESS: Address = [0x01u8; 32];
    /// `to = kv_router_address` dispatches to `put_kv_with_ttl`.
    pub const KV_ROUTER_ADDRESS: Address = [0x02u8; 32];
    /// `to = privacy_router_address` dispatches to the UNO handler.
    pub const PRIVACY_ROUTER_ADDRESS: Address = [0x03u8; 32];
}

/// A typed system-action payload, routed to when `to = system_action_address`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum SystemAction {
    /// Change the account's signer binding.
    SetSigner {
        /// New signer algorithm.
        algorithm: SignerType,
        /// New raw public value.
        public_value: Vec<u8>,
    },
    /// Register (or re-affirm) a validator candidacy.
    RegisterValidator {
        /// Self-stake pledged by the candidate.
        self_stake: u128,
    },
    /// Withdraw a validator candidacy (flips status to inactive; never
    /// removes the registry slot, per spec §3's append-only invariant).
    WithdrawValidator,
}

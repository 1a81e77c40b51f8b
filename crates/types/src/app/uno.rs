//! UNO wire payload (spec §4.7, §6). Field order within each action is
//! consensus-critical and frozen; the constants below fix the wire prefix
//! and action tags.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::account::Address;

/// The 8-byte magic prefix of every UNO payload.
pub const UNO_PAYLOAD_PREFIX: &[u8; 8] = b"GTOSUNO1";

/// One-byte action tags, fixed by spec §6.
pub mod action_tag {
    /// `SHIELD`.
    pub const SHIELD: u8 = 0x02;
    /// `TRANSFER`.
    pub const TRANSFER: u8 = 0x03;
    /// `UNSHIELD`.
    pub const UNSHIELD: u8 = 0x04;
}

/// Domain-separation action labels used in the Fiat-Shamir transcript
/// (spec §4.7, §9). The hyphenated form is the fixed consensus truth; the
/// underscore-separated variant from an externally studied reference
/// implementation is incompatible at the byte level and must never be
/// accepted or emitted.
pub mod transcript_label {
    /// Shield action label.
    pub const SHIELD: &[u8] = b"uno-shield-v1";
    /// Transfer action label.
    pub const TRANSFER: &[u8] = b"uno-transfer-v1";
    /// Unshield action label.
    pub const UNSHIELD: &[u8] = b"uno-unshield-v1";
    /// Range/equality sub-proof label.
    pub const BALANCE_PROOF: &[u8] = b"balance-proof";
}

/// The transcript-binding protocol version (spec §4.7, §9). Bumped whenever
/// the transcript field order or the proof system it binds changes.
pub const TRANSCRIPT_VERSION: u64 = 1;

/// The transcript-binding asset tag for GTOS's native asset. UNO carries a
/// single asset today, but the tag is bound into every transcript so a
/// future multi-asset wire format cannot replay a proof across assets.
pub const NATIVE_ASSET_TAG: &[u8] = b"gtos-native";

/// A 32-byte Pedersen-style commitment or ElGamal ciphertext component.
pub type CtBytes = [u8; 32];

/// The non-interactive proof bundle attached to every UNO action
/// (spec §4.7): ciphertext-validity, commitment-equality and range proofs,
/// each opaque at this layer and interpreted only by `gtos-crypto`/`gtos-uno`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UnoProofBundle {
    /// Proves the new ciphertext is well-formed under the destination key.
    pub ct_validity: Vec<u8>,
    /// Proves the sender's delta matches the claimed balance transition.
    pub commitment_equality: Vec<u8>,
    /// Proves the transferred/shielded/unshielded amount is non-negative
    /// and within range.
    pub range_proof: Vec<u8>,
}

/// `SHIELD(amount)`: debit public balance, credit encrypted balance.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ShieldPayload {
    /// Public plaintext amount being shielded.
    pub amount: u64,
    /// Sender's new ciphertext commitment.
    pub new_commitment: CtBytes,
    /// Sender's new ciphertext handle.
    pub new_handle: CtBytes,
    /// Attached proof bundle.
    pub proof: UnoProofBundle,
}

/// `TRANSFER(to, encrypted_delta)`: encrypted-to-encrypted transfer, amount hidden.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TransferPayload {
    /// Receiver address.
    pub to: Address,
    /// Sender's new ciphertext commitment.
    pub sender_new_commitment: CtBytes,
    /// Sender's new ciphertext handle.
    pub sender_new_handle: CtBytes,
    /// Homomorphic delta ciphertext applied to the receiver.
    pub receiver_delta_commitment: CtBytes,
    /// Homomorphic delta handle applied to the receiver.
    pub receiver_delta_handle: CtBytes,
    /// Attached proof bundle.
    pub proof: UnoProofBundle,
}

/// `UNSHIELD(to, amount)`: release encrypted balance to a public address.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct UnshieldPayload {
    /// Receiver of the released public balance.
    pub to: Address,
    /// Public plaintext amount being released.
    pub amount: u64,
    /// Sender's new ciphertext commitment.
    pub new_commitment: CtBytes,
    /// Sender's new ciphertext handle.
    pub new_handle: CtBytes,
    /// Attached proof bundle.
    pub proof: UnoProofBundle,
}

/// The decoded form of a UNO action, exactly one of the three admissible
/// actions (spec §4.7).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum UnoAction {
    /// See [`ShieldPayload`].
    Shield(ShieldPayload),
    /// See [`TransferPayload`].
    Transfer(TransferPayload),
    /// See [`UnshieldPayload`].
    Unshield(UnshieldPayload),
}

impl UnoAction {
    /// The wire action tag for this action.
    pub fn tag(&self) -> u8 {
        match self {
            UnoAction::Shield(_) => action_tag::SHIELD,
            UnoAction::Transfer(_) => action_tag::TRANSFER,
            UnoAction::Unshield(_) => action_tag::UNSHIELD,
        }
    }

    /// The transcript domain-separation label for this action.
    pub fn transcript_label(&self) -> &'static [u8] {
        match self {
            UnoAction::Shield(_) => transcript_label::SHIELD,
            UnoAction::Transfer(_) => transcript_label::TRANSFER,
            UnoAction::Unshield(_) => transcript_label::UNSHIELD,
        }
    }

    /// Encodes `self` as a full wire payload: prefix, tag, SCALE body.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9 + 128);
        out.extend_from_slice(UNO_PAYLOAD_PREFIX);
        out.push(self.tag());
        out.extend_from_slice(&self.encode());
        out
    }

    /// Decodes a full wire payload produced by [`UnoAction::to_wire`].
    pub fn from_wire(raw: &[u8]) -> Result<Self, UnoWireError> {
        if raw.len() < 9 || &raw[..8] != UNO_PAYLOAD_PREFIX {
            return Err(UnoWireError::BadPrefix);
        }
        let tag = raw[8];
        let body = &raw[9..];
        let action = match tag {
            action_tag::SHIELD => {
                UnoAction::Shield(ShieldPayload::decode(&mut &*body).map_err(|_| UnoWireError::BadBody)?)
            }
            action_tag::TRANSFER => UnoAction::Transfer(
                TransferPayload::decode(&mut &*body).map_err(|_| UnoWireError::BadBody)?,
            ),
            action_tag::UNSHIELD => UnoAction::Unshield(
                UnshieldPayload::decode(&mut &*body).map_err(|_| UnoWireError::BadBody)?,
            ),
            other => return Err(UnoWireError::UnknownTag(other)),
        };
        Ok(action)
    }
}

/// Errors decoding a UNO wire payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnoWireError {
    /// The 8-byte magic prefix did not match `GTOSUNO1`.
    #[error("bad UNO payload prefix")]
    BadPrefix,
    /// The action tag did not match any of the three admissible actions.
    #[error("unknown UNO action tag {0:#x}")]
    UnknownTag(u8),
    /// The SCALE body failed to decode for the tagged action.
    #[error("malformed UNO action body")]
    BadBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shield_wire_roundtrip() {
        let action = UnoAction::Shield(ShieldPayload {
            amount: 100,
            new_commitment: [1u8; 32],
            new_handle: [2u8; 32],
            proof: UnoProofBundle {
                ct_validity: vec![1, 2, 3],
                commitment_equality: vec![4, 5],
                range_proof: vec![6],
            },
        });
        let wire = action.to_wire();
        assert_eq!(&wire[..8], UNO_PAYLOAD_PREFIX);
        assert_eq!(wire[8], action_tag::SHIELD);
        let decoded = UnoAction::from_wire(&wire).unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn bad_prefix_rejected() {
        let mut wire = UnoAction::Shield(ShieldPayload {
            amount: 1,
            new_commitment: [0u8; 32],
            new_handle: [0u8; 32],
            proof: UnoProofBundle {
                ct_validity: vec![],
                commitment_equality: vec![],
                range_proof: vec![],
            },
        })
        .to_wire();
        wire[0] = b'X';
        assert_eq!(UnoAction::from_wire(&wire), Err(UnoWireError::BadPrefix));
    }
}

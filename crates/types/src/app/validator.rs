//! Validator registry types (spec §3, slot layout in spec §6).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::account::Address;

/// Whether a registered validator is currently eligible for rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ValidatorStatus {
    /// Eligible for slot rotation.
    Active,
    /// Registered but not eligible (withdrawn); never removed from the index.
    Inactive,
}

/// One validator registry slot.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorSlot {
    /// Validator address.
    pub address: Address,
    /// Self-stake, used for epoch-selection ordering.
    pub self_stake: u128,
    /// `true` once the address has registered at least once.
    pub registered: bool,
    /// Current eligibility status.
    pub status: ValidatorStatus,
}

/// The append-only validator index: `{count, list[i] -> address}` (spec §3).
/// The list is never shrunk; withdrawal only flips `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorRegistry {
    /// All slots ever registered, in registration order.
    pub slots: Vec<ValidatorSlot>,
}

impl ValidatorRegistry {
    /// The active validator set for epoch selection: filter active, sort by
    /// stake descending (ties broken by ascending address), truncate to
    /// `max_validators`, then resort ascending by address for rotation
    /// determinism (spec §4.1).
    pub fn select_epoch_validators(&self, max_validators: usize) -> Vec<Address> {
        let mut active: Vec<&ValidatorSlot> = self
            .slots
            .iter()
            .filter(|s| matches!(s.status, ValidatorStatus::Active))
            .collect();
        active.sort_by(|a, b| b.self_stake.cmp(&a.self_stake).then(a.address.cmp(&b.address)));
        active.truncate(max_validators);
        let mut chosen: Vec<Address> = active.into_iter().map(|s| s.address).collect();
        chosen.sort();
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(addr: u8, stake: u128, status: ValidatorStatus) -> ValidatorSlot {
        ValidatorSlot {
            address: [addr; 32],
            self_stake: stake,
            registered: true,
            status,
        }
    }

    #[test]
    fn selection_orders_by_stake_then_truncates_then_sorts_ascending() {
        let registry = ValidatorRegistry {
            slots: vec![
                slot(3, 10, ValidatorStatus::Active),
                slot(1, 30, ValidatorStatus::Active),
                slot(2, 20, ValidatorStatus::Active),
                slot(4, 40, ValidatorStatus::Inactive),
            ],
        };
        let chosen = registry.select_epoch_validators(2);
        assert_eq!(chosen, vec![[1u8; 32], [2u8; 32]]);
    }
}

#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! The validator registry (spec §3, slot layout in spec §6): an
//! append-only index of validator slots addressed by the fixed
//! keccak-prefixed key derivation in `gtos_types::keys`, plus the dispatch
//! logic for the two validator-touching system actions
//! (`RegisterValidator`/`WithdrawValidator`) reached through
//! `SystemAction` (spec §4.4).

use gtos_state::StateAccess;
use gtos_types::app::{Address, ValidatorRegistry, ValidatorSlot, ValidatorStatus};
use gtos_types::codec::{from_bytes_canonical, to_bytes_canonical};
use gtos_types::error::ExecutionError;
use gtos_types::keys;

fn decode_u64(bytes: &[u8]) -> Result<u64, ExecutionError> {
    let mut buf = [0u8; 8];
    let start = bytes.len().checked_sub(8).ok_or_else(|| {
        ExecutionError::StateBackend("validator count word shorter than 8 bytes".into())
    })?;
    buf.copy_from_slice(bytes.get(start..).unwrap_or(&[]));
    Ok(u64::from_be_bytes(buf))
}

fn encode_u64(v: u64) -> Vec<u8> {
    let mut word = vec![0u8; 24];
    word.extend_from_slice(&v.to_be_bytes());
    word
}

fn decode_bool(bytes: &[u8]) -> bool {
    bytes.last().copied().unwrap_or(0) != 0
}

fn encode_bool(v: bool) -> Vec<u8> {
    vec![u8::from(v)]
}

fn decode_status(bytes: &[u8]) -> ValidatorStatus {
    if bytes.last().copied().unwrap_or(0) == 1 {
        ValidatorStatus::Active
    } else {
        ValidatorStatus::Inactive
    }
}

fn encode_status(status: ValidatorStatus) -> Vec<u8> {
    match status {
        ValidatorStatus::Active => vec![1u8],
        ValidatorStatus::Inactive => vec![0u8],
    }
}

/// Read/write access to the on-chain validator registry over any raw
/// [`StateAccess`] view.
pub struct SystemState<'a, S> {
    state: &'a mut S,
}

impl<'a, S: StateAccess> SystemState<'a, S> {
    /// Wraps `state` with validator-registry accessors.
    pub fn new(state: &'a mut S) -> Self {
        SystemState { state }
    }

    /// `validatorCount`: the number of registered slots.
    pub fn validator_count(&self) -> Result<u64, ExecutionError> {
        match self.state.get(&keys::validator_count_key())? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    /// `validatorList[i]`: the address registered at append-order index `i`.
    pub fn validator_at(&self, index: u64) -> Result<Option<Address>, ExecutionError> {
        match self.state.get(&keys::validator_list_key(index))? {
            Some(bytes) => {
                let mut addr = [0u8; 32];
                let n = bytes.len().min(32);
                addr.get_mut(..n)
                    .and_then(|dst| bytes.get(..n).map(|src| dst.copy_from_slice(src)));
                Ok(Some(addr))
            }
            None => Ok(None),
        }
    }

    /// Reads one address's registry slot. `registered = false` when the
    /// address has never registered.
    pub fn get_slot(&self, address: &Address) -> Result<ValidatorSlot, ExecutionError> {
        let self_stake = match self
            .state
            .get(&keys::validator_field_key(address, keys::validator_field::SELF_STAKE))?
        {
            Some(bytes) => decode_u64(&bytes)? as u128,
            None => 0,
        };
        let registered = match self
            .state
            .get(&keys::validator_field_key(address, keys::validator_field::REGISTERED))?
        {
            Some(bytes) => decode_bool(&bytes),
            None => false,
        };
        let status = match self
            .state
            .get(&keys::validator_field_key(address, keys::validator_field::STATUS))?
        {
            Some(bytes) => decode_status(&bytes),
            None => ValidatorStatus::Inactive,
        };
        Ok(ValidatorSlot {
            address: *address,
            self_stake,
            registered,
            status,
        })
    }

    /// Registers (or re-affirms) a validator candidacy, pledging
    /// `self_stake`. Appends to the index on first registration; on
    /// re-registration only the stake and status are updated (spec §3's
    /// append-only invariant: the index is never shrunk or reordered).
    pub fn register_validator(
        &mut self,
        address: &Address,
        self_stake: u128,
    ) -> Result<(), ExecutionError> {
        let already_registered = self.get_slot(address)?.registered;
        if !already_registered {
            let count = self.validator_count()?;
            self.state
                .put(&keys::validator_list_key(count), address.to_vec())?;
            self.state
                .put(&keys::validator_count_key(), encode_u64(count + 1))?;
        }
        self.state.put(
            &keys::validator_field_key(address, keys::validator_field::SELF_STAKE),
            encode_u64(u64::try_from(self_stake).unwrap_or(u64::MAX)),
        )?;
        self.state.put(
            &keys::validator_field_key(address, keys::validator_field::REGISTERED),
            encode_bool(true),
        )?;
        self.state.put(
            &keys::validator_field_key(address, keys::validator_field::STATUS),
            encode_status(ValidatorStatus::Active),
        )
    }

    /// Withdraws a validator candidacy: flips `status` to `Inactive`.
    /// Never removes the registry slot (spec §3's append-only invariant).
    pub fn withdraw_validator(&mut self, address: &Address) -> Result<(), ExecutionError> {
        self.state.put(
            &keys::validator_field_key(address, keys::validator_field::STATUS),
            encode_status(ValidatorStatus::Inactive),
        )
    }

    /// Materialises the full [`ValidatorRegistry`] by walking the
    /// append-only index, for consensus's epoch-selection logic (spec §4.1).
    pub fn load_registry(&self) -> Result<ValidatorRegistry, ExecutionError> {
        let count = self.validator_count()?;
        let mut slots = Vec::with_capacity(count as usize);
        for i in 0..count {
            if let Some(address) = self.validator_at(i)? {
                slots.push(self.get_slot(&address)?);
            }
        }
        Ok(ValidatorRegistry { slots })
    }

    /// Seeds the registry at genesis with an initial set of equally-staked,
    /// active validators (spec §6: "genesis initialises these slots;
    /// failing to do so causes the chain to stall at the first epoch
    /// boundary").
    pub fn init_genesis_validators(
        &mut self,
        validators: &[Address],
        genesis_self_stake: u128,
    ) -> Result<(), ExecutionError> {
        for address in validators {
            self.register_validator(address, genesis_self_stake)?;
        }
        Ok(())
    }
}

/// A single blob-encoded checkpoint of consensus state, stored at epoch
/// blocks (spec §4.2's persistent snapshot checkpoint).
pub fn encode_checkpoint<T: parity_scale_codec::Encode>(value: &T) -> Result<Vec<u8>, ExecutionError> {
    to_bytes_canonical(value).map_err(ExecutionError::StateBackend)
}

/// Decodes a checkpoint previously written by [`encode_checkpoint`].
pub fn decode_checkpoint<T: parity_scale_codec::Decode>(bytes: &[u8]) -> Result<T, ExecutionError> {
    from_bytes_canonical(bytes).map_err(ExecutionError::StateBackend)
}

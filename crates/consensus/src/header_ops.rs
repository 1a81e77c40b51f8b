//! Sealhash, seal-signer recovery, genesis snapshot construction and
//! per-header snapshot application (spec §4.1, §4.2).

use std::collections::BTreeMap;

use parity_scale_codec::Encode;

use gtos_types::app::{Address, BlockHeader, ExtraData, Snapshot};
use gtos_types::config::SealSignerType;
use gtos_types::error::ConsensusError;
use gtos_types::keys::gtos_keccak256;

/// The full sealed header's hash, used as the snapshot-cache key and as
/// `parent_hash` linkage. Distinct from [`BlockHeader::sealhash`], which
/// excludes the seal bytes themselves.
pub fn header_hash(hdr: &BlockHeader) -> [u8; 32] {
    gtos_keccak256(&hdr.encode())
}

/// Recovers the address that sealed `hdr` (spec §4.1: `ecrecover` for
/// secp256k1; for ed25519, which has no recovery, the claimed signer is
/// `hdr.coinbase` and the seal is verified directly against it, mirroring
/// the account layer's "address is its own default signer" convention).
pub fn recover_seal_signer(
    hdr: &BlockHeader,
    seal_signer_type: SealSignerType,
    is_genesis: bool,
    is_epoch: bool,
) -> Result<Address, ConsensusError> {
    let seal_len = seal_signer_type.seal_len();
    let extra = ExtraData::decode(&hdr.extra_data, is_genesis, is_epoch, seal_len)
        .map_err(|e| ConsensusError::MalformedExtraData(e.to_string()))?;
    let seal = match &extra {
        ExtraData::Genesis { .. } => return Err(ConsensusError::MalformedLayout),
        ExtraData::NonEpoch { seal, .. } | ExtraData::Epoch { seal, .. } => seal.clone(),
    };
    let preimage = hdr
        .sealing_preimage(is_genesis, is_epoch, seal_len)
        .map_err(|e| ConsensusError::MalformedExtraData(e.to_string()))?;

    match seal_signer_type {
        SealSignerType::Secp256k1 => gtos_crypto::sign::ecrecover_address(&preimage, &seal)
            .map_err(|_| ConsensusError::InvalidSigner),
        SealSignerType::Ed25519 => {
            gtos_crypto::sign::verify(
                seal_signer_type.as_signer_type(),
                &hdr.coinbase,
                &preimage,
                &seal,
            )
            .map_err(|_| ConsensusError::InvalidSigner)?;
            Ok(hdr.coinbase)
        }
    }
}

/// Builds the genesis snapshot from the genesis header (spec §4.2).
pub fn genesis_snapshot(
    hdr: &BlockHeader,
    period_ms: u64,
    seal_signer_type: SealSignerType,
) -> Result<Snapshot, ConsensusError> {
    if hdr.number != 0 {
        return Err(ConsensusError::MalformedLayout);
    }
    let extra = ExtraData::decode(&hdr.extra_data, true, false, seal_signer_type.seal_len())
        .map_err(|e| ConsensusError::MalformedExtraData(e.to_string()))?;
    let mut validators = match extra {
        ExtraData::Genesis { validators, .. } => validators,
        _ => return Err(ConsensusError::MalformedLayout),
    };
    if validators.is_empty() {
        return Err(ConsensusError::EmptyValidatorSet);
    }
    validators.sort();
    Ok(Snapshot {
        number: 0,
        hash: header_hash(hdr),
        validators,
        recents: BTreeMap::new(),
        genesis_time: hdr.time,
        period_ms,
    })
}

/// Applies `hdr` to `snapshot`, producing a new snapshot (spec §4.1/§4.2
/// `apply`): records `signer` at the header's slot, evicts stale recents,
/// and — at an epoch boundary — replaces the active validator set with the
/// one re-embedded in the header's extra-data.
pub fn apply_header(
    snapshot: &Snapshot,
    hdr: &BlockHeader,
    signer: Address,
    is_epoch_block: bool,
    seal_signer_type: SealSignerType,
) -> Result<Snapshot, ConsensusError> {
    let mut next = snapshot.clone();
    let current_slot = crate::slot::slot(hdr.time, snapshot.genesis_time, snapshot.period_ms)?;
    next.recents.insert(current_slot, signer);
    next.evict_stale_recents(current_slot);
    next.number = hdr.number;
    next.hash = header_hash(hdr);

    if is_epoch_block {
        let extra = ExtraData::decode(&hdr.extra_data, false, true, seal_signer_type.seal_len())
            .map_err(|e| ConsensusError::MalformedExtraData(e.to_string()))?;
        if let ExtraData::Epoch { mut validators, .. } = extra {
            if validators.is_empty() {
                return Err(ConsensusError::EmptyValidatorSet);
            }
            validators.sort();
            next.validators = validators;
        }
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::ADDRESS_LEN;

    fn genesis_header(validators: &[[u8; 32]]) -> BlockHeader {
        let mut extra = vec![0u8; ADDRESS_LEN];
        for v in validators {
            extra.extend_from_slice(v);
        }
        BlockHeader {
            parent_hash: [0u8; 32],
            number: 0,
            time: 1_000,
            difficulty: 0,
            gas_limit: 1_000_000,
            gas_used: 0,
            state_root: [0u8; 32],
            receipts_root: [0u8; 32],
            transactions_root: [0u8; 32],
            coinbase: [0u8; 32],
            mix_digest: [0u8; 32],
            uncle_hash: vec![],
            extra_data: extra,
        }
    }

    #[test]
    fn genesis_snapshot_sorts_validators_ascending() {
        let hdr = genesis_header(&[[3u8; 32], [1u8; 32], [2u8; 32]]);
        let snap = genesis_snapshot(&hdr, 360, SealSignerType::Secp256k1).unwrap();
        assert_eq!(snap.validators, vec![[1u8; 32], [2u8; 32], [3u8; 32]]);
        assert_eq!(snap.genesis_time, 1_000);
    }

    #[test]
    fn genesis_snapshot_rejects_empty_validator_set() {
        let hdr = genesis_header(&[]);
        assert!(genesis_snapshot(&hdr, 360, SealSignerType::Secp256k1).is_err());
    }
}

//! The per-header verification state machine (spec §4.1): `admit` →
//! `cascade` → `seal`. `apply` (snapshot mutation) is
//! [`crate::header_ops::apply_header`], run separately once a header has
//! passed this pipeline.

use gtos_types::app::{Address, BlockHeader, ExtraData, Snapshot, DIFFICULTY_IN_TURN, DIFFICULTY_OUT_OF_TURN};
use gtos_types::config::{ChainConfig, SealSignerType};
use gtos_types::error::ConsensusError;

use crate::header_ops::recover_seal_signer;
use crate::slot;

/// `hdr.time <= now + allowed_future_block_time_ms`; layout invariants;
/// difficulty in `{1,2}` for any non-genesis block (spec §4.1 `admit`).
pub fn admit(hdr: &BlockHeader, now_ms: u64, cfg: &ChainConfig) -> Result<(), ConsensusError> {
    if hdr.time > now_ms + cfg.allowed_future_block_time_ms {
        return Err(ConsensusError::FutureBlock);
    }
    if !hdr.uncle_hash.is_empty() || hdr.mix_digest != [0u8; 32] {
        return Err(ConsensusError::MalformedLayout);
    }
    if hdr.number > 0 && hdr.difficulty != DIFFICULTY_IN_TURN && hdr.difficulty != DIFFICULTY_OUT_OF_TURN {
        return Err(ConsensusError::DifficultyMismatch);
    }
    let is_genesis = hdr.number == 0;
    let is_epoch = hdr.number != 0 && hdr.number % cfg.epoch == 0;
    ExtraData::decode(&hdr.extra_data, is_genesis, is_epoch, cfg.seal_signer_type.seal_len())
        .map_err(|e| ConsensusError::MalformedExtraData(e.to_string()))?;
    Ok(())
}

/// `parent` resolves; monotonic time; `slot(hdr) > slot(parent)` (spec
/// §4.1 `cascade`). The caller is responsible for resolving `parent` by
/// hash — this crate has no header store of its own.
pub fn cascade(hdr: &BlockHeader, parent: &BlockHeader, cfg: &ChainConfig) -> Result<(), ConsensusError> {
    if hdr.parent_hash != crate::header_ops::header_hash(parent) {
        return Err(ConsensusError::UnknownParent);
    }
    if hdr.time < parent.time + cfg.period_ms {
        return Err(ConsensusError::NonMonotonicTime);
    }
    Ok(())
}

/// `signer = ecrecover/ed25519(sealhash(hdr))`; `signer = hdr.coinbase`;
/// `signer` is active and outside the recents window; difficulty matches
/// the expected in-turn/out-of-turn outcome (spec §4.1 `seal`). Returns the
/// recovered signer on success, for use by [`crate::header_ops::apply_header`].
pub fn seal(hdr: &BlockHeader, snapshot: &Snapshot, cfg: &ChainConfig) -> Result<Address, ConsensusError> {
    let is_genesis = hdr.number == 0;
    let is_epoch = hdr.number != 0 && hdr.number % cfg.epoch == 0;
    let signer = recover_seal_signer(hdr, cfg.seal_signer_type, is_genesis, is_epoch)?;

    if signer != hdr.coinbase {
        return Err(ConsensusError::InvalidSigner);
    }
    if !snapshot.validators.contains(&signer) {
        return Err(ConsensusError::InvalidSigner);
    }

    let current_slot = slot::slot(hdr.time, snapshot.genesis_time, snapshot.period_ms)?;
    if snapshot.is_recently_signed(&signer, current_slot) {
        return Err(ConsensusError::RecentlySigned);
    }

    let expected = slot::expected_difficulty(&snapshot.validators, current_slot, &signer);
    if hdr.difficulty != expected {
        return Err(ConsensusError::DifficultyMismatch);
    }

    Ok(signer)
}

/// Runs `admit` → `cascade` → `seal` against an already-resolved `parent`
/// and the snapshot derived through it. Does not mutate the snapshot —
/// call [`crate::header_ops::apply_header`] with the returned signer once
/// the caller is ready to commit.
pub fn verify_header(
    hdr: &BlockHeader,
    parent: &BlockHeader,
    snapshot: &Snapshot,
    now_ms: u64,
    cfg: &ChainConfig,
) -> Result<Address, ConsensusError> {
    admit(hdr, now_ms, cfg)?;
    cascade(hdr, parent, cfg)?;

    let parent_slot = slot::slot(parent.time, snapshot.genesis_time, snapshot.period_ms)?;
    let this_slot = slot::slot(hdr.time, snapshot.genesis_time, snapshot.period_ms)?;
    if this_slot <= parent_slot {
        return Err(ConsensusError::NonIncreasingSlot);
    }

    seal(hdr, snapshot, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header_ops::{genesis_snapshot, header_hash};
    use gtos_types::app::ADDRESS_LEN;
    use k256::ecdsa::SigningKey;

    fn cfg() -> ChainConfig {
        ChainConfig {
            chain_id: 1,
            period_ms: 100,
            epoch: 1000,
            max_validators: 5,
            seal_signer_type: SealSignerType::Secp256k1,
            retain_blocks: 200,
            snapshot_interval: 1000,
            target_block_interval_ms: 100,
            allowed_future_block_time_ms: 300,
        }
    }

    fn address_from_signing_key(sk: &SigningKey) -> [u8; 32] {
        let uncompressed = sk.verifying_key().to_encoded_point(false);
        gtos_types::keys::gtos_keccak256(&uncompressed.as_bytes()[1..])
    }

    fn seal_header(hdr: &mut BlockHeader, sk: &SigningKey, vanity: [u8; 32], seal_with: fn(&SigningKey, &[u8]) -> Vec<u8>) {
        hdr.extra_data = vanity.to_vec();
        let preimage = hdr.sealing_preimage(false, false, 65).unwrap();
        let sig = seal_with(sk, &preimage);
        let mut extra = vanity.to_vec();
        extra.extend_from_slice(&sig);
        hdr.extra_data = extra;
    }

    fn sign_recoverable(sk: &SigningKey, preimage: &[u8]) -> Vec<u8> {
        use k256::ecdsa::{signature::hazmat::PrehashSigner, RecoveryId};
        let digest = gtos_types::keys::gtos_keccak256(preimage);
        let (sig, recid): (k256::ecdsa::Signature, RecoveryId) =
            sk.sign_prehash_recoverable(&digest).unwrap();
        let mut out = sig.to_bytes().to_vec();
        out.push(recid.to_byte());
        out
    }

    #[test]
    fn genesis_then_one_in_turn_block_verifies() {
        let sk = SigningKey::from_bytes(&[7u8; 32].into()).unwrap();
        let addr = address_from_signing_key(&sk);
        let cfg = cfg();

        let mut genesis_extra = vec![0u8; ADDRESS_LEN];
        genesis_extra.extend_from_slice(&addr);
        let genesis = BlockHeader {
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
            extra_data: genesis_extra,
        };
        let snapshot = genesis_snapshot(&genesis, cfg.period_ms, cfg.seal_signer_type).unwrap();

        let mut child = BlockHeader {
            parent_hash: header_hash(&genesis),
            number: 1,
            time: 1_100,
            difficulty: DIFFICULTY_IN_TURN,
            gas_limit: 1_000_000,
            gas_used: 0,
            state_root: [0u8; 32],
            receipts_root: [0u8; 32],
            transactions_root: [0u8; 32],
            coinbase: addr,
            mix_digest: [0u8; 32],
            uncle_hash: vec![],
            extra_data: vec![],
        };
        seal_header(&mut child, &sk, [0u8; 32], sign_recoverable);

        let signer = verify_header(&child, &genesis, &snapshot, 2_000, &cfg).unwrap();
        assert_eq!(signer, addr);
    }
}

//! Ties header verification ([`gtos_consensus`]), transaction execution
//! ([`crate::processor`]), and retention-window bookkeeping
//! ([`gtos_state::retention`]) into the one sequence a node actually runs
//! on every imported block (spec §4.8, §4.9): verify the seal and advance
//! the snapshot, re-execute and check the state root, then slide the
//! retain-window watermark and report what's now safe to prune.

use gtos_consensus::verify_and_apply_header;
use gtos_state::{BTreeMapStore, PrunePlan, RetentionManager};
use gtos_types::app::{Block, BlockHeader, BlockReceipts, Snapshot};
use gtos_types::config::ChainConfig;
use gtos_types::error::ConsensusError;

use crate::processor::{import_block, BlockError};

/// The result of successfully importing one block: its receipts, the
/// snapshot to cache at its hash, and the prune plan the retention window
/// now allows.
#[derive(Debug, Clone)]
pub struct ImportedBlock {
    /// One receipt per transaction, in transaction order.
    pub receipts: BlockReceipts,
    /// The snapshot the caller should cache at `block.header`'s hash.
    pub snapshot: Snapshot,
    /// Heights now eligible for pruning under the fixed retention window.
    pub prune_plan: PrunePlan,
}

/// Either stage of import can fail: the header can fail `admit`/`cascade`/
/// `seal`, or re-execution can disagree with the header's claimed state
/// root.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Header verification rejected the block before any state was touched.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
    /// The header passed verification but re-execution's result didn't match.
    #[error(transparent)]
    Block(#[from] BlockError),
}

/// Verifies `block`'s header against `parent`/`snapshot`, re-executes its
/// transactions against `state`, and — only once both succeed — advances
/// `retention`'s head and returns the resulting prune plan.
///
/// `retention`'s head is left untouched on any failure, so a rejected
/// block never shrinks the window a caller can still query.
pub fn import_and_prune(
    state: &mut BTreeMapStore,
    retention: &RetentionManager,
    block: &Block,
    parent: &BlockHeader,
    snapshot: &Snapshot,
    now_ms: u64,
    chain_id: u64,
    cfg: &ChainConfig,
) -> Result<ImportedBlock, ImportError> {
    let new_snapshot = verify_and_apply_header(&block.header, parent, snapshot, now_ms, cfg)?;
    let receipts = import_block(state, block, chain_id)?;

    retention.advance_head(block.header.number);
    let prune_plan = retention.plan();

    Ok(ImportedBlock {
        receipts,
        snapshot: new_snapshot,
        prune_plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::ExtraData;
    use gtos_types::config::SealSignerType;

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

    fn genesis_header(cfg: &ChainConfig, validator: [u8; 32]) -> BlockHeader {
        BlockHeader {
            parent_hash: [0u8; 32],
            number: 0,
            time: 0,
            difficulty: 0,
            gas_limit: 1_000_000,
            gas_used: 0,
            state_root: [0u8; 32],
            receipts_root: [0u8; 32],
            transactions_root: [0u8; 32],
            coinbase: [0u8; 32],
            mix_digest: [0u8; 32],
            uncle_hash: vec![],
            extra_data: ExtraData::Genesis {
                vanity: [0u8; 32],
                validators: vec![validator],
            }
            .encode(),
        }
    }

    #[test]
    fn rejected_header_leaves_retention_head_untouched() {
        let validator = [7u8; 32];
        let cfg = cfg();
        let genesis = genesis_header(&cfg, validator);
        let snapshot =
            gtos_consensus::genesis_snapshot(&genesis, cfg.period_ms, cfg.seal_signer_type).unwrap();

        // An all-zero seal can never recover to `coinbase`, so this header
        // fails `seal` before any state is touched.
        let bad_header = BlockHeader {
            parent_hash: gtos_consensus::header_hash(&genesis),
            number: 1,
            time: genesis.time + cfg.period_ms,
            difficulty: 2,
            gas_limit: genesis.gas_limit,
            gas_used: 0,
            state_root: [0u8; 32],
            receipts_root: [0u8; 32],
            transactions_root: [0u8; 32],
            coinbase: [9u8; 32],
            mix_digest: [0u8; 32],
            uncle_hash: vec![],
            extra_data: ExtraData::NonEpoch {
                vanity: [0u8; 32],
                seal: vec![0u8; cfg.seal_signer_type.seal_len()],
            }
            .encode(),
        };
        let bad_block = Block {
            header: bad_header,
            transactions: vec![],
        };

        let mut state = BTreeMapStore::default();
        let retention = RetentionManager::new(cfg.retain_blocks);
        retention.advance_head(0);

        let result = import_and_prune(
            &mut state,
            &retention,
            &bad_block,
            &genesis,
            &snapshot,
            genesis.time + cfg.period_ms,
            cfg.chain_id,
            &cfg,
        );
        assert!(matches!(result, Err(ImportError::Consensus(_))));
        assert_eq!(retention.head(), 0);
    }
}

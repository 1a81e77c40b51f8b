//! Applies a block's transaction sequence, computes the final state root,
//! and assembles or re-verifies a [`Block`] (spec §4.8): `apply` drives
//! [`gtos_execution::execute_block`] and commits `state_root`/
//! `transactions_root`/`receipts_root`; importing re-runs the identical
//! pipeline and compares the post-state root against the header's claim.

use gtos_execution::execute_block;
use gtos_state::{compute_list_root, BTreeMapStore};
use gtos_types::app::{Block, BlockHeader, BlockReceipts, SignerTransaction};
use parity_scale_codec::Encode;

/// A freshly-assembled block, its receipts, and the post-state root the
/// header now commits to.
#[derive(Debug, Clone)]
pub struct AssembledBlock {
    /// The block, with `header.state_root`/`transactions_root`/
    /// `receipts_root`/`gas_used` filled in from execution.
    pub block: Block,
    /// One receipt per transaction, in transaction order.
    pub receipts: BlockReceipts,
}

/// Failure importing a previously-sealed block.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BlockError {
    /// Re-execution's post-state root did not match the header's claim
    /// (spec §4.8's determinism contract).
    #[error("state root mismatch: header claims {expected:?}, re-execution computed {computed:?}")]
    StateRootMismatch {
        /// The value in `header.state_root`.
        expected: [u8; 32],
        /// The value re-execution actually produced.
        computed: [u8; 32],
    },
}

fn apply_transactions(
    state: &mut BTreeMapStore,
    chain_id: u64,
    current_block: u64,
    txs: &[SignerTransaction],
) -> (BlockReceipts, [u8; 32]) {
    let receipts = execute_block(state, chain_id, current_block, txs);
    let state_root = state.state_root();
    (BlockReceipts { receipts }, state_root)
}

/// Applies `txs` against `state` as block `header.number`, fills in the
/// header's commitments, and returns the assembled block and its receipts.
/// `header.state_root`/`transactions_root`/`receipts_root`/`gas_used` are
/// overwritten unconditionally — callers pass in a header with every other
/// field (parent/seal/time/coinbase/...) already set.
pub fn assemble_block(
    state: &mut BTreeMapStore,
    mut header: BlockHeader,
    chain_id: u64,
    txs: Vec<SignerTransaction>,
) -> AssembledBlock {
    let (receipts, state_root) = apply_transactions(state, chain_id, header.number, &txs);

    header.state_root = state_root;
    header.gas_used = receipts.receipts.iter().map(|r| r.gas_used).sum();
    header.transactions_root = compute_list_root(txs.iter().map(|tx| tx.encode()));
    header.receipts_root = compute_list_root(receipts.receipts.iter().map(|r| r.encode()));

    AssembledBlock {
        block: Block {
            header,
            transactions: txs,
        },
        receipts,
    }
}

/// Re-runs `block`'s transaction sequence against `state` and checks the
/// resulting state root against `block.header.state_root` (spec §4.8's
/// import-verification requirement). Does not check `transactions_root`/
/// `receipts_root` — those are a function of the block body alone and are
/// the wire/storage layer's concern to verify on receipt, not execution's.
pub fn import_block(
    state: &mut BTreeMapStore,
    block: &Block,
    chain_id: u64,
) -> Result<BlockReceipts, BlockError> {
    let (receipts, state_root) =
        apply_transactions(state, chain_id, block.header.number, &block.transactions);

    if state_root != block.header.state_root {
        return Err(BlockError::StateRootMismatch {
            expected: block.header.state_root,
            computed: state_root,
        });
    }
    Ok(receipts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_state::GtosStateStore;
    use gtos_types::app::{Account, Address, SignerBinding, SignerType};
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::{Signature, SigningKey};

    fn signing_key(seed: u8) -> SigningKey {
        let mut bytes = [0u8; 32];
        bytes[31] = seed;
        SigningKey::from_bytes(&bytes.into()).unwrap()
    }

    fn seed_account(state: &mut BTreeMapStore, addr: Address, balance: u128, key: &SigningKey) {
        let mut store = GtosStateStore::new(&mut *state);
        let mut account = Account::new(addr);
        account.balance[16..].copy_from_slice(&balance.to_be_bytes());
        account.signer = SignerBinding {
            algorithm: SignerType::Secp256k1,
            public_value: key.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            defaulted: false,
        };
        store.put_account(&account).unwrap();
    }

    fn tx(key: &SigningKey, from: Address, to: Address, nonce: u64, value: u128) -> SignerTransaction {
        let mut value_bytes = [0u8; 32];
        value_bytes[16..].copy_from_slice(&value.to_be_bytes());
        let mut t = SignerTransaction {
            chain_id: 1,
            from,
            nonce,
            gas: 100_000,
            gas_price: 1,
            to: Some(to),
            value: value_bytes,
            data: vec![],
            signer_type: SignerType::Secp256k1,
            signature: vec![],
        };
        let digest = gtos_crypto::hash::keccak256(&t.signing_preimage());
        let sig: Signature = key.sign_prehash(&digest).unwrap();
        t.signature = sig.to_bytes().to_vec();
        t
    }

    fn sample_header(number: u64) -> BlockHeader {
        BlockHeader {
            parent_hash: [0u8; 32],
            number,
            time: 1_000,
            difficulty: 2,
            gas_limit: 1_000_000,
            gas_used: 0,
            state_root: [0u8; 32],
            receipts_root: [0u8; 32],
            transactions_root: [0u8; 32],
            coinbase: [9u8; 32],
            mix_digest: [0u8; 32],
            uncle_hash: vec![],
            extra_data: vec![],
        }
    }

    #[test]
    fn assembled_block_reimports_cleanly() {
        let alice = [1u8; 32];
        let bob = [2u8; 32];
        let key = signing_key(1);

        let mut state = BTreeMapStore::default();
        seed_account(&mut state, alice, 1_000, &key);

        let txs = vec![tx(&key, alice, bob, 0, 100)];
        let assembled = assemble_block(&mut state, sample_header(1), 1, txs);
        assert_eq!(assembled.receipts.receipts.len(), 1);
        assert_ne!(assembled.block.header.state_root, [0u8; 32]);

        let mut replay_state = BTreeMapStore::default();
        seed_account(&mut replay_state, alice, 1_000, &key);
        let receipts = import_block(&mut replay_state, &assembled.block, 1).unwrap();
        assert_eq!(receipts, assembled.receipts);
    }

    #[test]
    fn import_rejects_a_tampered_state_root() {
        let alice = [1u8; 32];
        let bob = [2u8; 32];
        let key = signing_key(2);

        let mut state = BTreeMapStore::default();
        seed_account(&mut state, alice, 1_000, &key);
        let txs = vec![tx(&key, alice, bob, 0, 100)];
        let mut assembled = assemble_block(&mut state, sample_header(1), 1, txs);
        let real_root = assembled.block.header.state_root;
        assembled.block.header.state_root = [0xffu8; 32];

        let mut replay_state = BTreeMapStore::default();
        seed_account(&mut replay_state, alice, 1_000, &key);
        let err = import_block(&mut replay_state, &assembled.block, 1).unwrap_err();
        assert_eq!(
            err,
            BlockError::StateRootMismatch {
                expected: [0xffu8; 32],
                computed: real_root,
            }
        );
    }
}

//! The full block: a header plus its ordered transaction body (spec §3,
//! §4.8). Receipts are not carried inline — they are produced by
//! execution and committed to `receipts_root`; storage keeps them
//! separately keyed by block height.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::header::BlockHeader;
use super::receipt::Receipt;
use super::tx::SignerTransaction;

/// A full block: header plus the ordered transactions it seals.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Ordered transactions, in the order they were executed and sealed.
    pub transactions: Vec<SignerTransaction>,
}

impl Block {
    /// Block number, forwarded from the header for convenience.
    pub fn number(&self) -> u64 {
        self.header.number
    }
}

/// Receipts produced by applying a block's transactions, kept alongside
/// the block body in storage but outside the header-committed structure.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Default)]
pub struct BlockReceipts {
    /// One receipt per transaction, in transaction order.
    pub receipts: Vec<Receipt>,
}

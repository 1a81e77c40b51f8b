//! Transaction receipts (spec §4.8).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Outcome of applying a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Applied successfully.
    Success,
    /// Consumed gas but failed during execution (a failed-but-charged receipt).
    Failed,
}

/// The result of applying one transaction within a block.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Receipt {
    /// Success or failure.
    pub status: ReceiptStatus,
    /// Gas actually consumed.
    pub gas_used: u64,
    /// Hash of the originating transaction.
    pub tx_hash: [u8; 32],
    /// Index of this transaction within its block.
    pub tx_index: u32,
}

//! Core application data structures: accounts, code/KV entries, the
//! validator registry, block headers and snapshots, the transaction
//! envelope and UNO wire types, and transaction receipts.

pub mod account;
mod block;
mod header;
mod receipt;
mod tx;
pub mod uno;
mod validator;

pub use account::{Account, Address, CodeEntry, KvEntry, SignerBinding, SignerType, UnoTriple};
pub use block::{Block, BlockReceipts};
pub use header::{
    BlockHeader, ExtraData, ExtraDataError, Snapshot, ADDRESS_LEN, DIFFICULTY_IN_TURN,
    DIFFICULTY_OUT_OF_TURN, VANITY_LEN,
};
pub use receipt::{Receipt, ReceiptStatus};
pub use tx::{routing, SignerTransaction, SystemAction};
pub use uno::{
    action_tag, transcript_label, CtBytes, ShieldPayload, TransferPayload, UnoAction,
    UnoProofBundle, UnoWireError, UnshieldPayload, NATIVE_ASSET_TAG, TRANSCRIPT_VERSION,
    UNO_PAYLOAD_PREFIX,
};
pub use validator::{ValidatorRegistry, ValidatorSlot, ValidatorStatus};

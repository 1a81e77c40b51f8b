#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # GTOS Kernel Types
//!
//! Foundational crate for the GTOS node: the account/code/KV data model, the
//! block header and transaction envelope, the error taxonomy, and the chain
//! configuration structs. `gtos-types` has minimal dependencies and is a
//! dependency of almost every other crate in the workspace, so it carries no
//! execution or consensus logic of its own.

/// Maximum size in bytes for a single code entry payload (spec: 65,536).
pub const MAX_CODE_PAYLOAD_BYTES: usize = 65_536;

/// A crate-wide `Result` alias defaulting to the top-level aggregate error.
pub type Result<T, E = crate::error::GtosError> = std::result::Result<T, E>;

/// Account, code, KV, validator-registry, snapshot, header and envelope types.
pub mod app;
/// The canonical, deterministic binary codec for consensus-critical state.
pub mod codec;
/// Chain configuration (`ChainConfig`) and its validation rules.
pub mod config;
/// The error taxonomy: validation / execution / consensus tiers plus RPC codes.
pub mod error;
/// Well-known state key constants and their derivation helpers.
pub mod keys;
/// A small prelude of extension traits used throughout the workspace.
pub mod prelude;

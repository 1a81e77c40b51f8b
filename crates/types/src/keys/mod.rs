//! Well-known state key constants and derivation helpers.
//!
//! The validator registry lives at reserved, deterministically-derived slots
//! so that genesis initialisation and runtime reads agree byte-for-byte on
//! where each field lives (spec §6).

/// keccak("dpos\0validatorCount") — the registry's append-only count slot.
pub fn validator_count_key() -> [u8; 32] {
    keccak_label(b"dpos\0validatorCount")
}

/// keccak("dpos\0validatorList\0" ‖ BE8(i)) — the i-th entry of the append-only index.
pub fn validator_list_key(index: u64) -> [u8; 32] {
    let mut buf = Vec::with_capacity(18 + 8);
    buf.extend_from_slice(b"dpos\0validatorList\0");
    buf.extend_from_slice(&index.to_be_bytes());
    keccak_label(&buf)
}

/// Per-address validator field suffixes, fixed by spec §6.
pub mod validator_field {
    /// Self-stake field suffix.
    pub const SELF_STAKE: &[u8] = b"selfStake";
    /// Registered-flag field suffix.
    pub const REGISTERED: &[u8] = b"registered";
    /// Status field suffix.
    pub const STATUS: &[u8] = b"status";
}

/// keccak(addr32 ‖ 0x00 ‖ field) — a per-validator field slot.
pub fn validator_field_key(address: &[u8; 32], field: &[u8]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(32 + 1 + field.len());
    buf.extend_from_slice(address);
    buf.push(0x00);
    buf.extend_from_slice(field);
    keccak_label(&buf)
}

/// State key prefix for account entries, keyed by address.
pub const ACCOUNT_KEY_PREFIX: &[u8] = b"account\0";
/// State key prefix for code entries, keyed by owner address.
pub const CODE_KEY_PREFIX: &[u8] = b"code\0";
/// State key prefix for namespaced KV entries, keyed by `(owner, namespace, key)`.
pub const KV_KEY_PREFIX: &[u8] = b"kv\0";
/// State key for the persisted consensus snapshot checkpoint at an epoch block.
pub const SNAPSHOT_CHECKPOINT_PREFIX: &[u8] = b"snapshot\0";
/// State key for the global TTL sweep index, used only by the block-boundary pruning strategy.
pub const TTL_SWEEP_INDEX_KEY: &[u8] = b"ttl\0sweep_index";

/// Builds the storage key for an account entry.
pub fn account_key(address: &[u8; 32]) -> Vec<u8> {
    prefixed(ACCOUNT_KEY_PREFIX, address)
}

/// Builds the storage key for a code entry.
pub fn code_key(owner: &[u8; 32]) -> Vec<u8> {
    prefixed(CODE_KEY_PREFIX, owner)
}

/// Builds the storage key for the persisted snapshot checkpoint at the
/// epoch block identified by `hash`.
pub fn snapshot_checkpoint_key(hash: &[u8; 32]) -> Vec<u8> {
    prefixed(SNAPSHOT_CHECKPOINT_PREFIX, hash)
}

/// Builds the storage key for a namespaced KV entry.
pub fn kv_key(owner: &[u8; 32], namespace: &str, key: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(KV_KEY_PREFIX.len() + 32 + 1 + namespace.len() + 1 + key.len());
    buf.extend_from_slice(KV_KEY_PREFIX);
    buf.extend_from_slice(owner);
    buf.push(0x00);
    buf.extend_from_slice(namespace.as_bytes());
    buf.push(0x00);
    buf.extend_from_slice(key);
    buf
}

fn prefixed(prefix: &[u8], suffix: &[u8; 32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(prefix.len() + 32);
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(suffix);
    buf
}

fn keccak_label(label: &[u8]) -> [u8; 32] {
    gtos_keccak256(label)
}

/// Keccak-256, re-exported at the type layer so key derivation has no
/// dependency on `gtos-crypto` (which itself depends on `gtos-types`).
pub fn gtos_keccak256(data: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&out);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_count_key_is_stable() {
        assert_eq!(validator_count_key(), validator_count_key());
    }

    #[test]
    fn validator_list_key_varies_by_index() {
        assert_ne!(validator_list_key(0), validator_list_key(1));
    }

    #[test]
    fn validator_field_key_varies_by_field() {
        let addr = [7u8; 32];
        assert_ne!(
            validator_field_key(&addr, validator_field::SELF_STAKE),
            validator_field_key(&addr, validator_field::STATUS)
        );
    }
}

//! The in-memory canonical state store and typed account/code/KV accessors
//! (spec §3 DATA MODEL, §4.6 TTL PRIMITIVES).
//!
//! [`BTreeMapStore`] is the flat key/value engine the block processor keeps
//! "current state" in between commits; [`GtosStateStore`] layers the
//! account/code/KV codec on top of any [`StateAccess`] + [`StateIterate`]
//! implementation (a raw [`BTreeMapStore`] or a [`StateOverlay`] staged
//! over one). Validator-registry slots are addressed directly through
//! `gtos_types::keys` by `gtos-system`; this crate only owns the
//! general-purpose entries.

use std::collections::BTreeMap;

use gtos_types::app::{Account, Address, CodeEntry, KvEntry};
use gtos_types::codec::{from_bytes_canonical, to_bytes_canonical};
use gtos_types::error::ExecutionError;
use gtos_types::keys;

use crate::accessor::StateAccess;
use crate::commitment::compute_state_root;
use crate::overlay::StateIterate;

/// A flat, fully in-memory key/value store: the backing for the node's
/// live "current state" view.
#[derive(Debug, Clone, Default)]
pub struct BTreeMapStore(BTreeMap<Vec<u8>, Vec<u8>>);

impl BTreeMapStore {
    /// An empty store.
    pub fn new() -> Self {
        BTreeMapStore::default()
    }

    /// The state root over every live key, per [`compute_state_root`].
    pub fn state_root(&self) -> [u8; 32] {
        compute_state_root(self.0.iter())
    }

    /// The number of live keys. Exposed for diagnostics and tests only.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` iff the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl StateAccess for BTreeMapStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, ExecutionError> {
        Ok(self.0.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), ExecutionError> {
        self.0.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), ExecutionError> {
        self.0.remove(key);
        Ok(())
    }
}

impl StateIterate for BTreeMapStore {
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, ExecutionError> {
        Ok(self
            .0
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

fn decode<T: parity_scale_codec::Decode>(bytes: &[u8]) -> Result<T, ExecutionError> {
    from_bytes_canonical(bytes).map_err(ExecutionError::StateBackend)
}

fn encode<T: parity_scale_codec::Encode>(value: &T) -> Result<Vec<u8>, ExecutionError> {
    to_bytes_canonical(value).map_err(ExecutionError::StateBackend)
}

/// Typed account/code/KV access over any byte-keyed [`StateAccess`] view.
pub struct GtosStateStore<B> {
    inner: B,
}

impl<B: StateAccess> GtosStateStore<B> {
    /// Wraps `inner` with the account/code/KV codec.
    pub fn new(inner: B) -> Self {
        GtosStateStore { inner }
    }

    /// Unwraps to the underlying byte-keyed view.
    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Borrows the underlying byte-keyed view.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Mutably borrows the underlying byte-keyed view.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    /// Reads the account at `address`, if it has ever been credited.
    pub fn get_account(&self, address: &Address) -> Result<Option<Account>, ExecutionError> {
        match self.inner.get(&keys::account_key(address))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Reads the account at `address`, creating a fresh zero-balance
    /// account in memory (not yet persisted) if none exists.
    pub fn get_account_or_default(&self, address: &Address) -> Result<Account, ExecutionError> {
        Ok(self.get_account(address)?.unwrap_or_else(|| Account::new(*address)))
    }

    /// Writes `account` at its own address.
    pub fn put_account(&mut self, account: &Account) -> Result<(), ExecutionError> {
        let key = keys::account_key(&account.address);
        let bytes = encode(account)?;
        self.inner.put(&key, bytes)
    }

    /// Reads the code entry owned by `owner`, if one exists — regardless of
    /// whether it has expired (callers apply [`CodeEntry::is_active`]
    /// themselves against the current block number, spec §4.6).
    pub fn get_code(&self, owner: &Address) -> Result<Option<CodeEntry>, ExecutionError> {
        match self.inner.get(&keys::code_key(owner))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Writes a code entry for `owner`, replacing any prior entry.
    pub fn put_code(&mut self, owner: &Address, entry: &CodeEntry) -> Result<(), ExecutionError> {
        let key = keys::code_key(owner);
        let bytes = encode(entry)?;
        self.inner.put(&key, bytes)
    }

    /// Removes the code entry owned by `owner`, e.g. once lazily observed
    /// as expired (spec §4.6).
    pub fn remove_code(&mut self, owner: &Address) -> Result<(), ExecutionError> {
        self.inner.delete(&keys::code_key(owner))
    }

    /// Reads a namespaced KV entry.
    pub fn get_kv(
        &self,
        owner: &Address,
        namespace: &str,
        key: &[u8],
    ) -> Result<Option<KvEntry>, ExecutionError> {
        match self.inner.get(&keys::kv_key(owner, namespace, key))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Writes a namespaced KV entry, replacing any prior entry at the same
    /// `(owner, namespace, key)`.
    pub fn put_kv(
        &mut self,
        owner: &Address,
        namespace: &str,
        key: &[u8],
        entry: &KvEntry,
    ) -> Result<(), ExecutionError> {
        let full_key = keys::kv_key(owner, namespace, key);
        let bytes = encode(entry)?;
        self.inner.put(&full_key, bytes)
    }

    /// Removes a namespaced KV entry.
    pub fn remove_kv(
        &mut self,
        owner: &Address,
        namespace: &str,
        key: &[u8],
    ) -> Result<(), ExecutionError> {
        self.inner.delete(&keys::kv_key(owner, namespace, key))
    }
}

impl<B: StateIterate> GtosStateStore<B> {
    /// All namespaced KV entries owned by `owner` under `namespace`,
    /// decoded, sorted by their raw key suffix.
    pub fn scan_kv(
        &self,
        owner: &Address,
        namespace: &str,
    ) -> Result<Vec<(Vec<u8>, KvEntry)>, ExecutionError> {
        let mut prefix = keys::KV_KEY_PREFIX.to_vec();
        prefix.extend_from_slice(owner);
        prefix.push(0x00);
        prefix.extend_from_slice(namespace.as_bytes());
        prefix.push(0x00);
        let full_prefix_len = prefix.len();
        self.inner
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(k, v)| {
                let suffix = k
                    .get(full_prefix_len..)
                    .ok_or_else(|| {
                        ExecutionError::StateBackend("kv key shorter than scan prefix".into())
                    })?
                    .to_vec();
                let entry: KvEntry = decode(&v)?;
                Ok((suffix, entry))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::SignerBinding;

    fn account(addr: u8, nonce: u64) -> Account {
        Account {
            address: [addr; 32],
            nonce,
            balance: [0u8; 32],
            signer: SignerBinding::defaulted([addr; 32]),
            uno: None,
        }
    }

    #[test]
    fn account_roundtrips_through_store() {
        let mut store = GtosStateStore::new(BTreeMapStore::new());
        let acct = account(1, 7);
        store.put_account(&acct).unwrap();
        let loaded = store.get_account(&[1u8; 32]).unwrap().unwrap();
        assert_eq!(loaded.nonce, 7);
    }

    #[test]
    fn missing_account_defaults_to_fresh() {
        let store = GtosStateStore::new(BTreeMapStore::new());
        let acct = store.get_account_or_default(&[9u8; 32]).unwrap();
        assert_eq!(acct.nonce, 0);
        assert!(acct.signer.defaulted);
    }

    #[test]
    fn code_entry_roundtrips_and_removes() {
        let mut store = GtosStateStore::new(BTreeMapStore::new());
        let owner = [2u8; 32];
        let entry = CodeEntry {
            payload: vec![0xAB; 4],
            created_block: 10,
            expire_block: 20,
            code_hash: [1u8; 32],
        };
        store.put_code(&owner, &entry).unwrap();
        assert!(store.get_code(&owner).unwrap().is_some());
        store.remove_code(&owner).unwrap();
        assert!(store.get_code(&owner).unwrap().is_none());
    }

    #[test]
    fn kv_scan_returns_all_entries_in_namespace() {
        let mut store = GtosStateStore::new(BTreeMapStore::new());
        let owner = [3u8; 32];
        let entry = |created: u64| KvEntry {
            value: vec![1, 2, 3],
            created_block: created,
            expire_block: created + 100,
        };
        store.put_kv(&owner, "ns", b"a", &entry(1)).unwrap();
        store.put_kv(&owner, "ns", b"b", &entry(2)).unwrap();
        store.put_kv(&owner, "other", b"c", &entry(3)).unwrap();
        let scanned = store.scan_kv(&owner, "ns").unwrap();
        assert_eq!(scanned.len(), 2);
    }

    #[test]
    fn state_root_changes_when_account_written() {
        let mut store = BTreeMapStore::new();
        let empty_root = store.state_root();
        let mut typed = GtosStateStore::new(store.clone());
        typed.put_account(&account(5, 1)).unwrap();
        store = typed.into_inner();
        assert_ne!(store.state_root(), empty_root);
    }
}

//! Per-transaction state transition (spec §4.4): charge intrinsic gas,
//! debit value, route on destination. Every mutation path is
//! validate-then-mutate — state writes for a route only land once every
//! precondition for that route has passed.

use gtos_state::{GtosStateStore, StateAccess, StateOverlay};
use gtos_types::app::{routing, Account, Address, CodeEntry, KvEntry, Receipt, ReceiptStatus, SignerTransaction, SystemAction};
use gtos_types::codec::from_bytes_canonical;
use gtos_types::error::ExecutionError;
use gtos_types::keys;
use gtos_types::MAX_CODE_PAYLOAD_BYTES;

fn balance_to_u128(balance: &[u8; 32]) -> u128 {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&balance[16..]);
    u128::from_be_bytes(buf)
}

fn u128_to_balance(value: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[16..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Unconditionally bumps `address`'s nonce and debits `gas_cost` from its
/// public balance (saturating at zero), directly on `overlay` — the one
/// write path that survives a failed route (spec §4.4/§7).
fn charge_nonce_and_gas<B: StateAccess>(
    overlay: &mut StateOverlay<B>,
    address: &Address,
    gas_cost: u128,
) {
    let mut store = GtosStateStore::new(&mut *overlay);
    if let Ok(mut account) = store.get_account_or_default(address) {
        account.nonce = account.nonce.saturating_add(1);
        let balance = balance_to_u128(&account.balance);
        account.balance = u128_to_balance(balance.saturating_sub(gas_cost));
        let _ = store.put_account(&account);
    }
}

fn apply_code_ttl<S: StateAccess>(
    store: &mut GtosStateStore<S>,
    owner: &Address,
    current_block: u64,
    data: &[u8],
) -> Result<(), ExecutionError> {
    if data.len() < 8 {
        return Err(ExecutionError::StateBackend("code-TTL payload shorter than 8 bytes".into()));
    }
    let mut ttl_bytes = [0u8; 8];
    ttl_bytes.copy_from_slice(data.get(..8).ok_or_else(|| {
        ExecutionError::StateBackend("code-TTL payload truncated".into())
    })?);
    let ttl = u64::from_be_bytes(ttl_bytes);
    let payload = data.get(8..).unwrap_or(&[]).to_vec();
    if payload.len() > MAX_CODE_PAYLOAD_BYTES {
        return Err(ExecutionError::StateBackend("code payload too large".into()));
    }

    if let Some(existing) = store.get_code(owner)? {
        if existing.is_active(current_block) {
            return Err(ExecutionError::CodeStillActive);
        }
    }

    let code_hash = gtos_crypto::hash::keccak256(&payload);
    let entry = CodeEntry {
        payload,
        created_block: current_block,
        expire_block: current_block.saturating_add(ttl),
        code_hash,
    };
    store.put_code(owner, &entry)
}

fn apply_kv_ttl<S: StateAccess>(
    store: &mut GtosStateStore<S>,
    owner: &Address,
    current_block: u64,
    data: &[u8],
) -> Result<(), ExecutionError> {
    let mut off = 0usize;
    let ns_len = read_u16(data, &mut off)?;
    let namespace_bytes = read_bytes(data, &mut off, ns_len as usize)?;
    let namespace = std::str::from_utf8(namespace_bytes)
        .map_err(|_| ExecutionError::StateBackend("KV namespace is not valid UTF-8".into()))?;
    let key_len = read_u16(data, &mut off)?;
    let key = read_bytes(data, &mut off, key_len as usize)?.to_vec();
    let ttl = read_u64(data, &mut off)?;
    let value = data.get(off..).unwrap_or(&[]).to_vec();

    let entry = KvEntry {
        value,
        created_block: current_block,
        expire_block: current_block.saturating_add(ttl),
    };
    store.put_kv(owner, namespace, &key, &entry)
}

fn read_u16(data: &[u8], off: &mut usize) -> Result<u16, ExecutionError> {
    let slice = data
        .get(*off..*off + 2)
        .ok_or_else(|| ExecutionError::StateBackend("KV payload truncated".into()))?;
    let mut buf = [0u8; 2];
    buf.copy_from_slice(slice);
    *off += 2;
    Ok(u16::from_be_bytes(buf))
}

fn read_u64(data: &[u8], off: &mut usize) -> Result<u64, ExecutionError> {
    let slice = data
        .get(*off..*off + 8)
        .ok_or_else(|| ExecutionError::StateBackend("KV payload truncated".into()))?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    *off += 8;
    Ok(u64::from_be_bytes(buf))
}

fn read_bytes<'a>(data: &'a [u8], off: &mut usize, len: usize) -> Result<&'a [u8], ExecutionError> {
    let slice = data
        .get(*off..*off + len)
        .ok_or_else(|| ExecutionError::StateBackend("KV payload truncated".into()))?;
    *off += len;
    Ok(slice)
}

fn apply_system_action<S: StateAccess>(
    store: &mut GtosStateStore<S>,
    from: &Address,
    data: &[u8],
) -> Result<(), ExecutionError> {
    let action: SystemAction = from_bytes_canonical(data).map_err(ExecutionError::StateBackend)?;
    match action {
        SystemAction::SetSigner { algorithm, public_value } => {
            let mut account = store.get_account_or_default(from)?;
            account.signer = gtos_types::app::SignerBinding {
                algorithm,
                public_value,
                defaulted: false,
            };
            store.put_account(&account)
        }
        SystemAction::RegisterValidator { self_stake } => {
            let mut sys = gtos_system::SystemState::new(store.inner_mut());
            sys.register_validator(from, self_stake)
        }
        SystemAction::WithdrawValidator => {
            let mut sys = gtos_system::SystemState::new(store.inner_mut());
            sys.withdraw_validator(from)
        }
    }
}

fn apply_plain_credit<S: StateAccess>(
    store: &mut GtosStateStore<S>,
    from: &Address,
    to: &Address,
    value: u128,
) -> Result<(), ExecutionError> {
    if value == 0 {
        return Ok(());
    }
    let mut sender = store.get_account_or_default(from)?;
    let sender_balance = balance_to_u128(&sender.balance);
    if sender_balance < value {
        return Err(ExecutionError::InsufficientBalance);
    }
    sender.balance = u128_to_balance(sender_balance - value);

    let mut recipient = store.get_account_or_default(to)?;
    let recipient_balance = balance_to_u128(&recipient.balance);
    recipient.balance = u128_to_balance(
        recipient_balance
            .checked_add(value)
            .ok_or(ExecutionError::UnoVersionOverflow)?,
    );

    store.put_account(&sender)?;
    store.put_account(&recipient)
}

fn dispatch_route<S: StateAccess>(
    store: &mut GtosStateStore<S>,
    chain_id: u64,
    current_block: u64,
    tx: &SignerTransaction,
) -> Result<(), ExecutionError> {
    match tx.to {
        None => apply_code_ttl(store, &tx.from, current_block, &tx.data),
        Some(to) if to == routing::SYSTEM_ACTION_ADDRESS => apply_system_action(store, &tx.from, &tx.data),
        Some(to) if to == routing::KV_ROUTER_ADDRESS => apply_kv_ttl(store, &tx.from, current_block, &tx.data),
        Some(to) if to == routing::PRIVACY_ROUTER_ADDRESS => {
            let action = gtos_types::app::UnoAction::from_wire(&tx.data)
                .map_err(|e| ExecutionError::StateBackend(e.to_string()))?;
            gtos_uno::process_uno_action(store, chain_id, &tx.from, tx.nonce, &action)
        }
        Some(to) => apply_plain_credit(store, &tx.from, &to, balance_to_u128(&tx.value)),
    }
}

fn tx_hash(tx: &SignerTransaction) -> [u8; 32] {
    gtos_crypto::hash::keccak256(&tx.signing_preimage())
}

/// Applies one transaction against `level_overlay`: nonce/gas accounting is
/// always committed; the route-specific effect commits only on success
/// (spec §4.4: "a failed precondition must produce zero state writes for
/// that transaction [except the nonce/gas accounting]"). Admission
/// (signature, nonce floor, gas floor) is re-checked here exactly as
/// `gtos_tx::admit` checks it at pool entry, so the two stay
/// byte-equivalent (spec §4.3) — a tx with a forged `from` or a signature
/// that doesn't verify against the resolved signer binding never reaches
/// `dispatch_route`.
pub fn apply_tx<B: StateAccess>(
    level_overlay: &mut StateOverlay<B>,
    chain_id: u64,
    current_block: u64,
    tx: &SignerTransaction,
    tx_index: u32,
) -> Receipt {
    let intrinsic = gtos_tx::intrinsic_gas(&tx.data);
    let gas_cost = u128::from(tx.gas_price).saturating_mul(u128::from(intrinsic));

    let admitted = {
        let verify_store = GtosStateStore::new(&mut *level_overlay);
        gtos_tx::admit(tx.clone(), &verify_store).is_ok()
    };

    charge_nonce_and_gas(level_overlay, &tx.from, gas_cost);

    let outcome = if admitted {
        let mut tx_store = GtosStateStore::new(StateOverlay::new(&mut *level_overlay));
        let result = dispatch_route(&mut tx_store, chain_id, current_block, tx);
        let overlay = tx_store.into_inner();
        let changes = overlay.changes();
        drop(overlay);

        if result.is_ok() {
            for (k, v) in changes.inserts.0 {
                let _ = level_overlay.put(&k, v);
            }
            for k in changes.deletes.0 {
                let _ = level_overlay.delete(&k);
            }
        }
        result
    } else {
        Err(ExecutionError::InvalidSigner)
    };

    Receipt {
        status: if outcome.is_ok() { ReceiptStatus::Success } else { ReceiptStatus::Failed },
        gas_used: intrinsic,
        tx_hash: tx_hash(tx),
        tx_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_state::BTreeMapStore;
    use gtos_types::app::{SignerBinding, SignerType};
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::{Signature, SigningKey};

    /// A deterministic signing key, distinct per `seed` byte — test-only,
    /// never a real account's key.
    fn signing_key(seed: u8) -> SigningKey {
        let mut bytes = [0u8; 32];
        bytes[31] = seed;
        SigningKey::from_bytes(&bytes.into()).unwrap()
    }

    fn sign(key: &SigningKey, preimage: &[u8]) -> Vec<u8> {
        let digest = gtos_crypto::hash::keccak256(preimage);
        let sig: Signature = key.sign_prehash(&digest).unwrap();
        sig.to_bytes().to_vec()
    }

    fn tx(key: &SigningKey, from: [u8; 32], to: Option<[u8; 32]>, value: u128) -> SignerTransaction {
        let mut t = SignerTransaction {
            chain_id: 1,
            from,
            nonce: 0,
            gas: 1_000_000,
            gas_price: 1,
            to,
            value: u128_to_balance(value),
            data: vec![],
            signer_type: SignerType::Secp256k1,
            signature: vec![],
        };
        t.signature = sign(key, &t.signing_preimage());
        t
    }

    /// Seeds `addr` with `balance` and binds its signer to `key`'s public
    /// key, so a tx signed with `key` passes admission inside `apply_tx`.
    fn seed_account(overlay: &mut StateOverlay<BTreeMapStore>, addr: [u8; 32], balance: u128, key: &SigningKey) {
        let mut store = GtosStateStore::new(&mut *overlay);
        let mut account = Account::new(addr);
        account.balance = u128_to_balance(balance);
        account.signer = SignerBinding {
            algorithm: SignerType::Secp256k1,
            public_value: key.verifying_key().to_encoded_point(false).as_bytes().to_vec(),
            defaulted: false,
        };
        store.put_account(&account).unwrap();
    }

    #[test]
    fn plain_transfer_moves_balance_and_charges_gas() {
        let key = signing_key(1);
        let base = BTreeMapStore::new();
        let mut overlay = StateOverlay::new(base);
        seed_account(&mut overlay, [1u8; 32], 1_000, &key);

        let t = tx(&key, [1u8; 32], Some([2u8; 32]), 100);
        let receipt = apply_tx(&mut overlay, 1, 0, &t, 0);
        assert_eq!(receipt.status, ReceiptStatus::Success);

        let store = GtosStateStore::new(&mut overlay);
        let sender = store.get_account(&[1u8; 32]).unwrap().unwrap();
        let recipient = store.get_account(&[2u8; 32]).unwrap().unwrap();
        assert_eq!(balance_to_u128(&recipient.balance), 100);
        assert_eq!(sender.nonce, 1);
        assert!(balance_to_u128(&sender.balance) < 900);
    }

    #[test]
    fn insufficient_balance_leaves_zero_route_writes_but_still_charges_gas() {
        let key = signing_key(3);
        let base = BTreeMapStore::new();
        let mut overlay = StateOverlay::new(base);
        seed_account(&mut overlay, [3u8; 32], 10, &key);

        let t = tx(&key, [3u8; 32], Some([4u8; 32]), 1_000);
        let receipt = apply_tx(&mut overlay, 1, 0, &t, 0);
        assert_eq!(receipt.status, ReceiptStatus::Failed);

        let store = GtosStateStore::new(&mut overlay);
        assert!(store.get_account(&[4u8; 32]).unwrap().is_none());
        let sender = store.get_account(&[3u8; 32]).unwrap().unwrap();
        assert_eq!(sender.nonce, 1, "gas/nonce accounting still commits on failure");
    }

    #[test]
    fn unsigned_transfer_is_rejected_with_zero_route_writes() {
        let key = signing_key(6);
        let other_key = signing_key(60);
        let base = BTreeMapStore::new();
        let mut overlay = StateOverlay::new(base);
        seed_account(&mut overlay, [6u8; 32], 1_000, &key);

        // Signed with the wrong key: a forged `from` with a garbage/foreign
        // signature must never reach `dispatch_route`.
        let t = tx(&other_key, [6u8; 32], Some([7u8; 32]), 500);
        let receipt = apply_tx(&mut overlay, 1, 0, &t, 0);
        assert_eq!(receipt.status, ReceiptStatus::Failed);

        let store = GtosStateStore::new(&mut overlay);
        assert!(store.get_account(&[7u8; 32]).unwrap().is_none());
        let sender = store.get_account(&[6u8; 32]).unwrap().unwrap();
        assert_eq!(sender.nonce, 1, "gas/nonce accounting still commits on a failed admission");
        assert_eq!(balance_to_u128(&sender.balance), 1_000, "no value moved on a failed admission");
    }

    #[test]
    fn code_ttl_roundtrips_through_nil_to() {
        let key = signing_key(5);
        let base = BTreeMapStore::new();
        let mut overlay = StateOverlay::new(base);
        seed_account(&mut overlay, [5u8; 32], 1_000, &key);

        let mut data = 10u64.to_be_bytes().to_vec();
        data.extend_from_slice(b"hello");
        let mut t = tx(&key, [5u8; 32], None, 0);
        t.data = data;
        t.signature = sign(&key, &t.signing_preimage());
        let receipt = apply_tx(&mut overlay, 1, 100, &t, 0);
        assert_eq!(receipt.status, ReceiptStatus::Success);

        let store = GtosStateStore::new(&mut overlay);
        let code = store.get_code(&[5u8; 32]).unwrap().unwrap();
        assert_eq!(code.payload, b"hello");
        assert_eq!(code.expire_block, 110);
    }
}

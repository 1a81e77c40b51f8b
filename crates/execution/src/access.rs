//! Conservative conflict analysis (spec §4.5): each transaction is
//! annotated with the set of state keys its execution may touch. Access
//! analysis is conservative by construction — the sets below always include
//! every key a given route *could* touch, never fewer.

use std::collections::BTreeSet;

use gtos_types::app::{routing, SignerTransaction};
use gtos_types::keys;

/// The conservative set of state keys one transaction may read or write.
/// Reads and writes are not distinguished: any shared key between two
/// transactions is treated as a conflict (spec §4.5: "unknown → treat as
/// conflicting").
#[derive(Debug, Clone, Default)]
pub struct AccessSet(pub BTreeSet<Vec<u8>>);

/// A fixed marker key serialising every UNO transaction with every other
/// (spec §4.5: "a shared conflict marker is placed on the privacy router
/// address for any UNO transaction").
fn uno_conflict_marker() -> Vec<u8> {
    let mut key = b"marker\0uno\0".to_vec();
    key.extend_from_slice(&routing::PRIVACY_ROUTER_ADDRESS);
    key
}

/// A fixed marker key serialising every system action that touches the
/// validator registry (spec §4.5: "System-action transactions that touch
/// shared registries ... likewise serialise").
fn validator_registry_conflict_marker() -> Vec<u8> {
    keys::validator_count_key().to_vec()
}

/// Computes the conservative access set for `tx` (spec §4.4's routing
/// table determines which keys a transaction may touch).
pub fn access_set_for(tx: &SignerTransaction) -> AccessSet {
    let mut keys_touched = BTreeSet::new();
    keys_touched.insert(keys::account_key(&tx.from));

    match tx.to {
        None => {
            // Nil-`to` convention: code-with-TTL router, keyed by the
            // sender's own owner address.
            keys_touched.insert(keys::code_key(&tx.from));
        }
        Some(to) if to == routing::SYSTEM_ACTION_ADDRESS => {
            keys_touched.insert(validator_registry_conflict_marker());
        }
        Some(to) if to == routing::KV_ROUTER_ADDRESS => {
            let mut marker = keys::KV_KEY_PREFIX.to_vec();
            marker.extend_from_slice(&tx.from);
            keys_touched.insert(marker);
        }
        Some(to) if to == routing::PRIVACY_ROUTER_ADDRESS => {
            keys_touched.insert(uno_conflict_marker());
        }
        Some(to) => {
            keys_touched.insert(keys::account_key(&to));
        }
    }

    AccessSet(keys_touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::SignerType;

    fn tx(from: [u8; 32], to: Option<[u8; 32]>) -> SignerTransaction {
        SignerTransaction {
            chain_id: 1,
            from,
            nonce: 0,
            gas: 21_000,
            gas_price: 1,
            to,
            value: [0u8; 32],
            data: vec![],
            signer_type: SignerType::Secp256k1,
            signature: vec![],
        }
    }

    #[test]
    fn distinct_senders_and_recipients_do_not_conflict() {
        let a = access_set_for(&tx([1u8; 32], Some([2u8; 32])));
        let b = access_set_for(&tx([3u8; 32], Some([4u8; 32])));
        assert!(a.0.is_disjoint(&b.0));
    }

    #[test]
    fn uno_transactions_share_a_conflict_marker() {
        let a = access_set_for(&tx([1u8; 32], Some(routing::PRIVACY_ROUTER_ADDRESS)));
        let b = access_set_for(&tx([2u8; 32], Some(routing::PRIVACY_ROUTER_ADDRESS)));
        assert!(!a.0.is_disjoint(&b.0));
    }

    #[test]
    fn system_actions_share_the_registry_marker() {
        let a = access_set_for(&tx([1u8; 32], Some(routing::SYSTEM_ACTION_ADDRESS)));
        let b = access_set_for(&tx([2u8; 32], Some(routing::SYSTEM_ACTION_ADDRESS)));
        assert!(!a.0.is_disjoint(&b.0));
    }
}

#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! Transaction envelope decode, admission checks, and sender resolution
//! (spec §4.3). Both the pool's admission path and the executor's
//! block-application path call [`admit`], so the two stay byte-equivalent
//! by construction (spec §4.3: "any divergence is a consensus defect").

use gtos_crypto::sign;
use gtos_state::{GtosStateStore, StateAccess};
use gtos_types::app::{Account, SignerTransaction};
use gtos_types::error::ValidationError;

/// Per-byte intrinsic gas weights (spec §4.6's cost model, generalised to
/// every envelope's `data` field per spec §4.3's gas-below-intrinsic check).
const INTRINSIC_BASE: u64 = 21_000;
const INTRINSIC_PER_NONZERO_BYTE: u64 = 16;
const INTRINSIC_PER_ZERO_BYTE: u64 = 4;

/// `base + 16·nonzero_bytes + 4·zero_bytes` over `data` (spec §4.6).
pub fn intrinsic_gas(data: &[u8]) -> u64 {
    let (zero, nonzero) = data.iter().fold((0u64, 0u64), |(z, nz), b| {
        if *b == 0 {
            (z + 1, nz)
        } else {
            (z, nz + 1)
        }
    });
    INTRINSIC_BASE
        .saturating_add(nonzero.saturating_mul(INTRINSIC_PER_NONZERO_BYTE))
        .saturating_add(zero.saturating_mul(INTRINSIC_PER_ZERO_BYTE))
}

/// The outcome of a successful admission check: the transaction plus the
/// account it was resolved and verified against.
pub struct Admitted {
    /// The admitted transaction.
    pub tx: SignerTransaction,
    /// The sender's account at admission time.
    pub account: Account,
    /// The intrinsic gas charged against `tx.gas`.
    pub intrinsic_gas: u64,
}

/// Runs every admission-time check from spec §4.3/§7 Tier 1, in the fixed
/// order the spec lists them: unsupported signer, nonce-too-low,
/// gas-below-intrinsic, invalid signer. Both the mempool and the executor's
/// pre-apply step call this exact function.
pub fn admit<B: StateAccess>(
    tx: SignerTransaction,
    state: &GtosStateStore<B>,
) -> Result<Admitted, ValidationError> {
    let intrinsic = intrinsic_gas(&tx.data);
    if tx.gas < intrinsic {
        return Err(ValidationError::GasBelowIntrinsic {
            intrinsic,
            provided: tx.gas,
        });
    }

    let account = state
        .get_account_or_default(&tx.from)
        .map_err(|e| ValidationError::MalformedEnvelope(e.to_string()))?;

    if tx.nonce < account.nonce {
        return Err(ValidationError::NonceTooLow {
            current: account.nonce,
            provided: tx.nonce,
        });
    }

    let preimage = tx.signing_preimage();
    sign::verify(
        account.signer.algorithm,
        &account.signer.public_value,
        &preimage,
        &tx.signature,
    )
    .map_err(|_| ValidationError::InvalidSigner)?;

    Ok(Admitted {
        tx,
        account,
        intrinsic_gas: intrinsic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::{SignerBinding, SignerType};

    fn base_tx(from: [u8; 32], nonce: u64, gas: u64) -> SignerTransaction {
        SignerTransaction {
            chain_id: 1,
            from,
            nonce,
            gas,
            gas_price: 1,
            to: Some([9u8; 32]),
            value: [0u8; 32],
            data: vec![],
            signer_type: SignerType::Secp256k1,
            signature: vec![0u8; 65],
        }
    }

    #[test]
    fn intrinsic_gas_counts_zero_and_nonzero_bytes() {
        let g = intrinsic_gas(&[0, 0, 1, 2]);
        assert_eq!(g, INTRINSIC_BASE + 2 * 16 + 2 * 4);
    }

    #[test]
    fn rejects_gas_below_intrinsic() {
        let store = GtosStateStore::new(gtos_state::BTreeMapStore::new());
        let tx = base_tx([1u8; 32], 0, 100);
        let err = admit(tx, &store).unwrap_err();
        assert!(matches!(err, ValidationError::GasBelowIntrinsic { .. }));
    }

    #[test]
    fn rejects_nonce_too_low() {
        let mut store = GtosStateStore::new(gtos_state::BTreeMapStore::new());
        let mut acct = Account::new([1u8; 32]);
        acct.nonce = 5;
        acct.signer = SignerBinding::defaulted([1u8; 32]);
        store.put_account(&acct).unwrap();

        let tx = base_tx([1u8; 32], 3, 1_000_000);
        let err = admit(tx, &store).unwrap_err();
        assert!(matches!(err, ValidationError::NonceTooLow { current: 5, provided: 3 }));
    }

    #[test]
    fn rejects_invalid_signature() {
        let store = GtosStateStore::new(gtos_state::BTreeMapStore::new());
        let tx = base_tx([1u8; 32], 0, 1_000_000);
        let err = admit(tx, &store).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSigner));
    }
}

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

//! Shield/transfer/unshield verification and state progression for the
//! encrypted-balance subsystem (spec §4.7). Admission and block application
//! both call [`process_uno_action`], so the two checks stay byte-equivalent
//! by construction, matching the pool/executor equivalence gtos-tx enforces
//! for ordinary signer verification.

use curve25519_dalek::ristretto::CompressedRistretto;

use gtos_crypto::uno::{verify_opening, verify_range, ElGamalCiphertext, ElGamalPublicKey, TranscriptContext, UnoTranscript};
use gtos_state::{GtosStateStore, StateAccess};
use gtos_types::app::{Account, Address, SignerType, UnoAction, UnoTriple};
use gtos_types::error::ExecutionError;

fn to_compressed(bytes: &[u8; 32]) -> CompressedRistretto {
    CompressedRistretto(*bytes)
}

fn elgamal_public_key(account: &Account) -> Result<ElGamalPublicKey, ExecutionError> {
    if account.signer.algorithm != SignerType::ElGamal {
        return Err(ExecutionError::PermissionDenied(
            "account signer is not bound to ElGamal".to_string(),
        ));
    }
    let mut buf = [0u8; 32];
    let src = account.signer.public_value.get(..32).ok_or_else(|| {
        ExecutionError::StateBackend("ElGamal public key shorter than 32 bytes".to_string())
    })?;
    buf.copy_from_slice(src);
    Ok(ElGamalPublicKey(to_compressed(&buf)))
}

fn triple_to_ciphertext(triple: &UnoTriple) -> ElGamalCiphertext {
    ElGamalCiphertext {
        commitment: to_compressed(&triple.ct_commitment),
        handle: to_compressed(&triple.ct_handle),
    }
}

fn next_version(current: u64) -> Result<u64, ExecutionError> {
    current.checked_add(1).ok_or(ExecutionError::UnoVersionOverflow)
}

/// Runs the full verification-and-apply pipeline for `action`, originating
/// from `tx_from`/`tx_nonce`/`chain_id` (spec §4.7). On any failure, `state`
/// is left untouched — every helper below only mutates after every check
/// has passed.
pub fn process_uno_action<B: StateAccess>(
    state: &mut GtosStateStore<B>,
    chain_id: u64,
    tx_from: &Address,
    tx_nonce: u64,
    action: &UnoAction,
) -> Result<(), ExecutionError> {
    match action {
        UnoAction::Shield(payload) => shield(state, chain_id, tx_from, tx_nonce, payload),
        UnoAction::Transfer(payload) => transfer(state, chain_id, tx_from, tx_nonce, payload),
        UnoAction::Unshield(payload) => unshield(state, chain_id, tx_from, tx_nonce, payload),
    }
}

fn shield<B: StateAccess>(
    state: &mut GtosStateStore<B>,
    chain_id: u64,
    from: &Address,
    nonce: u64,
    payload: &gtos_types::app::uno::ShieldPayload,
) -> Result<(), ExecutionError> {
    use gtos_types::app::uno::transcript_label;

    let mut sender = state.get_account_or_default(from)?;
    let sender_pk = elgamal_public_key(&sender)?;

    let public_balance = u128::from_be_bytes(
        sender.balance.get(16..32).map(|s| {
            let mut b = [0u8; 16];
            b.copy_from_slice(s);
            b
        }).unwrap_or([0u8; 16]),
    );
    if public_balance < u128::from(payload.amount) {
        return Err(ExecutionError::InsufficientBalance);
    }

    let old_ct: Vec<ElGamalCiphertext> = sender.uno.as_ref().map(triple_to_ciphertext).into_iter().collect();
    let new_ct = ElGamalCiphertext {
        commitment: to_compressed(&payload.new_commitment),
        handle: to_compressed(&payload.new_handle),
    };
    let new_slice = [new_ct];

    let ctx = TranscriptContext {
        version: gtos_types::app::uno::TRANSCRIPT_VERSION,
        native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
        chain_id,
        action_label: transcript_label::SHIELD,
        from: *from,
        to: None,
        nonce,
        old_ciphertexts: &old_ct,
        new_ciphertexts: &new_slice,
    };

    let mut t1 = UnoTranscript::shield(&ctx);
    verify_opening(
        &mut t1,
        &new_ct.commitment,
        Some(&sender_pk),
        Some(&new_ct.handle),
        &payload.proof.ct_validity,
    )
    .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let mut t2 = UnoTranscript::shield(&ctx);
    verify_opening(&mut t2, &new_ct.commitment, None, None, &payload.proof.commitment_equality)
        .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let mut t3 = UnoTranscript::shield(&ctx);
    verify_range(&mut t3, &payload.proof.range_proof, &new_ct.commitment)
        .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let new_version = next_version(sender.uno.as_ref().map_or(0, |u| u.version))?;

    let mut new_balance = [0u8; 32];
    new_balance[16..].copy_from_slice(&(public_balance - u128::from(payload.amount)).to_be_bytes());
    sender.balance = new_balance;
    sender.uno = Some(UnoTriple {
        ct_commitment: payload.new_commitment,
        ct_handle: payload.new_handle,
        version: new_version,
    });
    state.put_account(&sender)
}

fn transfer<B: StateAccess>(
    state: &mut GtosStateStore<B>,
    chain_id: u64,
    from: &Address,
    nonce: u64,
    payload: &gtos_types::app::uno::TransferPayload,
) -> Result<(), ExecutionError> {
    use gtos_types::app::uno::transcript_label;

    let mut sender = state.get_account_or_default(from)?;
    let sender_pk = elgamal_public_key(&sender)?;
    let mut receiver = state.get_account_or_default(&payload.to)?;
    let _receiver_pk = elgamal_public_key(&receiver)?;

    let old_sender_ct: Vec<ElGamalCiphertext> = sender.uno.as_ref().map(triple_to_ciphertext).into_iter().collect();
    let sender_new_ct = ElGamalCiphertext {
        commitment: to_compressed(&payload.sender_new_commitment),
        handle: to_compressed(&payload.sender_new_handle),
    };
    let delta_ct = ElGamalCiphertext {
        commitment: to_compressed(&payload.receiver_delta_commitment),
        handle: to_compressed(&payload.receiver_delta_handle),
    };
    let new_slice = [sender_new_ct, delta_ct];

    let ctx = TranscriptContext {
        version: gtos_types::app::uno::TRANSCRIPT_VERSION,
        native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
        chain_id,
        action_label: transcript_label::TRANSFER,
        from: *from,
        to: Some(payload.to),
        nonce,
        old_ciphertexts: &old_sender_ct,
        new_ciphertexts: &new_slice,
    };

    let mut t1 = UnoTranscript::transfer(&ctx);
    verify_opening(
        &mut t1,
        &sender_new_ct.commitment,
        Some(&sender_pk),
        Some(&sender_new_ct.handle),
        &payload.proof.ct_validity,
    )
    .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let mut t2 = UnoTranscript::transfer(&ctx);
    verify_opening(&mut t2, &delta_ct.commitment, None, None, &payload.proof.commitment_equality)
        .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let mut t3 = UnoTranscript::transfer(&ctx);
    verify_range(&mut t3, &payload.proof.range_proof, &delta_ct.commitment)
        .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let sender_new_version = next_version(sender.uno.as_ref().map_or(0, |u| u.version))?;
    let receiver_new_version = next_version(receiver.uno.as_ref().map_or(0, |u| u.version))?;

    let receiver_new_ct = match receiver.uno.as_ref() {
        Some(prev) => triple_to_ciphertext(prev)
            .homomorphic_add(&delta_ct)
            .map_err(|_| ExecutionError::ProofVerificationFailed)?,
        None => delta_ct,
    };

    sender.uno = Some(UnoTriple {
        ct_commitment: payload.sender_new_commitment,
        ct_handle: payload.sender_new_handle,
        version: sender_new_version,
    });
    receiver.uno = Some(UnoTriple {
        ct_commitment: receiver_new_ct.commitment.to_bytes(),
        ct_handle: receiver_new_ct.handle.to_bytes(),
        version: receiver_new_version,
    });

    state.put_account(&sender)?;
    state.put_account(&receiver)
}

fn unshield<B: StateAccess>(
    state: &mut GtosStateStore<B>,
    chain_id: u64,
    from: &Address,
    nonce: u64,
    payload: &gtos_types::app::uno::UnshieldPayload,
) -> Result<(), ExecutionError> {
    use gtos_types::app::uno::transcript_label;

    let mut sender = state.get_account_or_default(from)?;
    let sender_pk = elgamal_public_key(&sender)?;
    let mut receiver = state.get_account_or_default(&payload.to)?;

    let old_ct: Vec<ElGamalCiphertext> = sender.uno.as_ref().map(triple_to_ciphertext).into_iter().collect();
    let new_ct = ElGamalCiphertext {
        commitment: to_compressed(&payload.new_commitment),
        handle: to_compressed(&payload.new_handle),
    };
    let new_slice = [new_ct];

    let ctx = TranscriptContext {
        version: gtos_types::app::uno::TRANSCRIPT_VERSION,
        native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
        chain_id,
        action_label: transcript_label::UNSHIELD,
        from: *from,
        to: Some(payload.to),
        nonce,
        old_ciphertexts: &old_ct,
        new_ciphertexts: &new_slice,
    };

    let mut t1 = UnoTranscript::unshield(&ctx);
    verify_opening(
        &mut t1,
        &new_ct.commitment,
        Some(&sender_pk),
        Some(&new_ct.handle),
        &payload.proof.ct_validity,
    )
    .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let mut t2 = UnoTranscript::unshield(&ctx);
    verify_opening(&mut t2, &new_ct.commitment, None, None, &payload.proof.commitment_equality)
        .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let mut t3 = UnoTranscript::unshield(&ctx);
    verify_range(&mut t3, &payload.proof.range_proof, &new_ct.commitment)
        .map_err(|_| ExecutionError::ProofVerificationFailed)?;

    let new_version = next_version(sender.uno.as_ref().map_or(0, |u| u.version))?;

    let receiver_balance = u128::from_be_bytes({
        let mut b = [0u8; 16];
        if let Some(s) = receiver.balance.get(16..32) {
            b.copy_from_slice(s);
        }
        b
    });
    let credited = receiver_balance
        .checked_add(u128::from(payload.amount))
        .ok_or(ExecutionError::UnoVersionOverflow)?;
    let mut new_receiver_balance = [0u8; 32];
    new_receiver_balance[16..].copy_from_slice(&credited.to_be_bytes());
    receiver.balance = new_receiver_balance;

    sender.uno = Some(UnoTriple {
        ct_commitment: payload.new_commitment,
        ct_handle: payload.new_handle,
        version: new_version,
    });

    state.put_account(&sender)?;
    state.put_account(&receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_crypto::uno::{prove_opening, prove_range, ElGamalKeyPair};
    use gtos_state::BTreeMapStore;
    use gtos_types::app::uno::{transcript_label, ShieldPayload, UnoProofBundle};
    use gtos_types::app::SignerBinding;
    use curve25519_dalek::scalar::Scalar;

    fn elgamal_account(addr: Address, keys: &ElGamalKeyPair) -> Account {
        let mut account = Account::new(addr);
        account.balance = {
            let mut b = [0u8; 32];
            b[16..].copy_from_slice(&1_000u128.to_be_bytes());
            b
        };
        account.signer = SignerBinding {
            algorithm: SignerType::ElGamal,
            public_value: keys.public.0.to_bytes().to_vec(),
            defaulted: false,
        };
        account
    }

    #[test]
    fn shield_debits_public_balance_and_sets_triple() {
        let keys = ElGamalKeyPair::generate();
        let addr = [1u8; 32];
        let mut store = GtosStateStore::new(BTreeMapStore::new());
        store.put_account(&elgamal_account(addr, &keys)).unwrap();

        let amount = 100u64;
        let blinding = Scalar::from(7u64);
        let ct = ElGamalCiphertext::encrypt_with_blinding(amount, blinding, &keys.public).unwrap();

        let ctx = TranscriptContext {
            version: gtos_types::app::uno::TRANSCRIPT_VERSION,
            native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
            chain_id: 1,
            action_label: transcript_label::SHIELD,
            from: addr,
            to: None,
            nonce: 0,
            old_ciphertexts: &[],
            new_ciphertexts: &[ct],
        };

        let mut t1 = UnoTranscript::shield(&ctx);
        let ct_validity = prove_opening(&mut t1, amount, &blinding, Some(&keys.public)).unwrap();
        let mut t2 = UnoTranscript::shield(&ctx);
        let commitment_equality = prove_opening(&mut t2, amount, &blinding, None).unwrap();
        let mut t3 = UnoTranscript::shield(&ctx);
        let range_proof = prove_range(&mut t3, amount, &blinding).unwrap();

        let payload = ShieldPayload {
            amount,
            new_commitment: ct.commitment.to_bytes(),
            new_handle: ct.handle.to_bytes(),
            proof: UnoProofBundle {
                ct_validity: ct_validity.proof_bytes,
                commitment_equality: commitment_equality.proof_bytes,
                range_proof: range_proof.proof_bytes,
            },
        };

        process_uno_action(&mut store, 1, &addr, 0, &UnoAction::Shield(payload)).unwrap();

        let acct = store.get_account(&addr).unwrap().unwrap();
        let remaining = u128::from_be_bytes({
            let mut b = [0u8; 16];
            b.copy_from_slice(&acct.balance[16..]);
            b
        });
        assert_eq!(remaining, 900);
        assert_eq!(acct.uno.unwrap().version, 1);
    }

    #[test]
    fn shield_rejects_non_elgamal_signer() {
        let addr = [2u8; 32];
        let mut store = GtosStateStore::new(BTreeMapStore::new());
        store.put_account(&Account::new(addr)).unwrap();

        let payload = ShieldPayload {
            amount: 1,
            new_commitment: [0u8; 32],
            new_handle: [0u8; 32],
            proof: UnoProofBundle {
                ct_validity: vec![],
                commitment_equality: vec![],
                range_proof: vec![],
            },
        };
        let err = process_uno_action(&mut store, 1, &addr, 0, &UnoAction::Shield(payload)).unwrap_err();
        assert!(matches!(err, ExecutionError::PermissionDenied(_)));
    }
}

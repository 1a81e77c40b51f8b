//! Bulletproofs range proofs bounding UNO plaintext values to `[0, 2^64)`
//! non-negative 64-bit integers (spec §4.7: every shield/transfer/unshield
//! action carries a range proof alongside its ciphertext-validity proof).

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;

use crate::error::CryptoError;

use super::transcript::UnoTranscript;

/// Number of bits proven non-negative. UNO balances are bounded to 64-bit
/// unsigned integers (spec §3's `Account.balance` / ciphertext plaintexts).
const RANGE_BITS: usize = 64;

/// A range proof plus the commitment it was generated against, ready to be
/// embedded in a `ShieldPayload`/`TransferPayload`/`UnshieldPayload`'s
/// `range_proof` field.
pub struct RangeProofBundle {
    /// Serialized Bulletproofs range proof.
    pub proof_bytes: Vec<u8>,
    /// The value commitment the proof attests to.
    pub commitment: CompressedRistretto,
}

/// Proves `value` lies in `[0, 2^64)`, binding the proof to `transcript`.
pub fn prove_range(
    transcript: &mut UnoTranscript,
    value: u64,
    blinding: &Scalar,
) -> Result<RangeProofBundle, CryptoError> {
    let bp_gens = BulletproofGens::new(RANGE_BITS, 1);
    let pc_gens = PedersenGens::default();
    let mut branch = transcript.range_proof_branch();

    let (proof, commitment) = RangeProof::prove_single(
        &bp_gens,
        &pc_gens,
        &mut branch,
        value,
        blinding,
        RANGE_BITS,
    )
    .map_err(|_| CryptoError::RangeProofFailed)?;

    Ok(RangeProofBundle {
        proof_bytes: proof.to_bytes(),
        commitment,
    })
}

/// Verifies a previously produced range proof against `commitment`, using
/// the same transcript context the prover used.
pub fn verify_range(
    transcript: &mut UnoTranscript,
    proof_bytes: &[u8],
    commitment: &CompressedRistretto,
) -> Result<(), CryptoError> {
    let bp_gens = BulletproofGens::new(RANGE_BITS, 1);
    let pc_gens = PedersenGens::default();
    let mut branch = transcript.range_proof_branch();

    let proof = RangeProof::from_bytes(proof_bytes)
        .map_err(|_| CryptoError::Malformed("malformed range proof bytes".to_string()))?;

    proof
        .verify_single(&bp_gens, &pc_gens, &mut branch, commitment, RANGE_BITS)
        .map_err(|_| CryptoError::RangeProofFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::uno::transcript_label;
    use gtos_types::app::account::Address;

    use crate::uno::transcript::TranscriptContext;
    use crate::uno::ElGamalCiphertext;

    fn ctx<'a>(old: &'a [ElGamalCiphertext], new: &'a [ElGamalCiphertext]) -> TranscriptContext<'a> {
        TranscriptContext {
            version: gtos_types::app::uno::TRANSCRIPT_VERSION,
            native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
            chain_id: 1,
            action_label: transcript_label::SHIELD,
            from: Address::default(),
            to: None,
            nonce: 0,
            old_ciphertexts: old,
            new_ciphertexts: new,
        }
    }

    #[test]
    fn valid_range_proof_verifies() {
        let old: Vec<ElGamalCiphertext> = vec![];
        let new: Vec<ElGamalCiphertext> = vec![];
        let c = ctx(&old, &new);

        let blinding = Scalar::from(123456789u64);
        let mut prover_t = UnoTranscript::shield(&c);
        let bundle = prove_range(&mut prover_t, 1000, &blinding).unwrap();

        let mut verifier_t = UnoTranscript::shield(&c);
        verify_range(&mut verifier_t, &bundle.proof_bytes, &bundle.commitment).unwrap();
    }

    #[test]
    fn tampered_commitment_fails_verification() {
        let old: Vec<ElGamalCiphertext> = vec![];
        let new: Vec<ElGamalCiphertext> = vec![];
        let c = ctx(&old, &new);

        let blinding = Scalar::from(42u64);
        let mut prover_t = UnoTranscript::shield(&c);
        let bundle = prove_range(&mut prover_t, 5, &blinding).unwrap();

        let mut verifier_t = UnoTranscript::shield(&c);
        let bogus = CompressedRistretto([7u8; 32]);
        assert!(verify_range(&mut verifier_t, &bundle.proof_bytes, &bogus).is_err());
    }
}

//! Sigma-protocol proofs of Pedersen-opening knowledge, optionally extended
//! with the ElGamal-handle relation (spec §4.7's ciphertext-validity and
//! commitment-equality proofs share this one construction): prove knowledge
//! of `(value, blinding)` such that `commitment = value*G + blinding*H`, and
//! — when a public key and handle are supplied — that
//! `handle = blinding*PK` as well, binding the ciphertext to its declared key.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::RngCore;

use super::elgamal::ElGamalPublicKey;
use super::pedersen::generators;
use super::transcript::UnoTranscript;
use crate::error::CryptoError;

fn random_scalar() -> Scalar {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    Scalar::from_bytes_mod_order_wide(&bytes)
}

fn challenge_scalar(transcript: &mut UnoTranscript, points: &[CompressedRistretto]) -> Scalar {
    let t = transcript.inner_mut();
    for p in points {
        t.append_message(b"balance-proof-point", p.as_bytes());
    }
    let mut buf = [0u8; 64];
    t.challenge_bytes(b"balance-proof-challenge", &mut buf);
    Scalar::from_bytes_mod_order_wide(&buf)
}

struct Proof {
    a1: CompressedRistretto,
    a2: Option<CompressedRistretto>,
    z_v: Scalar,
    z_r: Scalar,
}

impl Proof {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 32 * 4);
        out.push(u8::from(self.a2.is_some()));
        out.extend_from_slice(self.a1.as_bytes());
        if let Some(a2) = self.a2 {
            out.extend_from_slice(a2.as_bytes());
        }
        out.extend_from_slice(self.z_v.as_bytes());
        out.extend_from_slice(self.z_r.as_bytes());
        out
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let has_a2 = *bytes
            .first()
            .ok_or_else(|| CryptoError::Malformed("empty balance proof".to_string()))?
            != 0;
        let mut off = 1usize;
        let a1 = read_point(bytes, &mut off)?;
        let a2 = if has_a2 { Some(read_point(bytes, &mut off)?) } else { None };
        let z_v = read_scalar(bytes, &mut off)?;
        let z_r = read_scalar(bytes, &mut off)?;
        Ok(Proof { a1, a2, z_v, z_r })
    }
}

fn read_point(bytes: &[u8], off: &mut usize) -> Result<CompressedRistretto, CryptoError> {
    let slice = bytes
        .get(*off..*off + 32)
        .ok_or_else(|| CryptoError::Malformed("truncated balance proof".to_string()))?;
    let mut buf = [0u8; 32];
    buf.copy_from_slice(slice);
    *off += 32;
    Ok(CompressedRistretto(buf))
}

fn read_scalar(bytes: &[u8], off: &mut usize) -> Result<Scalar, CryptoError> {
    let slice = bytes
        .get(*off..*off + 32)
        .ok_or_else(|| CryptoError::Malformed("truncated balance proof".to_string()))?;
    let mut buf = [0u8; 32];
    buf.copy_from_slice(slice);
    *off += 32;
    Option::from(Scalar::from_canonical_bytes(buf))
        .ok_or_else(|| CryptoError::Malformed("non-canonical scalar in balance proof".to_string()))
}

/// A proof of knowledge of a Pedersen opening, optionally extended with the
/// handle relation.
pub struct OpeningProofBundle {
    /// Serialized proof bytes.
    pub proof_bytes: Vec<u8>,
}

/// Proves knowledge of `(value, blinding)` opening a commitment, binding the
/// proof to `transcript`. Pass `public_key` to additionally prove the
/// ciphertext-validity relation `handle = blinding * public_key` (spec
/// §4.7's CT-validity proof); pass `None` for a bare commitment-equality
/// proof over a delta commitment whose amount stays hidden.
pub fn prove_opening(
    transcript: &mut UnoTranscript,
    value: u64,
    blinding: &Scalar,
    public_key: Option<&ElGamalPublicKey>,
) -> Result<OpeningProofBundle, CryptoError> {
    let (g, h) = generators();
    let k_v = random_scalar();
    let k_r = random_scalar();
    let a1 = (g * k_v + h * k_r).compress();
    let a2 = match public_key {
        Some(pk) => {
            let pk_point = pk
                .0
                .decompress()
                .ok_or_else(|| CryptoError::Malformed("invalid ElGamal public key".to_string()))?;
            Some((pk_point * k_r).compress())
        }
        None => None,
    };

    let mut points = vec![a1];
    if let Some(a2v) = a2 {
        points.push(a2v);
    }
    let e = challenge_scalar(transcript, &points);

    let z_v = k_v + e * Scalar::from(value);
    let z_r = k_r + e * blinding;
    let proof = Proof { a1, a2, z_v, z_r };
    Ok(OpeningProofBundle {
        proof_bytes: proof.to_bytes(),
    })
}

/// Verifies a proof produced by [`prove_opening`] against `commitment`
/// (and, if the proof carries the handle relation, against `public_key` and
/// `handle`). The caller's choice of `public_key`/`handle` must match what
/// the prover used, or verification fails with a shape mismatch.
pub fn verify_opening(
    transcript: &mut UnoTranscript,
    commitment: &CompressedRistretto,
    public_key: Option<&ElGamalPublicKey>,
    handle: Option<&CompressedRistretto>,
    proof_bytes: &[u8],
) -> Result<(), CryptoError> {
    let proof = Proof::from_bytes(proof_bytes)?;

    let mut points = vec![proof.a1];
    if let Some(a2) = proof.a2 {
        points.push(a2);
    }
    let e = challenge_scalar(transcript, &points);

    let (g, h) = generators();
    let commitment_point = commitment
        .decompress()
        .ok_or_else(|| CryptoError::Malformed("invalid commitment".to_string()))?;
    let a1 = proof
        .a1
        .decompress()
        .ok_or_else(|| CryptoError::Malformed("invalid proof point".to_string()))?;
    let lhs1 = (g * proof.z_v + h * proof.z_r).compress();
    let rhs1 = (a1 + commitment_point * e).compress();
    if lhs1 != rhs1 {
        return Err(CryptoError::VerificationFailed);
    }

    match (public_key, handle, proof.a2) {
        (Some(pk), Some(handle), Some(a2)) => {
            let pk_point = pk
                .0
                .decompress()
                .ok_or_else(|| CryptoError::Malformed("invalid ElGamal public key".to_string()))?;
            let handle_point = handle
                .decompress()
                .ok_or_else(|| CryptoError::Malformed("invalid handle".to_string()))?;
            let a2_point = a2
                .decompress()
                .ok_or_else(|| CryptoError::Malformed("invalid proof point".to_string()))?;
            let lhs2 = (pk_point * proof.z_r).compress();
            let rhs2 = (a2_point + handle_point * e).compress();
            if lhs2 != rhs2 {
                return Err(CryptoError::VerificationFailed);
            }
            Ok(())
        }
        (None, None, None) => Ok(()),
        _ => Err(CryptoError::Malformed(
            "balance proof shape does not match the requested verification mode".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtos_types::app::account::Address;
    use gtos_types::app::uno::transcript_label;

    use crate::uno::elgamal::ElGamalKeyPair;
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
    fn ct_validity_proof_roundtrips() {
        let keys = ElGamalKeyPair::generate();
        let (ct, blinding) = ElGamalCiphertext::encrypt(42, &keys.public).unwrap();

        let old: Vec<ElGamalCiphertext> = vec![];
        let new = [ct];
        let c = ctx(&old, &new);

        let mut prover_t = UnoTranscript::shield(&c);
        let bundle = prove_opening(&mut prover_t, 42, &blinding, Some(&keys.public)).unwrap();

        let mut verifier_t = UnoTranscript::shield(&c);
        verify_opening(
            &mut verifier_t,
            &ct.commitment,
            Some(&keys.public),
            Some(&ct.handle),
            &bundle.proof_bytes,
        )
        .unwrap();
    }

    #[test]
    fn commitment_equality_proof_roundtrips_without_handle() {
        let blinding = Scalar::from(99u64);
        let (g, h) = generators();
        let commitment = (g * Scalar::from(7u64) + h * blinding).compress();

        let old: Vec<ElGamalCiphertext> = vec![];
        let new: Vec<ElGamalCiphertext> = vec![];
        let c = ctx(&old, &new);

        let mut prover_t = UnoTranscript::shield(&c);
        let bundle = prove_opening(&mut prover_t, 7, &blinding, None).unwrap();

        let mut verifier_t = UnoTranscript::shield(&c);
        verify_opening(&mut verifier_t, &commitment, None, None, &bundle.proof_bytes).unwrap();
    }

    #[test]
    fn tampered_value_fails_verification() {
        let keys = ElGamalKeyPair::generate();
        let (ct, blinding) = ElGamalCiphertext::encrypt(42, &keys.public).unwrap();

        let old: Vec<ElGamalCiphertext> = vec![];
        let new = [ct];
        let c = ctx(&old, &new);

        let mut prover_t = UnoTranscript::shield(&c);
        // Proves the wrong value against the real ciphertext.
        let bundle = prove_opening(&mut prover_t, 43, &blinding, Some(&keys.public)).unwrap();

        let mut verifier_t = UnoTranscript::shield(&c);
        assert!(verify_opening(
            &mut verifier_t,
            &ct.commitment,
            Some(&keys.public),
            Some(&ct.handle),
            &bundle.proof_bytes,
        )
        .is_err());
    }
}

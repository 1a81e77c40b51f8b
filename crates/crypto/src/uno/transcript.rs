//! Merlin transcript binding for UNO proofs (spec §4.7, §9). Every proof
//! accompanying a shield/transfer/unshield action is bound to the full
//! consensus context of that action — protocol label, chain id, action
//! tag, asset tag, sender/receiver, nonce, and the old/new ciphertexts —
//! so that a proof valid for one context is cryptographically meaningless
//! replayed against another. The domain-separator labels below are fixed
//! consensus truth: changing them changes the set of valid proofs for
//! every UNO transaction ever recorded.

use merlin::Transcript;

use gtos_types::app::account::Address;
use gtos_types::app::uno::transcript_label;

use super::elgamal::ElGamalCiphertext;

/// The context a [`UnoTranscript`] binds a proof to.
pub struct TranscriptContext<'a> {
    /// Transcript-binding protocol version (spec §9), e.g.
    /// `gtos_types::app::uno::TRANSCRIPT_VERSION`.
    pub version: u64,
    /// Asset this action moves, e.g.
    /// `gtos_types::app::uno::NATIVE_ASSET_TAG`.
    pub native_asset: &'static [u8],
    /// Chain this action is being verified against.
    pub chain_id: u64,
    /// Action-specific domain label (shield/transfer/unshield).
    pub action_label: &'static [u8],
    /// Sender address.
    pub from: Address,
    /// Receiver address, if the action has one (shield/unshield have none).
    pub to: Option<Address>,
    /// Transaction nonce of the originating `SignerTransaction`.
    pub nonce: u64,
    /// Prior ciphertext(s) this action transitions from.
    pub old_ciphertexts: &'a [ElGamalCiphertext],
    /// New ciphertext(s) this action transitions to.
    pub new_ciphertexts: &'a [ElGamalCiphertext],
}

/// A Merlin transcript pre-loaded with a [`TranscriptContext`], ready to be
/// handed to a Bulletproofs prover/verifier or a Schnorr-style ciphertext
/// validity proof.
pub struct UnoTranscript(Transcript);

impl UnoTranscript {
    /// Builds a fresh transcript for `ctx`, committing every field in a
    /// fixed order. The order and the labels are consensus truth.
    pub fn new(ctx: &TranscriptContext<'_>) -> Self {
        let mut t = Transcript::new(b"gtos-uno-v1");
        t.append_message(b"protocol", b"gtos-uno-v1");
        t.append_u64(b"version", ctx.version);
        t.append_message(b"native-asset", ctx.native_asset);
        t.append_message(b"action", ctx.action_label);
        t.append_u64(b"chain-id", ctx.chain_id);
        t.append_message(b"from", &ctx.from);
        match ctx.to {
            Some(to) => t.append_message(b"to", &to),
            None => t.append_message(b"to", b"none"),
        }
        t.append_u64(b"nonce", ctx.nonce);
        for ct in ctx.old_ciphertexts {
            t.append_message(b"old-commitment", ct.commitment.as_bytes());
            t.append_message(b"old-handle", ct.handle.as_bytes());
        }
        for ct in ctx.new_ciphertexts {
            t.append_message(b"new-commitment", ct.commitment.as_bytes());
            t.append_message(b"new-handle", ct.handle.as_bytes());
        }
        UnoTranscript(t)
    }

    /// Transcript for a shield action (mint into the encrypted balance).
    pub fn shield(ctx: &TranscriptContext<'_>) -> Self {
        debug_assert_eq!(ctx.action_label, transcript_label::SHIELD);
        Self::new(ctx)
    }

    /// Transcript for a transfer action (encrypted-to-encrypted move).
    pub fn transfer(ctx: &TranscriptContext<'_>) -> Self {
        debug_assert_eq!(ctx.action_label, transcript_label::TRANSFER);
        Self::new(ctx)
    }

    /// Transcript for an unshield action (burn back to the public balance).
    pub fn unshield(ctx: &TranscriptContext<'_>) -> Self {
        debug_assert_eq!(ctx.action_label, transcript_label::UNSHIELD);
        Self::new(ctx)
    }

    /// Forks a dedicated sub-transcript for the range proof component,
    /// kept separate from the Bulletproofs generators' own transcript use
    /// so range-proof and ciphertext-validity challenges never collide.
    pub fn range_proof_branch(&self) -> Transcript {
        let mut branch = self.0.clone();
        branch.append_message(b"branch", transcript_label::BALANCE_PROOF);
        branch
    }

    /// Exposes the inner transcript for equality/validity sub-proofs that
    /// need direct Merlin challenge scalars.
    pub fn inner_mut(&mut self) -> &mut Transcript {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::ristretto::CompressedRistretto;
    use merlin::TranscriptRng;
    use rand::rngs::OsRng;

    fn dummy_ct() -> ElGamalCiphertext {
        ElGamalCiphertext {
            commitment: CompressedRistretto([1u8; 32]),
            handle: CompressedRistretto([2u8; 32]),
        }
    }

    fn challenge_bytes(t: &mut Transcript) -> [u8; 32] {
        let mut rng: TranscriptRng = t.build_rng().finalize(&mut OsRng);
        use rand::RngCore;
        let mut out = [0u8; 32];
        rng.fill_bytes(&mut out);
        out
    }

    fn base_ctx<'a>(old: &'a [ElGamalCiphertext], new: &'a [ElGamalCiphertext]) -> TranscriptContext<'a> {
        TranscriptContext {
            version: gtos_types::app::uno::TRANSCRIPT_VERSION,
            native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
            chain_id: 1,
            action_label: transcript_label::TRANSFER,
            from: [9u8; 32],
            to: Some([8u8; 32]),
            nonce: 0,
            old_ciphertexts: old,
            new_ciphertexts: new,
        }
    }

    #[test]
    fn differing_context_fields_produce_different_challenges() {
        let old = [dummy_ct()];
        let new = [dummy_ct()];
        let ctx_a = base_ctx(&old, &new);
        let mut ctx_b_from = [9u8; 32];
        ctx_b_from[0] = 0xff;
        let ctx_b = TranscriptContext { from: ctx_b_from, ..base_ctx(&old, &new) };

        let mut ta = UnoTranscript::new(&ctx_a);
        let mut tb = UnoTranscript::new(&ctx_b);
        assert_ne!(
            challenge_bytes(ta.inner_mut()),
            challenge_bytes(tb.inner_mut())
        );
    }

    #[test]
    fn mutating_version_changes_the_challenge() {
        let old = [dummy_ct()];
        let new = [dummy_ct()];
        let ctx_a = base_ctx(&old, &new);
        let ctx_b = TranscriptContext { version: ctx_a.version + 1, ..base_ctx(&old, &new) };

        let mut ta = UnoTranscript::new(&ctx_a);
        let mut tb = UnoTranscript::new(&ctx_b);
        assert_ne!(
            challenge_bytes(ta.inner_mut()),
            challenge_bytes(tb.inner_mut())
        );
    }

    #[test]
    fn mutating_native_asset_tag_changes_the_challenge() {
        let old = [dummy_ct()];
        let new = [dummy_ct()];
        let ctx_a = base_ctx(&old, &new);
        let ctx_b = TranscriptContext { native_asset: b"gtos-other-asset", ..base_ctx(&old, &new) };

        let mut ta = UnoTranscript::new(&ctx_a);
        let mut tb = UnoTranscript::new(&ctx_b);
        assert_ne!(
            challenge_bytes(ta.inner_mut()),
            challenge_bytes(tb.inner_mut())
        );
    }

    #[test]
    fn identical_context_produces_identical_challenges() {
        let old = [dummy_ct()];
        let new = [dummy_ct()];
        let ctx = TranscriptContext {
            version: gtos_types::app::uno::TRANSCRIPT_VERSION,
            native_asset: gtos_types::app::uno::NATIVE_ASSET_TAG,
            chain_id: 7,
            action_label: transcript_label::SHIELD,
            from: [3u8; 32],
            to: None,
            nonce: 4,
            old_ciphertexts: &old,
            new_ciphertexts: &new,
        };
        let mut t1 = UnoTranscript::shield(&ctx);
        let mut t2 = UnoTranscript::shield(&ctx);
        assert_eq!(
            challenge_bytes(t1.inner_mut()),
            challenge_bytes(t2.inner_mut())
        );
    }
}

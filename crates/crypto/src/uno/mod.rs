//! Ristretto255 group primitives backing the UNO subsystem (spec §4.7):
//! twisted ElGamal ciphertexts, Pedersen commitments, Bulletproofs range
//! proofs, and the Merlin transcript that binds every proof to its full
//! consensus context.

mod balance_proof;
mod elgamal;
mod pedersen;
mod range_proof;
mod transcript;

pub use balance_proof::{prove_opening, verify_opening, OpeningProofBundle};
pub use elgamal::{ElGamalCiphertext, ElGamalKeyPair, ElGamalPublicKey, ElGamalSecretKey};
pub use pedersen::{PedersenCommitment, PedersenOpening};
pub use range_proof::{prove_range, verify_range, RangeProofBundle};
pub use transcript::{TranscriptContext, UnoTranscript};

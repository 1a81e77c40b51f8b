//! The DPoS slot clock and validator rotation (spec §4.1).

use gtos_types::app::{Address, DIFFICULTY_IN_TURN, DIFFICULTY_OUT_OF_TURN};
use gtos_types::error::ConsensusError;

/// `slot(h) = (h.time - genesis_time) / period_ms`. Undefined (and a
/// failure condition) if `h.time < genesis_time`.
pub fn slot(time: u64, genesis_time: u64, period_ms: u64) -> Result<u64, ConsensusError> {
    if time < genesis_time {
        return Err(ConsensusError::NonMonotonicTime);
    }
    Ok((time - genesis_time) / period_ms.max(1))
}

/// `validators[slot mod |V|]`, in the ascending-address order the snapshot
/// already carries (spec §4.1).
pub fn expected_proposer(validators: &[Address], slot: u64) -> Option<Address> {
    if validators.is_empty() {
        return None;
    }
    let idx = (slot as usize) % validators.len();
    validators.get(idx).copied()
}

/// 2 iff `signer` is the expected in-turn proposer for `slot`, else 1.
pub fn expected_difficulty(validators: &[Address], slot: u64, signer: &Address) -> u64 {
    match expected_proposer(validators, slot) {
        Some(expected) if &expected == signer => DIFFICULTY_IN_TURN,
        _ => DIFFICULTY_OUT_OF_TURN,
    }
}

/// `max(parent.time + period_ms, now_ms)` — the timestamp a proposer signs
/// and never re-stamps (spec §4.1).
pub fn sealing_time(parent_time: u64, period_ms: u64, now_ms: u64) -> u64 {
    (parent_time + period_ms).max(now_ms)
}

/// `clamp(2*period_ms, 100ms, 1000ms)` — the out-of-turn broadcast-delay
/// window width (spec §4.1). The delay itself is drawn by the caller from
/// a non-cryptographic PRNG; this is a liveness heuristic, not a security
/// property.
pub fn wiggle_window_ms(period_ms: u64) -> u64 {
    (2 * period_ms).clamp(100, 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_divides_elapsed_time_by_period() {
        assert_eq!(slot(1_000, 0, 250).unwrap(), 4);
        assert_eq!(slot(1_100, 1_000, 250).unwrap(), 0);
    }

    #[test]
    fn slot_before_genesis_is_an_error() {
        assert!(slot(0, 100, 250).is_err());
    }

    #[test]
    fn expected_proposer_rotates_by_slot_modulo_set_size() {
        let validators = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        assert_eq!(expected_proposer(&validators, 0), Some([1u8; 32]));
        assert_eq!(expected_proposer(&validators, 1), Some([2u8; 32]));
        assert_eq!(expected_proposer(&validators, 3), Some([1u8; 32]));
    }

    #[test]
    fn difficulty_is_in_turn_only_for_the_expected_signer() {
        let validators = vec![[1u8; 32], [2u8; 32]];
        assert_eq!(expected_difficulty(&validators, 0, &[1u8; 32]), DIFFICULTY_IN_TURN);
        assert_eq!(expected_difficulty(&validators, 0, &[2u8; 32]), DIFFICULTY_OUT_OF_TURN);
    }

    #[test]
    fn wiggle_window_is_clamped() {
        assert_eq!(wiggle_window_ms(10), 100);
        assert_eq!(wiggle_window_ms(2_000), 1_000);
        assert_eq!(wiggle_window_ms(300), 600);
    }
}

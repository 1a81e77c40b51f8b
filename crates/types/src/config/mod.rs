//! Chain configuration shared by every core component.

use serde::{Deserialize, Serialize};

pub mod consensus;
pub use consensus::SealSignerType;

/// Genesis/chain configuration (spec §6). The per-network fields must be
/// stated explicitly; the fixed network-wide constants default to the
/// values spec §6 mandates so a genesis file only needs to state what
/// varies per deployment. Parsing the genesis file itself (TOML/JSON on
/// disk) is an external collaborator's concern; only this typed struct and
/// its validation are in-core.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Explicit chain identity, carried on every transaction and header seal.
    pub chain_id: u64,
    /// Slot period, in milliseconds.
    pub period_ms: u64,
    /// Number of blocks between validator-set re-embeddings.
    pub epoch: u64,
    /// Maximum validators selected per epoch (spec §6: `<= 21`, test-net `15`).
    pub max_validators: usize,
    /// The signer algorithm genesis mandates for header sealing.
    pub seal_signer_type: SealSignerType,

    /// Rolling window of finalised blocks whose bodies are retained.
    #[serde(default = "default_retain_blocks")]
    pub retain_blocks: u64,
    /// Blocks between persisted snapshot checkpoints.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
    /// Target block interval, in milliseconds (liveness tuning knob, distinct from `period_ms`).
    #[serde(default = "default_target_block_interval")]
    pub target_block_interval_ms: u64,
    /// Header future-time admission bound, in milliseconds (`now + this`).
    #[serde(default = "default_allowed_future_block_time")]
    pub allowed_future_block_time_ms: u64,
}

fn default_retain_blocks() -> u64 {
    200
}
fn default_snapshot_interval() -> u64 {
    1000
}
fn default_target_block_interval() -> u64 {
    360
}
fn default_allowed_future_block_time() -> u64 {
    1200
}

impl ChainConfig {
    /// Validates the configuration, returning a descriptive error on the
    /// first violated constraint (spec §6).
    pub fn validate(&self) -> Result<(), String> {
        if self.period_ms == 0 {
            return Err("period_ms must be non-zero".to_string());
        }
        if self.epoch == 0 {
            return Err("epoch must be non-zero".to_string());
        }
        if self.max_validators == 0 || self.max_validators > 21 {
            return Err("max_validators must be in 1..=21".to_string());
        }
        if self.retain_blocks == 0 {
            return Err("retain_blocks must be non-zero".to_string());
        }
        if self.snapshot_interval == 0 {
            return Err("snapshot_interval must be non-zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChainConfig {
        ChainConfig {
            chain_id: 1,
            period_ms: 360,
            epoch: 1667,
            max_validators: 15,
            seal_signer_type: SealSignerType::Secp256k1,
            retain_blocks: default_retain_blocks(),
            snapshot_interval: default_snapshot_interval(),
            target_block_interval_ms: default_target_block_interval(),
            allowed_future_block_time_ms: default_allowed_future_block_time(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn zero_period_rejected() {
        let mut cfg = sample();
        cfg.period_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn over_max_validators_rejected() {
        let mut cfg = sample();
        cfg.max_validators = 22;
        assert!(cfg.validate().is_err());
    }
}

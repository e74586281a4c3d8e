//! Per-network consensus parameters.

use crate::error::{PowError, Result};
use crate::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Main,
    Test,
    Regtest,
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("unknown network '{other}'")),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

/// Heights of the *next* block at which each later algorithm takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationHeights {
    pub gravity_well: u64,
    pub digishield: u64,
    pub dual_kgw3: u64,
    pub adaptive: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Maximum permitted target (minimum difficulty).
    pub pow_limit: U256,
    pub target_spacing: u64,
    pub target_timespan: u64,
    pub activation: ActivationHeights,
    /// Blocks after `activation.dual_kgw3` that are pinned to the transition target.
    pub smoothing_window: u64,
    /// Testnet rule: a late candidate may be mined at the pow limit.
    pub allow_min_difficulty_blocks: bool,
    /// next height -> compact target recorded on chain, applied under DUAL_KGW3.
    #[serde(default)]
    pub pow_overrides: BTreeMap<u64, u32>,
}

impl ConsensusConfig {
    pub fn main() -> Self {
        ConsensusConfig {
            // 0x00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff
            pow_limit: U256::MAX >> 20,
            target_spacing: 90,
            target_timespan: 8 * 60 * 60,
            activation: ActivationHeights {
                gravity_well: 26_850,
                digishield: 1_100_000,
                dual_kgw3: 1_250_000,
                adaptive: 8_250_000,
            },
            smoothing_window: 8,
            allow_min_difficulty_blocks: false,
            pow_overrides: BTreeMap::new(),
        }
    }

    pub fn test() -> Self {
        ConsensusConfig {
            activation: ActivationHeights {
                gravity_well: 50,
                digishield: 1_100_000,
                dual_kgw3: 1_250_000,
                adaptive: 8_588_750,
            },
            allow_min_difficulty_blocks: true,
            ..Self::main()
        }
    }

    pub fn regtest() -> Self {
        ConsensusConfig {
            // 0x7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff
            pow_limit: U256::MAX >> 1,
            target_spacing: 1,
            target_timespan: 8 * 60 * 60,
            activation: ActivationHeights {
                gravity_well: 20,
                digishield: 320,
                dual_kgw3: 640,
                adaptive: 960,
            },
            smoothing_window: 8,
            allow_min_difficulty_blocks: true,
            pow_overrides: BTreeMap::new(),
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
            Network::Regtest => Self::regtest(),
        }
    }

    /// Blocks between legacy retargets.
    pub fn adjustment_interval(&self) -> u64 {
        self.target_timespan / self.target_spacing
    }

    pub fn pow_limit_bits(&self) -> u32 {
        crate::compact::encode(self.pow_limit)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pow_limit.is_zero() {
            return Err(PowError::InvalidConfig("pow limit must be non-zero"));
        }
        if self.target_spacing == 0 {
            return Err(PowError::InvalidConfig("target spacing must be non-zero"));
        }
        if self.target_timespan < self.target_spacing {
            return Err(PowError::InvalidConfig("target timespan is shorter than spacing"));
        }
        let a = &self.activation;
        if !(a.gravity_well <= a.digishield && a.digishield <= a.dual_kgw3 && a.dual_kgw3 <= a.adaptive) {
            return Err(PowError::InvalidConfig("activation heights must be non-decreasing"));
        }
        Ok(())
    }
}

//! Next-target computation.
//!
//! The chain has switched retarget algorithms several times. [`Algorithm`]
//! picks the one in force for a given next height and [`next_work_required`]
//! runs it against a read-only [`ChainView`].

mod adaptive;
mod digishield;
mod dual_kgw3;
mod gravity_well;
mod legacy;

use crate::error::Result;
use crate::params::ConsensusConfig;
use crate::types::{BlockRecord, ChainView};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// V1: fixed-interval retarget with height-dependent clamps.
    Legacy,
    /// V2: Kimoto Gravity Well.
    GravityWell,
    /// V3: per-block DigiShield-style retarget.
    DigiShield,
    /// Smoothing plateau after the DUAL_KGW3 fork: a constant target.
    Transition,
    /// V4: averaged KGW3 + last-interval estimators with shock absorbers.
    DualKgw3,
    /// V5: success-weighted average with timestamp-gap branches.
    Adaptive,
}

impl Algorithm {
    /// Algorithm in force for the block at `next_height`. Later rules win.
    pub fn for_height(next_height: u64, config: &ConsensusConfig) -> Self {
        let heights = &config.activation;
        let smoothing_end = heights.dual_kgw3.saturating_add(config.smoothing_window);

        let mut algorithm = Algorithm::Legacy;
        if next_height >= heights.gravity_well {
            algorithm = Algorithm::GravityWell;
        }
        if next_height >= heights.digishield {
            algorithm = Algorithm::DigiShield;
        }
        if (heights.dual_kgw3..smoothing_end).contains(&next_height) {
            algorithm = Algorithm::Transition;
        }
        if next_height >= smoothing_end {
            algorithm = Algorithm::DualKgw3;
        }
        if next_height >= heights.adaptive {
            algorithm = Algorithm::Adaptive;
        }
        algorithm
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Algorithm::Legacy => "legacy",
            Algorithm::GravityWell => "kimoto-gravity-well",
            Algorithm::DigiShield => "digishield",
            Algorithm::Transition => "transition",
            Algorithm::DualKgw3 => "dual-kgw3",
            Algorithm::Adaptive => "adaptive",
        };
        f.write_str(name)
    }
}

/// Compact target the successor of `last` must satisfy.
///
/// `last == None` means the next block is genesis. `candidate_time` is the
/// proposed timestamp of the block being built or validated.
pub fn next_work_required<C: ChainView + ?Sized>(
    chain: &C,
    last: Option<&BlockRecord>,
    candidate_time: u32,
    config: &ConsensusConfig,
) -> Result<u32> {
    config.validate()?;
    let Some(last) = last else {
        return Ok(config.pow_limit_bits());
    };

    let next_height = last.height + 1;
    let algorithm = Algorithm::for_height(next_height, config);
    log::debug!("next height {next_height}: retarget with {algorithm}");

    let bits = match algorithm {
        Algorithm::Legacy => legacy::next_work(chain, last, candidate_time, config)?,
        Algorithm::GravityWell => gravity_well::next_work(chain, last, config)?,
        Algorithm::DigiShield => digishield::next_work(chain, last, config)?,
        Algorithm::Transition => crate::SMOOTHING_TRANSITION_BITS,
        Algorithm::DualKgw3 => match config.pow_overrides.get(&next_height) {
            Some(bits) => {
                log::info!("height {next_height}: using recorded target {bits:08x}");
                *bits
            }
            None => dual_kgw3::next_work(chain, last, candidate_time, config)?,
        },
        Algorithm::Adaptive => adaptive::next_work(chain, last, candidate_time, config)?,
    };
    Ok(bits)
}

/// Testnet: a candidate more than two spacings after `last` may be mined at
/// the pow limit.
fn is_late_candidate(last: &BlockRecord, candidate_time: u32, spacing: u64) -> bool {
    i64::from(candidate_time) > i64::from(last.time) + 2 * spacing as i64
}

/// Testnet rule for interval-based retargets: late candidates get the pow
/// limit, otherwise skip back over blocks that were themselves mined under
/// that rule.
fn min_difficulty_rule<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    candidate_time: u32,
    interval: u64,
    config: &ConsensusConfig,
) -> Result<u32> {
    let limit_bits = config.pow_limit_bits();
    if is_late_candidate(last, candidate_time, config.target_spacing) {
        return Ok(limit_bits);
    }

    let mut block = last;
    while block.height % interval != 0 && block.bits == limit_bits {
        match chain.parent(block)? {
            Some(parent) => block = parent,
            None => break,
        }
    }
    Ok(block.bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PowError;
    use crate::params::ActivationHeights;

    fn config() -> ConsensusConfig {
        ConsensusConfig {
            activation: ActivationHeights {
                gravity_well: 100,
                digishield: 200,
                dual_kgw3: 300,
                adaptive: 400,
            },
            smoothing_window: 8,
            ..ConsensusConfig::main()
        }
    }

    #[test]
    fn selects_by_next_height() {
        let config = config();
        assert_eq!(Algorithm::for_height(0, &config), Algorithm::Legacy);
        assert_eq!(Algorithm::for_height(99, &config), Algorithm::Legacy);
        assert_eq!(Algorithm::for_height(100, &config), Algorithm::GravityWell);
        assert_eq!(Algorithm::for_height(199, &config), Algorithm::GravityWell);
        assert_eq!(Algorithm::for_height(200, &config), Algorithm::DigiShield);
        assert_eq!(Algorithm::for_height(299, &config), Algorithm::DigiShield);
        assert_eq!(Algorithm::for_height(300, &config), Algorithm::Transition);
        assert_eq!(Algorithm::for_height(307, &config), Algorithm::Transition);
        assert_eq!(Algorithm::for_height(308, &config), Algorithm::DualKgw3);
        assert_eq!(Algorithm::for_height(399, &config), Algorithm::DualKgw3);
        assert_eq!(Algorithm::for_height(400, &config), Algorithm::Adaptive);
        assert_eq!(Algorithm::for_height(u64::MAX, &config), Algorithm::Adaptive);
    }

    #[test]
    fn adaptive_overrides_an_unfinished_plateau() {
        let mut config = config();
        config.activation.adaptive = 303;
        assert_eq!(Algorithm::for_height(302, &config), Algorithm::Transition);
        assert_eq!(Algorithm::for_height(303, &config), Algorithm::Adaptive);
    }

    #[test]
    fn invalid_config_is_an_error_not_a_panic() {
        let chain = vec![
            BlockRecord::new(0, 1_000, 0x1e0f_ffff),
            BlockRecord::new(1, 1_090, 0x1e0f_ffff),
        ];
        let last = chain.last();

        let mut config = ConsensusConfig::main();
        config.target_spacing = 0;
        assert!(matches!(
            next_work_required(chain.as_slice(), last, 1_180, &config),
            Err(PowError::InvalidConfig(_))
        ));

        let mut config = ConsensusConfig::main();
        config.target_timespan = config.target_spacing - 1;
        assert!(matches!(
            next_work_required(chain.as_slice(), last, 1_180, &config),
            Err(PowError::InvalidConfig(_))
        ));
        assert!(matches!(
            next_work_required(chain.as_slice(), None, 1_180, &config),
            Err(PowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn mainnet_schedule() {
        let config = ConsensusConfig::main();
        assert_eq!(Algorithm::for_height(26_849, &config), Algorithm::Legacy);
        assert_eq!(Algorithm::for_height(26_850, &config), Algorithm::GravityWell);
        assert_eq!(Algorithm::for_height(1_100_000, &config), Algorithm::DigiShield);
        assert_eq!(Algorithm::for_height(1_250_000, &config), Algorithm::Transition);
        assert_eq!(Algorithm::for_height(1_250_008, &config), Algorithm::DualKgw3);
        assert_eq!(Algorithm::for_height(8_250_000, &config), Algorithm::Adaptive);
    }

    #[test]
    fn never_steps_back_to_an_older_algorithm() {
        fn rank(algorithm: Algorithm) -> u8 {
            match algorithm {
                Algorithm::Legacy => 0,
                Algorithm::GravityWell => 1,
                Algorithm::DigiShield => 2,
                Algorithm::Transition => 3,
                Algorithm::DualKgw3 => 4,
                Algorithm::Adaptive => 5,
            }
        }
        let config = config();
        let mut previous = Algorithm::Legacy;
        for height in 0..500 {
            let current = Algorithm::for_height(height, &config);
            assert!(rank(current) >= rank(previous), "height {height}");
            previous = current;
        }
    }
}

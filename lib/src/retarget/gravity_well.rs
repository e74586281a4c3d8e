//! Kimoto Gravity Well.
//!
//! Walks back from the tip keeping a running average of past targets and
//! stops once the observed block rate leaves the "event horizon" band, whose
//! width shrinks as the window grows.

use crate::compact;
use crate::error::Result;
use crate::params::ConsensusConfig;
use crate::types::{BlockRecord, ChainView};
use crate::util::{clamp_target, elapsed, mul_div};
use crate::{SECONDS_PER_DAY, U256};

/// Window bounds and deviation curve of one KGW flavour.
pub(super) struct Well {
    pub past_blocks_min: u64,
    pub past_blocks_max: u64,
    pub spacing: u64,
    /// `i` in `1 + 0.7084 * (mass / i)^-1.228`
    pub horizon_scale: f64,
}

/// Where the walk stopped.
pub(super) struct Reading {
    pub average: U256,
    pub actual_seconds: i64,
    pub target_seconds: i64,
}

impl Reading {
    /// Average scaled by how far the window ran ahead of or behind schedule.
    pub fn scaled_average(&self) -> U256 {
        if self.actual_seconds != 0 && self.target_seconds != 0 {
            mul_div(self.average, self.actual_seconds as u64, self.target_seconds as u64)
        } else {
            self.average
        }
    }
}

impl Well {
    pub fn classic(config: &ConsensusConfig) -> Self {
        let spacing = config.target_spacing;
        Well {
            past_blocks_min: SECONDS_PER_DAY / 4 / spacing,
            past_blocks_max: SECONDS_PER_DAY * 7 / spacing,
            spacing,
            horizon_scale: 144.0,
        }
    }

    /// True when the chain is too short for this well; callers fall back to
    /// the pow limit.
    pub fn too_shallow(&self, last: &BlockRecord) -> bool {
        last.height == 0 || last.height < self.past_blocks_min
    }

    fn horizon_deviation(&self, mass: u64) -> f64 {
        1.0 + 0.7084 * (mass as f64 / self.horizon_scale).powf(-1.228)
    }

    pub fn walk<C: ChainView + ?Sized>(&self, chain: &C, last: &BlockRecord) -> Result<Reading> {
        let mut reading = last;
        let mut mass: u64 = 0;
        let mut average = U256::zero();
        let mut actual_seconds: i64 = 0;
        let mut target_seconds: i64 = 0;

        while reading.height > 0 {
            if self.past_blocks_max > 0 && mass >= self.past_blocks_max {
                break;
            }
            mass += 1;

            let target = reading.target().target;
            average = if mass == 1 { target } else { step_average(average, target, mass) };

            actual_seconds = elapsed(last.time, reading.time).max(0);
            target_seconds = (self.spacing * mass) as i64;
            let mut ratio = 1.0;
            if actual_seconds != 0 && target_seconds != 0 {
                ratio = target_seconds as f64 / actual_seconds as f64;
            }

            let fast = self.horizon_deviation(mass);
            let slow = 1.0 / fast;
            if mass >= self.past_blocks_min && (ratio <= slow || ratio >= fast) {
                log::debug!("kgw: left event horizon after {mass} blocks, ratio {ratio}");
                break;
            }

            match chain.parent(reading)? {
                Some(parent) => reading = parent,
                None => break,
            }
        }

        Ok(Reading {
            average,
            actual_seconds,
            target_seconds,
        })
    }
}

/// `average + (target - average) / n`, with the subtraction taken in whichever
/// direction keeps it unsigned.
pub(super) fn step_average(average: U256, target: U256, n: u64) -> U256 {
    let n = U256::from(n);
    if target >= average {
        average + (target - average) / n
    } else {
        average - (average - target) / n
    }
}

pub(super) fn next_work<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    config: &ConsensusConfig,
) -> Result<u32> {
    let well = Well::classic(config);
    if well.too_shallow(last) {
        return Ok(config.pow_limit_bits());
    }

    let reading = well.walk(chain, last)?;
    let new_target = clamp_target(reading.scaled_average(), config.pow_limit);
    let bits = compact::encode(new_target);
    log::debug!("kgw retarget: {:08x} -> {bits:08x}", last.bits);
    Ok(bits)
}

//! DUAL_KGW3: the mean of a tighter Kimoto Gravity Well and a plain
//! last-interval retarget, followed by two shock absorbers.

use super::gravity_well::Well;
use crate::compact;
use crate::error::{PowError, Result};
use crate::params::ConsensusConfig;
use crate::types::{BlockRecord, ChainView};
use crate::util::{clamp_target, elapsed, mul_div};
use crate::{SECONDS_PER_DAY, STALL_LIMIT_DIVISOR, U256};

// candidate가 마지막 블록보다 이 시간 이상 늦으면 난이도를 크게 떨어뜨린다
const LONG_TIME_LIMIT: i64 = 60 * 60;

fn well(config: &ConsensusConfig) -> Well {
    let spacing = config.target_spacing;
    Well {
        past_blocks_min: SECONDS_PER_DAY / 40 / spacing,
        past_blocks_max: SECONDS_PER_DAY * 7 / spacing,
        spacing,
        horizon_scale: 72.0,
    }
}

pub(super) fn next_work<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    candidate_time: u32,
    config: &ConsensusConfig,
) -> Result<u32> {
    let well = well(config);
    if well.too_shallow(last) {
        return Ok(config.pow_limit_bits());
    }
    let spacing = config.target_spacing as i64;

    // estimator 1: KGW3
    let kgw = well.walk(chain, last)?.scaled_average();

    // estimator 2: 직전 블록 간격만으로 조정
    let parent = chain
        .parent(last)?
        .ok_or(PowError::MissingAncestor { height: last.height.saturating_sub(1) })?;
    let last_interval = elapsed(last.time, parent.time);
    let mut interval = if last_interval < 0 { spacing } else { last_interval };
    interval = interval.clamp(spacing / 3, spacing * 3);
    let short = mul_div(last.target().target, interval as u64, spacing as u64);

    // (kgw + short) / 2, 256비트 안에서 넘치지 않게
    let two = U256::from(2u64);
    let mut new_target = kgw / two + short / two + (kgw % two + short % two) / two;

    // 직전 블록이 spacing/6 보다 빨랐다면 난이도를 바로 올린다
    log::debug!("dual kgw3: last interval {last_interval}s");
    if last_interval < spacing / 6 {
        new_target = mul_div(new_target, 85, 100);
    }

    if elapsed(candidate_time, last.time) > LONG_TIME_LIMIT {
        new_target = config.pow_limit / U256::from(STALL_LIMIT_DIVISOR);
        log::info!(
            "dual kgw3: no block for over {LONG_TIME_LIMIT}s, target dropped to {:08x}",
            compact::encode(new_target)
        );
    }

    let bits = compact::encode(clamp_target(new_target, config.pow_limit));
    log::debug!("dual kgw3 retarget: {:08x} -> {bits:08x}", last.bits);
    Ok(bits)
}

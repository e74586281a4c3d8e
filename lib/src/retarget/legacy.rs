use super::min_difficulty_rule;
use crate::compact;
use crate::error::Result;
use crate::params::ConsensusConfig;
use crate::types::{BlockRecord, ChainView};
use crate::util::{clamp_target, elapsed, mul_div};

// 높이에 따라 timespan 하한을 다르게 둔다. 초기 체인일수록 더 큰 폭의 조정을 허용
fn min_timespan(next_height: u64, timespan: i64) -> i64 {
    if next_height > 10_000 {
        timespan / 4
    } else if next_height > 5_000 {
        timespan / 8
    } else {
        timespan / 16
    }
}

pub(super) fn next_work<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    candidate_time: u32,
    config: &ConsensusConfig,
) -> Result<u32> {
    let interval = config.adjustment_interval();
    let next_height = last.height + 1;

    // interval마다 한 번만 조정한다
    if next_height % interval != 0 {
        if config.allow_min_difficulty_blocks {
            return min_difficulty_rule(chain, last, candidate_time, interval, config);
        }
        return Ok(last.bits);
    }

    // genesis 직후 첫 조정만 interval - 1 블록, 그 외에는 interval 전체를 거슬러 올라간다
    let blocks_to_go_back = if next_height == interval { interval - 1 } else { interval };
    let first = chain.ancestor(last.height - blocks_to_go_back)?;

    let timespan = config.target_timespan as i64;
    let raw_timespan = elapsed(last.time, first.time);
    let actual_timespan = raw_timespan.clamp(min_timespan(next_height, timespan), timespan * 4);
    log::debug!("legacy: actual timespan {raw_timespan}s, {actual_timespan}s after bounds");

    let old_target = last.target().target;
    let new_target = clamp_target(
        mul_div(old_target, actual_timespan as u64, timespan as u64),
        config.pow_limit,
    );
    let bits = compact::encode(new_target);
    log::debug!("legacy retarget: {:08x} -> {bits:08x}", last.bits);
    Ok(bits)
}

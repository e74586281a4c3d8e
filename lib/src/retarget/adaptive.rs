//! Adaptive retarget.
//!
//! Starts from an estimate built only from recent blocks that arrived close to
//! schedule, reacts to the candidate's timestamp gap first, and otherwise
//! applies a bucketed 90-block window retarget.

use super::gravity_well::step_average;
use crate::compact;
use crate::error::Result;
use crate::params::ConsensusConfig;
use crate::types::{BlockRecord, ChainView};
use crate::util::{clamp_target, elapsed, mul_div};
use crate::{STALL_LIMIT_DIVISOR, U256};

const SUCCESS_SEARCH_DEPTH: usize = 14;
const WINDOW: u64 = 90;

// 모든 배율은 90분율
const SCALE: u64 = 90;
const FAST_GAP_SCALE: u64 = 54;

/// (gap above `multiple * spacing`, scale), checked in order after the stall rule.
const LATE_GAP_STEPS: [(i64, u64); 4] = [(7, 149), (5, 131), (4, 117), (3, 104)];

/// (modulated timespan below `threshold / 180` of spacing, bucket)
const BUCKETS: [(i64, u64); 3] = [(168, 81), (180, 87), (189, 93)];
const SLOWEST_BUCKET: u64 = 96;

/// Average target over recent on-schedule blocks, or the tip's own target
/// when there is none or the tip has clearly moved away from it.
fn base_estimate<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    spacing: i64,
) -> Result<U256> {
    let last_target = last.target().target;
    let tolerance = spacing / 5;

    let mut successes: u64 = 0;
    let mut average = U256::zero();
    let mut block = last;
    for _ in 0..SUCCESS_SEARCH_DEPTH {
        let Some(parent) = chain.parent(block)? else {
            break;
        };
        let interval = elapsed(block.time, parent.time);
        if (interval - spacing).abs() <= tolerance {
            successes += 1;
            let target = block.target().target;
            average = if successes == 1 { target } else { step_average(average, target, successes) };
        }
        block = parent;
    }

    if successes == 0 {
        log::debug!("adaptive: no on-schedule blocks, using tip target");
        return Ok(last_target);
    }

    // tip이 제시간에 나왔는데 평균과 30% 이상 어긋나면 tip 쪽을 믿는다
    let Some(parent) = chain.parent(last)? else {
        return Ok(average);
    };
    let last_interval = elapsed(last.time, parent.time);
    let window = spacing * 6 / 5;
    let lower = mul_div(average, 70, 100);
    let upper = mul_div(average, 130, 100);
    if (0..=window).contains(&last_interval) && (last_target < lower || last_target > upper) {
        log::debug!("adaptive: tip diverges from {successes}-block average, using tip target");
        return Ok(last_target);
    }
    Ok(average)
}

fn bucket(modulated: i64, spacing: i64) -> u64 {
    BUCKETS
        .iter()
        .find(|(threshold, _)| modulated * 180 < threshold * spacing)
        .map(|(_, bucket)| *bucket)
        .unwrap_or(SLOWEST_BUCKET)
}

fn window_retarget<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    estimate: U256,
    spacing: i64,
) -> Result<U256> {
    let blocks = WINDOW.min(last.height);
    let first = chain.ancestor(last.height - blocks)?;
    let actual = elapsed(last.time, first.time);

    let n = blocks as i64;
    let modulated = spacing + (actual - spacing * n) / n;
    let bucket = bucket(modulated, spacing);
    log::debug!("adaptive: {blocks}-block window took {actual}s, modulated {modulated}s, bucket {bucket}");
    Ok(mul_div(estimate, bucket, SCALE))
}

pub(super) fn next_work<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    candidate_time: u32,
    config: &ConsensusConfig,
) -> Result<u32> {
    if last.is_genesis() {
        return Ok(config.pow_limit_bits());
    }
    let spacing = config.target_spacing as i64;
    let estimate = base_estimate(chain, last, spacing)?;
    let gap = elapsed(candidate_time, last.time);

    let new_target = if gap < spacing / 2 {
        mul_div(estimate, FAST_GAP_SCALE, SCALE)
    } else if gap > 14 * spacing {
        log::info!("adaptive: candidate {gap}s after tip, dropping to pow limit / {STALL_LIMIT_DIVISOR}");
        config.pow_limit / U256::from(STALL_LIMIT_DIVISOR)
    } else if let Some((_, scale)) = LATE_GAP_STEPS.iter().find(|(multiple, _)| gap > multiple * spacing) {
        mul_div(estimate, *scale, SCALE)
    } else {
        window_retarget(chain, last, estimate, spacing)?
    };

    let bits = compact::encode(clamp_target(new_target, config.pow_limit));
    log::debug!("adaptive retarget: {:08x} -> {bits:08x} (gap {gap}s)", last.bits);
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Blockchain;

    const BITS: u32 = 0x1c0f_fff0;

    fn chain(len: u64, spacing: u32) -> Blockchain {
        let mut chain = Blockchain::new();
        for height in 0..len {
            chain
                .add_block(BlockRecord::new(height, 1_000_000 + spacing * height as u32, BITS))
                .unwrap();
        }
        chain
    }

    fn t() -> U256 {
        compact::decode(BITS).target
    }

    fn scaled(target: U256, scale: u64) -> u32 {
        compact::encode(target * U256::from(scale) / U256::from(90u64))
    }

    fn next(chain: &Blockchain, gap: u32) -> u32 {
        let tip = chain.tip().unwrap();
        next_work(chain, tip, tip.time + gap, &ConsensusConfig::main()).unwrap()
    }

    #[test]
    fn buckets() {
        assert_eq!(bucket(70, 90), 81);
        assert_eq!(bucket(83, 90), 81);
        assert_eq!(bucket(84, 90), 87);
        assert_eq!(bucket(89, 90), 87);
        assert_eq!(bucket(90, 90), 93);
        assert_eq!(bucket(94, 90), 93);
        assert_eq!(bucket(95, 90), 96);
        assert_eq!(bucket(-5, 90), 81);
    }

    #[test]
    fn fast_candidate_hardens() {
        assert_eq!(next(&chain(100, 90), 30), scaled(t(), 54));
    }

    #[test]
    fn stalled_candidate_drops_to_fraction_of_limit() {
        let limit = ConsensusConfig::main().pow_limit;
        assert_eq!(next(&chain(100, 90), 16 * 90), compact::encode(limit / U256::from(15u64)));
        assert_eq!(next(&chain(100, 90), 14 * 90 + 1), compact::encode(limit / U256::from(15u64)));
    }

    #[test]
    fn late_candidate_steps() {
        let chain = chain(100, 90);
        assert_eq!(next(&chain, 14 * 90), scaled(t(), 149));
        assert_eq!(next(&chain, 7 * 90 + 1), scaled(t(), 149));
        assert_eq!(next(&chain, 7 * 90), scaled(t(), 131));
        assert_eq!(next(&chain, 5 * 90), scaled(t(), 117));
        assert_eq!(next(&chain, 4 * 90), scaled(t(), 104));
        assert_eq!(next(&chain, 3 * 90 + 1), scaled(t(), 104));
    }

    #[test]
    fn on_schedule_window_uses_93_bucket() {
        assert_eq!(next(&chain(100, 90), 90), scaled(t(), 93));
    }

    #[test]
    fn fast_window_uses_81_bucket() {
        // 80초 간격은 ±20% 안이라 평균 추정치는 그대로, 창은 80초로 측정된다
        assert_eq!(next(&chain(100, 80), 90), scaled(t(), 81));
    }

    #[test]
    fn without_successes_tip_target_is_used() {
        // 200초 간격에는 성공 구간이 없다. 창: 90 + (18000 - 8100) / 90 = 200 -> 96
        assert_eq!(next(&chain(100, 200), 90), scaled(t(), 96));
    }

    #[test]
    fn divergent_tip_overrides_average() {
        let doubled = t() * U256::from(2u64);
        let mut chain = chain(100, 90);
        let tip_time = chain.tip().unwrap().time;
        chain
            .add_block(BlockRecord::new(100, tip_time + 90, compact::encode(doubled)))
            .unwrap();
        assert_eq!(next(&chain, 90), scaled(doubled, 93));
    }

    #[test]
    fn short_chain_uses_what_it_has() {
        // 높이 10: 창은 10블록
        assert_eq!(next(&chain(11, 90), 90), scaled(t(), 93));
    }

    #[test]
    fn genesis_tip_gets_pow_limit() {
        let config = ConsensusConfig::main();
        let chain = chain(1, 90);
        let tip = chain.tip().unwrap();
        assert_eq!(next_work(&chain, tip, tip.time + 90, &config).unwrap(), config.pow_limit_bits());
    }
}

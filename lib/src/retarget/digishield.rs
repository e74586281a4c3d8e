use crate::compact;
use crate::error::Result;
use crate::params::ConsensusConfig;
use crate::types::{BlockRecord, ChainView};
use crate::util::{clamp_target, elapsed, mul_div};

pub(super) fn next_work<C: ChainView + ?Sized>(
    chain: &C,
    last: &BlockRecord,
    config: &ConsensusConfig,
) -> Result<u32> {
    // retarget timespan == spacing 이므로 interval은 1, 매 블록 조정한다
    let retarget_timespan = config.target_spacing as i64;

    // genesis 바로 다음 블록은 비교할 간격이 없다
    let blocks_to_go_back = if last.is_genesis() { 0 } else { 1 };
    let first = chain.ancestor(last.height - blocks_to_go_back)?;

    let raw_timespan = elapsed(last.time, first.time);
    let actual_timespan = raw_timespan.clamp(
        retarget_timespan - retarget_timespan / 4,
        retarget_timespan + retarget_timespan / 2,
    );
    log::debug!("digishield: actual timespan {raw_timespan}s, {actual_timespan}s after bounds");

    let new_target = clamp_target(
        mul_div(last.target().target, actual_timespan as u64, retarget_timespan as u64),
        config.pow_limit,
    );
    let bits = compact::encode(new_target);
    log::debug!("digishield retarget: {:08x} -> {bits:08x}", last.bits);
    Ok(bits)
}

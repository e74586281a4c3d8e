//! Proof-of-work check of a hash against a compact target.

use crate::compact;
use crate::error::{PowError, Result};
use crate::params::ConsensusConfig;
use crate::sha256::{Hash, PowHasher};
use crate::U256;

/// How a failed check is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Failures are errors carrying the rejection reason.
    #[default]
    Strict,
    /// Failures are `Ok(false)`; used when scanning an index speculatively.
    Lenient,
}

/// Decode `bits` and check it is a usable target no easier than `pow_limit`.
pub fn target_from_bits(bits: u32, pow_limit: U256) -> Result<U256> {
    let decoded = compact::decode(bits);
    if decoded.negative {
        return Err(PowError::NegativeTarget(bits));
    }
    if decoded.overflow {
        return Err(PowError::OverflowTarget(bits));
    }
    if decoded.target.is_zero() {
        return Err(PowError::ZeroTarget(bits));
    }
    if decoded.target > pow_limit {
        return Err(PowError::TargetAboveLimit { bits });
    }
    Ok(decoded.target)
}

pub fn check_proof_of_work(hash: &Hash, bits: u32, pow_limit: U256) -> Result<()> {
    // 범위 검사를 먼저 해야 해시 비교 없이 잘못된 target을 걸러낸다
    let target = target_from_bits(bits, pow_limit)?;
    if !hash.matches_target(target) {
        return Err(PowError::InsufficientWork {
            hash: hash.as_u256(),
            target,
        });
    }
    Ok(())
}

pub fn verify(hash: &Hash, bits: u32, config: &ConsensusConfig, mode: CheckMode) -> Result<bool> {
    match check_proof_of_work(hash, bits, config.pow_limit) {
        Ok(()) => Ok(true),
        Err(e) => match mode {
            CheckMode::Strict => Err(e),
            CheckMode::Lenient => {
                log::trace!("lenient pow check failed: {e}");
                Ok(false)
            }
        },
    }
}

/// Hash a serialized header with `hasher` and verify it against `bits`.
pub fn verify_header<H: PowHasher + ?Sized>(
    hasher: &H,
    header: &[u8],
    bits: u32,
    config: &ConsensusConfig,
    mode: CheckMode,
) -> Result<bool> {
    let hash = hasher.pow_hash(header);
    verify(&hash, bits, config, mode)
}

use crate::U256;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PowError {
    #[error("compact target {0:#010x} has its sign bit set")]
    NegativeTarget(u32),
    #[error("compact target {0:#010x} does not fit in 256 bits")]
    OverflowTarget(u32),
    #[error("compact target {0:#010x} decodes to zero")]
    ZeroTarget(u32),
    #[error("compact target {bits:#010x} is above the network pow limit")]
    TargetAboveLimit { bits: u32 },
    #[error("hash {hash:x} does not meet target {target:x}")]
    InsufficientWork { hash: U256, target: U256 },
    #[error("chain view has no block at height {height}")]
    MissingAncestor { height: u64 },
    #[error("block at height {got} cannot follow tip, expected height {expected}")]
    UnlinkedBlock { expected: u64, got: u64 },
    #[error("invalid consensus config: {0}")]
    InvalidConfig(&'static str),
}

impl PowError {
    /// Range failures of the compact target itself, as opposed to a hash that
    /// simply did not do enough work.
    pub fn is_invalid_target(&self) -> bool {
        matches!(
            self,
            PowError::NegativeTarget(_)
                | PowError::OverflowTarget(_)
                | PowError::ZeroTarget(_)
                | PowError::TargetAboveLimit { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PowError>;

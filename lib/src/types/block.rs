use crate::compact::{self, Decoded};
use serde::{Deserialize, Serialize};

/// What the retarget engine needs to know about a block. The parent link is
/// implied by `height - 1` in the owning [`ChainView`](super::ChainView).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRecord {
    pub height: u64,
    pub time: u32,
    /// compact target this block was mined against
    pub bits: u32,
}

impl BlockRecord {
    pub fn new(height: u64, time: u32, bits: u32) -> Self {
        BlockRecord { height, time, bits }
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    pub fn target(&self) -> Decoded {
        compact::decode(self.bits)
    }
}

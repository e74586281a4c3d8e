use crate::error::{PowError, Result};
use crate::params::ConsensusConfig;
use crate::types::BlockRecord;
use crate::util::{load_cbor, save_cbor, Savable};
use serde::{Deserialize, Serialize};
use std::io::{Read, Result as IoResult, Write};

/// Read-only, height-indexed access to one chain of blocks.
///
/// Implementations must hand out a stable snapshot for the duration of a
/// single retarget computation.
pub trait ChainView {
    fn block_at(&self, height: u64) -> Option<&BlockRecord>;

    fn ancestor(&self, height: u64) -> Result<&BlockRecord> {
        self.block_at(height).ok_or(PowError::MissingAncestor { height })
    }

    /// `Ok(None)` only for genesis.
    fn parent(&self, block: &BlockRecord) -> Result<Option<&BlockRecord>> {
        match block.height.checked_sub(1) {
            Some(height) => self.ancestor(height).map(Some),
            None => Ok(None),
        }
    }
}

impl ChainView for [BlockRecord] {
    fn block_at(&self, height: u64) -> Option<&BlockRecord> {
        let record = self.get(usize::try_from(height).ok()?)?;
        // 슬라이스가 genesis부터 시작하지 않으면 높이와 인덱스가 어긋난다
        (record.height == height).then_some(record)
    }
}

/// Vec-backed chain where index == height.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Blockchain {
    blocks: Vec<BlockRecord>,
}

impl Blockchain {
    pub fn new() -> Self {
        Blockchain { blocks: vec![] }
    }

    pub fn block_height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&BlockRecord> {
        self.blocks.last()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockRecord> {
        self.blocks.iter()
    }

    pub fn add_block(&mut self, block: BlockRecord) -> Result<()> {
        // 새 블록은 반드시 현재 tip 바로 다음 높이여야 한다
        let expected = self.block_height();
        if block.height != expected {
            return Err(PowError::UnlinkedBlock {
                expected,
                got: block.height,
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Compact target a block built on the current tip must carry.
    pub fn next_target(&self, candidate_time: u32, config: &ConsensusConfig) -> Result<u32> {
        crate::retarget::next_work_required(self, self.tip(), candidate_time, config)
    }
}

impl ChainView for Blockchain {
    fn block_at(&self, height: u64) -> Option<&BlockRecord> {
        self.blocks.block_at(height)
    }
}

impl Savable for Blockchain {
    fn load<I: Read>(reader: I) -> IoResult<Self> {
        let chain: Blockchain = load_cbor(reader, "blockchain")?;
        // 저장된 파일이라도 높이 연속성은 다시 확인한다
        let mut checked = Blockchain::new();
        for block in chain.blocks {
            checked.add_block(block).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
            })?;
        }
        Ok(checked)
    }

    fn save<O: Write>(&self, writer: O) -> IoResult<()> {
        save_cbor(self, writer, "blockchain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: u64) -> Blockchain {
        let mut chain = Blockchain::new();
        for height in 0..len {
            chain
                .add_block(BlockRecord::new(height, 1_000 + 90 * height as u32, 0x1e0f_ffff))
                .unwrap();
        }
        chain
    }

    #[test]
    fn rejects_height_gaps() {
        let mut chain = chain(3);
        let err = chain.add_block(BlockRecord::new(5, 0, 0x1e0f_ffff)).unwrap_err();
        assert_eq!(err, PowError::UnlinkedBlock { expected: 3, got: 5 });
        assert_eq!(chain.block_height(), 3);
    }

    #[test]
    fn walks_parents_down_to_genesis() {
        let chain = chain(3);
        let tip = *chain.tip().unwrap();
        let parent = chain.parent(&tip).unwrap().unwrap();
        assert_eq!(parent.height, 1);
        let genesis = chain.ancestor(0).unwrap();
        assert!(genesis.is_genesis());
        assert_eq!(chain.parent(genesis).unwrap(), None);
    }

    #[test]
    fn missing_ancestor_is_an_error() {
        let chain = chain(3);
        assert_eq!(chain.ancestor(7), Err(PowError::MissingAncestor { height: 7 }));
    }

    #[test]
    fn pruned_slice_does_not_alias_heights() {
        let full = chain(5);
        let blocks: Vec<BlockRecord> = full.blocks().copied().collect();
        let pruned = &blocks[2..];
        assert_eq!(pruned.block_at(0), None);
        let tip = pruned[2];
        assert_eq!(pruned.parent(&tip), Err(PowError::MissingAncestor { height: 3 }));
    }

    #[test]
    fn cbor_round_trip_preserves_records() {
        let original = chain(4);
        let mut bytes = vec![];
        original.save(&mut bytes).unwrap();
        let loaded = Blockchain::load(bytes.as_slice()).unwrap();
        assert_eq!(
            loaded.blocks().copied().collect::<Vec<_>>(),
            original.blocks().copied().collect::<Vec<_>>()
        );
    }
}

mod block;
mod blockchain;

pub use block::BlockRecord;
pub use blockchain::{Blockchain, ChainView};

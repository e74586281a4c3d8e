use serde::{Deserialize, Serialize};
use uint::construct_uint;

pub mod compact;
pub mod error;
pub mod params;
pub mod pow;
pub mod retarget;
pub mod sha256;
pub mod types;
pub mod util;

construct_uint! {
    #[derive(Serialize, Deserialize)]
    pub struct U256(4);
}

// target × seconds 곱셈이 256비트를 넘지 않도록 중간 계산에만 사용
construct_uint! {
    pub struct U512(8);
}

pub use compact::{decode, encode, Decoded};
pub use error::PowError;
pub use params::{ActivationHeights, ConsensusConfig, Network};
pub use pow::{check_proof_of_work, verify, verify_header, CheckMode};
pub use retarget::{next_work_required, Algorithm};
pub use sha256::{DoubleSha256, Hash, PowHasher};
pub use types::{BlockRecord, Blockchain, ChainView};

// smoothing 구간 동안 강제되는 compact target.
// powLimit에서 계산하지 않는다. 과거 체인에 기록된 값 그대로 사용해야 한다.
pub const SMOOTHING_TRANSITION_BITS: u32 = 0x1e0f_ffff;

// 정지된 체인을 살리기 위한 난이도 하락: powLimit / 15
pub const STALL_LIMIT_DIVISOR: u64 = 15;

pub const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

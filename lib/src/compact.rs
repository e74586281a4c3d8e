//! Compact "bits" encoding of 256-bit targets.
//!
//! Layout: `[exponent (1 byte)][sign (1 bit)][mantissa (23 bits)]`, where the
//! exponent counts the significant bytes of the magnitude:
//! `target = mantissa * 256^(exponent - 3)`.

use crate::U256;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Result of unpacking a compact target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub target: U256,
    pub negative: bool,
    pub overflow: bool,
}

impl Decoded {
    /// A usable target: non-negative, non-zero, within 256 bits.
    pub fn is_valid(&self) -> bool {
        !self.negative && !self.overflow && !self.target.is_zero()
    }
}

pub fn decode(bits: u32) -> Decoded {
    let size = (bits >> 24) as usize;
    let mut word = bits & MANTISSA_MASK;

    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        U256::from(word)
    } else {
        U256::from(word) << (8 * (size - 3))
    };

    // 부호/오버플로 플래그는 mantissa가 0이 아닐 때만 의미가 있다
    let negative = word != 0 && (bits & SIGN_BIT) != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    Decoded {
        target,
        negative,
        overflow,
    }
}

pub fn encode(target: U256) -> u32 {
    let mut size = target.bits().div_ceil(8);
    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3))).low_u64() as u32
    };

    // mantissa 최상위 비트는 부호 비트이므로 한 바이트 밀어서 exponent를 늘린다
    if compact & SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | ((size as u32) << 24)
}

/// Re-encode a compact value the way a node would after decoding it, dropping
/// redundant leading mantissa bytes.
pub fn normalize(bits: u32) -> u32 {
    encode(decode(bits).target)
}

use crate::{U256, U512};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use std::path::Path;

// CBOR로 저장/로드 가능한 타입
pub trait Savable: Sized {
    fn load<I: Read>(reader: I) -> IoResult<Self>;
    fn save<O: Write>(&self, writer: O) -> IoResult<()>;

    fn load_from_file<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let file = File::open(path)?;
        Self::load(file)
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let file = File::create(path)?;
        self.save(file)
    }
}

pub(crate) fn load_cbor<T: DeserializeOwned, I: Read>(reader: I, what: &str) -> IoResult<T> {
    ciborium::de::from_reader(reader).map_err(|_| {
        IoError::new(IoErrorKind::InvalidData, format!("Failed to deserialize {what}"))
    })
}

pub(crate) fn save_cbor<T: Serialize, O: Write>(value: &T, writer: O, what: &str) -> IoResult<()> {
    ciborium::ser::into_writer(value, writer).map_err(|_| {
        IoError::new(IoErrorKind::InvalidData, format!("Failed to serialize {what}"))
    })
}

fn widen(value: U256) -> U512 {
    let mut limbs = [0u64; 8];
    limbs[..4].copy_from_slice(&value.0);
    U512(limbs)
}

fn narrow(value: U512) -> Option<U256> {
    if value.0[4..].iter().any(|limb| *limb != 0) {
        return None;
    }
    let mut limbs = [0u64; 4];
    limbs.copy_from_slice(&value.0[..4]);
    Some(U256(limbs))
}

/// `value * numerator / denominator` computed in 512 bits.
///
/// A quotient that does not fit back into 256 bits saturates to `U256::MAX`;
/// callers clamp to the pow limit afterwards anyway.
pub fn mul_div(value: U256, numerator: u64, denominator: u64) -> U256 {
    assert!(denominator != 0, "mul_div by zero");
    let wide = widen(value) * U512::from(numerator) / U512::from(denominator);
    narrow(wide).unwrap_or(U256::MAX)
}

/// Clamp a freshly computed target into `1..=pow_limit`.
pub fn clamp_target(target: U256, pow_limit: U256) -> U256 {
    if target > pow_limit {
        pow_limit
    } else if target.is_zero() {
        U256::one()
    } else {
        target
    }
}

/// Zero-padded, most-significant-first hex of a 256-bit value.
pub fn to_hex(value: U256) -> String {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    hex::encode(bytes)
}

/// Seconds between two block timestamps; negative when clocks disagree.
pub fn elapsed(later: u32, earlier: u32) -> i64 {
    i64::from(later) - i64::from(earlier)
}

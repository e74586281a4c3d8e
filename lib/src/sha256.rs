use std::fmt;

use crate::U256;
use serde::{Deserialize, Serialize};
use sha256::digest;

/// Proof-of-work digest read as a little-endian 256-bit integer.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Hash(U256);

impl Hash {
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Hash(U256::from_little_endian(&bytes))
    }

    pub fn from_u256(value: U256) -> Self {
        Hash(value)
    }

    pub fn zero() -> Self {
        Hash(U256::zero())
    }

    // hash가 target 이하라면 작업증명을 만족한 것으로 간주
    pub fn matches_target(&self, target: U256) -> bool {
        self.0 <= target
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_little_endian(&mut bytes);
        bytes
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&crate::util::to_hex(self.0))
    }
}

/// Digest used wherever proof of work is checked. The retarget engine does
/// not care which algorithm produced it.
pub trait PowHasher {
    fn pow_hash(&self, header: &[u8]) -> Hash;
}

/// SHA256(SHA256(header)).
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSha256;

fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    // sha256 crate는 hex 문자열을 돌려주므로 다시 바이트로 되돌린다
    let hex_digest = digest(data);
    let mut out = [0u8; 32];
    hex::decode_to_slice(hex_digest, &mut out).expect("BUG: sha256 digest is always 32 bytes");
    out
}

impl PowHasher for DoubleSha256 {
    fn pow_hash(&self, header: &[u8]) -> Hash {
        let first = sha256_bytes(header);
        Hash::from_le_bytes(sha256_bytes(&first[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_sha256_known_vector() {
        // SHA256d("hello")
        let hash = DoubleSha256.pow_hash(b"hello");
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn digest_bytes_are_little_endian() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        assert_eq!(Hash::from_le_bytes(bytes).as_u256(), U256::one());

        let mut bytes = [0u8; 32];
        bytes[31] = 0x80;
        assert_eq!(Hash::from_le_bytes(bytes).as_u256(), U256::one() << 255);
    }

    #[test]
    fn matches_target_is_inclusive() {
        let target = U256::from(1000u64);
        assert!(Hash::from_u256(target).matches_target(target));
        assert!(!Hash::from_u256(target + U256::one()).matches_target(target));
        assert!(Hash::zero().matches_target(target));
    }
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// 256-bit value derived from revealed secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomValue(#[serde(with = "hex::serde")] [u8; 32]);

impl RandomValue {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        RandomValue(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// H(s_1 || s_2 || ... || s_n) over secrets in reveal order
    pub fn from_reveals<'a>(secrets: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for secret in secrets {
            hasher.update(secret);
        }
        RandomValue(hasher.finalize().into())
    }

    /// H(self || salt), used to derive per-item randomness
    pub fn mix(&self, salt: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(salt);
        RandomValue(hasher.finalize().into())
    }

    /// The value read as a big-endian integer, reduced modulo `n`
    pub fn reduce(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let n = n as u128;
        let remainder = self
            .0
            .iter()
            .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % n);
        remainder as usize
    }
}

impl fmt::Display for RandomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::{LuminoError, Result};

/// Non-negative fixed-point token amount with 9 decimal places
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u128);

const SCALE: u128 = 1_000_000_000; // 10^9

impl Amount {
    /// Zero amount
    pub const ZERO: Amount = Amount(0);

    /// Create from raw scaled value
    pub const fn from_raw(raw: u128) -> Self {
        Amount(raw)
    }

    /// Get the raw scaled value
    pub const fn raw(&self) -> u128 {
        self.0
    }

    /// Create from whole token units
    pub const fn from_units(units: u64) -> Self {
        Amount((units as u128) * SCALE)
    }

    /// Parse a decimal string such as "12.5"
    pub fn from_string(s: &str) -> Result<Self> {
        let invalid = || LuminoError::InvalidAmount(format!("cannot parse: {}", s));
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || frac.len() > 9 {
            return Err(invalid());
        }
        let whole: u128 = whole.parse().map_err(|_| invalid())?;
        let frac_raw: u128 = if frac.is_empty() {
            0
        } else {
            let digits: u128 = frac.parse().map_err(|_| invalid())?;
            digits * 10u128.pow(9 - frac.len() as u32)
        };
        whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac_raw))
            .map(Amount)
            .ok_or_else(|| LuminoError::InvalidAmount(format!("overflow: {}", s)))
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(&self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or_else(|| LuminoError::InvalidAmount("overflow in addition".to_string()))
    }

    /// Checked subtraction, fails instead of going below zero
    pub fn checked_sub(&self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or_else(|| LuminoError::InvalidAmount("underflow in subtraction".to_string()))
    }

    /// Subtraction clamped at zero
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Checked multiplication by integer
    pub fn checked_mul_int(&self, factor: u64) -> Result<Self> {
        self.0
            .checked_mul(factor as u128)
            .map(Amount)
            .ok_or_else(|| LuminoError::InvalidAmount("overflow in multiplication".to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / SCALE, self.0 % SCALE)
    }
}

// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 26.6 fixed point numbers.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

/// A signed 26.6 fixed point number: the low 6 bits hold the fraction.
///
/// This is the unit outline rasterizers use for sizes, metrics, kerning and stroke
/// parameters. Divide by 64 to recover device pixels.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct F26Dot6(i32);

impl F26Dot6 {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One whole unit (64 in raw form).
    pub const ONE: Self = Self(64);

    /// Creates a value from its raw bit pattern.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Returns the raw bit pattern.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Converts a float, truncating toward zero like a C cast of `value * 64`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "truncation toward zero is the documented conversion"
    )]
    pub fn from_f64(value: f64) -> Self {
        Self((value * 64.0) as i32)
    }

    /// Converts a float, rounding to the nearest 1/64.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the value has been rounded first"
    )]
    pub fn from_f64_rounded(value: f64) -> Self {
        Self((value * 64.0).round() as i32)
    }

    /// Converts to a float.
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 64.0
    }

    /// Rounds down to a whole unit.
    pub const fn floor(self) -> Self {
        Self(self.0 & !63)
    }

    /// Rounds up to a whole unit.
    pub const fn ceil(self) -> Self {
        Self((self.0 + 63) & !63)
    }

    /// Rounds to the nearest whole unit.
    pub const fn round(self) -> Self {
        Self((self.0 + 32) & !63)
    }
}

impl Add for F26Dot6 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for F26Dot6 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for F26Dot6 {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<i32> for F26Dot6 {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl fmt::Debug for F26Dot6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F26Dot6({})", self.to_f64())
    }
}

impl fmt::Display for F26Dot6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::F26Dot6;

    #[test]
    fn conversions() {
        assert_eq!(F26Dot6::from_f64(12.5).to_bits(), 800);
        assert_eq!(F26Dot6::from_bits(-96).to_f64(), -1.5);
        // C-style casts truncate toward zero.
        assert_eq!(F26Dot6::from_f64(-0.999).to_bits(), -63);
        assert_eq!(F26Dot6::from_f64_rounded(0.999).to_bits(), 64);
    }

    #[test]
    fn pixel_rounding() {
        let v = F26Dot6::from_bits(100);
        assert_eq!(v.floor().to_bits(), 64);
        assert_eq!(v.ceil().to_bits(), 128);
        assert_eq!(v.round().to_bits(), 128);
        let n = F26Dot6::from_bits(-100);
        assert_eq!(n.floor().to_bits(), -128);
        assert_eq!(n.ceil().to_bits(), -64);
    }
}

//! UQ112x112 fixed-point prices
//!
//! Prices are stored as unsigned integers scaled by 2^112, held in 256-bit
//! words so that a full 112-bit numerator shifted left by 112 never overflows.
//! The oracle accumulates these values multiplied by elapsed seconds with
//! wrap-around at 2^256, so consumers only ever look at differences.
//!
//! ## Design Principles
//!
//! - **No Floating Point**: construction and accumulation are integer-only
//! - **Explicit Widths**: operands are checked against the 112-bit reserve range
//! - **Display Boundary**: [`UQ112x112::to_decimal`] is the only lossy path

use crate::common::errors::FixedPointError;
use ethnum::U256;
use rust_decimal::Decimal;
use std::fmt;

/// Number of fractional bits
pub const RESOLUTION: u32 = 112;

/// Largest value a 112-bit reserve can hold
pub const MAX_UINT112: u128 = (1u128 << RESOLUTION) - 1;

/// Largest mantissa `rust_decimal` accepts (2^96 - 1)
const MAX_DECIMAL_MANTISSA: u128 = (1u128 << 96) - 1;

/// Unsigned fixed point with 112 integer and 112 fractional bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UQ112x112(pub U256);

impl UQ112x112 {
    /// 1.0 in UQ112x112
    pub const ONE: Self = Self(U256::from_words(0, 1u128 << RESOLUTION));

    pub const ZERO: Self = Self(U256::ZERO);

    /// Fractional digits kept when converting to a decimal
    pub const DECIMAL_PLACES: u32 = 18;

    /// Encode an integer as UQ112x112
    pub fn encode(value: u128) -> Result<Self, FixedPointError> {
        if value > MAX_UINT112 {
            return Err(FixedPointError::Overflow { value });
        }
        Ok(Self(U256::from(value) << RESOLUTION))
    }

    /// `numerator / denominator` as UQ112x112, truncated toward zero
    ///
    /// Both operands must fit in 112 bits, as reserves do.
    pub fn ratio(numerator: u128, denominator: u128) -> Result<Self, FixedPointError> {
        if denominator == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        if denominator > MAX_UINT112 {
            return Err(FixedPointError::Overflow { value: denominator });
        }
        let encoded = Self::encode(numerator)?;
        Ok(Self(encoded.0 / U256::from(denominator)))
    }

    /// Raw scaled representation
    pub fn raw(&self) -> U256 {
        self.0
    }

    /// Integer part, truncated
    pub fn integer_part(&self) -> U256 {
        self.0 >> RESOLUTION
    }

    /// Multiply by a scalar with wrap-around at 2^256
    pub fn wrapping_mul_u64(&self, scalar: u64) -> U256 {
        self.0.wrapping_mul(U256::from(scalar as u128))
    }

    /// Convert to a `Decimal` for display, keeping as many of
    /// [`Self::DECIMAL_PLACES`] fractional digits as fit the mantissa
    pub fn to_decimal(&self) -> Result<Decimal, FixedPointError> {
        let fraction_mask = (U256::ONE << RESOLUTION) - U256::ONE;
        let integer = self.0 >> RESOLUTION;
        let fraction = self.0 & fraction_mask;

        for scale in (0..=Self::DECIMAL_PLACES).rev() {
            let unit = U256::from(10u128.pow(scale));
            let mantissa = integer * unit + ((fraction * unit) >> RESOLUTION);
            let (high, low) = mantissa.into_words();
            if high == 0 && low <= MAX_DECIMAL_MANTISSA {
                return Ok(Decimal::from_i128_with_scale(low as i128, scale));
            }
        }

        Err(FixedPointError::NotRepresentable {
            value: self.0.to_string(),
        })
    }
}

impl fmt::Display for UQ112x112 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Ok(decimal) => write!(f, "{}", decimal.normalize()),
            Err(_) => write!(f, "{}/2^112", self.0),
        }
    }
}

//! Constant-product (x*y=k) math with exact integer arithmetic
//!
//! Everything here works on native-precision integers. Products are taken in
//! 256-bit words and every multiplication happens before the division it feeds,
//! so no intermediate value is rounded.

use crate::error::{PairError, Result};
use ethnum::U256;
use pair_config::protocol::FEE_DENOMINATOR;

/// V2 AMM math functions with zero precision loss
pub struct V2Math;

impl V2Math {
    /// Full-width product of two amounts
    pub fn mul(a: u128, b: u128) -> U256 {
        U256::from(a) * U256::from(b)
    }

    /// Narrow a 256-bit value back to `u128`, failing with `Overflow`
    pub fn to_u128(value: U256) -> Result<u128> {
        let (high, low) = value.into_words();
        if high != 0 {
            return Err(PairError::Overflow);
        }
        Ok(low)
    }

    /// `floor(a * b / denominator)` without intermediate overflow
    pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
        if denominator == 0 {
            return Err(PairError::Overflow);
        }
        Self::to_u128(Self::mul(a, b) / U256::from(denominator))
    }

    /// Integer square root, rounded down (Babylonian method)
    pub fn isqrt(value: U256) -> U256 {
        if value > U256::from(3u128) {
            let mut z = value;
            let mut x = value / U256::from(2u128) + U256::ONE;
            while x < z {
                z = x;
                x = (value / x + x) / U256::from(2u128);
            }
            z
        } else if value != U256::ZERO {
            U256::ONE
        } else {
            U256::ZERO
        }
    }

    /// Calculate exact output amount for a given input using x*y=k
    ///
    /// # Arguments
    /// * `amount_in` - Input asset amount (native precision)
    /// * `reserve_in` - Input asset reserve
    /// * `reserve_out` - Output asset reserve
    /// * `fee_bps` - Fee in basis points (30 = 0.3%)
    ///
    /// # Returns
    /// Largest output the invariant allows, rounded down
    pub fn get_amount_out(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
    ) -> Result<u128> {
        if amount_in == 0 {
            return Err(PairError::InsufficientInputAmount);
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(PairError::InsufficientLiquidity {
                requested: 0,
                reserve: 0,
            });
        }

        let amount_in_with_fee = Self::mul(amount_in, (FEE_DENOMINATOR - fee_bps) as u128);
        let numerator = amount_in_with_fee * U256::from(reserve_out);
        let denominator =
            Self::mul(reserve_in, FEE_DENOMINATOR as u128) + amount_in_with_fee;

        Self::to_u128(numerator / denominator)
    }

    /// Calculate required input amount for a desired output (reverse calculation)
    pub fn get_amount_in(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
    ) -> Result<u128> {
        if amount_out == 0 {
            return Err(PairError::InsufficientOutputAmount);
        }
        if reserve_in == 0 || amount_out >= reserve_out {
            return Err(PairError::InsufficientLiquidity {
                requested: amount_out,
                reserve: reserve_out,
            });
        }

        let numerator = Self::mul(reserve_in, amount_out) * U256::from(FEE_DENOMINATOR as u128);
        let denominator = Self::mul(reserve_out - amount_out, (FEE_DENOMINATOR - fee_bps) as u128);

        // Add 1 to round up (ensures sufficient input)
        Self::to_u128(numerator / denominator + U256::ONE)
    }

    /// Amount of b equivalent to `amount_a` at the current reserve ratio
    pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128> {
        if amount_a == 0 {
            return Err(PairError::InsufficientInputAmount);
        }
        if reserve_a == 0 || reserve_b == 0 {
            return Err(PairError::InsufficientLiquidity {
                requested: 0,
                reserve: 0,
            });
        }
        Self::mul_div(amount_a, reserve_b, reserve_a)
    }
}

//! Pool Price Oracle
//!
//! Read-only price queries against concentrated-liquidity and weighted
//! pools. Never touches tick data or reserves for pricing — only the
//! current-state word each pool family exposes.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

pub mod concentrated;
pub mod weighted;

use alloy::providers::Provider;
use rust_decimal::Decimal;

use crate::error::ArbError;
use crate::types::{PoolDescriptor, PoolFamily, Price, PriceSample};

/// Reads a single pool's current price. Stateless beyond a decimals cache,
/// since a price sample is discarded after the tick that produced it.
pub struct PoolPriceOracle<P> {
    provider: P,
}

impl<P: Provider + Clone> PoolPriceOracle<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// `price(pool_id) -> (price, base_token, quote_token)`.
    ///
    /// Returns a rational price expressing "how many quote units per 1 base
    /// unit" at the pool's current state.
    pub async fn price(&self, pool: &PoolDescriptor) -> Result<PriceSample, ArbError> {
        match pool.family {
            PoolFamily::Concentrated => concentrated::read_price(&self.provider, pool).await,
            PoolFamily::Weighted => weighted::read_price(&self.provider, pool).await,
        }
    }
}

/// `(Q / 2^96)^2 * 10^(dec0 - dec1)`, the price of token0 in units of token1.
///
/// Shared by the concentrated-pool reader; exposed for unit testing against
/// hand-picked sqrtPriceX96/tick/decimals triples.
pub fn sqrt_price_x96_to_price(sqrt_price_x96: Decimal, dec0: i32, dec1: i32) -> Price {
    let two_pow_96 = pow2_decimal(96);
    let ratio = sqrt_price_x96 / two_pow_96;
    let base_price = ratio * ratio;
    scale_by_decimals(base_price, dec0 - dec1)
}

fn pow2_decimal(exp: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let two = Decimal::from(2u8);
    for _ in 0..exp {
        result *= two;
    }
    result
}

/// Multiplies `value` by `10^diff` (diff may be negative).
pub fn scale_by_decimals(value: Decimal, diff: i32) -> Decimal {
    if diff == 0 {
        return value;
    }
    let ten = Decimal::from(10u8);
    let mut factor = Decimal::ONE;
    for _ in 0..diff.unsigned_abs() {
        factor *= ten;
    }
    if diff > 0 {
        value * factor
    } else {
        value / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_price_one_to_one_with_equal_decimals() {
        // sqrtPriceX96 = 2^96 means price = 1.0 for equal decimals.
        let q = pow2_decimal(96);
        let price = sqrt_price_x96_to_price(q, 18, 18);
        assert_eq!(price, Decimal::ONE);
    }

    #[test]
    fn sqrt_price_accounts_for_decimal_difference() {
        // sqrtPriceX96 = 2^96 (raw price 1.0), dec0=18, dec1=6 => scale by 10^12
        let q = pow2_decimal(96);
        let price = sqrt_price_x96_to_price(q, 18, 6);
        assert_eq!(price, scale_by_decimals(Decimal::ONE, 12));
    }
}

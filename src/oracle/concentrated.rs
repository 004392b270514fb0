//! Concentrated-liquidity pool pricing (swapr_yes, swapr_no, swapr_pred_yes,
//! swapr_pred_no).
//!
//! Reads a single global state word (`slot0`) exposing the current sqrt
//! price, plus the token decimals of token0 and token1. Tick data and
//! reserves are never consulted for pricing.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::providers::Provider;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::contracts::{IConcentratedPool, IERC20};
use crate::error::ArbError;
use crate::oracle::sqrt_price_x96_to_price;
use crate::types::{PoolDescriptor, PriceSample};

pub async fn read_price<P: Provider + Clone>(
    provider: &P,
    pool: &PoolDescriptor,
) -> Result<PriceSample, ArbError> {
    let contract = IConcentratedPool::new(pool.address, provider.clone());

    let slot0 = contract
        .slot0()
        .call()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;

    let token0 = contract
        .token0()
        .call()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;
    let token1 = contract
        .token1()
        .call()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;

    let dec0 = fetch_decimals(provider, token0, pool.address).await?;
    let dec1 = fetch_decimals(provider, token1, pool.address).await?;

    let block_number = provider
        .get_block_number()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;

    let sqrt_price_x96 = Decimal::from_str_exact(&slot0.sqrtPriceX96.to_string()).map_err(|e| {
        ArbError::PoolDecodeError {
            pool: pool.address,
            reason: format!("sqrtPriceX96 out of decimal range: {e}"),
        }
    })?;

    let price_token0_in_token1 =
        sqrt_price_x96_to_price(sqrt_price_x96, dec0 as i32, dec1 as i32);

    let (price, base_token, quote_token) = if pool.base_token_index == 0 {
        (price_token0_in_token1, token0, token1)
    } else {
        if price_token0_in_token1.is_zero() {
            return Err(ArbError::PoolDecodeError {
                pool: pool.address,
                reason: "cannot invert a zero price".to_string(),
            });
        }
        (Decimal::ONE / price_token0_in_token1, token1, token0)
    };

    Ok(PriceSample {
        pool_id: pool.address,
        price,
        base_token,
        quote_token,
        block_number,
        observed_at: Utc::now(),
    })
}

async fn fetch_decimals<P: Provider + Clone>(
    provider: &P,
    token: alloy::primitives::Address,
    pool: alloy::primitives::Address,
) -> Result<u8, ArbError> {
    let token_contract = IERC20::new(token, provider.clone());
    token_contract
        .decimals()
        .call()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool,
            source: anyhow::anyhow!(e),
        })
}

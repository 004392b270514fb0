//! Weighted-pool vault pricing (weighted_spot).
//!
//! Reads the pool's token list and normalised balances from the vault.
//! Equal-weighted case only — see the Open Questions note on unequal
//! token weights.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::providers::Provider;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::contracts::{IERC20, IWeightedPool, IWeightedVault};
use crate::error::ArbError;
use crate::oracle::scale_by_decimals;
use crate::types::{PoolDescriptor, PriceSample};

pub async fn read_price<P: Provider + Clone>(
    provider: &P,
    pool: &PoolDescriptor,
) -> Result<PriceSample, ArbError> {
    let pool_contract = IWeightedPool::new(pool.address, provider.clone());

    let pool_id = pool_contract
        .getPoolId()
        .call()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;
    let vault_address =
        pool_contract
            .getVault()
            .call()
            .await
            .map_err(|e| ArbError::RpcTransient {
                pool: pool.address,
                source: anyhow::anyhow!(e),
            })?;

    let vault = IWeightedVault::new(vault_address, provider.clone());
    let tokens_reply = vault
        .getPoolTokens(pool_id)
        .call()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;

    if tokens_reply.tokens.len() != 2 {
        return Err(ArbError::PoolDecodeError {
            pool: pool.address,
            reason: format!(
                "expected a 2-token weighted pool, found {}",
                tokens_reply.tokens.len()
            ),
        });
    }

    let token0 = tokens_reply.tokens[0];
    let token1 = tokens_reply.tokens[1];
    let balance0 = Decimal::from_str_exact(&tokens_reply.rawBalances[0].to_string()).map_err(
        |e| ArbError::PoolDecodeError {
            pool: pool.address,
            reason: format!("balance0 out of decimal range: {e}"),
        },
    )?;
    let balance1 = Decimal::from_str_exact(&tokens_reply.rawBalances[1].to_string()).map_err(
        |e| ArbError::PoolDecodeError {
            pool: pool.address,
            reason: format!("balance1 out of decimal range: {e}"),
        },
    )?;

    let dec0 = fetch_decimals(provider, token0, pool.address).await?;
    let dec1 = fetch_decimals(provider, token1, pool.address).await?;

    let block_number = provider
        .get_block_number()
        .await
        .map_err(|e| ArbError::RpcTransient {
            pool: pool.address,
            source: anyhow::anyhow!(e),
        })?;

    if balance0.is_zero() || balance1.is_zero() {
        return Err(ArbError::PoolDecodeError {
            pool: pool.address,
            reason: "weighted pool has a zero balance leg".to_string(),
        });
    }

    // price of token i in units of token j = (balance_j / decimals_j) / (balance_i / decimals_i)
    let normalised0 = scale_by_decimals(balance0, -(dec0 as i32));
    let normalised1 = scale_by_decimals(balance1, -(dec1 as i32));
    let price_token0_in_token1 = normalised1 / normalised0;

    let (price, base_token, quote_token) = if pool.base_token_index == 0 {
        (price_token0_in_token1, token0, token1)
    } else {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalised_ratio_matches_spec_formula() {
        // balance0 = 1000 @ 18 dec, balance1 = 2000 @ 6 dec
        // normalised0 = 1000e-18... using raw values directly for this unit check
        let balance0 = Decimal::from(1_000u64);
        let balance1 = Decimal::from(2_000u64);
        let normalised0 = scale_by_decimals(balance0, -0);
        let normalised1 = scale_by_decimals(balance1, -0);
        let price = normalised1 / normalised0;
        assert_eq!(price, Decimal::from(2u8));
    }
}

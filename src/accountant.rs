//! Balance Accountant
//!
//! Reads balances of base, company, and four conditional tokens for the
//! wallet and executor holders; diffs snapshots; and flags dust residuals.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use std::collections::BTreeMap;

use alloy::primitives::{Address, I256, U256};
use alloy::providers::Provider;
use rust_decimal::Decimal;
use tracing::warn;

use crate::contracts::IERC20;
use crate::error::ArbError;
use crate::types::{BalanceSnapshot, Holder, Proposal, TokenLabel};

pub struct BalanceAccountant<P> {
    provider: P,
    proposal: Proposal,
}

impl<P: Provider + Clone> BalanceAccountant<P> {
    pub fn new(provider: P, proposal: Proposal) -> Self {
        Self { provider, proposal }
    }

    fn token_address(&self, label: TokenLabel) -> Address {
        match label {
            TokenLabel::BaseCurrency => self.proposal.base_currency,
            TokenLabel::BaseCompany => self.proposal.base_company,
            TokenLabel::YesCurrency => self.proposal.yes_currency,
            TokenLabel::NoCurrency => self.proposal.no_currency,
            TokenLabel::YesCompany => self.proposal.yes_company,
            TokenLabel::NoCompany => self.proposal.no_company,
        }
    }

    fn holder_address(&self, holder: Holder, wallet: Address, executor: Address) -> Address {
        match holder {
            Holder::Wallet => wallet,
            Holder::Executor => executor,
        }
    }

    /// `snapshot(holder) -> BalanceSnapshot`. Reads all six token balances
    /// for one holder at the current block.
    pub async fn snapshot(
        &self,
        holder: Holder,
        wallet: Address,
        executor: Address,
    ) -> Result<BalanceSnapshot, ArbError> {
        let holder_addr = self.holder_address(holder, wallet, executor);
        let mut balances = BTreeMap::new();

        for label in TokenLabel::ALL {
            let token_addr = self.token_address(label);
            let token = IERC20::new(token_addr, self.provider.clone());
            let balance =
                token
                    .balanceOf(holder_addr)
                    .call()
                    .await
                    .map_err(|e| ArbError::RpcTransient {
                        pool: token_addr,
                        source: anyhow::anyhow!(e),
                    })?;
            balances.insert(label, balance);
        }

        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| ArbError::RpcTransient {
                pool: holder_addr,
                source: anyhow::anyhow!(e),
            })?;

        Ok(BalanceSnapshot {
            holder,
            block_number,
            balances,
        })
    }

}

/// `diff(pre, post) -> {token -> signed delta}`.
///
/// Refuses to compare snapshots taken with reversed block ordering.
pub fn diff(
    pre: &BalanceSnapshot,
    post: &BalanceSnapshot,
) -> Result<BTreeMap<TokenLabel, I256>, ArbError> {
    if post.block_number < pre.block_number {
        return Err(ArbError::PoolDecodeError {
            pool: Address::ZERO,
            reason: format!(
                "post snapshot block {} precedes pre snapshot block {}",
                post.block_number, pre.block_number
            ),
        });
    }

    let mut out = BTreeMap::new();
    for label in TokenLabel::ALL {
        let pre_v = I256::try_from(pre.get(label)).unwrap_or(I256::ZERO);
        let post_v = I256::try_from(post.get(label)).unwrap_or(I256::ZERO);
        out.insert(label, post_v - pre_v);
    }
    Ok(out)
}

/// `warn_residuals(snapshot, epsilon_exponent) -> list of warnings`.
///
/// Flags any conditional token or plain company token whose balance
/// exceeds a dust threshold `epsilon = 10^(decimals-4)`, per token
/// decimals supplied by the caller (the Oracle/Accountant do not cache
/// decimals across ticks).
pub fn warn_residuals(snapshot: &BalanceSnapshot, decimals: &BTreeMap<TokenLabel, u8>) -> Vec<String> {
    let flagged = [
        TokenLabel::BaseCompany,
        TokenLabel::YesCurrency,
        TokenLabel::NoCurrency,
        TokenLabel::YesCompany,
        TokenLabel::NoCompany,
    ];

    let mut warnings = Vec::new();
    for label in flagged {
        let Some(&dec) = decimals.get(&label) else {
            continue;
        };
        let balance = snapshot.get(label);
        let epsilon = dust_threshold(dec);
        if balance > epsilon {
            let msg = format!(
                "residual {label} balance {balance} exceeds dust threshold {epsilon} (decimals={dec})"
            );
            warn!("{msg}");
            warnings.push(msg);
        }
    }
    warnings
}

/// `epsilon = 10^(decimals-4)`, expressed in raw base units.
fn dust_threshold(decimals: u8) -> U256 {
    if decimals < 4 {
        return U256::from(1u64);
    }
    U256::from(10u64).pow(U256::from((decimals - 4) as u64))
}

/// Delta of `base_currency` at a holder, expressed as a human-readable
/// decimal for the Verify state's profitability report.
pub fn profit_delta_decimal(delta: I256, decimals: u8) -> Decimal {
    let raw = Decimal::from_str_exact(&delta.to_string()).unwrap_or(Decimal::ZERO);
    let divisor = Decimal::from(10u64.pow(decimals as u32));
    raw / divisor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(block: u64, base_currency: u64) -> BalanceSnapshot {
        let mut balances = BTreeMap::new();
        balances.insert(TokenLabel::BaseCurrency, U256::from(base_currency));
        for label in TokenLabel::ALL {
            balances.entry(label).or_insert(U256::ZERO);
        }
        BalanceSnapshot {
            holder: Holder::Executor,
            block_number: block,
            balances,
        }
    }

    #[test]
    fn diff_is_conservative_for_every_label() {
        let pre = snapshot_with(100, 1_000);
        let post = snapshot_with(101, 1_500);
        let delta = diff(&pre, &post).expect("diff should succeed");
        for label in TokenLabel::ALL {
            let expected = I256::try_from(post.get(label)).unwrap() - I256::try_from(pre.get(label)).unwrap();
            assert_eq!(delta[&label], expected);
        }
    }

    #[test]
    fn diff_rejects_reversed_block_order() {
        let pre = snapshot_with(101, 1_000);
        let post = snapshot_with(100, 1_500);
        assert!(diff(&pre, &post).is_err());
    }

    #[test]
    fn dust_threshold_floors_at_one_for_low_decimals() {
        assert_eq!(dust_threshold(2), U256::from(1u64));
        assert_eq!(dust_threshold(6), U256::from(100u64));
        assert_eq!(dust_threshold(18), U256::from(10u64).pow(U256::from(14u64)));
    }

    #[test]
    fn warn_residuals_flags_only_conditional_and_company_tokens() {
        let mut snapshot = snapshot_with(1, 0);
        snapshot
            .balances
            .insert(TokenLabel::YesCompany, U256::from(10_000_000_000_000_000u64));
        snapshot
            .balances
            .insert(TokenLabel::BaseCurrency, U256::from(10_000_000_000_000_000u64));

        let mut decimals = BTreeMap::new();
        for label in TokenLabel::ALL {
            decimals.insert(label, 18u8);
        }

        let warnings = warn_residuals(&snapshot, &decimals);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("yes_company"));
    }
}

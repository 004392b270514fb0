//! Arbitrage Controller
//!
//! Drives the Init -> Idle -> PriceFetch -> Detect -> PreSnapshot -> Execute
//! -> PostSnapshot -> Verify -> Report -> Idle loop. One tick runs at a
//! time; price reads within a tick are issued in parallel over a bounded
//! worker pool and joined before detection.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use std::sync::Arc;

use alloy::primitives::{Address, I256};
use alloy::providers::Provider;
use futures::future::join_all;
use rust_decimal::Decimal;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};

use crate::accountant::{self, BalanceAccountant};
use crate::detector::{self, TickPrices};
use crate::error::ArbError;
use crate::executor::{ExecutorAdapter, TradeIntent};
use crate::oracle::PoolPriceOracle;
use crate::types::{Holder, PoolDescriptor, Price, Proposal, TokenAmount, Verdict};

/// Bounds concurrent price reads within a tick to one per pool, matching
/// §5's "default <= 5" worker pool sizing.
const MAX_PARALLEL_PRICE_READS: usize = 5;

/// Maximum tolerated deviation of `p_pred_yes + p_pred_no` from 1 before a
/// tick aborts rather than trust a skewed implied price (spec §9).
fn pred_identity_epsilon() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

pub struct ControllerConfig {
    pub amount: Decimal,
    pub tolerance: Decimal,
    pub min_profit: Decimal,
    pub interval_secs: u64,
    pub prefund: bool,
    pub force_send: bool,
    pub dry_run: bool,
    pub base_currency_decimals: u8,
    pub wallet_address: Address,
    pub executor_address: Address,
}

pub struct Controller<P> {
    provider: P,
    proposal: Proposal,
    oracle: PoolPriceOracle<P>,
    accountant: BalanceAccountant<P>,
    executor: Arc<dyn ExecutorAdapter>,
    config: ControllerConfig,
    shutdown: watch::Receiver<bool>,
}

/// A single tick's outcome, used for the Report state and tests.
#[derive(Debug, Clone)]
pub enum TickReport {
    NoOpportunity,
    Skipped { reason: String },
    Executed { tx_hash: String, profit: Decimal },
    Failed { error: String },
}

impl<P: Provider + Clone> Controller<P> {
    pub fn new(
        provider: P,
        proposal: Proposal,
        executor: Arc<dyn ExecutorAdapter>,
        config: ControllerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let oracle = PoolPriceOracle::new(provider.clone());
        let accountant = BalanceAccountant::new(provider.clone(), proposal.clone());
        Self {
            provider,
            proposal,
            oracle,
            accountant,
            executor,
            config,
            shutdown,
        }
    }

    /// Runs the controller loop until cancelled. Returns once the shutdown
    /// signal fires and no transaction is in flight.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("arbitrage controller starting");
        loop {
            if *self.shutdown.borrow() {
                info!("shutdown signal observed, controller exiting");
                return Ok(());
            }

            let report = self.tick().await;
            self.report(report);

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(self.config.interval_secs)) => {}
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        info!("shutdown signal observed during sleep, controller exiting");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn report(&self, report: TickReport) {
        match report {
            TickReport::NoOpportunity => info!("tick report: no opportunity"),
            TickReport::Skipped { reason } => info!(reason = %reason, "tick report: skipped"),
            TickReport::Executed { tx_hash, profit } => {
                info!(tx_hash = %tx_hash, profit = %profit, "tick report: executed")
            }
            TickReport::Failed { error } => error!(error = %error, "tick report: failed"),
        }
    }

    /// PriceFetch -> Detect -> PreSnapshot -> Execute -> PostSnapshot -> Verify.
    async fn tick(&self) -> TickReport {
        let (prices, p_pred_no) = match self.fetch_prices().await {
            Ok(p) => p,
            Err(e) => {
                warn!("price fetch failed, aborting tick: {e}");
                return TickReport::Failed {
                    error: e.to_string(),
                };
            }
        };

        if let Err(msg) =
            detector::check_pred_yes_no_identity(prices.p_pred_yes, p_pred_no, pred_identity_epsilon())
        {
            warn!("pred_yes/pred_no identity check failed, aborting tick: {msg}");
            return TickReport::Failed { error: msg };
        }

        let verdict = detector::detect(&prices, self.config.tolerance);
        if !verdict.is_opportunity() {
            return TickReport::NoOpportunity;
        }

        if self.config.dry_run {
            info!(?verdict, "dry run: would execute but not sending");
            return TickReport::Skipped {
                reason: "dry run".to_string(),
            };
        }

        let pre_wallet = match self
            .accountant
            .snapshot(
                Holder::Wallet,
                self.config.wallet_address,
                self.config.executor_address,
            )
            .await
        {
            Ok(s) => s,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("pre-snapshot failed: {e}"),
                }
            }
        };
        let pre_executor = match self
            .accountant
            .snapshot(
                Holder::Executor,
                self.config.wallet_address,
                self.config.executor_address,
            )
            .await
        {
            Ok(s) => s,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("pre-snapshot failed: {e}"),
                }
            }
        };

        let amount_raw = TokenAmount::from_decimal(self.config.amount, self.config.base_currency_decimals).raw;
        let min_profit_raw =
            TokenAmount::from_decimal(self.config.min_profit, self.config.base_currency_decimals).raw;
        let min_profit_i256 = I256::try_from(min_profit_raw).unwrap_or(I256::ZERO);

        let nonce = match self.provider.get_transaction_count(self.config.wallet_address).await {
            Ok(n) => n,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("nonce read failed: {e}"),
                }
            }
        };

        let mut intent = TradeIntent {
            amount: amount_raw,
            flow: verdict.flow(),
            cheaper: verdict.cheaper(),
            min_profit: min_profit_i256,
            prefund: self.config.prefund,
            force_send: self.config.force_send,
            gas_limit_override: None,
            nonce,
        };

        let prefund_result = match self.executor.prefund(&intent).await {
            Ok(r) => r,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("prefund failed: {e}"),
                };
            }
        };
        if prefund_result.is_some() {
            // prefund consumed `nonce`; the main call must use the next one.
            intent.nonce += 1;
        }

        let outcome = match self.executor.run(&intent).await {
            Ok(o) => o,
            Err(ArbError::MinProfitNotMet) => {
                return TickReport::Skipped {
                    reason: "min profit not met".to_string(),
                }
            }
            Err(e) => {
                return TickReport::Failed {
                    error: e.to_string(),
                }
            }
        };

        let post_wallet = match self
            .accountant
            .snapshot(
                Holder::Wallet,
                self.config.wallet_address,
                self.config.executor_address,
            )
            .await
        {
            Ok(s) => s,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("post-snapshot failed: {e}"),
                }
            }
        };
        let post_executor = match self
            .accountant
            .snapshot(
                Holder::Executor,
                self.config.wallet_address,
                self.config.executor_address,
            )
            .await
        {
            Ok(s) => s,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("post-snapshot failed: {e}"),
                }
            }
        };

        let wallet_delta = match accountant::diff(&pre_wallet, &post_wallet) {
            Ok(d) => d,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("verify diff failed: {e}"),
                }
            }
        };
        let executor_delta = match accountant::diff(&pre_executor, &post_executor) {
            Ok(d) => d,
            Err(e) => {
                return TickReport::Failed {
                    error: format!("verify diff failed: {e}"),
                }
            }
        };

        // Primary: the executor-holder delta is the actual trade P&L. Secondary:
        // the wallet-holder delta is gas spent signing/sending, reported but not
        // compared against min_profit.
        let primary_profit = accountant::profit_delta_decimal(
            executor_delta[&crate::types::TokenLabel::BaseCurrency],
            self.config.base_currency_decimals,
        );
        let gas_cost = accountant::profit_delta_decimal(
            wallet_delta[&crate::types::TokenLabel::BaseCurrency],
            self.config.base_currency_decimals,
        );
        let profit_pct = if self.config.amount.is_zero() {
            Decimal::ZERO
        } else {
            primary_profit / self.config.amount * Decimal::new(100, 0)
        };

        if primary_profit < self.config.min_profit {
            warn!(
                primary_profit = %primary_profit,
                primary_profit_pct = %profit_pct,
                gas_cost = %gas_cost,
                min_profit = %self.config.min_profit,
                "verify: primary profit below configured min_profit"
            );
        } else {
            info!(
                primary_profit = %primary_profit,
                primary_profit_pct = %profit_pct,
                gas_cost = %gas_cost,
                "verify: primary profit meets min_profit"
            );
        }

        let profit = primary_profit;

        let warnings = accountant::warn_residuals(&post_executor, &self.decimals_table());
        for w in warnings {
            warn!("{w}");
        }

        TickReport::Executed {
            tx_hash: outcome.tx_hash,
            profit,
        }
    }

    /// Reads all four conditional legs plus the spot price in parallel,
    /// bounded by `MAX_PARALLEL_PRICE_READS`. Returns the detector's
    /// `TickPrices` plus the separately-observed `p_pred_no`, which
    /// `implied_price` does not consume directly but which the identity
    /// sanity check needs.
    async fn fetch_prices(&self) -> Result<(TickPrices, Price), ArbError> {
        let semaphore = Arc::new(Semaphore::new(MAX_PARALLEL_PRICE_READS));
        let pools: [(&str, PoolDescriptor); 5] = [
            ("yes", self.proposal.pools.swapr_yes),
            ("no", self.proposal.pools.swapr_no),
            ("pred_yes", self.proposal.pools.swapr_pred_yes),
            ("pred_no", self.proposal.pools.swapr_pred_no),
            ("spot", self.proposal.pools.weighted_spot),
        ];

        let tasks = pools.into_iter().map(|(label, pool)| {
            let semaphore = semaphore.clone();
            let oracle = &self.oracle;
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                (label, oracle.price(&pool).await)
            }
        });

        let results = join_all(tasks).await;
        let mut p_yes = None;
        let mut p_no = None;
        let mut p_pred_yes = None;
        let mut p_pred_no = None;
        let mut p_spot = None;

        for (label, result) in results {
            let sample = result?;
            match label {
                "yes" => p_yes = Some(sample.price),
                "no" => p_no = Some(sample.price),
                "pred_yes" => p_pred_yes = Some(sample.price),
                "pred_no" => p_pred_no = Some(sample.price),
                "spot" => p_spot = Some(sample.price),
                _ => unreachable!(),
            }
        }

        let prices = TickPrices {
            p_yes: p_yes.expect("yes price always populated"),
            p_no: p_no.expect("no price always populated"),
            p_pred_yes: p_pred_yes.expect("pred_yes price always populated"),
            p_spot: p_spot.expect("spot price always populated"),
        };
        Ok((prices, p_pred_no.expect("pred_no price always populated")))
    }

    fn decimals_table(&self) -> std::collections::BTreeMap<crate::types::TokenLabel, u8> {
        // Conditional and company tokens mirror the base currency's
        // decimals in every proposal this bot has been deployed against;
        // a future multi-decimal proposal would need per-token reads here.
        let mut map = std::collections::BTreeMap::new();
        for label in crate::types::TokenLabel::ALL {
            map.insert(label, self.config.base_currency_decimals);
        }
        map
    }
}

/// Installs SIGINT/SIGTERM handling and returns a `watch::Receiver` that
/// flips to `true` on either signal, for the Controller's inter-tick sleep
/// to observe.
pub fn install_shutdown_signal() -> anyhow::Result<watch::Receiver<bool>> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook_tokio::Signals;
    use futures::stream::StreamExt;

    let (tx, rx) = watch::channel(false);
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    tokio::spawn(async move {
        while let Some(signal) = signals.next().await {
            info!(signal, "shutdown signal received");
            let _ = tx.send(true);
            break;
        }
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_report_variants_are_distinguishable() {
        let r = TickReport::NoOpportunity;
        assert!(matches!(r, TickReport::NoOpportunity));

        let r = TickReport::Skipped {
            reason: "min profit not met".to_string(),
        };
        assert!(matches!(r, TickReport::Skipped { .. }));
    }

    #[test]
    fn amount_conversion_round_trips_through_token_amount() {
        let amount = Decimal::new(150, 2); // 1.50
        let raw = TokenAmount::from_decimal(amount, 18).raw;
        assert_eq!(TokenAmount { raw, decimals: 18 }.as_decimal(), amount);
    }

    #[test]
    fn verdict_none_short_circuits_before_any_snapshot() {
        // Exercises the same classification path `tick()` uses for the
        // NoOpportunity branch, without needing a live provider.
        let prices = TickPrices {
            p_yes: Decimal::new(50, 2),
            p_no: Decimal::new(50, 2),
            p_pred_yes: Decimal::new(50, 2),
            p_spot: Decimal::new(50, 2),
        };
        let verdict = detector::detect(&prices, Decimal::new(1, 2));
        assert_eq!(verdict, Verdict::None);
    }
}

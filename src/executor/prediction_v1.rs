//! prediction_v1 executor flavor: a single `run` entrypoint that takes the
//! forced flow direction as a parameter, rather than exposing separate
//! BUY/SELL functions (§4.3).
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::contracts::{IERC20, IPredictionV1Executor};
use crate::error::ArbError;
use crate::executor::{prefund_amount, ExecutorAdapter, RunOutcome, TradeIntent, RECEIPT_TIMEOUT};
use crate::gas::{FeeFields, GasIntent, GasPolicy};
use crate::types::Flow;

pub struct PredictionV1Adapter<P> {
    provider: P,
    executor_address: Address,
    wallet_address: Address,
    base_currency: Address,
    gas_policy: GasPolicy,
}

impl<P: Provider + Clone> PredictionV1Adapter<P> {
    pub fn new(
        provider: P,
        executor_address: Address,
        wallet_address: Address,
        base_currency: Address,
        gas_policy: GasPolicy,
    ) -> Self {
        Self {
            provider,
            executor_address,
            wallet_address,
            base_currency,
            gas_policy,
        }
    }

    async fn current_base_fee(&self) -> Result<Option<U256>, ArbError> {
        let block = self
            .provider
            .get_block_by_number(alloy::eips::BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ArbError::RpcTransient {
                pool: self.executor_address,
                source: anyhow::anyhow!(e),
            })?;
        Ok(block.and_then(|b| b.header.base_fee_per_gas).map(U256::from))
    }

    async fn wait_for_receipt(&self, tx_hash: alloy::primitives::B256) -> Result<bool, ArbError> {
        let deadline = tokio::time::Instant::now() + RECEIPT_TIMEOUT;
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ArbError::RpcTransient {
                    pool: self.executor_address,
                    source: anyhow::anyhow!(e),
                })?;
            if let Some(receipt) = receipt {
                return Ok(receipt.status());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ArbError::TimedOut {
                    tx_hash: format!("{tx_hash:#x}"),
                    window_secs: RECEIPT_TIMEOUT.as_secs(),
                });
            }
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        }
    }
}

/// `buyConditional`/`sellConditional` collapse into one `int8` parameter on
/// this flavor: 0 = buy, 1 = sell.
fn forced_flow_code(flow: Flow) -> i8 {
    match flow {
        Flow::Buy => 0,
        Flow::Sell => 1,
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync> ExecutorAdapter for PredictionV1Adapter<P> {
    async fn prefund(&self, intent: &TradeIntent) -> Result<Option<String>, ArbError> {
        if !intent.prefund {
            return Ok(None);
        }

        let token = IERC20::new(self.base_currency, self.provider.clone());
        let executor_balance = token
            .balanceOf(self.executor_address)
            .call()
            .await
            .map_err(|e| ArbError::PrefundFailed {
                reason: format!("could not read executor balance: {e}"),
            })?;

        let needed = prefund_amount(intent.amount, executor_balance);
        if needed.is_zero() {
            return Ok(None);
        }

        let pending = token
            .transfer(self.executor_address, needed)
            .nonce(intent.nonce)
            .send()
            .await
            .map_err(|e| ArbError::PrefundFailed {
                reason: format!("transfer send failed: {e}"),
            })?;

        let tx_hash = *pending.tx_hash();
        let ok = self.wait_for_receipt(tx_hash).await.map_err(|e| match e {
            ArbError::TimedOut { .. } => ArbError::PrefundFailed {
                reason: "prefund transfer not confirmed within window".to_string(),
            },
            other => other,
        })?;

        if !ok {
            return Err(ArbError::PrefundFailed {
                reason: "prefund transfer reverted".to_string(),
            });
        }

        info!(tx_hash = %format!("{tx_hash:#x}"), amount = %needed, "prefund transfer confirmed");
        Ok(Some(format!("{tx_hash:#x}")))
    }

    async fn run(&self, intent: &TradeIntent) -> Result<RunOutcome, ArbError> {
        let flow = intent.flow.ok_or_else(|| ArbError::SimulationFailed {
            reason: "prediction_v1 requires an explicit forced flow".to_string(),
        })?;

        let executor = IPredictionV1Executor::new(self.executor_address, self.provider.clone());
        let call = executor.run(intent.amount, forced_flow_code(flow), intent.min_profit);

        let gas_limit = match call.estimate_gas().await {
            Ok(est) => crate::gas::resolve_gas_limit(intent.gas_limit_override, Some(est), GasIntent::CombinedFlow),
            Err(e) => {
                if intent.force_send {
                    warn!("gas estimation failed, forcing send with fallback limit: {e}");
                    crate::gas::resolve_gas_limit(intent.gas_limit_override, None, GasIntent::CombinedFlow)
                } else {
                    return Err(ArbError::SimulationFailed {
                        reason: e.to_string(),
                    });
                }
            }
        };

        let base_fee = self.current_base_fee().await?;
        let current_gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| ArbError::RpcTransient {
                pool: self.executor_address,
                source: anyhow::anyhow!(e),
            })?;
        let call = match self.gas_policy.fee_fields(base_fee, U256::from(current_gas_price)) {
            FeeFields::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => call
                .max_fee_per_gas(max_fee_per_gas.to::<u128>())
                .max_priority_fee_per_gas(max_priority_fee_per_gas.to::<u128>()),
            FeeFields::Legacy { gas_price } => call.gas_price(gas_price.to::<u128>()),
        };

        let pending = call
            .gas(gas_limit)
            .nonce(intent.nonce)
            .send()
            .await
            .map_err(|_| ArbError::SendReverted { tx_hash: None })?;

        let tx_hash = *pending.tx_hash();
        let ok = self.wait_for_receipt(tx_hash).await?;

        if !ok {
            return Err(ArbError::SendReverted {
                tx_hash: Some(format!("{tx_hash:#x}")),
            });
        }

        Ok(RunOutcome {
            tx_hash: format!("{tx_hash:#x}"),
            receipt_status_ok: ok,
        })
    }

    async fn sweep(&self, token: Address, to: Address, amount: U256) -> Result<String, ArbError> {
        let executor = IPredictionV1Executor::new(self.executor_address, self.provider.clone());

        let owner = executor
            .owner()
            .call()
            .await
            .map_err(|_| ArbError::SendReverted { tx_hash: None })?;
        if owner != self.wallet_address {
            return Err(ArbError::SendReverted { tx_hash: None });
        }

        let pending = executor
            .withdraw(token, to, amount)
            .send()
            .await
            .map_err(|_| ArbError::SendReverted { tx_hash: None })?;

        let tx_hash = *pending.tx_hash();
        let ok = self.wait_for_receipt(tx_hash).await?;
        if !ok {
            return Err(ArbError::SendReverted {
                tx_hash: Some(format!("{tx_hash:#x}")),
            });
        }
        Ok(format!("{tx_hash:#x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_flow_code_matches_convention() {
        assert_eq!(forced_flow_code(Flow::Buy), 0);
        assert_eq!(forced_flow_code(Flow::Sell), 1);
    }
}

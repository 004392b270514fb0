//! Gas policy: EIP-1559 vs legacy fee construction, and gas-limit fallback.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::primitives::U256;

/// Tunable gas parameters, sourced from config (`PRIORITY_FEE_WEI`,
/// `MAX_FEE_MULTIPLIER`, `MIN_GAS_PRICE_BUMP_WEI`).
#[derive(Debug, Clone, Copy)]
pub struct GasPolicy {
    pub priority_fee_wei: u64,
    pub max_fee_multiplier: u64,
    pub min_gas_price_bump_wei: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            priority_fee_wei: 1,
            max_fee_multiplier: 2,
            min_gas_price_bump_wei: 1,
        }
    }
}

/// The two fee shapes a signed transaction may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeFields {
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    Legacy {
        gas_price: U256,
    },
}

impl GasPolicy {
    /// `maxFeePerGas = base_fee * MULT + tip`, `maxPriorityFeePerGas = tip`
    /// when the chain advertises a base fee; otherwise
    /// `gasPrice = current_gas_price + bump`.
    pub fn fee_fields(&self, base_fee_per_gas: Option<U256>, current_gas_price: U256) -> FeeFields {
        match base_fee_per_gas {
            Some(base_fee) => {
                let tip = U256::from(self.priority_fee_wei);
                let max_fee = base_fee * U256::from(self.max_fee_multiplier) + tip;
                FeeFields::Eip1559 {
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: tip,
                }
            }
            None => FeeFields::Legacy {
                gas_price: current_gas_price + U256::from(self.min_gas_price_bump_wei),
            },
        }
    }
}

/// Default gas limit when `--force-send` bypasses estimation, per §4.4:
/// 150k for a prefund transfer, 1.5M for a combined-flow executor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasIntent {
    Prefund,
    CombinedFlow,
}

impl GasIntent {
    pub fn fallback_limit(&self) -> u64 {
        match self {
            GasIntent::Prefund => 150_000,
            GasIntent::CombinedFlow => 1_500_000,
        }
    }
}

/// Gas limit resolution order: explicit CLI override, else estimate * 1.2,
/// else the per-flavor default.
pub fn resolve_gas_limit(
    cli_override: Option<u64>,
    estimated: Option<u64>,
    intent: GasIntent,
) -> u64 {
    if let Some(limit) = cli_override {
        return limit;
    }
    if let Some(est) = estimated {
        return est.saturating_mul(12) / 10;
    }
    intent.fallback_limit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip1559_fees_when_base_fee_present() {
        let policy = GasPolicy::default();
        let fees = policy.fee_fields(Some(U256::from(100u64)), U256::from(50u64));
        assert_eq!(
            fees,
            FeeFields::Eip1559 {
                max_fee_per_gas: U256::from(201u64), // 100*2 + 1
                max_priority_fee_per_gas: U256::from(1u64),
            }
        );
    }

    #[test]
    fn legacy_fees_when_no_base_fee() {
        let policy = GasPolicy::default();
        let fees = policy.fee_fields(None, U256::from(50u64));
        assert_eq!(
            fees,
            FeeFields::Legacy {
                gas_price: U256::from(51u64), // 50 + 1
            }
        );
    }

    #[test]
    fn gas_limit_prefers_cli_override() {
        assert_eq!(resolve_gas_limit(Some(42), Some(100), GasIntent::Prefund), 42);
    }

    #[test]
    fn gas_limit_falls_back_to_estimate_times_1_2() {
        assert_eq!(
            resolve_gas_limit(None, Some(100_000), GasIntent::CombinedFlow),
            120_000
        );
    }

    #[test]
    fn gas_limit_falls_back_to_flavor_default() {
        assert_eq!(resolve_gas_limit(None, None, GasIntent::Prefund), 150_000);
        assert_eq!(resolve_gas_limit(None, None, GasIntent::CombinedFlow), 1_500_000);
    }
}

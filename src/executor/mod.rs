//! Executor Adapter
//!
//! Translates a high-level trade intent into a single on-chain contract
//! call per executor flavor, signs and sends it, observes the receipt, and
//! returns the transaction hash. Prefund, the main arb call, and owner
//! sweep are three distinct operations with separate error surfaces — the
//! source conflates them; this adapter does not.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

pub mod futarchy_v5;
pub mod pnk_variant;
pub mod prediction_v1;
pub mod subprocess;

use alloy::primitives::{Address, I256, U256};
use async_trait::async_trait;
use std::time::Duration;

use crate::error::ArbError;
use crate::types::{CheaperLeg, Flow};

/// Default wall-clock timeout for a receipt poll (§5).
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// A high-level trade intent, independent of executor flavor.
#[derive(Debug, Clone, Copy)]
pub struct TradeIntent {
    pub amount: U256,
    pub flow: Option<Flow>,
    pub cheaper: Option<CheaperLeg>,
    pub min_profit: I256,
    pub prefund: bool,
    pub force_send: bool,
    pub gas_limit_override: Option<u64>,
    /// Read once at intent creation via `eth_getTransactionCount`. For a
    /// prefund+main pair, the caller increments this locally between the
    /// two sends rather than letting each `send()` re-fetch it, so a
    /// delayed or dropped prefund transaction cannot desync the pair.
    pub nonce: u64,
}

/// Outcome of a successful `run` call.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub tx_hash: String,
    pub receipt_status_ok: bool,
}

/// Implemented once per executor flavor (futarchy_v5, pnk_variant,
/// prediction_v1) and once more for the out-of-process Subprocess Shim.
#[async_trait]
pub trait ExecutorAdapter: Send + Sync {
    /// Transfers `amount - executor_current_base_balance` (clamped to >= 0)
    /// from wallet to executor, if `intent.prefund` is set. Returns `None`
    /// when no transfer was needed.
    async fn prefund(&self, intent: &TradeIntent) -> Result<Option<String>, ArbError>;

    /// Invokes the flavor-specific executor method. Returns the transaction
    /// hash and whether the receipt's status was 1 (success).
    async fn run(&self, intent: &TradeIntent) -> Result<RunOutcome, ArbError>;

    /// Owner-gated withdrawal from the executor contract back to `to`.
    async fn sweep(&self, token: Address, to: Address, amount: U256) -> Result<String, ArbError>;
}

/// `amount - executor_current_base_balance`, clamped to >= 0.
pub fn prefund_amount(amount: U256, executor_current_base_balance: U256) -> U256 {
    amount.saturating_sub(executor_current_base_balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefund_amount_clamps_to_zero() {
        assert_eq!(prefund_amount(U256::from(100u64), U256::from(150u64)), U256::ZERO);
        assert_eq!(prefund_amount(U256::from(100u64), U256::from(40u64)), U256::from(60u64));
    }
}

//! Error taxonomy for the arbitrage bot.
//!
//! The Oracle, Accountant, and Executor Adapter surface these kinds upward;
//! the Controller decides disposition (retry, skip, fatal). No error is
//! silently swallowed — every report carries a suggested operator action.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::primitives::Address;

/// Closed error taxonomy shared by the Oracle, Accountant, and Executor Adapter.
#[derive(Debug, thiserror::Error)]
pub enum ArbError {
    /// A required effective-config key is absent. Fatal at startup.
    #[error("configuration incomplete: missing {0:?}")]
    ConfigIncomplete(Vec<String>),

    /// Transient RPC failure reading on-chain state. Retryable next tick.
    #[error("transient RPC error reading {pool}: {source}")]
    RpcTransient {
        pool: Address,
        #[source]
        source: anyhow::Error,
    },

    /// Pool state could not be decoded. Fatal for the tick.
    #[error("could not decode pool state for {pool}: {reason}")]
    PoolDecodeError { pool: Address, reason: String },

    /// The executor reverted with its on-chain min-profit guard.
    /// Informational skip; the controller proceeds without retrying.
    #[error("executor reverted: minimum profit not met")]
    MinProfitNotMet,

    /// The executor reverted for any other reason. Error report; no retry.
    #[error("executor call reverted (tx {tx_hash:?})")]
    SendReverted { tx_hash: Option<String> },

    /// Receipt was not observed within the configured wait window.
    #[error("transaction {tx_hash} not confirmed within {window_secs}s")]
    TimedOut { tx_hash: String, window_secs: u64 },

    /// The preparatory wallet -> executor transfer reverted or timed out.
    /// Aborts the tick; the main call is never attempted.
    #[error("prefund transfer failed: {reason}")]
    PrefundFailed { reason: String },

    /// The signing key is not accessible (e.g. invalid private key material).
    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),

    /// Gas estimation reverted and `--force-send` was not set.
    #[error("gas simulation failed: {reason}")]
    SimulationFailed { reason: String },
}

impl ArbError {
    /// A short, human-readable suggestion for what the operator should do next.
    /// Included in every user-facing report per the error-handling design.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            ArbError::ConfigIncomplete(_) => {
                "set the missing configuration keys and restart the bot"
            }
            ArbError::RpcTransient { .. } => "no action needed; the next tick will retry",
            ArbError::PoolDecodeError { .. } => {
                "verify the pool address and ABI; this tick was aborted"
            }
            ArbError::MinProfitNotMet => "no action needed; this was an expected skip",
            ArbError::SendReverted { .. } => {
                "inspect the transaction on a block explorer before the next attempt"
            }
            ArbError::TimedOut { .. } => {
                "check the transaction status manually; the next tick reconciles balances"
            }
            ArbError::PrefundFailed { .. } => {
                "verify wallet balance and allowance before retrying"
            }
            ArbError::SignerUnavailable(_) => "verify PRIVATE_KEY is set and well-formed",
            ArbError::SimulationFailed { .. } => {
                "re-run with --force-send to bypass gas estimation, or investigate the revert"
            }
        }
    }
}

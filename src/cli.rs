//! Command-line surface.
//!
//! Parsed into a plain `CliOverrides` and threaded through the Config
//! Manager's explicit merge function rather than relying on clap's own
//! `env` fallback, since the Config Manager's precedence rules are more
//! specific than what clap provides out of the box.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;

use crate::config::CliOverrides;
use crate::types::{BotType, ForcedFlow};

#[derive(Parser, Debug)]
#[command(name = "arbitrage-bot", about = "Cross-venue arbitrage bot for conditional-token prediction markets")]
pub struct Cli {
    /// JSON config file path. Mutually exclusive with --env.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base environment file path (KEY=VALUE lines). Mutually exclusive with --config.
    #[arg(long)]
    pub env: Option<PathBuf>,

    /// Trade size in base-currency units (decimal, human-readable).
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Inter-tick sleep, in seconds.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Minimum |spot - implied| deviation to consider an opportunity.
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Minimum profit the on-chain executor must clear, in base-currency units.
    #[arg(long)]
    pub min_profit: Option<Decimal>,

    /// Which deployed executor flavor to target.
    #[arg(long)]
    pub bot_type: Option<CliBotType>,

    /// Force a specific flow instead of letting the detector choose.
    #[arg(long)]
    pub force_flow: Option<CliForcedFlow>,

    /// Perform detection and logging only; never sign or send.
    #[arg(long)]
    pub dry_run: bool,

    /// Top up the executor's base-currency balance before the main call.
    #[arg(long)]
    pub prefund: bool,

    /// Bypass gas estimation and send with the fallback gas limit on failure.
    #[arg(long)]
    pub force_send: bool,

    /// Explicit gas limit override, bypassing estimation entirely.
    #[arg(long)]
    pub gas: Option<u64>,

    /// Write the effective merged configuration to this path (or "-" for
    /// stdout) and exit without running the controller.
    #[arg(long)]
    pub dump_config: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliBotType {
    Balancer,
    Kleros,
    Pnk,
    Prediction,
}

impl From<CliBotType> for BotType {
    fn from(v: CliBotType) -> BotType {
        match v {
            CliBotType::Balancer => BotType::Balancer,
            CliBotType::Kleros => BotType::Kleros,
            CliBotType::Pnk => BotType::Pnk,
            CliBotType::Prediction => BotType::Prediction,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliForcedFlow {
    Buy,
    Sell,
}

impl From<CliForcedFlow> for ForcedFlow {
    fn from(v: CliForcedFlow) -> ForcedFlow {
        match v {
            CliForcedFlow::Buy => ForcedFlow::Buy,
            CliForcedFlow::Sell => ForcedFlow::Sell,
        }
    }
}

/// Error for `--amount 0`, rejected at CLI parsing per the invariant that a
/// zero-size trade can never clear gas cost.
#[derive(Debug)]
pub struct ZeroAmountError;

impl std::fmt::Display for ZeroAmountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "--amount must be greater than zero")
    }
}

impl std::error::Error for ZeroAmountError {}

/// Validates CLI-parsed values that clap's own type system cannot express,
/// returning an invalid-arguments error (exit code 2, per §6) on failure.
pub fn validate(cli: &Cli) -> Result<(), ZeroAmountError> {
    if let Some(amount) = cli.amount {
        if amount <= Decimal::ZERO {
            return Err(ZeroAmountError);
        }
    }
    Ok(())
}

impl Cli {
    /// Projects the parsed CLI into the Config Manager's override struct.
    pub fn into_overrides(self) -> CliOverrides {
        CliOverrides {
            config_path: self.config,
            env_path: self.env,
            amount: self.amount,
            interval_secs: self.interval,
            tolerance: self.tolerance,
            min_profit: self.min_profit,
            bot_type: self.bot_type.map(BotType::from),
            force_flow: self.force_flow.map(ForcedFlow::from),
            dry_run: self.dry_run,
            prefund: self.prefund,
            force_send: self.force_send,
            dump_config: self.dump_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_is_rejected() {
        let cli = Cli {
            config: None,
            env: None,
            amount: Some(Decimal::ZERO),
            interval: None,
            tolerance: None,
            min_profit: None,
            bot_type: None,
            force_flow: None,
            dry_run: false,
            prefund: false,
            force_send: false,
            gas: None,
            dump_config: None,
        };
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn positive_amount_is_accepted() {
        let cli = Cli {
            config: None,
            env: None,
            amount: Some(Decimal::new(150, 2)),
            interval: None,
            tolerance: None,
            min_profit: None,
            bot_type: None,
            force_flow: None,
            dry_run: false,
            prefund: false,
            force_send: false,
            gas: None,
            dump_config: None,
        };
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn missing_amount_is_accepted_at_cli_layer() {
        let cli = Cli {
            config: None,
            env: None,
            amount: None,
            interval: None,
            tolerance: None,
            min_profit: None,
            bot_type: None,
            force_flow: None,
            dry_run: false,
            prefund: false,
            force_send: false,
            gas: None,
            dump_config: None,
        };
        assert!(validate(&cli).is_ok());
    }
}

//! Subprocess Shim executor adapter.
//!
//! Materialises the effective config to an env file, spawns the Python
//! executor as a child process with a scrubbed environment, and scrapes its
//! stdout/stderr for a transaction hash and the "min profit not met" skip
//! signal. Exists so an operator migrating off the original implementation
//! can point the bot at the old executor binaries during a transition
//! period, without reimplementing their chain calls.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::ArbError;
use crate::executor::{ExecutorAdapter, RunOutcome, TradeIntent};
use crate::types::{CheaperLeg, Flow};

static TX_HASH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)Tx sent:\s*(?:0x)?([a-fA-F0-9]{64})").unwrap(),
        Regex::new(r"(?i)Transaction hash:\s*(?:0x)?([a-fA-F0-9]{64})").unwrap(),
        Regex::new(r"(?i)tx:\s*(?:0x)?([a-fA-F0-9]{64})").unwrap(),
    ]
});

/// Scans `output` for any of the known transaction-hash announcement
/// formats and returns the first match, normalised to a `0x`-prefixed hash.
pub fn parse_tx_hash(output: &str) -> Option<String> {
    for pattern in TX_HASH_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(output) {
            let hash = &captures[1];
            return Some(if hash.starts_with("0x") {
                hash.to_string()
            } else {
                format!("0x{hash}")
            });
        }
    }
    None
}

/// True when stderr indicates the expected, non-error "skip" outcome:
/// the trade would not have cleared the configured minimum profit.
pub fn is_min_profit_skip(stderr: &str) -> bool {
    stderr.to_lowercase().contains("min profit not met")
}

pub struct SubprocessAdapter {
    binary: PathBuf,
    module_args: Vec<String>,
    env_dir: PathBuf,
    config: BTreeMap<String, String>,
}

impl SubprocessAdapter {
    pub fn new(
        binary: PathBuf,
        module_args: Vec<String>,
        env_dir: PathBuf,
        config: BTreeMap<String, String>,
    ) -> Self {
        Self {
            binary,
            module_args,
            env_dir,
            config,
        }
    }

    /// Writes `config` to `build/envs/exec_env_<unix_ts>_<pid>.env` and
    /// returns the path. The child process receives this file's keys via
    /// `--env`, not via its own inherited environment — callers strip
    /// those keys from the spawned process's environment so the file is
    /// the single source of truth for the run.
    fn materialise_env_file(&self, unix_ts: u64) -> Result<PathBuf, ArbError> {
        std::fs::create_dir_all(&self.env_dir).map_err(|e| ArbError::PrefundFailed {
            reason: format!("could not create env dir: {e}"),
        })?;
        let path = self
            .env_dir
            .join(format!("exec_env_{unix_ts}_{}.env", std::process::id()));
        let mut contents = String::new();
        for (k, v) in &self.config {
            contents.push_str(k);
            contents.push('=');
            contents.push_str(v);
            contents.push('\n');
        }
        std::fs::write(&path, contents).map_err(|e| ArbError::PrefundFailed {
            reason: format!("could not write env file: {e}"),
        })?;
        Ok(path)
    }

    async fn spawn(&self, extra_args: &[String], unix_ts: u64) -> Result<(bool, String, String), ArbError> {
        let env_path = self.materialise_env_file(unix_ts)?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.module_args)
            .args(extra_args)
            .arg("--env")
            .arg(&env_path)
            .env_clear()
            .envs(std::env::vars().filter(|(k, _)| !self.config.contains_key(k)))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| {
            warn!("failed to spawn subprocess executor: {e}");
            ArbError::SendReverted { tx_hash: None }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        Ok((output.status.success(), stdout, stderr))
    }
}

#[async_trait]
impl ExecutorAdapter for SubprocessAdapter {
    async fn prefund(&self, intent: &TradeIntent) -> Result<Option<String>, ArbError> {
        if !intent.prefund {
            return Ok(None);
        }
        let unix_ts = current_unix_ts();
        let args = vec!["--prefund".to_string()];
        let (ok, stdout, stderr) = self.spawn(&args, unix_ts).await?;
        if !ok {
            return Err(ArbError::PrefundFailed {
                reason: format!("subprocess prefund failed: {stderr}"),
            });
        }
        Ok(parse_tx_hash(&stdout))
    }

    async fn run(&self, intent: &TradeIntent) -> Result<RunOutcome, ArbError> {
        let flow = intent.flow.ok_or_else(|| ArbError::SimulationFailed {
            reason: "subprocess shim requires an explicit flow".to_string(),
        })?;
        let cheaper = intent.cheaper.unwrap_or(CheaperLeg::Yes);

        let mut args = vec![
            "--flow".to_string(),
            match flow {
                Flow::Buy => "buy".to_string(),
                Flow::Sell => "sell".to_string(),
            },
            "--amount".to_string(),
            intent.amount.to_string(),
            "--cheaper".to_string(),
            match cheaper {
                CheaperLeg::Yes => "yes".to_string(),
                CheaperLeg::No => "no".to_string(),
            },
            "--min-profit".to_string(),
            intent.min_profit.to_string(),
            "--execute".to_string(),
        ];
        if intent.prefund {
            args.push("--prefund".to_string());
        }

        let unix_ts = current_unix_ts();
        let (ok, stdout, stderr) = self.spawn(&args, unix_ts).await?;
        let tx_hash = parse_tx_hash(&stdout);

        if ok {
            info!(tx_hash = ?tx_hash, "subprocess executor reported success");
            return Ok(RunOutcome {
                tx_hash: tx_hash.unwrap_or_default(),
                receipt_status_ok: true,
            });
        }

        if is_min_profit_skip(&stderr) {
            return Err(ArbError::MinProfitNotMet);
        }

        Err(ArbError::SendReverted { tx_hash })
    }

    async fn sweep(&self, _token: Address, _to: Address, _amount: U256) -> Result<String, ArbError> {
        Err(ArbError::SignerUnavailable(
            "subprocess shim does not support owner sweep, invoke the legacy withdraw script directly".to_string(),
        ))
    }
}

/// Wall-clock timestamp used to make concurrent invocations' env-file names
/// distinct. Tests construct env-file paths directly with a fixed value
/// instead of calling this.
fn current_unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before unix epoch")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tx_sent_format() {
        let out = "some logs\nTx sent: 0xabc123\nmore logs";
        assert_eq!(parse_tx_hash(out), None); // too short to match 64 hex chars, falls through
    }

    #[test]
    fn parses_full_length_tx_hash() {
        let hash = "a".repeat(64);
        let out = format!("Tx sent: {hash}");
        assert_eq!(parse_tx_hash(&out), Some(format!("0x{hash}")));
    }

    #[test]
    fn parses_transaction_hash_format_with_0x_prefix() {
        let hash = "b".repeat(64);
        let out = format!("Transaction hash: 0x{hash}");
        assert_eq!(parse_tx_hash(&out), Some(format!("0x{hash}")));
    }

    #[test]
    fn returns_none_when_no_hash_present() {
        assert_eq!(parse_tx_hash("no hash here"), None);
    }

    #[test]
    fn detects_min_profit_skip_case_insensitively() {
        assert!(is_min_profit_skip("Error: MIN PROFIT NOT MET for this route"));
        assert!(!is_min_profit_skip("some other failure"));
    }
}

//! Configuration management
//!
//! Merges layered configuration (CLI > process environment > JSON config
//! file > base environment file > defaults) into a typed effective config,
//! with critical keys always re-overlaid from the process environment after
//! the file merge. Materialises a flat key=value view for the Subprocess
//! Shim.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ArbError;
use crate::types::{
    BotType, ExecutorDescriptor, ExecutorFlavor, ForcedFlow, PoolDescriptor, PoolFamily, PoolSet,
    Proposal,
};

// ── Key catalogue ───────────────────────────────────────────────────────

pub const KEY_RPC_URL: &str = "RPC_URL";
pub const KEY_CHAIN_ID: &str = "CHAIN_ID";
pub const KEY_PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const KEY_EXECUTOR_V5: &str = "FUTARCHY_ARB_EXECUTOR_V5";
pub const KEY_EXECUTOR_PREDICTION: &str = "PREDICTION_ARB_EXECUTOR_V1";
pub const KEY_BALANCER_ROUTER: &str = "BALANCER_ROUTER_ADDRESS";
pub const KEY_SWAPR_ROUTER: &str = "SWAPR_ROUTER_ADDRESS";
pub const KEY_FUTARCHY_ROUTER: &str = "FUTARCHY_ROUTER_ADDRESS";
pub const KEY_SDAI_TOKEN: &str = "SDAI_TOKEN_ADDRESS";
pub const KEY_COMPANY_TOKEN: &str = "COMPANY_TOKEN_ADDRESS";
pub const KEY_SDAI_YES: &str = "SWAPR_SDAI_YES_ADDRESS";
pub const KEY_SDAI_NO: &str = "SWAPR_SDAI_NO_ADDRESS";
pub const KEY_GNO_YES: &str = "SWAPR_GNO_YES_ADDRESS";
pub const KEY_GNO_NO: &str = "SWAPR_GNO_NO_ADDRESS";
pub const KEY_BALANCER_POOL: &str = "BALANCER_POOL_ADDRESS";
pub const KEY_POOL_YES: &str = "SWAPR_POOL_YES_ADDRESS";
pub const KEY_POOL_NO: &str = "SWAPR_POOL_NO_ADDRESS";
pub const KEY_POOL_PRED_YES: &str = "SWAPR_POOL_PRED_YES_ADDRESS";
pub const KEY_POOL_PRED_NO: &str = "SWAPR_POOL_PRED_NO_ADDRESS";
pub const KEY_PRIORITY_FEE_WEI: &str = "PRIORITY_FEE_WEI";
pub const KEY_MAX_FEE_MULTIPLIER: &str = "MAX_FEE_MULTIPLIER";
pub const KEY_MIN_GAS_PRICE_BUMP_WEI: &str = "MIN_GAS_PRICE_BUMP_WEI";

/// Every address/network key recognised by the bot, in the fixed order used
/// by `materialise()`.
const ADDRESS_KEYS: &[&str] = &[
    KEY_RPC_URL,
    KEY_CHAIN_ID,
    KEY_PRIVATE_KEY,
    KEY_EXECUTOR_V5,
    KEY_EXECUTOR_PREDICTION,
    KEY_BALANCER_ROUTER,
    KEY_SWAPR_ROUTER,
    KEY_FUTARCHY_ROUTER,
    KEY_SDAI_TOKEN,
    KEY_COMPANY_TOKEN,
    KEY_SDAI_YES,
    KEY_SDAI_NO,
    KEY_GNO_YES,
    KEY_GNO_NO,
    KEY_BALANCER_POOL,
    KEY_POOL_YES,
    KEY_POOL_NO,
    KEY_POOL_PRED_YES,
    KEY_POOL_PRED_NO,
    KEY_PRIORITY_FEE_WEI,
    KEY_MAX_FEE_MULTIPLIER,
    KEY_MIN_GAS_PRICE_BUMP_WEI,
];

/// Keys that are always overlaid from the process environment after the
/// file merge, regardless of what the JSON config / base env file say.
const CRITICAL_KEYS: &[&str] = &[
    KEY_PRIVATE_KEY,
    KEY_RPC_URL,
    KEY_EXECUTOR_V5,
    KEY_EXECUTOR_PREDICTION,
    KEY_BALANCER_ROUTER,
    KEY_SWAPR_ROUTER,
    KEY_FUTARCHY_ROUTER,
    KEY_SDAI_TOKEN,
    KEY_COMPANY_TOKEN,
    KEY_SDAI_YES,
    KEY_SDAI_NO,
    KEY_GNO_YES,
    KEY_GNO_NO,
    KEY_BALANCER_POOL,
    KEY_POOL_YES,
    KEY_POOL_NO,
    KEY_POOL_PRED_YES,
    KEY_POOL_PRED_NO,
];

fn default_layer() -> BTreeMap<String, String> {
    let mut defaults = BTreeMap::new();
    defaults.insert(KEY_CHAIN_ID.to_string(), "100".to_string());
    defaults.insert(KEY_PRIORITY_FEE_WEI.to_string(), "1".to_string());
    defaults.insert(KEY_MAX_FEE_MULTIPLIER.to_string(), "2".to_string());
    defaults.insert(KEY_MIN_GAS_PRICE_BUMP_WEI.to_string(), "1".to_string());
    defaults
}

// ── CLI overrides (runtime options only; see §6) ────────────────────────

/// Runtime-option overrides collected from the command line. These never
/// participate in the address/network key merge above — they set the
/// highest-precedence values for amount/interval/tolerance/min_profit/flow.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
    pub amount: Option<Decimal>,
    pub interval_secs: Option<u64>,
    pub tolerance: Option<Decimal>,
    pub min_profit: Option<Decimal>,
    pub bot_type: Option<BotType>,
    pub force_flow: Option<ForcedFlow>,
    pub dry_run: bool,
    pub prefund: bool,
    pub force_send: bool,
    pub dump_config: Option<String>,
}

/// A JSON config file's top-level shape (§6: `bot`, `network`, `wallet`,
/// `contracts`, `proposal`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub bot: BTreeMap<String, String>,
    #[serde(default)]
    pub network: BTreeMap<String, String>,
    #[serde(default)]
    pub wallet: BTreeMap<String, String>,
    #[serde(default)]
    pub contracts: BTreeMap<String, String>,
    #[serde(default)]
    pub proposal: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Flattens the nested JSON sections into the single key catalogue,
    /// the narrow adapter described in the design notes.
    fn flatten(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        for section in [&self.bot, &self.network, &self.wallet, &self.contracts, &self.proposal] {
            for (k, v) in section {
                flat.insert(k.to_uppercase(), v.clone());
            }
        }
        flat
    }
}

/// The fully merged, typed configuration a controller is built from.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: Option<String>,
    pub executor: ExecutorDescriptor,
    pub balancer_router: Address,
    pub swapr_router: Address,
    pub futarchy_router: Address,
    pub proposal: Proposal,
    pub gas: crate::gas::GasPolicy,
    pub amount: Decimal,
    pub interval_secs: u64,
    pub tolerance: Decimal,
    pub min_profit: Decimal,
    pub bot_type: BotType,
    pub force_flow: Option<ForcedFlow>,
    pub dry_run: bool,
    pub prefund: bool,
    pub force_send: bool,
    flat: BTreeMap<String, String>,
}

impl EffectiveConfig {
    /// `get(path) -> value | None`, a dotted-path accessor. The flat
    /// catalogue has no real nesting left after `materialise()`, so the
    /// "dotted path" degenerates to a direct key lookup plus a few
    /// well-known aliases used by `--dump-config` consumers.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.flat.get(path).map(|s| s.as_str())
    }

    /// `materialise() -> flat key=value mapping`, for the Subprocess Shim.
    pub fn materialise(&self) -> &BTreeMap<String, String> {
        &self.flat
    }

    pub fn materialise_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.flat).unwrap_or(serde_json::Value::Null)
    }

    /// Fills in the executor's owner wallet once the signer has been
    /// constructed from `PRIVATE_KEY` (config load happens before signing
    /// material is touched).
    pub fn with_owner_wallet(mut self, owner_wallet: Address) -> Self {
        self.executor.owner_wallet = owner_wallet;
        self
    }
}

/// `load(sources) -> EffectiveConfig`.
pub fn load(cli: &CliOverrides, process_env: &BTreeMap<String, String>) -> Result<EffectiveConfig, ArbError> {
    if cli.config_path.is_some() && cli.env_path.is_some() {
        return Err(ArbError::ConfigIncomplete(vec![
            "--config and --env are mutually exclusive".to_string(),
        ]));
    }

    let defaults = default_layer();

    let base_env_file = cli
        .env_path
        .as_deref()
        .map(read_env_file)
        .transpose()
        .map_err(|e| ArbError::ConfigIncomplete(vec![format!("base env file: {e}")]))?
        .unwrap_or_default();

    let json_file = cli
        .config_path
        .as_deref()
        .map(read_json_file)
        .transpose()
        .map_err(|e| ArbError::ConfigIncomplete(vec![format!("config file: {e}")]))?
        .map(|f| f.flatten())
        .unwrap_or_default();

    // Precedence, lowest to highest: defaults, base env file, json file, process env.
    let mut merged = defaults;
    overlay(&mut merged, &base_env_file);
    overlay(&mut merged, &json_file);
    overlay(&mut merged, process_env);

    // Critical keys always come from process env after the file merge,
    // regardless of what base_env_file/json_file claimed.
    for key in CRITICAL_KEYS {
        if let Some(value) = process_env.get(*key) {
            if !value.is_empty() {
                merged.insert((*key).to_string(), value.clone());
            }
        }
    }

    let bot_type = cli.bot_type.unwrap_or(BotType::Balancer);
    validate(&merged, bot_type)?;

    let executor_address_key = match bot_type.executor_flavor() {
        ExecutorFlavor::PredictionV1 => KEY_EXECUTOR_PREDICTION,
        _ => KEY_EXECUTOR_V5,
    };

    // owner_wallet is resolved once the signer is constructed from
    // PRIVATE_KEY (see wallet::derive_address); it is not a config key.
    let executor = ExecutorDescriptor {
        address: parse_address(&merged, executor_address_key)?,
        flavor: bot_type.executor_flavor(),
        owner_wallet: Address::ZERO,
    };

    let proposal = Proposal {
        base_currency: parse_address(&merged, KEY_SDAI_TOKEN)?,
        base_company: parse_address(&merged, KEY_COMPANY_TOKEN)?,
        yes_currency: parse_address(&merged, KEY_SDAI_YES)?,
        no_currency: parse_address(&merged, KEY_SDAI_NO)?,
        yes_company: parse_address(&merged, KEY_GNO_YES)?,
        no_company: parse_address(&merged, KEY_GNO_NO)?,
        pools: PoolSet {
            swapr_yes: PoolDescriptor::new(
                parse_address(&merged, KEY_POOL_YES)?,
                PoolFamily::Concentrated,
                0,
            ),
            swapr_no: PoolDescriptor::new(
                parse_address(&merged, KEY_POOL_NO)?,
                PoolFamily::Concentrated,
                0,
            ),
            swapr_pred_yes: PoolDescriptor::new(
                parse_address(&merged, KEY_POOL_PRED_YES)?,
                PoolFamily::Concentrated,
                0,
            ),
            swapr_pred_no: PoolDescriptor::new(
                parse_address(&merged, KEY_POOL_PRED_NO)?,
                PoolFamily::Concentrated,
                0,
            ),
            weighted_spot: PoolDescriptor::new(
                parse_address(&merged, KEY_BALANCER_POOL)?,
                PoolFamily::Weighted,
                0,
            ),
        },
        proposal_id: merged
            .get(KEY_BALANCER_POOL)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
    };
    proposal
        .validate()
        .map_err(|e| ArbError::ConfigIncomplete(vec![e.to_string()]))?;

    let gas = crate::gas::GasPolicy {
        priority_fee_wei: parse_u64(&merged, KEY_PRIORITY_FEE_WEI)?,
        max_fee_multiplier: parse_u64(&merged, KEY_MAX_FEE_MULTIPLIER)?,
        min_gas_price_bump_wei: parse_u64(&merged, KEY_MIN_GAS_PRICE_BUMP_WEI)?,
    };

    let private_key = merged.get(KEY_PRIVATE_KEY).cloned();
    if private_key.is_none() && !cli.dry_run {
        return Err(ArbError::SignerUnavailable(
            "PRIVATE_KEY is required for non-dry-run operation".to_string(),
        ));
    }

    Ok(EffectiveConfig {
        rpc_url: merged
            .get(KEY_RPC_URL)
            .cloned()
            .ok_or_else(|| ArbError::ConfigIncomplete(vec![KEY_RPC_URL.to_string()]))?,
        chain_id: parse_u64(&merged, KEY_CHAIN_ID)?,
        private_key,
        executor,
        balancer_router: parse_address(&merged, KEY_BALANCER_ROUTER)?,
        swapr_router: parse_address(&merged, KEY_SWAPR_ROUTER)?,
        futarchy_router: parse_address(&merged, KEY_FUTARCHY_ROUTER)?,
        proposal,
        gas,
        amount: cli.amount.unwrap_or(Decimal::ZERO),
        interval_secs: cli.interval_secs.unwrap_or(12),
        tolerance: cli.tolerance.unwrap_or(Decimal::new(1, 2)), // 0.01
        min_profit: cli.min_profit.unwrap_or(Decimal::ZERO),
        bot_type,
        force_flow: cli.force_flow,
        dry_run: cli.dry_run,
        prefund: cli.prefund,
        force_send: cli.force_send,
        flat: merged,
    })
}

fn overlay(base: &mut BTreeMap<String, String>, layer: &BTreeMap<String, String>) {
    for (k, v) in layer {
        if v.is_empty() {
            continue;
        }
        base.insert(k.clone(), v.clone());
    }
}

/// Validation checklist: every address/network key must be present and
/// non-empty. `ConfigIncomplete` names every missing path, not just the
/// first.
fn validate(merged: &BTreeMap<String, String>, bot_type: BotType) -> Result<(), ArbError> {
    let mut missing = Vec::new();
    for key in ADDRESS_KEYS {
        if *key == KEY_EXECUTOR_V5 && bot_type.executor_flavor() == ExecutorFlavor::PredictionV1 {
            continue;
        }
        if *key == KEY_EXECUTOR_PREDICTION && bot_type.executor_flavor() != ExecutorFlavor::PredictionV1 {
            continue;
        }
        match merged.get(*key) {
            Some(v) if !v.is_empty() => {}
            _ => missing.push((*key).to_string()),
        }
    }
    if !missing.is_empty() {
        warn!(missing = ?missing, "configuration incomplete");
        return Err(ArbError::ConfigIncomplete(missing));
    }
    info!("configuration validated for bot_type={bot_type:?}");
    Ok(())
}

fn parse_address(merged: &BTreeMap<String, String>, key: &str) -> Result<Address, ArbError> {
    let raw = merged
        .get(key)
        .ok_or_else(|| ArbError::ConfigIncomplete(vec![key.to_string()]))?;
    Address::from_str(raw).map_err(|e| ArbError::ConfigIncomplete(vec![format!("{key}: {e}")]))
}

fn parse_u64(merged: &BTreeMap<String, String>, key: &str) -> Result<u64, ArbError> {
    let raw = merged
        .get(key)
        .ok_or_else(|| ArbError::ConfigIncomplete(vec![key.to_string()]))?;
    raw.parse()
        .map_err(|_| ArbError::ConfigIncomplete(vec![format!("{key}: not a valid integer")]))
}

fn read_env_file(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let contents = std::fs::read_to_string(path)?;
    let mut map = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().trim_matches('"').to_string());
        }
    }
    Ok(map)
}

fn read_json_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Loads the base `.env` file (if present) into process environment the way
/// the teacher's `load_config` does, before the explicit layered merge
/// takes over. Does not override already-set process env vars.
pub fn load_dotenv_base() {
    dotenv::dotenv().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_process_env() -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(KEY_RPC_URL.to_string(), "https://rpc.example".to_string());
        env.insert(KEY_CHAIN_ID.to_string(), "100".to_string());
        env.insert(
            KEY_PRIVATE_KEY.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000a".to_string(),
        );
        env.insert(KEY_EXECUTOR_V5.to_string(), addr_str(1));
        env.insert(KEY_EXECUTOR_PREDICTION.to_string(), addr_str(2));
        env.insert(KEY_BALANCER_ROUTER.to_string(), addr_str(3));
        env.insert(KEY_SWAPR_ROUTER.to_string(), addr_str(4));
        env.insert(KEY_FUTARCHY_ROUTER.to_string(), addr_str(5));
        env.insert(KEY_SDAI_TOKEN.to_string(), addr_str(6));
        env.insert(KEY_COMPANY_TOKEN.to_string(), addr_str(7));
        env.insert(KEY_SDAI_YES.to_string(), addr_str(8));
        env.insert(KEY_SDAI_NO.to_string(), addr_str(9));
        env.insert(KEY_GNO_YES.to_string(), addr_str(10));
        env.insert(KEY_GNO_NO.to_string(), addr_str(11));
        env.insert(KEY_BALANCER_POOL.to_string(), addr_str(12));
        env.insert(KEY_POOL_YES.to_string(), addr_str(13));
        env.insert(KEY_POOL_NO.to_string(), addr_str(14));
        env.insert(KEY_POOL_PRED_YES.to_string(), addr_str(15));
        env.insert(KEY_POOL_PRED_NO.to_string(), addr_str(16));
        env.insert(KEY_PRIORITY_FEE_WEI.to_string(), "1".to_string());
        env.insert(KEY_MAX_FEE_MULTIPLIER.to_string(), "2".to_string());
        env.insert(KEY_MIN_GAS_PRICE_BUMP_WEI.to_string(), "1".to_string());
        env
    }

    fn addr_str(byte: u8) -> String {
        format!("0x{:040x}", byte)
    }

    #[test]
    fn load_succeeds_with_full_process_env() {
        let cli = CliOverrides::default();
        let env = sample_process_env();
        let cfg = load(&cli, &env).expect("config should load");
        assert_eq!(cfg.chain_id, 100);
        assert_eq!(cfg.interval_secs, 12);
    }

    #[test]
    fn missing_key_reports_config_incomplete() {
        let cli = CliOverrides::default();
        let mut env = sample_process_env();
        env.remove(KEY_RPC_URL);
        let err = load(&cli, &env).unwrap_err();
        assert!(matches!(err, ArbError::ConfigIncomplete(_)));
    }

    #[test]
    fn process_env_wins_over_json_file_for_critical_keys() {
        let cli = CliOverrides::default();
        let env = sample_process_env();

        // Simulate a json-file layer with a different private key; critical
        // key overlay must still pick the process env value.
        let mut json_layer = BTreeMap::new();
        json_layer.insert(KEY_PRIVATE_KEY.to_string(), "0xdeadbeef".to_string());

        let mut merged = default_layer();
        overlay(&mut merged, &BTreeMap::new());
        overlay(&mut merged, &json_layer);
        overlay(&mut merged, &env);
        for key in CRITICAL_KEYS {
            if let Some(value) = env.get(*key) {
                merged.insert((*key).to_string(), value.clone());
            }
        }

        assert_eq!(merged.get(KEY_PRIVATE_KEY), env.get(KEY_PRIVATE_KEY));
    }

    #[test]
    fn empty_string_values_are_treated_as_absent() {
        let mut base = default_layer();
        let mut layer = BTreeMap::new();
        layer.insert(KEY_CHAIN_ID.to_string(), "".to_string());
        overlay(&mut base, &layer);
        assert_eq!(base.get(KEY_CHAIN_ID), Some(&"100".to_string()));
    }
}

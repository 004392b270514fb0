//! Core data model: proposals, pool descriptors, price samples, verdicts,
//! and balance snapshots.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use std::collections::BTreeMap;
use std::fmt;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A finite positive rational price. `Decimal` carries 28-29 significant
/// digits, comfortably meeting the sub-1e-12 relative error bound.
pub type Price = Decimal;

/// Pool-family tag: determines which on-chain read path the Oracle uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolFamily {
    Concentrated,
    Weighted,
}

/// A single pool's static configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    pub address: Address,
    pub family: PoolFamily,
    /// Which side (0 or 1) is considered "base" for price quoting.
    pub base_token_index: u8,
}

impl PoolDescriptor {
    pub fn new(address: Address, family: PoolFamily, base_token_index: u8) -> Self {
        Self {
            address,
            family,
            base_token_index,
        }
    }
}

/// The five pools of a proposal, named by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSet {
    /// Prices YES-company vs YES-currency.
    pub swapr_yes: PoolDescriptor,
    /// Prices NO-company vs NO-currency.
    pub swapr_no: PoolDescriptor,
    /// Prices YES-currency vs base_currency.
    pub swapr_pred_yes: PoolDescriptor,
    /// Prices NO-currency vs base_currency.
    pub swapr_pred_no: PoolDescriptor,
    /// Prices base_company vs base_currency.
    pub weighted_spot: PoolDescriptor,
}

impl PoolSet {
    pub fn addresses(&self) -> [Address; 5] {
        [
            self.swapr_yes.address,
            self.swapr_no.address,
            self.swapr_pred_yes.address,
            self.swapr_pred_no.address,
            self.weighted_spot.address,
        ]
    }
}

/// An immutable proposal record. Lifetime spans a full control loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub base_currency: Address,
    pub base_company: Address,
    pub yes_currency: Address,
    pub no_currency: Address,
    pub yes_company: Address,
    pub no_company: Address,
    pub pools: PoolSet,
    /// Opaque identifier, often the on-chain proposal object's address.
    pub proposal_id: String,
}

impl Proposal {
    /// Six token addresses in a fixed order, for distinctness/membership checks.
    pub fn tokens(&self) -> [Address; 6] {
        [
            self.base_currency,
            self.base_company,
            self.yes_currency,
            self.no_currency,
            self.yes_company,
            self.no_company,
        ]
    }

    /// Checks that the six tokens are pairwise distinct and the five pool
    /// addresses are pairwise distinct. Does not inspect on-chain pool
    /// state; that is the Oracle's job.
    pub fn validate(&self) -> anyhow::Result<()> {
        let tokens = self.tokens();
        for i in 0..tokens.len() {
            for j in (i + 1)..tokens.len() {
                if tokens[i] == tokens[j] {
                    anyhow::bail!(
                        "proposal token addresses must be pairwise distinct, found duplicate {:?}",
                        tokens[i]
                    );
                }
            }
        }

        let pools = self.pools.addresses();
        for i in 0..pools.len() {
            for j in (i + 1)..pools.len() {
                if pools[i] == pools[j] {
                    anyhow::bail!(
                        "proposal pool addresses must be pairwise distinct, found duplicate {:?}",
                        pools[i]
                    );
                }
            }
        }

        Ok(())
    }
}

/// Executor contract flavor; determines the ABI method selected for a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorFlavor {
    FutarchyV5,
    PredictionV1,
    PnkVariant,
}

impl fmt::Display for ExecutorFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorFlavor::FutarchyV5 => write!(f, "futarchy_v5"),
            ExecutorFlavor::PredictionV1 => write!(f, "prediction_v1"),
            ExecutorFlavor::PnkVariant => write!(f, "pnk_variant"),
        }
    }
}

/// The deployed executor contract and the account authorised for privileged calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorDescriptor {
    pub address: Address,
    pub flavor: ExecutorFlavor,
    /// The EOA authorised to invoke privileged methods (withdraw/sweep).
    pub owner_wallet: Address,
}

/// One pool's observed price for one tick. Discarded after the tick.
#[derive(Debug, Clone, Copy)]
pub struct PriceSample {
    pub pool_id: Address,
    pub price: Price,
    pub base_token: Address,
    pub quote_token: Address,
    pub block_number: u64,
    pub observed_at: DateTime<Utc>,
}

/// Which conditional leg is cheaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheaperLeg {
    Yes,
    No,
}

impl fmt::Display for CheaperLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheaperLeg::Yes => write!(f, "yes"),
            CheaperLeg::No => write!(f, "no"),
        }
    }
}

/// Flow direction: BUY buys conditionals cheaply and sells the composite
/// expensively on spot; SELL is the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flow {
    Buy,
    Sell,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Buy => write!(f, "buy"),
            Flow::Sell => write!(f, "sell"),
        }
    }
}

/// The detector's tagged-sum verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    None,
    Buy(CheaperLeg),
    Sell(CheaperLeg),
}

impl Verdict {
    pub fn is_opportunity(&self) -> bool {
        !matches!(self, Verdict::None)
    }

    pub fn flow(&self) -> Option<Flow> {
        match self {
            Verdict::None => None,
            Verdict::Buy(_) => Some(Flow::Buy),
            Verdict::Sell(_) => Some(Flow::Sell),
        }
    }

    pub fn cheaper(&self) -> Option<CheaperLeg> {
        match self {
            Verdict::None => None,
            Verdict::Buy(c) | Verdict::Sell(c) => Some(*c),
        }
    }
}

/// Token label used to key a balance snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenLabel {
    BaseCurrency,
    BaseCompany,
    YesCurrency,
    NoCurrency,
    YesCompany,
    NoCompany,
}

impl TokenLabel {
    pub const ALL: [TokenLabel; 6] = [
        TokenLabel::BaseCurrency,
        TokenLabel::BaseCompany,
        TokenLabel::YesCurrency,
        TokenLabel::NoCurrency,
        TokenLabel::YesCompany,
        TokenLabel::NoCompany,
    ];
}

impl fmt::Display for TokenLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenLabel::BaseCurrency => "base_currency",
            TokenLabel::BaseCompany => "base_company",
            TokenLabel::YesCurrency => "yes_currency",
            TokenLabel::NoCurrency => "no_currency",
            TokenLabel::YesCompany => "yes_company",
            TokenLabel::NoCompany => "no_company",
        };
        write!(f, "{s}")
    }
}

/// Which holder a balance snapshot was taken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holder {
    Wallet,
    Executor,
}

/// A point-in-time balance reading across the six proposal tokens for one holder.
#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    pub holder: Holder,
    pub block_number: u64,
    pub balances: BTreeMap<TokenLabel, U256>,
}

impl BalanceSnapshot {
    pub fn get(&self, label: TokenLabel) -> U256 {
        self.balances.get(&label).copied().unwrap_or_default()
    }
}

/// A decimal quantity plus its underlying token's decimals, used to convert
/// between human-readable amounts and raw base-unit `U256` quantities.
#[derive(Debug, Clone, Copy)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn from_decimal(amount: Decimal, decimals: u8) -> Self {
        let scale = Decimal::from(10u64.pow(decimals as u32));
        let scaled = (amount * scale).trunc();
        let raw = U256::from_str_radix(&scaled.to_string(), 10).unwrap_or(U256::ZERO);
        Self { raw, decimals }
    }

    pub fn as_decimal(&self) -> Decimal {
        let divisor = Decimal::from(10u64.pow(self.decimals as u32));
        Decimal::from_str_exact(&self.raw.to_string()).unwrap_or(Decimal::ZERO) / divisor
    }
}

/// Forced flow override, parsed from `--force-flow buy|sell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForcedFlow {
    Buy,
    Sell,
}

impl From<ForcedFlow> for Flow {
    fn from(f: ForcedFlow) -> Flow {
        match f {
            ForcedFlow::Buy => Flow::Buy,
            ForcedFlow::Sell => Flow::Sell,
        }
    }
}

/// Bot "flavor" selection, mirrors `--bot-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotType {
    Balancer,
    Kleros,
    Pnk,
    Prediction,
}

impl BotType {
    pub fn executor_flavor(&self) -> ExecutorFlavor {
        match self {
            BotType::Balancer | BotType::Kleros => ExecutorFlavor::FutarchyV5,
            BotType::Pnk => ExecutorFlavor::PnkVariant,
            BotType::Prediction => ExecutorFlavor::PredictionV1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = byte;
        Address::from(bytes)
    }

    fn sample_pools() -> PoolSet {
        PoolSet {
            swapr_yes: PoolDescriptor::new(addr(10), PoolFamily::Concentrated, 0),
            swapr_no: PoolDescriptor::new(addr(11), PoolFamily::Concentrated, 0),
            swapr_pred_yes: PoolDescriptor::new(addr(12), PoolFamily::Concentrated, 0),
            swapr_pred_no: PoolDescriptor::new(addr(13), PoolFamily::Concentrated, 0),
            weighted_spot: PoolDescriptor::new(addr(14), PoolFamily::Weighted, 0),
        }
    }

    fn sample_proposal() -> Proposal {
        Proposal {
            base_currency: addr(1),
            base_company: addr(2),
            yes_currency: addr(3),
            no_currency: addr(4),
            yes_company: addr(5),
            no_company: addr(6),
            pools: sample_pools(),
            proposal_id: "0xproposal".to_string(),
        }
    }

    #[test]
    fn validate_accepts_distinct_addresses() {
        assert!(sample_proposal().validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_tokens() {
        let mut p = sample_proposal();
        p.no_company = p.base_currency;
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_pools() {
        let mut p = sample_proposal();
        p.pools.swapr_no.address = p.pools.swapr_yes.address;
        assert!(p.validate().is_err());
    }

    #[test]
    fn verdict_projects_flow_and_cheaper() {
        let v = Verdict::Buy(CheaperLeg::Yes);
        assert_eq!(v.flow(), Some(Flow::Buy));
        assert_eq!(v.cheaper(), Some(CheaperLeg::Yes));
        assert!(Verdict::None.flow().is_none());
    }

    #[test]
    fn token_amount_round_trips_decimal() {
        let amount = TokenAmount::from_decimal(Decimal::new(150, 2), 18); // 1.50
        assert_eq!(amount.as_decimal(), Decimal::new(150, 2));
    }
}

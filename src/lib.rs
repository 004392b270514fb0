//! Futarchy Arbitrage Bot
//!
//! Cross-venue arbitrage between a conditional-token prediction market's
//! four conditional legs and the underlying spot market, for futarchy
//! governance proposals.
//!
//! Author: AI-Generated
//! Created: 2026-01-28

pub mod accountant;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod controller;
pub mod detector;
pub mod error;
pub mod executor;
pub mod gas;
pub mod oracle;
pub mod types;
pub mod wallet;

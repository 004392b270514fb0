//! Signing wallet construction.
//!
//! Wraps `alloy`'s local signer. Supports a private-key hex string or, for
//! the optional derivation-linked wallet, a mnemonic plus derivation path —
//! only the resulting address is ever logged, never key material.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::primitives::Address;
use alloy::signers::local::{LocalSigner, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::local::coins_bip39::English;
use tracing::info;

use crate::error::ArbError;

/// A derivation-linked wallet: the address is computed from (master key,
/// path); the key is never logged.
pub fn from_mnemonic(mnemonic: &str, derivation_path: &str) -> Result<PrivateKeySigner, ArbError> {
    let signer: LocalSigner<_> = MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .derivation_path(derivation_path)
        .map_err(|e| ArbError::SignerUnavailable(format!("invalid derivation path: {e}")))?
        .build()
        .map_err(|e| ArbError::SignerUnavailable(format!("mnemonic derivation failed: {e}")))?;

    info!(address = %signer.address(), path = derivation_path, "derivation-linked wallet resolved");
    Ok(signer)
}

/// A wallet from a raw private key hex string (with or without `0x` prefix).
pub fn from_private_key(private_key_hex: &str) -> Result<PrivateKeySigner, ArbError> {
    let trimmed = private_key_hex.trim_start_matches("0x");
    trimmed
        .parse::<PrivateKeySigner>()
        .map_err(|e| ArbError::SignerUnavailable(format!("invalid private key: {e}")))
}

/// The address a signer would sign transactions from, safe to log.
pub fn address_of(signer: &PrivateKeySigner) -> Address {
    signer.address()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_private_key() {
        let result = from_private_key("not-a-key");
        assert!(result.is_err());
    }

    #[test]
    fn accepts_0x_prefixed_private_key() {
        let key = "0x0000000000000000000000000000000000000000000000000000000000000a";
        assert!(from_private_key(key).is_ok());
    }
}

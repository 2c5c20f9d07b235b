use crate::domain::error::{SwapError, SwapResult};
use ethers::core::types::Address;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WALLET_ADDRESS: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
}

/// Accepts only `0x` followed by exactly 40 hex digits. Checksums are not
/// enforced, matching what wallets hand to the front end.
pub fn validate_wallet_address(raw: Option<&str>) -> SwapResult<Address> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(SwapError::validation("Wallet address is required")),
    };
    if !WALLET_ADDRESS.is_match(raw) {
        return Err(SwapError::validation("Invalid wallet address format"));
    }
    raw.parse::<Address>()
        .map_err(|_| SwapError::validation("Invalid wallet address format"))
}

pub fn validate_slippage_bps(bps: u32) -> SwapResult<u32> {
    if bps > 10_000 {
        return Err(SwapError::validation(format!(
            "slippageBps must be between 0 and 10000, got {bps}"
        )));
    }
    Ok(bps)
}

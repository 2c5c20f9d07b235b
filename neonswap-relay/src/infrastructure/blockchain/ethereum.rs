use crate::domain::error::{SwapError, SwapResult};
use ethers::core::types::{Address, U256};

/// Returns `None` for input that is empty, unparsable, not strictly
/// positive or more precise than `decimals`; callers decide whether that is
/// an error.
pub fn parse_positive_amount(amount: &str, decimals: u8) -> Option<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || fraction_digits(trimmed) > decimals as usize {
        return None;
    }
    let parsed: U256 = ethers::utils::parse_units(trimmed, decimals as u32).ok()?.into();
    if parsed.is_zero() {
        None
    } else {
        Some(parsed)
    }
}

/// Cheap pre-check that needs no decimals, so empty or non-positive input
/// never reaches the chain.
pub fn is_positive_decimal(amount: &str) -> bool {
    matches!(amount.trim().parse::<f64>(), Ok(v) if v.is_finite() && v > 0.0)
}

fn fraction_digits(amount: &str) -> usize {
    amount.split_once('.').map_or(0, |(_, frac)| frac.len())
}

/// Like [`parse_positive_amount`] but reports why the amount was refused.
pub fn parse_amount(amount: &str, decimals: u8) -> SwapResult<U256> {
    if fraction_digits(amount.trim()) > decimals as usize {
        return Err(SwapError::invalid_amount(format!(
            "'{amount}' has more than {decimals} decimal places"
        )));
    }
    parse_positive_amount(amount, decimals).ok_or_else(|| {
        SwapError::invalid_amount(format!("'{amount}' is not a positive decimal amount"))
    })
}

/// Renders integer units as a decimal string: trailing zeros are trimmed but
/// one fractional digit is always kept (`10.0`, `0.25`).
pub fn format_amount(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let full = match ethers::utils::format_units(value, decimals as u32) {
        Ok(s) => s,
        Err(_) => return value.to_string(),
    };
    match full.split_once('.') {
        Some((int_part, frac_part)) => {
            let frac = frac_part.trim_end_matches('0');
            if frac.is_empty() {
                format!("{int_part}.0")
            } else {
                format!("{int_part}.{frac}")
            }
        }
        None => format!("{full}.0"),
    }
}

/// UI rendering of a balance: exactly `0` when empty, otherwise four
/// fractional digits.
pub fn display_balance(formatted: &str) -> String {
    match formatted.parse::<f64>() {
        Ok(v) if v == 0.0 => "0".to_string(),
        Ok(v) => format!("{v:.4}"),
        Err(_) => "0".to_string(),
    }
}

pub fn short_address(address: &Address) -> String {
    let full = format!("{address:?}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Slippage floor: `quoted * (10000 - bps) / 10000`, rounded down.
pub fn min_amount_out(quoted: U256, slippage_bps: u32) -> SwapResult<U256> {
    if slippage_bps > 10_000 {
        return Err(SwapError::validation(format!(
            "slippage of {slippage_bps} bps exceeds 10000"
        )));
    }
    let keep = U256::from(10_000u32 - slippage_bps);
    let scaled = quoted
        .checked_mul(keep)
        .ok_or_else(|| SwapError::invalid_amount("quoted amount overflows slippage math"))?;
    Ok(scaled / U256::from(10_000u32))
}

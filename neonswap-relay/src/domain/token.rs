//! Token registry for the swap core
//!
//! The set of tradable tokens is fixed at startup. The native coin never
//! appears in a router path directly; it is represented there by the
//! configured wrapped-native contract.

use crate::domain::error::{SwapError, SwapResult};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSymbol {
    #[serde(rename = "NEON")]
    Neon,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDTi", alias = "USDT")]
    Usdt,
}

impl TokenSymbol {
    pub const ALL: [TokenSymbol; 3] = [TokenSymbol::Neon, TokenSymbol::Usdc, TokenSymbol::Usdt];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSymbol::Neon => "NEON",
            TokenSymbol::Usdc => "USDC",
            TokenSymbol::Usdt => "USDTi",
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, TokenSymbol::Neon)
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenSymbol {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEON" => Ok(TokenSymbol::Neon),
            "USDC" => Ok(TokenSymbol::Usdc),
            "USDTI" | "USDT" => Ok(TokenSymbol::Usdt),
            _ => Err(SwapError::UnknownToken(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: TokenSymbol,
    pub address: Address,
    pub decimals: u8,
}

/// Address and precision a token trades under in a router path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedToken {
    pub address: Address,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: HashMap<TokenSymbol, TokenInfo>,
    wrapped_native: Option<Address>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>, wrapped_native: Option<Address>) -> Self {
        Self {
            tokens: tokens.into_iter().map(|t| (t.symbol, t)).collect(),
            wrapped_native,
        }
    }

    pub fn get(&self, symbol: TokenSymbol) -> SwapResult<&TokenInfo> {
        self.tokens
            .get(&symbol)
            .ok_or_else(|| SwapError::UnknownToken(symbol.to_string()))
    }

    pub fn wrapped_native(&self) -> SwapResult<Address> {
        match self.wrapped_native {
            Some(address) if !address.is_zero() => Ok(address),
            _ => Err(SwapError::configuration(
                "Wrapped native token address is not configured",
            )),
        }
    }

    /// Static resolution: the native symbol maps to wrapped native at 18
    /// decimals, ERC-20s to their registered address and decimals.
    pub fn resolve(&self, symbol: TokenSymbol) -> SwapResult<ResolvedToken> {
        let token = self.get(symbol)?;
        if symbol.is_native() {
            return Ok(ResolvedToken {
                address: self.wrapped_native()?,
                decimals: NATIVE_DECIMALS,
            });
        }
        Ok(ResolvedToken {
            address: token.address,
            decimals: token.decimals,
        })
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenInfo> {
        TokenSymbol::ALL.iter().filter_map(|s| self.tokens.get(s))
    }
}

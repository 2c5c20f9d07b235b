use crate::domain::error::{SwapError, SwapResult};
use crate::domain::token::{TokenInfo, TokenRegistry, TokenSymbol, NATIVE_DECIMALS};
use anyhow::{anyhow, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const NEON_MAINNET_CHAIN_ID: u64 = 245022934;
pub const NATIVE_CURRENCY_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcEndpoint {
    pub label: String,
    pub url: String,
}

impl RpcEndpoint {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: TokenSymbol,
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub log_level: String,
    pub log_directory: Option<String>,
    pub chain_id: u64,
    pub chain_name: String,
    pub explorer_tx_url: String,
    pub rpc_endpoints: Vec<RpcEndpoint>,
    pub router_address: String,
    pub wrapped_native_address: String,
    pub tokens: Vec<TokenConfig>,
    pub data_dir: String,
    #[serde(skip)]
    pub wallet_private_key: Option<String>,
    pub balance_timeout_secs: u64,
    pub rpc_timeout_secs: u64,
    pub approval_timeout_secs: u64,
    pub balance_poll_secs: u64,
    pub default_slippage_bps: u32,
    pub legacy_transactions: bool,
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 4000,
            log_level: "info".to_string(),
            log_directory: None,
            chain_id: NEON_MAINNET_CHAIN_ID,
            chain_name: "Neon EVM Mainnet".to_string(),
            explorer_tx_url: "https://neon.blockscout.com/tx/".to_string(),
            rpc_endpoints: vec![
                RpcEndpoint::new("Everstake", "https://neon-mainnet.everstake.one"),
                RpcEndpoint::new("P2P.org", "https://neon-proxy-mainnet.solana.p2p.org"),
                RpcEndpoint::new("DRPC", "https://neon.drpc.org"),
            ],
            router_address: "0xBb5e1777A331ED93E07cF043363e48d320eb96c4".to_string(),
            wrapped_native_address: "0x202C35e517Fa803B537565c40F0a6965D7204609".to_string(),
            tokens: vec![
                TokenConfig {
                    symbol: TokenSymbol::Neon,
                    address: NATIVE_CURRENCY_ADDRESS.to_string(),
                    decimals: NATIVE_DECIMALS,
                },
                TokenConfig {
                    symbol: TokenSymbol::Usdc,
                    address: "0xEA6B04272f9f62F997F666F07D3a974134f7FFb9".to_string(),
                    decimals: 18,
                },
                TokenConfig {
                    symbol: TokenSymbol::Usdt,
                    address: "0xc0E49f8C615d3d4c245970F6Dc528E4A47d69a44".to_string(),
                    decimals: 18,
                },
            ],
            data_dir: "./data".to_string(),
            wallet_private_key: None,
            balance_timeout_secs: 10,
            rpc_timeout_secs: 10,
            approval_timeout_secs: 120,
            balance_poll_secs: 30,
            default_slippage_bps: 50,
            legacy_transactions: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let config_file = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        let mut config = if Path::new(&config_file).exists() {
            Self::load_from_file(&config_file)?
        } else {
            Self::from_lookup(|key| env::var(key).ok())?
        };

        // the key is only ever taken from the environment
        if config.wallet_private_key.is_none() {
            config.wallet_private_key = env::var("WALLET_PRIVATE_KEY").ok().filter(|k| !k.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(file_path, data)?;
        Ok(())
    }

    /// Build a configuration from an environment-like lookup, falling back to
    /// the Neon mainnet defaults for anything unset or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let rpc_endpoints = match get("RPC_URLS") {
            Some(raw) => Self::parse_rpc_urls(&raw)?,
            None => defaults.rpc_endpoints.clone(),
        };

        let mut tokens = defaults.tokens.clone();
        for token in tokens.iter_mut() {
            let key = match token.symbol {
                TokenSymbol::Neon => continue,
                TokenSymbol::Usdc => "USDC_ADDRESS",
                TokenSymbol::Usdt => "USDT_ADDRESS",
            };
            if let Some(address) = get(key) {
                Self::ensure_hex_address(key, &address)?;
                token.address = address;
            }
        }

        let router_address = match get("ROUTER_ADDRESS") {
            Some(address) => {
                Self::ensure_hex_address("ROUTER_ADDRESS", &address)?;
                address
            }
            None => defaults.router_address.clone(),
        };

        // an explicitly empty value disables native swaps
        let wrapped_native_address = match lookup("WRAPPED_NATIVE_ADDRESS") {
            Some(address) if address.trim().is_empty() => String::new(),
            Some(address) => {
                Self::ensure_hex_address("WRAPPED_NATIVE_ADDRESS", &address)?;
                address
            }
            None => defaults.wrapped_native_address.clone(),
        };

        Ok(Self {
            environment: get("RUST_ENV").unwrap_or(defaults.environment),
            port: Self::parse_or("PORT", get("PORT"), defaults.port)?,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_directory: get("LOG_DIR"),
            chain_id: Self::parse_or("CHAIN_ID", get("CHAIN_ID"), defaults.chain_id)?,
            chain_name: get("CHAIN_NAME").unwrap_or(defaults.chain_name),
            explorer_tx_url: get("EXPLORER_TX_URL").unwrap_or(defaults.explorer_tx_url),
            rpc_endpoints,
            router_address,
            wrapped_native_address,
            tokens,
            data_dir: get("DATA_DIR").unwrap_or(defaults.data_dir),
            wallet_private_key: get("WALLET_PRIVATE_KEY"),
            balance_timeout_secs: Self::parse_or(
                "BALANCE_TIMEOUT_SECS",
                get("BALANCE_TIMEOUT_SECS"),
                defaults.balance_timeout_secs,
            )?,
            rpc_timeout_secs: Self::parse_or("RPC_TIMEOUT_SECS", get("RPC_TIMEOUT_SECS"), defaults.rpc_timeout_secs)?,
            approval_timeout_secs: Self::parse_or(
                "APPROVAL_TIMEOUT_SECS",
                get("APPROVAL_TIMEOUT_SECS"),
                defaults.approval_timeout_secs,
            )?,
            balance_poll_secs: Self::parse_or(
                "BALANCE_POLL_SECS",
                get("BALANCE_POLL_SECS"),
                defaults.balance_poll_secs,
            )?,
            default_slippage_bps: Self::parse_or(
                "DEFAULT_SLIPPAGE_BPS",
                get("DEFAULT_SLIPPAGE_BPS"),
                defaults.default_slippage_bps,
            )?,
            legacy_transactions: Self::parse_or(
                "LEGACY_TRANSACTIONS",
                get("LEGACY_TRANSACTIONS"),
                defaults.legacy_transactions,
            )?,
            version: defaults.version,
        })
    }

    fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, fallback: T) -> Result<T> {
        match value {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|_| anyhow!("Invalid value for {}: '{}'", key, raw)),
            None => Ok(fallback),
        }
    }

    /// Parses `label=url` pairs or bare URLs separated by commas.
    pub fn parse_rpc_urls(raw: &str) -> Result<Vec<RpcEndpoint>> {
        let endpoints: Vec<RpcEndpoint> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .enumerate()
            .map(|(i, entry)| match entry.split_once('=') {
                Some((label, url)) if !label.contains("://") => {
                    RpcEndpoint::new(label.trim(), url.trim())
                }
                _ => RpcEndpoint::new(format!("RPC {}", i + 1), entry),
            })
            .collect();

        if endpoints.is_empty() {
            return Err(anyhow!("RPC_URLS is set but contains no endpoints"));
        }
        for endpoint in &endpoints {
            if !(endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://")) {
                return Err(anyhow!(
                    "Invalid RPC URL for {}: '{}'. Expected an http(s) URL",
                    endpoint.label,
                    endpoint.url
                ));
            }
        }
        Ok(endpoints)
    }

    /// Validates if a string is a valid hex address (0x followed by 40 hex characters)
    pub fn is_valid_hex_address(address: &str) -> bool {
        if !address.starts_with("0x") {
            return false;
        }

        let hex_part = &address[2..];
        if hex_part.len() != 40 {
            return false;
        }

        hex_part.chars().all(|c| c.is_ascii_hexdigit())
    }

    fn ensure_hex_address(key: &str, address: &str) -> Result<()> {
        if !Self::is_valid_hex_address(address) {
            return Err(anyhow!(
                "Invalid {}: '{}'. Expected format: 0x followed by 40 hex characters",
                key,
                address
            ));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_endpoints.is_empty() {
            return Err(anyhow!("At least one RPC endpoint is required"));
        }
        for endpoint in &self.rpc_endpoints {
            if endpoint.url.is_empty() {
                return Err(anyhow!("RPC URL is required for endpoint {}", endpoint.label));
            }
        }

        Self::ensure_hex_address("router address", &self.router_address)?;
        if !self.wrapped_native_address.is_empty() {
            Self::ensure_hex_address("wrapped native address", &self.wrapped_native_address)?;
        }
        for token in &self.tokens {
            Self::ensure_hex_address(&format!("{} address", token.symbol), &token.address)?;
        }

        if self.default_slippage_bps > 10_000 {
            return Err(anyhow!(
                "DEFAULT_SLIPPAGE_BPS must be at most 10000, got {}",
                self.default_slippage_bps
            ));
        }
        for (key, secs) in [
            ("BALANCE_TIMEOUT_SECS", self.balance_timeout_secs),
            ("RPC_TIMEOUT_SECS", self.rpc_timeout_secs),
            ("APPROVAL_TIMEOUT_SECS", self.approval_timeout_secs),
        ] {
            if secs == 0 {
                return Err(anyhow!("{} must be greater than zero", key));
            }
        }

        if self.environment == "production" && self.wallet_private_key.is_none() {
            tracing::warn!("No WALLET_PRIVATE_KEY configured; swap execution is disabled");
        }

        Ok(())
    }

    pub fn router(&self) -> SwapResult<Address> {
        self.router_address
            .parse::<Address>()
            .map_err(|e| SwapError::configuration(format!("Invalid router address: {e}")))
    }

    pub fn token_registry(&self) -> SwapResult<TokenRegistry> {
        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let address = token.address.parse::<Address>().map_err(|e| {
                SwapError::configuration(format!("Invalid address for {}: {e}", token.symbol))
            })?;
            tokens.push(TokenInfo {
                symbol: token.symbol,
                address,
                decimals: token.decimals,
            });
        }

        let wrapped_native = if self.wrapped_native_address.is_empty() {
            None
        } else {
            Some(self.wrapped_native_address.parse::<Address>().map_err(|e| {
                SwapError::configuration(format!("Invalid wrapped native address: {e}"))
            })?)
        };

        Ok(TokenRegistry::new(tokens, wrapped_native))
    }

    pub fn balance_timeout(&self) -> Duration {
        Duration::from_secs(self.balance_timeout_secs)
    }

    /// Limit for each quote, allowance and chain-id read.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_secs)
    }

    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_secs(self.balance_poll_secs)
    }

    pub fn explorer_link(&self, tx_hash: &str) -> String {
        format!("{}{}", self.explorer_tx_url, tx_hash)
    }

    /// Redacted view for logs and the config endpoint
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.environment,
            "chainId": self.chain_id,
            "chainName": self.chain_name,
            "rpcEndpoints": self.rpc_endpoints,
            "routerAddress": self.router_address,
            "wrappedNativeAddress": self.wrapped_native_address,
            "tokens": self.tokens,
            "walletConfigured": self.wallet_private_key.is_some(),
            "defaultSlippageBps": self.default_slippage_bps,
            "balanceTimeoutSecs": self.balance_timeout_secs,
            "rpcTimeoutSecs": self.rpc_timeout_secs,
            "approvalTimeoutSecs": self.approval_timeout_secs,
            "balancePollSecs": self.balance_poll_secs,
            "version": self.version,
        })
    }
}

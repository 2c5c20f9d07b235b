//! In-process chain fakes shared by the app-layer tests.

use crate::api::state::AppState;
use crate::domain::error::{SwapError, SwapResult};
use crate::domain::token::{TokenInfo, TokenRegistry, TokenSymbol};
use crate::infrastructure::blockchain::reader::{ChainReader, ReaderFactory};
use crate::infrastructure::blockchain::signer::SwapSigner;
use crate::infrastructure::config::{Config, RpcEndpoint, TokenConfig};
use crate::infrastructure::storage::preference_store::{MemoryPreferenceStore, PreferenceStore};
use async_trait::async_trait;
use ethers::core::types::{Address, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RPC_A: &str = "https://rpc-a.example";
pub const RPC_B: &str = "https://rpc-b.example";
pub const RPC_C: &str = "https://rpc-c.example";

pub fn wrapped_native() -> Address {
    Address::repeat_byte(0x20)
}

pub fn usdc() -> Address {
    Address::repeat_byte(0xea)
}

pub fn usdt() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn router() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn wallet() -> Address {
    "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6".parse().unwrap()
}

pub fn registry() -> Arc<TokenRegistry> {
    Arc::new(TokenRegistry::new(
        vec![
            TokenInfo { symbol: TokenSymbol::Neon, address: Address::zero(), decimals: 18 },
            TokenInfo { symbol: TokenSymbol::Usdc, address: usdc(), decimals: 18 },
            TokenInfo { symbol: TokenSymbol::Usdt, address: usdt(), decimals: 18 },
        ],
        Some(wrapped_native()),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Error,
    Hang,
}

/// Constant-product pools with the 0.3% fee of a V2 router.
pub struct FakeReader {
    pub url: String,
    pub failure: Failure,
    pub chain_id: u64,
    pub native: U256,
    pub balances: HashMap<Address, U256>,
    pub decimals: HashMap<Address, u8>,
    pub allowance: U256,
    pub reserves: HashMap<(Address, Address), (U256, U256)>,
    pub decimals_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,
}

impl FakeReader {
    pub fn healthy(url: &str) -> Self {
        let e18 = U256::exp10(18);
        let mut reserves = HashMap::new();
        // 1 NEON ~ 0.25 USDC
        reserves.insert(
            (wrapped_native(), usdc()),
            (U256::from(4_000_000u64) * e18, U256::from(1_000_000u64) * e18),
        );
        reserves.insert(
            (usdc(), usdt()),
            (U256::from(500_000u64) * e18, U256::from(500_000u64) * e18),
        );
        reserves.insert(
            (wrapped_native(), usdt()),
            (U256::from(2_000_000u64) * e18, U256::from(500_000u64) * e18),
        );

        Self {
            url: url.to_string(),
            failure: Failure::None,
            chain_id: 245022934,
            native: U256::from(3u64) * e18 / 2u64,
            balances: HashMap::from([(usdc(), U256::from(25u64) * e18), (usdt(), U256::zero())]),
            decimals: HashMap::from([(usdc(), 18), (usdt(), 18)]),
            allowance: U256::zero(),
            reserves,
            decimals_calls: AtomicUsize::new(0),
            quote_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(url: &str) -> Self {
        Self { failure: Failure::Error, ..Self::healthy(url) }
    }

    pub fn hanging(url: &str) -> Self {
        Self { failure: Failure::Hang, ..Self::healthy(url) }
    }

    async fn check(&self) -> SwapResult<()> {
        match self.failure {
            Failure::None => Ok(()),
            Failure::Error => Err(SwapError::upstream(&self.url, "connection refused")),
            Failure::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    fn pool(&self, a: Address, b: Address) -> SwapResult<(U256, U256)> {
        if let Some((ra, rb)) = self.reserves.get(&(a, b)) {
            return Ok((*ra, *rb));
        }
        if let Some((rb, ra)) = self.reserves.get(&(b, a)) {
            return Ok((*ra, *rb));
        }
        Err(SwapError::upstream(&self.url, "execution reverted: INSUFFICIENT_LIQUIDITY"))
    }
}

#[async_trait]
impl ChainReader for FakeReader {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> SwapResult<u64> {
        self.check().await?;
        Ok(self.chain_id)
    }

    async fn native_balance(&self, _owner: Address) -> SwapResult<U256> {
        self.check().await?;
        Ok(self.native)
    }

    async fn token_balance(&self, token: Address, _owner: Address) -> SwapResult<U256> {
        self.check().await?;
        Ok(self.balances.get(&token).copied().unwrap_or_default())
    }

    async fn token_decimals(&self, token: Address) -> SwapResult<u8> {
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        self.decimals
            .get(&token)
            .copied()
            .ok_or_else(|| SwapError::upstream(&self.url, "execution reverted"))
    }

    async fn allowance(&self, _token: Address, _owner: Address, _spender: Address) -> SwapResult<U256> {
        self.check().await?;
        Ok(self.allowance)
    }

    async fn amounts_out(&self, amount_in: U256, path: Vec<Address>) -> SwapResult<Vec<U256>> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        let (reserve_in, reserve_out) = self.pool(path[0], path[1])?;
        let amount_in_with_fee = amount_in * 997u64;
        let out = amount_in_with_fee * reserve_out / (reserve_in * 1000u64 + amount_in_with_fee);
        Ok(vec![amount_in, out])
    }

    async fn amounts_in(&self, amount_out: U256, path: Vec<Address>) -> SwapResult<Vec<U256>> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        let (reserve_in, reserve_out) = self.pool(path[0], path[1])?;
        if amount_out >= reserve_out {
            return Err(SwapError::upstream(&self.url, "execution reverted: INSUFFICIENT_LIQUIDITY"));
        }
        let numerator = reserve_in * amount_out * 1000u64;
        let denominator = (reserve_out - amount_out) * 997u64;
        Ok(vec![numerator / denominator + 1u64, amount_out])
    }
}

/// Hands out scripted readers and records every URL it was asked for.
pub struct FakeFactory {
    failing: HashSet<String>,
    hanging: HashSet<String>,
    pub connects: Mutex<Vec<String>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            hanging: HashSet::new(),
            connects: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, urls: &[&str]) -> Self {
        self.failing.extend(urls.iter().map(|u| u.to_string()));
        self
    }

    pub fn hanging(mut self, urls: &[&str]) -> Self {
        self.hanging.extend(urls.iter().map(|u| u.to_string()));
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

impl ReaderFactory for FakeFactory {
    fn connect(&self, url: &str) -> SwapResult<Arc<dyn ChainReader>> {
        self.connects.lock().unwrap().push(url.to_string());
        let reader = if self.failing.contains(url) {
            FakeReader::failing(url)
        } else if self.hanging.contains(url) {
            FakeReader::hanging(url)
        } else {
            FakeReader::healthy(url)
        };
        Ok(Arc::new(reader))
    }
}

/// Handler state wired to the fakes: three endpoints, tokens at the fake
/// addresses, preferences kept in memory.
pub fn app_state(factory: Arc<FakeFactory>, signer: Option<Arc<dyn SwapSigner>>) -> Arc<AppState> {
    app_state_with_store(factory, signer, Arc::new(MemoryPreferenceStore::new()))
}

pub fn app_state_with_store(
    factory: Arc<FakeFactory>,
    signer: Option<Arc<dyn SwapSigner>>,
    store: Arc<dyn PreferenceStore>,
) -> Arc<AppState> {
    let hex = |address: Address| format!("{address:?}");
    let config = Config {
        rpc_endpoints: vec![
            RpcEndpoint::new("A", RPC_A),
            RpcEndpoint::new("B", RPC_B),
            RpcEndpoint::new("C", RPC_C),
        ],
        router_address: hex(router()),
        wrapped_native_address: hex(wrapped_native()),
        tokens: vec![
            TokenConfig { symbol: TokenSymbol::Neon, address: hex(Address::zero()), decimals: 18 },
            TokenConfig { symbol: TokenSymbol::Usdc, address: hex(usdc()), decimals: 18 },
            TokenConfig { symbol: TokenSymbol::Usdt, address: hex(usdt()), decimals: 18 },
        ],
        ..Config::default()
    };
    let state = AppState::build(config, store, factory, move |_url| Ok(signer.clone())).unwrap();
    Arc::new(state)
}

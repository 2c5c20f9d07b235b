use crate::domain::error::{SwapError, SwapResult};
use crate::infrastructure::blockchain::contracts::{Erc20, SwapRouter};
use async_trait::async_trait;
use ethers::{
    core::types::{Address, U256},
    middleware::Middleware,
    providers::{Http, Provider},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Read-only view of the chain: everything quoting and balance fetching
/// needs, nothing that requires a signer.
#[async_trait]
pub trait ChainReader: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn chain_id(&self) -> SwapResult<u64>;

    async fn native_balance(&self, owner: Address) -> SwapResult<U256>;

    async fn token_balance(&self, token: Address, owner: Address) -> SwapResult<U256>;

    async fn token_decimals(&self, token: Address) -> SwapResult<u8>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> SwapResult<U256>;

    async fn amounts_out(&self, amount_in: U256, path: Vec<Address>) -> SwapResult<Vec<U256>>;

    async fn amounts_in(&self, amount_out: U256, path: Vec<Address>) -> SwapResult<Vec<U256>>;
}

/// Opens a reader against a given RPC URL; the balance reader asks for one
/// per failover attempt.
pub trait ReaderFactory: Send + Sync {
    fn connect(&self, url: &str) -> SwapResult<Arc<dyn ChainReader>>;
}

/// Bounds one RPC call; an expired call counts as a failure of that endpoint.
pub async fn bounded<T>(
    timeout: Duration,
    endpoint: &str,
    call: impl Future<Output = SwapResult<T>>,
) -> SwapResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SwapError::Timeout {
            endpoint: endpoint.to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}

pub struct EthersReader {
    url: String,
    provider: Arc<Provider<Http>>,
    router: SwapRouter<Provider<Http>>,
}

impl EthersReader {
    pub fn new(url: &str, router: Address) -> SwapResult<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| SwapError::upstream(url, format!("Failed to create HTTP provider: {e}")))?;
        let provider = Arc::new(provider);
        Ok(Self {
            url: url.to_string(),
            router: SwapRouter::new(router, Arc::clone(&provider)),
            provider,
        })
    }

    fn erc20(&self, token: Address) -> Erc20<Provider<Http>> {
        Erc20::new(token, Arc::clone(&self.provider))
    }
}

#[async_trait]
impl ChainReader for EthersReader {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn chain_id(&self) -> SwapResult<u64> {
        let id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))?;
        Ok(id.as_u64())
    }

    async fn native_balance(&self, owner: Address) -> SwapResult<U256> {
        self.provider
            .get_balance(owner, None)
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> SwapResult<U256> {
        self.erc20(token)
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))
    }

    async fn token_decimals(&self, token: Address) -> SwapResult<u8> {
        self.erc20(token)
            .decimals()
            .call()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> SwapResult<U256> {
        self.erc20(token)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))
    }

    async fn amounts_out(&self, amount_in: U256, path: Vec<Address>) -> SwapResult<Vec<U256>> {
        self.router
            .get_amounts_out(amount_in, path)
            .call()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))
    }

    async fn amounts_in(&self, amount_out: U256, path: Vec<Address>) -> SwapResult<Vec<U256>> {
        self.router
            .get_amounts_in(amount_out, path)
            .call()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))
    }
}

pub struct HttpReaderFactory {
    router: Address,
}

impl HttpReaderFactory {
    pub fn new(router: Address) -> Self {
        Self { router }
    }
}

impl ReaderFactory for HttpReaderFactory {
    fn connect(&self, url: &str) -> SwapResult<Arc<dyn ChainReader>> {
        let reader = EthersReader::new(url, self.router)?;
        Ok(Arc::new(reader))
    }
}

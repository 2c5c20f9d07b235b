use crate::domain::error::{SwapError, SwapResult};
use crate::infrastructure::blockchain::contracts::{Erc20, SwapRouter};
use async_trait::async_trait;
use ethers::{
    abi::Detokenize,
    contract::ContractCall,
    core::types::{Address, H256, U256},
    middleware::{Middleware, SignerMiddleware},
    providers::{Http, Provider},
    signers::{LocalWallet, Signer},
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// State-changing capability: everything that needs the wallet's signature.
///
/// Swap methods return as soon as the transaction is accepted by the node;
/// only the approval waits for its receipt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Chain the wallet is currently connected to.
    async fn chain_id(&self) -> SwapResult<u64>;

    async fn approve_and_wait(&self, token: Address, spender: Address, amount: U256) -> SwapResult<H256>;

    async fn swap_exact_eth_for_tokens(
        &self,
        value: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> SwapResult<H256>;

    async fn swap_exact_tokens_for_eth(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> SwapResult<H256>;

    async fn swap_exact_tokens_for_tokens(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> SwapResult<H256>;
}

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct EthersSigner {
    url: String,
    address: Address,
    client: Arc<SignerClient>,
    router: SwapRouter<SignerClient>,
    legacy: bool,
    approval_timeout: Duration,
}

impl EthersSigner {
    pub fn new(
        url: &str,
        private_key: &str,
        chain_id: u64,
        router: Address,
        legacy: bool,
        approval_timeout: Duration,
    ) -> SwapResult<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| SwapError::upstream(url, format!("Failed to create HTTP provider: {e}")))?;
        let wallet = LocalWallet::from_str(private_key.trim_start_matches("0x"))
            .map_err(|e| SwapError::configuration(format!("Invalid wallet private key: {e}")))?
            .with_chain_id(chain_id);
        let address = wallet.address();
        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        Ok(Self {
            url: url.to_string(),
            address,
            router: SwapRouter::new(router, Arc::clone(&client)),
            client,
            legacy,
            approval_timeout,
        })
    }

    async fn submit<D>(&self, call: ContractCall<SignerClient, D>) -> SwapResult<H256>
    where
        D: Detokenize + Send + Sync,
    {
        let call = if self.legacy { call.legacy() } else { call };
        let pending = call
            .send()
            .await
            .map_err(|e| SwapError::from_signer(&self.url, e))?;
        Ok(pending.tx_hash())
    }
}

#[async_trait]
impl SwapSigner for EthersSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn chain_id(&self) -> SwapResult<u64> {
        let id = self
            .client
            .get_chainid()
            .await
            .map_err(|e| SwapError::upstream(&self.url, e))?;
        Ok(id.as_u64())
    }

    async fn approve_and_wait(&self, token: Address, spender: Address, amount: U256) -> SwapResult<H256> {
        let erc20 = Erc20::new(token, Arc::clone(&self.client));
        let call = erc20.approve(spender, amount);
        let call = if self.legacy { call.legacy() } else { call };
        let pending = call
            .send()
            .await
            .map_err(|e| SwapError::from_signer(&self.url, e))?;
        let tx_hash = pending.tx_hash();
        tracing::info!(tx_hash = ?tx_hash, token = ?token, "Approval submitted, waiting for confirmation");

        let receipt = tokio::time::timeout(self.approval_timeout, pending)
            .await
            .map_err(|_| SwapError::Timeout {
                endpoint: self.url.clone(),
                seconds: self.approval_timeout.as_secs(),
            })?
            .map_err(|e| SwapError::upstream(&self.url, e))?
            .ok_or_else(|| {
                SwapError::upstream(&self.url, format!("approval {tx_hash:?} was dropped before confirmation"))
            })?;
        if receipt.status == Some(0u64.into()) {
            return Err(SwapError::upstream(&self.url, format!("approval {tx_hash:?} reverted")));
        }
        Ok(tx_hash)
    }

    async fn swap_exact_eth_for_tokens(
        &self,
        value: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> SwapResult<H256> {
        let call = self
            .router
            .swap_exact_eth_for_tokens(amount_out_min, path, to, deadline)
            .value(value);
        self.submit(call).await
    }

    async fn swap_exact_tokens_for_eth(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> SwapResult<H256> {
        let call = self
            .router
            .swap_exact_tokens_for_eth(amount_in, amount_out_min, path, to, deadline);
        self.submit(call).await
    }

    async fn swap_exact_tokens_for_tokens(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        to: Address,
        deadline: U256,
    ) -> SwapResult<H256> {
        let call = self
            .router
            .swap_exact_tokens_for_tokens(amount_in, amount_out_min, path, to, deadline);
        self.submit(call).await
    }
}

use crate::app::balance_service::BalanceReader;
use crate::app::endpoint_selector::EndpointSelector;
use crate::app::quote_service::QuoteEngine;
use crate::app::swap_service::SwapExecutor;
use crate::domain::error::{SwapError, SwapResult};
use crate::infrastructure::blockchain::reader::ReaderFactory;
use crate::infrastructure::blockchain::signer::SwapSigner;
use crate::infrastructure::config::Config;
use crate::infrastructure::storage::preference_store::PreferenceStore;
use std::sync::Arc;

/// Everything the handlers share. One quote engine and one executor exist
/// per configured endpoint, indexed like the selector's list.
pub struct AppState {
    pub config: Arc<Config>,
    pub selector: Arc<EndpointSelector>,
    pub balances: Arc<BalanceReader>,
    executors: Vec<Arc<SwapExecutor>>,
}

impl AppState {
    /// `signer_for` is asked once per endpoint URL; `None` disables swaps
    /// through that endpoint.
    pub fn build<S>(
        config: Config,
        store: Arc<dyn PreferenceStore>,
        factory: Arc<dyn ReaderFactory>,
        signer_for: S,
    ) -> SwapResult<Self>
    where
        S: Fn(&str) -> SwapResult<Option<Arc<dyn SwapSigner>>>,
    {
        let registry = Arc::new(config.token_registry()?);
        let router = config.router()?;
        let selector = Arc::new(EndpointSelector::new(config.rpc_endpoints.clone(), store)?);
        let balances = Arc::new(BalanceReader::new(
            selector.urls(),
            Arc::clone(&factory),
            Arc::clone(&registry),
            config.balance_timeout(),
        )?);

        let mut executors = Vec::with_capacity(selector.len());
        for endpoint in selector.list() {
            let engine = Arc::new(QuoteEngine::new(
                factory.connect(&endpoint.url)?,
                Arc::clone(&registry),
                config.rpc_timeout(),
            ));
            let signer = signer_for(&endpoint.url)?;
            executors.push(Arc::new(SwapExecutor::new(
                engine,
                signer,
                router,
                config.chain_id,
                config.default_slippage_bps,
            )));
        }

        Ok(Self {
            config: Arc::new(config),
            selector,
            balances,
            executors,
        })
    }

    pub fn executor(&self, index: usize) -> SwapResult<&Arc<SwapExecutor>> {
        self.executors
            .get(index)
            .ok_or_else(|| SwapError::configuration(format!("No executor for RPC index {index}")))
    }

    pub fn engine(&self, index: usize) -> SwapResult<&Arc<QuoteEngine>> {
        Ok(self.executor(index)?.engine())
    }
}

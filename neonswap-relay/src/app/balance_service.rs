use crate::app::endpoint_selector::EndpointSelector;
use crate::app::quote_service::RequestSequencer;
use crate::domain::error::{SwapError, SwapResult};
use crate::domain::token::{TokenRegistry, TokenSymbol, NATIVE_DECIMALS};
use crate::infrastructure::blockchain::ethereum::{display_balance, format_amount};
use crate::infrastructure::blockchain::reader::{bounded, ChainReader, ReaderFactory};
use crate::validators::request_validator::validate_wallet_address;
use chrono::{DateTime, Utc};
use ethers::core::types::{Address, U256};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalance {
    pub symbol: TokenSymbol,
    pub raw: U256,
    pub decimals: u8,
    pub formatted: String,
}

impl TokenBalance {
    pub fn new(symbol: TokenSymbol, raw: U256, decimals: u8) -> Self {
        Self {
            symbol,
            raw,
            decimals,
            formatted: format_amount(raw, decimals),
        }
    }

    pub fn zero(symbol: TokenSymbol, decimals: u8) -> Self {
        Self::new(symbol, U256::zero(), decimals)
    }

    /// `0` for an empty balance, four fractional digits otherwise.
    pub fn display(&self) -> String {
        if self.raw.is_zero() {
            return "0".to_string();
        }
        display_balance(&self.formatted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Balances {
    pub native: TokenBalance,
    pub usdc: TokenBalance,
    pub usdt: TokenBalance,
}

impl Balances {
    pub fn zero(registry: &TokenRegistry) -> Self {
        let decimals = |symbol: TokenSymbol| {
            registry
                .get(symbol)
                .map(|t| t.decimals)
                .unwrap_or(NATIVE_DECIMALS)
        };
        Self {
            native: TokenBalance::zero(TokenSymbol::Neon, NATIVE_DECIMALS),
            usdc: TokenBalance::zero(TokenSymbol::Usdc, decimals(TokenSymbol::Usdc)),
            usdt: TokenBalance::zero(TokenSymbol::Usdt, decimals(TokenSymbol::Usdt)),
        }
    }
}

/// Reads balances with round-robin failover across every configured
/// endpoint, each tried at most once per call.
pub struct BalanceReader {
    endpoints: Vec<String>,
    factory: Arc<dyn ReaderFactory>,
    registry: Arc<TokenRegistry>,
    timeout: Duration,
}

impl BalanceReader {
    pub fn new(
        endpoints: Vec<String>,
        factory: Arc<dyn ReaderFactory>,
        registry: Arc<TokenRegistry>,
        timeout: Duration,
    ) -> SwapResult<Self> {
        if endpoints.is_empty() {
            return Err(SwapError::configuration("Balance reader needs at least one RPC endpoint"));
        }
        Ok(Self {
            endpoints,
            factory,
            registry,
            timeout,
        })
    }

    pub fn zero_balances(&self) -> Balances {
        Balances::zero(&self.registry)
    }

    fn start_index(&self, hint: Option<usize>) -> usize {
        hint.filter(|index| *index < self.endpoints.len()).unwrap_or(0)
    }

    pub async fn get_balances(&self, wallet: &str, hint: Option<usize>) -> SwapResult<Balances> {
        let owner = validate_wallet_address(Some(wallet))?;
        self.failover(self.start_index(hint), move |reader| {
            self.read_all(reader, owner).boxed()
        })
        .await
    }

    pub async fn get_token_balance(
        &self,
        wallet: &str,
        symbol: TokenSymbol,
        hint: Option<usize>,
    ) -> SwapResult<TokenBalance> {
        let owner = validate_wallet_address(Some(wallet))?;
        self.registry.get(symbol)?;
        self.failover(self.start_index(hint), move |reader| {
            self.read_token(reader, owner, symbol).boxed()
        })
        .await
    }

    async fn failover<'a, T, F>(&'a self, start: usize, op: F) -> SwapResult<T>
    where
        F: Fn(Arc<dyn ChainReader>) -> BoxFuture<'a, SwapResult<T>>,
    {
        let total = self.endpoints.len();
        let mut last_error = None;

        for attempt in 0..total {
            let index = (start + attempt) % total;
            let url = &self.endpoints[index];

            let result = match self.factory.connect(url) {
                Ok(reader) => op(reader).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(endpoint = %url, index, attempt = attempt + 1, "Balance fetched after failover");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        endpoint = %url,
                        index,
                        attempt = attempt + 1,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Balance fetch failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        tracing::error!(attempts = total, "All RPC endpoints failed to return balances");
        Err(SwapError::AllEndpointsFailed {
            attempts: total,
            last: Box::new(
                last_error.unwrap_or_else(|| SwapError::configuration("no RPC endpoints configured")),
            ),
        })
    }

    async fn read_all(&self, reader: Arc<dyn ChainReader>, owner: Address) -> SwapResult<Balances> {
        let (native, usdc, usdt) = futures::try_join!(
            self.read_token(Arc::clone(&reader), owner, TokenSymbol::Neon),
            self.read_token(Arc::clone(&reader), owner, TokenSymbol::Usdc),
            self.read_token(Arc::clone(&reader), owner, TokenSymbol::Usdt),
        )?;
        Ok(Balances { native, usdc, usdt })
    }

    async fn read_token(
        &self,
        reader: Arc<dyn ChainReader>,
        owner: Address,
        symbol: TokenSymbol,
    ) -> SwapResult<TokenBalance> {
        let endpoint = reader.endpoint();
        if symbol.is_native() {
            let raw = bounded(self.timeout, endpoint, reader.native_balance(owner)).await?;
            return Ok(TokenBalance::new(symbol, raw, NATIVE_DECIMALS));
        }

        let token = self.registry.get(symbol)?.address;
        let (raw, decimals) = futures::try_join!(
            bounded(self.timeout, endpoint, reader.token_balance(token, owner)),
            bounded(self.timeout, endpoint, reader.token_decimals(token)),
        )?;
        Ok(TokenBalance::new(symbol, raw, decimals))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BalanceState {
    pub balances: Option<Balances>,
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Background refresh of one wallet's balances.
///
/// Fetches immediately, then every `period` and whenever [`refresh`] is
/// called. Each fetch starts at the selector's preferred endpoint as it is at
/// that moment. Fetches may overlap; only the most recently started one is
/// published. Stopping or dropping the handle aborts the task and any fetch
/// still running, so nothing is published after the consumer is gone.
///
/// [`refresh`]: BalancePoller::refresh
pub struct BalancePoller {
    state: watch::Receiver<BalanceState>,
    refresh: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl BalancePoller {
    pub fn spawn(
        reader: Arc<BalanceReader>,
        selector: Arc<EndpointSelector>,
        wallet: String,
        period: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(BalanceState {
            loading: true,
            ..BalanceState::default()
        });
        let refresh = Arc::new(Notify::new());
        let wake = Arc::clone(&refresh);

        let handle = tokio::spawn(async move {
            let sequencer = RequestSequencer::new();
            let mut fetches = JoinSet::new();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = wake.notified() => {}
                    Some(done) = fetches.join_next() => {
                        let (ticket, result) = match done {
                            Ok(done) => done,
                            Err(e) => {
                                tracing::error!(wallet = %wallet, error = %e, "Balance fetch task failed");
                                continue;
                            }
                        };
                        if !sequencer.is_current(ticket) {
                            tracing::debug!(wallet = %wallet, "Dropping superseded balance fetch");
                            continue;
                        }
                        if tx.send(Self::next_state(&tx, &wallet, result)).is_err() {
                            break;
                        }
                        continue;
                    }
                }
                if tx.is_closed() {
                    break;
                }

                tx.send_modify(|state| state.loading = true);
                let ticket = sequencer.begin();
                let hint = Some(selector.current_index());
                let reader = Arc::clone(&reader);
                let wallet = wallet.clone();
                fetches.spawn(async move {
                    let result = if wallet.trim().is_empty() {
                        Ok(reader.zero_balances())
                    } else {
                        reader.get_balances(&wallet, hint).await
                    };
                    (ticket, result)
                });
            }
        });

        Self {
            state: rx,
            refresh,
            handle,
        }
    }

    /// A failed fetch keeps the last good balances next to the error.
    fn next_state(tx: &watch::Sender<BalanceState>, wallet: &str, result: SwapResult<Balances>) -> BalanceState {
        match result {
            Ok(balances) => BalanceState {
                balances: Some(balances),
                loading: false,
                error: None,
                updated_at: Some(Utc::now()),
            },
            Err(e) => {
                tracing::warn!(wallet = %wallet, error = %e, "Balance poll failed");
                BalanceState {
                    balances: tx.borrow().balances.clone(),
                    loading: false,
                    error: Some(e.to_string()),
                    updated_at: Some(Utc::now()),
                }
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceState> {
        self.state.clone()
    }

    pub fn current(&self) -> BalanceState {
        self.state.borrow().clone()
    }

    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for BalancePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

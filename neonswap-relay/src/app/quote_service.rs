use crate::domain::error::{SwapError, SwapResult};
use crate::domain::token::{ResolvedToken, TokenRegistry, TokenSymbol};
use crate::infrastructure::blockchain::ethereum::{format_amount, is_positive_decimal, parse_positive_amount};
use crate::infrastructure::blockchain::reader::{bounded, ChainReader};
use ethers::core::types::{Address, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount: U256,
    pub formatted: String,
}

impl Quote {
    pub fn new(amount: U256, decimals: u8) -> Self {
        Self {
            amount,
            formatted: format_amount(amount, decimals),
        }
    }
}

/// Router quotes bound to one RPC endpoint.
///
/// Token decimals are read on chain once per address and kept for the life
/// of the engine. Every read is limited to `timeout`. On-chain failures and
/// expired reads turn into "no quote"; only setup errors (unknown token,
/// missing wrapped-native address) are returned.
pub struct QuoteEngine {
    reader: Arc<dyn ChainReader>,
    registry: Arc<TokenRegistry>,
    decimals_cache: RwLock<HashMap<String, u8>>,
    timeout: Duration,
}

impl QuoteEngine {
    pub fn new(reader: Arc<dyn ChainReader>, registry: Arc<TokenRegistry>, timeout: Duration) -> Self {
        Self {
            reader,
            registry,
            decimals_cache: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self) -> &str {
        self.reader.endpoint()
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> SwapResult<U256> {
        bounded(self.timeout, self.endpoint(), self.reader.allowance(token, owner, spender)).await
    }

    pub async fn resolve_token(&self, symbol: TokenSymbol) -> SwapResult<ResolvedToken> {
        let token = self.registry.resolve(symbol)?;
        if symbol.is_native() {
            return Ok(token);
        }

        let key = format!("{:?}", token.address).to_lowercase();
        if let Some(decimals) = self.decimals_cache.read().await.get(&key) {
            return Ok(ResolvedToken {
                address: token.address,
                decimals: *decimals,
            });
        }

        let decimals = bounded(self.timeout, self.endpoint(), self.reader.token_decimals(token.address)).await?;
        let decimals = *self.decimals_cache.write().await.entry(key).or_insert(decimals);
        tracing::debug!(symbol = %symbol, decimals, "Cached token decimals");
        Ok(ResolvedToken {
            address: token.address,
            decimals,
        })
    }

    pub async fn resolve_pair(
        &self,
        input: TokenSymbol,
        output: TokenSymbol,
    ) -> SwapResult<(ResolvedToken, ResolvedToken)> {
        futures::try_join!(self.resolve_token(input), self.resolve_token(output))
    }

    /// How much `output` the router gives for `amount_in` of `input`.
    pub async fn quote_forward(
        &self,
        input: TokenSymbol,
        output: TokenSymbol,
        amount_in: &str,
    ) -> SwapResult<Option<Quote>> {
        if !is_positive_decimal(amount_in) || input == output {
            return Ok(None);
        }
        let Some((from, to)) = self.resolve_for_quote(input, output).await? else {
            return Ok(None);
        };
        let Some(amount) = parse_positive_amount(amount_in, from.decimals) else {
            return Ok(None);
        };

        match self.amount_out(from, to, amount).await {
            Ok(out) => Ok(Some(Quote::new(out, to.decimals))),
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint(), input = %input, output = %output, error = %e, "Forward quote unavailable");
                Ok(None)
            }
        }
    }

    /// How much `input` is needed to receive `amount_out` of `output`.
    pub async fn quote_reverse(
        &self,
        input: TokenSymbol,
        output: TokenSymbol,
        amount_out: &str,
    ) -> SwapResult<Option<Quote>> {
        if !is_positive_decimal(amount_out) || input == output {
            return Ok(None);
        }
        let Some((from, to)) = self.resolve_for_quote(input, output).await? else {
            return Ok(None);
        };
        let Some(amount) = parse_positive_amount(amount_out, to.decimals) else {
            return Ok(None);
        };

        let path = vec![from.address, to.address];
        let result = bounded(self.timeout, self.endpoint(), self.reader.amounts_in(amount, path))
            .await
            .and_then(|amounts| {
                amounts
                    .first()
                    .copied()
                    .ok_or_else(|| SwapError::upstream(self.endpoint(), "router returned no amounts"))
            });
        match result {
            Ok(needed) => Ok(Some(Quote::new(needed, from.decimals))),
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint(), input = %input, output = %output, error = %e, "Reverse quote unavailable");
                Ok(None)
            }
        }
    }

    /// Unswallowed forward quote in raw units, used right before a swap.
    pub async fn amount_out(&self, from: ResolvedToken, to: ResolvedToken, amount_in: U256) -> SwapResult<U256> {
        let path = vec![from.address, to.address];
        let amounts = bounded(self.timeout, self.endpoint(), self.reader.amounts_out(amount_in, path)).await?;
        amounts
            .last()
            .copied()
            .ok_or_else(|| SwapError::upstream(self.endpoint(), "router returned no amounts"))
    }

    async fn resolve_for_quote(
        &self,
        input: TokenSymbol,
        output: TokenSymbol,
    ) -> SwapResult<Option<(ResolvedToken, ResolvedToken)>> {
        match self.resolve_pair(input, output).await {
            Ok(pair) => Ok(Some(pair)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint(), error = %e, "Could not resolve token decimals");
                Ok(None)
            }
        }
    }
}

/// Monotonic tickets that let callers drop results of superseded requests.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

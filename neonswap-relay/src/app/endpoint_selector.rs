use crate::domain::error::{SwapError, SwapResult};
use crate::infrastructure::config::RpcEndpoint;
use crate::infrastructure::storage::preference_store::PreferenceStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cookie carrying the preferred endpoint index on every request.
pub const RPC_PREFERENCE_COOKIE: &str = "rpc_index";
pub const RPC_PREFERENCE_MAX_AGE_DAYS: i64 = 30;

/// Ordered RPC endpoints plus the index the user prefers.
///
/// The preference is written to the durable store on every selection and
/// travels with requests as the `rpc_index` cookie; read-side handlers only
/// trust the request hint and start from 0 without one.
pub struct EndpointSelector {
    endpoints: Vec<RpcEndpoint>,
    current: AtomicUsize,
    store: Arc<dyn PreferenceStore>,
}

impl EndpointSelector {
    pub fn new(endpoints: Vec<RpcEndpoint>, store: Arc<dyn PreferenceStore>) -> SwapResult<Self> {
        if endpoints.is_empty() {
            return Err(SwapError::configuration("At least one RPC endpoint is required"));
        }

        let initial = match store.load_rpc_index() {
            Ok(Some(index)) if index < endpoints.len() => index,
            Ok(Some(index)) => {
                tracing::warn!(index, "Stored RPC index is out of range, using 0");
                0
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored RPC preference, using 0");
                0
            }
        };

        Ok(Self {
            endpoints,
            current: AtomicUsize::new(initial),
            store,
        })
    }

    pub fn list(&self) -> &[RpcEndpoint] {
        &self.endpoints
    }

    pub fn urls(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> &RpcEndpoint {
        &self.endpoints[self.current_index()]
    }

    /// Persists a new preferred index. Out-of-range indices are ignored and
    /// `Ok(false)` is returned.
    pub fn select(&self, index: usize) -> SwapResult<bool> {
        if index >= self.endpoints.len() {
            tracing::debug!(index, len = self.endpoints.len(), "Ignoring out-of-range RPC selection");
            return Ok(false);
        }
        self.store.save_rpc_index(index)?;
        self.current.store(index, Ordering::SeqCst);
        tracing::info!(index, label = %self.endpoints[index].label, "Preferred RPC endpoint changed");
        Ok(true)
    }

    /// Parses a request-scoped hint; anything missing, non-numeric or out of
    /// range yields `None`.
    pub fn parse_hint(&self, hint: Option<&str>) -> Option<usize> {
        hint.and_then(|h| h.trim().parse::<usize>().ok())
            .filter(|index| *index < self.endpoints.len())
    }

    /// Where read-side failover starts for a request.
    pub fn start_index(&self, hint: Option<&str>) -> usize {
        self.parse_hint(hint).unwrap_or(0)
    }

    /// Index client-facing calls (quotes, swaps) use: the request hint when
    /// valid, otherwise the durable preference.
    pub fn effective_index(&self, hint: Option<&str>) -> usize {
        self.parse_hint(hint).unwrap_or_else(|| self.current_index())
    }
}

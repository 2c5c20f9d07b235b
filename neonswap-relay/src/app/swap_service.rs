use crate::app::quote_service::QuoteEngine;
use crate::domain::error::{SwapError, SwapResult};
use crate::domain::token::TokenSymbol;
use crate::infrastructure::blockchain::ethereum::{is_positive_decimal, min_amount_out, parse_amount};
use crate::infrastructure::blockchain::reader::bounded;
use crate::infrastructure::blockchain::signer::SwapSigner;
use crate::validators::request_validator::{validate_slippage_bps, validate_wallet_address};
use ethers::core::types::{Address, H256, U256};
use serde::Deserialize;
use std::sync::Arc;

/// Router deadline offset, in seconds from submission.
pub const SWAP_DEADLINE_SECS: u64 = 20 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub input: TokenSymbol,
    pub output: TokenSymbol,
    pub amount_in: String,
    /// Defaults to the signer's own address.
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    pub tx_hash: H256,
    pub recipient: Address,
    pub amount_in: U256,
    pub quoted_out: U256,
    pub amount_out_min: U256,
    pub deadline: u64,
    pub approval_tx: Option<H256>,
}

/// Submits swaps through the router with the relay's signer.
pub struct SwapExecutor {
    engine: Arc<QuoteEngine>,
    signer: Option<Arc<dyn SwapSigner>>,
    router: Address,
    expected_chain_id: u64,
    default_slippage_bps: u32,
}

impl SwapExecutor {
    pub fn new(
        engine: Arc<QuoteEngine>,
        signer: Option<Arc<dyn SwapSigner>>,
        router: Address,
        expected_chain_id: u64,
        default_slippage_bps: u32,
    ) -> Self {
        Self {
            engine,
            signer,
            router,
            expected_chain_id,
            default_slippage_bps,
        }
    }

    pub fn engine(&self) -> &Arc<QuoteEngine> {
        &self.engine
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    pub async fn execute(&self, request: &SwapRequest) -> SwapResult<SwapReceipt> {
        if !is_positive_decimal(&request.amount_in) {
            return Err(SwapError::invalid_amount(format!(
                "'{}' is not a positive decimal amount",
                request.amount_in
            )));
        }
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| SwapError::WalletUnavailable("no signing wallet is configured".to_string()))?;
        let recipient = match request.recipient.as_deref() {
            Some(raw) => validate_wallet_address(Some(raw))?,
            None => signer.address(),
        };
        if request.input == request.output {
            return Err(SwapError::validation("Input and output tokens must differ"));
        }
        let slippage_bps = validate_slippage_bps(request.slippage_bps.unwrap_or(self.default_slippage_bps))?;

        let actual = bounded(self.engine.timeout(), self.engine.endpoint(), signer.chain_id()).await?;
        if actual != self.expected_chain_id {
            return Err(SwapError::WrongNetwork {
                expected: self.expected_chain_id,
                actual,
            });
        }

        let (from, to) = self.engine.resolve_pair(request.input, request.output).await?;
        let amount_in = parse_amount(&request.amount_in, from.decimals)?;
        let quoted_out = self.engine.amount_out(from, to, amount_in).await?;
        let amount_out_min = min_amount_out(quoted_out, slippage_bps)?;
        let deadline = chrono::Utc::now().timestamp().max(0) as u64 + SWAP_DEADLINE_SECS;

        let mut approval_tx = None;
        if !request.input.is_native() {
            let owner = signer.address();
            let allowance = self.engine.allowance(from.address, owner, self.router).await?;
            if allowance < amount_in {
                tracing::info!(
                    token = %request.input,
                    allowance = %allowance,
                    required = %amount_in,
                    "Allowance too low, approving router"
                );
                approval_tx = Some(signer.approve_and_wait(from.address, self.router, amount_in).await?);
            }
        }

        let path = vec![from.address, to.address];
        let deadline_arg = U256::from(deadline);
        let tx_hash = match (request.input.is_native(), request.output.is_native()) {
            (true, _) => {
                signer
                    .swap_exact_eth_for_tokens(amount_in, amount_out_min, path, recipient, deadline_arg)
                    .await?
            }
            (false, true) => {
                signer
                    .swap_exact_tokens_for_eth(amount_in, amount_out_min, path, recipient, deadline_arg)
                    .await?
            }
            (false, false) => {
                signer
                    .swap_exact_tokens_for_tokens(amount_in, amount_out_min, path, recipient, deadline_arg)
                    .await?
            }
        };

        tracing::info!(
            tx_hash = ?tx_hash,
            input = %request.input,
            output = %request.output,
            amount_in = %amount_in,
            amount_out_min = %amount_out_min,
            endpoint = %self.engine.endpoint(),
            "Swap submitted"
        );

        Ok(SwapReceipt {
            tx_hash,
            recipient,
            amount_in,
            quoted_out,
            amount_out_min,
            deadline,
            approval_tx,
        })
    }
}

use crate::api::handlers::rpc_hint;
use crate::api::state::AppState;
use crate::app::swap_service::SwapRequest;
use crate::domain::error::SwapResult;
use actix_web::web::{Data, Json};
use actix_web::{post, HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::Arc;

/// Executes a swap with the relay's signer through the preferred endpoint.
/// Responds as soon as the swap transaction is accepted by the node.
#[post("/swap")]
pub async fn execute_swap(
    state: Data<Arc<AppState>>,
    req: HttpRequest,
    body: Json<SwapRequest>,
) -> SwapResult<HttpResponse> {
    let index = state.selector.effective_index(rpc_hint(&req).as_deref());
    let executor = state.executor(index)?;
    let receipt = executor.execute(&body).await?;

    let tx_hash = format!("{:?}", receipt.tx_hash);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "txHash": tx_hash,
        "explorerUrl": state.config.explorer_link(&tx_hash),
        "input": body.input,
        "output": body.output,
        "recipient": format!("{:?}", receipt.recipient),
        "amountIn": receipt.amount_in.to_string(),
        "quotedOut": receipt.quoted_out.to_string(),
        "amountOutMin": receipt.amount_out_min.to_string(),
        "deadline": receipt.deadline,
        "approvalTx": receipt.approval_tx.map(|h| format!("{h:?}")),
        "rpcIndex": index,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

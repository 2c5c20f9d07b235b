use crate::api::state::AppState;
use actix_web::web::Data;
use actix_web::{get, HttpResponse, Responder};
use std::sync::Arc;

#[get("/health")]
pub async fn health(state: Data<Arc<AppState>>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "chain": state.config.chain_name,
        "chainId": state.config.chain_id,
        "rpcEndpoints": state.selector.len(),
        "message": "NeonSwap Relay is running"
    }))
}

use crate::api::handlers::rpc_hint;
use crate::api::state::AppState;
use crate::app::balance_service::TokenBalance;
use crate::domain::error::SwapError;
use crate::domain::token::TokenSymbol;
use crate::validators::request_validator::validate_wallet_address;
use actix_web::web::{Data, Query};
use actix_web::{get, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    pub wallet: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub wallet: String,
    pub token: String,
    pub balance: String,
    pub formatted_balance: String,
    pub display_balance: String,
    pub decimals: u8,
    pub symbol: String,
    pub chain: String,
    pub timestamp: i64,
}

impl BalanceResponse {
    fn new(wallet: &str, chain: &str, balance: &TokenBalance) -> Self {
        Self {
            wallet: wallet.to_string(),
            token: balance.symbol.to_string(),
            balance: balance.raw.to_string(),
            formatted_balance: balance.formatted.clone(),
            display_balance: balance.display(),
            decimals: balance.decimals,
            symbol: balance.symbol.to_string(),
            chain: chain.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

fn bad_request(err: SwapError) -> HttpResponse {
    let message = match err {
        SwapError::Validation(message) => message,
        other => other.to_string(),
    };
    HttpResponse::BadRequest().json(json!({ "error": message }))
}

fn fetch_failed(symbol: &str, err: &SwapError) -> HttpResponse {
    tracing::error!(token = symbol, error = %err, "Error fetching balance");
    HttpResponse::InternalServerError().json(json!({ "error": "Failed to fetch balance" }))
}

async fn token_balance(
    state: &AppState,
    req: &HttpRequest,
    query: &WalletQuery,
    symbol: TokenSymbol,
) -> HttpResponse {
    let wallet = match validate_wallet_address(query.wallet.as_deref()) {
        Ok(_) => query.wallet.as_deref().unwrap_or_default().trim(),
        Err(e) => return bad_request(e),
    };

    let hint = state.selector.parse_hint(rpc_hint(req).as_deref());
    match state.balances.get_token_balance(wallet, symbol, hint).await {
        Ok(balance) => HttpResponse::Ok().json(BalanceResponse::new(wallet, &state.config.chain_name, &balance)),
        Err(e) => fetch_failed(symbol.as_str(), &e),
    }
}

#[get("/balance/neon")]
pub async fn neon_balance(state: Data<Arc<AppState>>, req: HttpRequest, query: Query<WalletQuery>) -> HttpResponse {
    token_balance(&state, &req, &query, TokenSymbol::Neon).await
}

#[get("/balance/usdc")]
pub async fn usdc_balance(state: Data<Arc<AppState>>, req: HttpRequest, query: Query<WalletQuery>) -> HttpResponse {
    token_balance(&state, &req, &query, TokenSymbol::Usdc).await
}

#[get("/balance/usdt")]
pub async fn usdt_balance(state: Data<Arc<AppState>>, req: HttpRequest, query: Query<WalletQuery>) -> HttpResponse {
    token_balance(&state, &req, &query, TokenSymbol::Usdt).await
}

/// All three balances from a single endpoint in one failover pass.
#[get("/balances")]
pub async fn all_balances(state: Data<Arc<AppState>>, req: HttpRequest, query: Query<WalletQuery>) -> HttpResponse {
    let wallet = match validate_wallet_address(query.wallet.as_deref()) {
        Ok(_) => query.wallet.as_deref().unwrap_or_default().trim(),
        Err(e) => return bad_request(e),
    };

    let hint = state.selector.parse_hint(rpc_hint(&req).as_deref());
    match state.balances.get_balances(wallet, hint).await {
        Ok(balances) => {
            let chain = &state.config.chain_name;
            HttpResponse::Ok().json(json!({
                "wallet": wallet,
                "chain": chain,
                "balances": [
                    BalanceResponse::new(wallet, chain, &balances.native),
                    BalanceResponse::new(wallet, chain, &balances.usdc),
                    BalanceResponse::new(wallet, chain, &balances.usdt),
                ],
                "timestamp": chrono::Utc::now().timestamp_millis(),
            }))
        }
        Err(e) => fetch_failed("ALL", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::endpoint_selector::RPC_PREFERENCE_COOKIE;
    use crate::app::test_support::{app_state, FakeFactory, RPC_A, RPC_B, RPC_C};
    use actix_web::cookie::Cookie;
    use actix_web::{test, web, App};

    const WALLET: &str = "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6";

    #[actix_web::test]
    async fn test_usdc_balance_response_shape() {
        let factory = Arc::new(FakeFactory::new());
        let state = app_state(factory.clone(), None);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(usdc_balance)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/balance/usdc?wallet={WALLET}"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["wallet"], WALLET);
        assert_eq!(body["token"], "USDC");
        assert_eq!(body["symbol"], "USDC");
        assert_eq!(body["balance"], "25000000000000000000");
        assert_eq!(body["formattedBalance"], "25.0");
        assert_eq!(body["decimals"], 18);
        assert_eq!(body["chain"], "Neon EVM Mainnet");
        assert!(body["timestamp"].is_i64());
    }

    #[actix_web::test]
    async fn test_missing_or_malformed_wallet_is_rejected_without_rpc() {
        let factory = Arc::new(FakeFactory::new());
        let state = app_state(factory.clone(), None);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(neon_balance)),
        )
        .await;
        let connects_at_startup = factory.attempts().len();

        let req = test::TestRequest::get().uri("/api/balance/neon").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Wallet address is required");

        let req = test::TestRequest::get().uri("/api/balance/neon?wallet=0x1234").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid wallet address format");

        assert_eq!(factory.attempts().len(), connects_at_startup);
    }

    #[actix_web::test]
    async fn test_cookie_sets_failover_start() {
        let factory = Arc::new(FakeFactory::new().failing(&[RPC_C]));
        let state = app_state(factory.clone(), None);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(usdt_balance)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/balance/usdt?wallet={WALLET}"))
            .cookie(Cookie::new(RPC_PREFERENCE_COOKIE, "2"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        // construction connects once per endpoint, then the request: C fails, A answers
        let attempts = factory.attempts();
        assert_eq!(&attempts[attempts.len() - 2..], &[RPC_C.to_string(), RPC_A.to_string()]);
    }

    #[actix_web::test]
    async fn test_all_endpoints_failing_is_500() {
        let factory = Arc::new(FakeFactory::new().failing(&[RPC_A, RPC_B, RPC_C]));
        let state = app_state(factory, None);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(all_balances)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/balances?wallet={WALLET}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to fetch balance");
    }

    #[actix_web::test]
    async fn test_all_balances() {
        let factory = Arc::new(FakeFactory::new());
        let state = app_state(factory, None);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(all_balances)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/balances?wallet={WALLET}"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let balances = body["balances"].as_array().unwrap();
        assert_eq!(balances.len(), 3);
        assert_eq!(balances[0]["symbol"], "NEON");
        assert_eq!(balances[0]["displayBalance"], "1.5000");
        assert_eq!(balances[2]["symbol"], "USDTi");
        assert_eq!(balances[2]["displayBalance"], "0");
    }
}

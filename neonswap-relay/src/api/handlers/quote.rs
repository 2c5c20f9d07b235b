use crate::api::handlers::rpc_hint;
use crate::api::state::AppState;
use crate::domain::error::{SwapError, SwapResult};
use crate::domain::token::TokenSymbol;
use actix_web::web::{Data, Query};
use actix_web::{get, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub input: String,
    pub output: String,
    pub amount_in: Option<String>,
    pub amount_out: Option<String>,
}

/// Forward quote with `amountIn`, reverse quote with `amountOut`.
/// `quote` is null when the router cannot price the request.
#[get("/quote")]
pub async fn get_quote(
    state: Data<Arc<AppState>>,
    req: HttpRequest,
    query: Query<QuoteQuery>,
) -> SwapResult<HttpResponse> {
    let input: TokenSymbol = query.input.parse()?;
    let output: TokenSymbol = query.output.parse()?;

    let index = state.selector.effective_index(rpc_hint(&req).as_deref());
    let engine = state.engine(index)?;

    let (direction, amount, quote) = match (&query.amount_in, &query.amount_out) {
        (Some(amount_in), None) => ("exactIn", amount_in, engine.quote_forward(input, output, amount_in).await?),
        (None, Some(amount_out)) => ("exactOut", amount_out, engine.quote_reverse(input, output, amount_out).await?),
        _ => return Err(SwapError::validation("Provide exactly one of amountIn or amountOut")),
    };

    let quote = quote.map(|q| {
        json!({
            "amount": q.amount.to_string(),
            "formatted": q.formatted,
        })
    });

    Ok(HttpResponse::Ok().json(json!({
        "input": input,
        "output": output,
        "direction": direction,
        "amount": amount,
        "quote": quote,
        "rpcIndex": index,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{app_state, FakeFactory};
    use actix_web::{test, web, App};

    async fn call(uri: &str) -> (u16, serde_json::Value) {
        let state = app_state(Arc::new(FakeFactory::new()), None);
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(get_quote)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status().as_u16();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_forward_quote() {
        let (status, body) = call("/api/quote?input=NEON&output=USDC&amountIn=10").await;
        assert_eq!(status, 200);
        assert_eq!(body["input"], "NEON");
        assert_eq!(body["direction"], "exactIn");
        let formatted: f64 = body["quote"]["formatted"].as_str().unwrap().parse().unwrap();
        assert!(formatted > 2.4 && formatted < 2.5);
    }

    #[actix_web::test]
    async fn test_reverse_quote_and_no_quote() {
        let (status, body) = call("/api/quote?input=USDC&output=USDTi&amountOut=1").await;
        assert_eq!(status, 200);
        assert_eq!(body["direction"], "exactOut");
        assert!(body["quote"]["amount"].is_string());

        let (status, body) = call("/api/quote?input=USDC&output=USDTi&amountIn=0").await;
        assert_eq!(status, 200);
        assert!(body["quote"].is_null());
    }

    #[actix_web::test]
    async fn test_bad_requests() {
        let (status, body) = call("/api/quote?input=DAI&output=USDC&amountIn=1").await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "UNKNOWN_TOKEN");

        let (status, body) = call("/api/quote?input=NEON&output=USDC&amountIn=1&amountOut=1").await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

use crate::api::handlers::rpc_hint;
use crate::api::state::AppState;
use crate::app::endpoint_selector::{RPC_PREFERENCE_COOKIE, RPC_PREFERENCE_MAX_AGE_DAYS};
use crate::domain::error::SwapResult;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::web::{Data, Json};
use actix_web::{get, post, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SelectRpcRequest {
    pub index: i64,
}

#[get("/rpc")]
pub async fn list_rpc(state: Data<Arc<AppState>>, req: HttpRequest) -> HttpResponse {
    let endpoints: Vec<_> = state
        .selector
        .list()
        .iter()
        .enumerate()
        .map(|(index, endpoint)| {
            json!({
                "index": index,
                "label": endpoint.label,
                "url": endpoint.url,
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "endpoints": endpoints,
        "currentIndex": state.selector.effective_index(rpc_hint(&req).as_deref()),
        "storedIndex": state.selector.current_index(),
    }))
}

/// Persists the preference and mirrors it into the `rpc_index` cookie.
/// Out-of-range indices change nothing.
#[post("/rpc/select")]
pub async fn select_rpc(state: Data<Arc<AppState>>, body: Json<SelectRpcRequest>) -> SwapResult<HttpResponse> {
    let selected = match usize::try_from(body.index) {
        Ok(index) => state.selector.select(index)?,
        Err(_) => false,
    };
    let current = state.selector.current_index();

    let payload = json!({
        "selected": selected,
        "currentIndex": current,
        "endpoint": state.selector.current(),
    });
    if !selected {
        return Ok(HttpResponse::Ok().json(payload));
    }

    let cookie = Cookie::build(RPC_PREFERENCE_COOKIE, current.to_string())
        .path("/")
        .max_age(CookieDuration::days(RPC_PREFERENCE_MAX_AGE_DAYS))
        .finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{app_state_with_store, FakeFactory};
    use crate::infrastructure::storage::preference_store::{MemoryPreferenceStore, PreferenceStore};
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn test_select_sets_cookie_and_persists() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let state = app_state_with_store(Arc::new(FakeFactory::new()), None, store.clone());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(select_rpc).service(list_rpc)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/rpc/select")
            .set_json(json!({ "index": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == RPC_PREFERENCE_COOKIE)
            .unwrap();
        assert_eq!(cookie.value(), "2");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(30)));
        assert_eq!(store.load_rpc_index().unwrap(), Some(2));

        let req = test::TestRequest::get().uri("/api/rpc").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["currentIndex"], 2);
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_out_of_range_select_is_noop() {
        let store = Arc::new(MemoryPreferenceStore::with_index(1));
        let state = app_state_with_store(Arc::new(FakeFactory::new()), None, store.clone());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state))
                .service(web::scope("/api").service(select_rpc)),
        )
        .await;

        for index in [3, -1] {
            let req = test::TestRequest::post()
                .uri("/api/rpc/select")
                .set_json(json!({ "index": index }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
            assert!(resp.response().cookies().next().is_none());
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["selected"], false);
            assert_eq!(body["currentIndex"], 1);
        }
        assert_eq!(store.load_rpc_index().unwrap(), Some(1));
    }
}

pub mod balance;
pub mod health;
pub mod quote;
pub mod rpc;
pub mod swap;

use crate::app::endpoint_selector::RPC_PREFERENCE_COOKIE;
use actix_web::HttpRequest;

/// Raw value of the endpoint preference cookie, if the client sent one.
pub(crate) fn rpc_hint(req: &HttpRequest) -> Option<String> {
    req.cookie(RPC_PREFERENCE_COOKIE).map(|c| c.value().to_string())
}

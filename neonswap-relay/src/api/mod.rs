pub mod handlers;
pub mod state;

use actix_web::web;

pub use handlers::balance::{all_balances, neon_balance, usdc_balance, usdt_balance};
pub use handlers::health::health;
pub use handlers::quote::get_quote;
pub use handlers::rpc::{list_rpc, select_rpc};
pub use handlers::swap::execute_swap;

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(neon_balance)
            .service(usdc_balance)
            .service(usdt_balance)
            .service(all_balances)
            .service(get_quote)
            .service(execute_swap)
            .service(list_rpc)
            .service(select_rpc),
    );
}

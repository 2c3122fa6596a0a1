//! Route table.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | /account | `create_account` |
//! | GET | /account | `list_accounts` |
//! | POST | /account/transfer | `transfer` |
//! | POST | /account/{accountNumber}/deposit | `deposit` |
//! | GET | /account/{accountNumber}/balance | `get_balance` |
//! | GET | /currency/conversion/{from}/{to}/{amount} | `convert_currency` |

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers::{
    convert_currency, create_account, deposit, get_balance, list_accounts, transfer,
};

/// Build the router with request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/account", post(create_account).get(list_accounts))
        .route("/account/transfer", post(transfer))
        .route("/account/{account_number}/deposit", post(deposit))
        .route("/account/{account_number}/balance", get(get_balance))
        .route(
            "/currency/conversion/{from}/{to}/{amount}",
            get(convert_currency),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP handlers. Each one maps a request onto a single ledger or gateway
//! call and lets [`ApiError`] pick the status code.

use axum::Json;
use axum::extract::{Path, State};

use crate::domain::{parse_money, Account, AccountNumber};

use super::AppState;
use super::dto::{
    ApiJson, BalanceResponse, CreateAccountRequest, DepositRequest, MessageResponse,
    TransferRequest,
};
use super::error::ApiError;

/// POST /account
pub async fn create_account(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .ledger
        .create_account(request.first_name, request.last_name)
        .await?;
    Ok(Json(account))
}

/// GET /account
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(state.ledger.list_accounts().await?))
}

/// POST /account/{account_number}/deposit
pub async fn deposit(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
    ApiJson(request): ApiJson<DepositRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .ledger
        .deposit(&AccountNumber::from(account_number), request.amount)
        .await?;
    Ok(Json(account))
}

/// POST /account/transfer
pub async fn transfer(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TransferRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .ledger
        .transfer(
            &AccountNumber::from(request.from_account),
            &AccountNumber::from(request.to_account),
            request.amount,
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Transfer successful".to_string(),
    }))
}

/// GET /account/{account_number}/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .ledger
        .get_balance(&AccountNumber::from(account_number))
        .await?;
    Ok(Json(BalanceResponse { balance }))
}

/// GET /currency/conversion/{from}/{to}/{amount}
pub async fn convert_currency(
    State(state): State<AppState>,
    Path((from, to, amount)): Path<(String, String, String)>,
) -> Result<Json<f64>, ApiError> {
    let from = state
        .currencies
        .resolve(&from)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported currency: {}", from)))?;
    let to = state
        .currencies
        .resolve(&to)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported currency: {}", to)))?;
    let amount = parse_money(&amount)
        .map_err(|e| ApiError::BadRequest(format!("Invalid amount: {}", e)))?;

    let converted = state.gateway.convert(amount, &from, &to).await?;
    Ok(Json(converted))
}

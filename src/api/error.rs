use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::LedgerError;
use crate::currency::ConversionError;

use super::dto::ErrorResponse;

/// Everything a handler can fail with, mapped to a status and `{"error"}` body.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    Conversion(ConversionError),
    BadRequest(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        ApiError::Conversion(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => ledger_status(err),
            ApiError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::AccountNotFound
        | LedgerError::SourceNotFound
        | LedgerError::DestinationNotFound => StatusCode::NOT_FOUND,
        LedgerError::InvalidAmount
        | LedgerError::SameAccount
        | LedgerError::InsufficientFunds { .. }
        | LedgerError::AmountOutOfRange => StatusCode::BAD_REQUEST,
        LedgerError::ConcurrentModification => StatusCode::CONFLICT,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Ledger(err) if err.is_client_error() => err.to_string(),
            ApiError::Ledger(err) => {
                tracing::error!(error = ?err, "storage failure");
                "Internal server error".to_string()
            }
            ApiError::Conversion(err) => {
                tracing::error!(error = %err, "currency conversion failed");
                err.to_string()
            }
            ApiError::BadRequest(message) => message,
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

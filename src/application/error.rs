use thiserror::Error;

use crate::domain::{LedgerViolation, Money};

/// Failures reported by the ledger engine.
///
/// The display strings of the validation variants are the messages shown to
/// API clients. Compare variants with `matches!`, not their text.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Source and destination accounts must be different")]
    SameAccount,

    #[error("Source account not found")]
    SourceNotFound,

    #[error("Destination account not found")]
    DestinationNotFound,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Insufficient balance in source account")]
    InsufficientFunds { balance: Money, requested: Money },

    #[error("Amount is out of the supported range")]
    AmountOutOfRange,

    #[error("Account was modified concurrently, please retry")]
    ConcurrentModification,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    /// True for errors caused by the request itself rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, LedgerError::Storage(_))
    }
}

impl From<LedgerViolation> for LedgerError {
    fn from(violation: LedgerViolation) -> Self {
        match violation {
            LedgerViolation::NonPositiveAmount => LedgerError::InvalidAmount,
            LedgerViolation::InsufficientFunds { balance, requested } => {
                LedgerError::InsufficientFunds { balance, requested }
            }
            LedgerViolation::OutOfRange => LedgerError::AmountOutOfRange,
        }
    }
}

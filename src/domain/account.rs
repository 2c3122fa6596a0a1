use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Money;

/// Store-assigned primary key. Never used as a business lookup key.
pub type AccountId = i64;

/// Opaque, externally visible account token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Generate a fresh random account number (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccountNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccountNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub account_number: AccountNumber,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every balance write.
    #[serde(skip)]
    pub version: i64,
}

/// An account that has not been stored yet and therefore has no id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub account_number: AccountNumber,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            account_number: AccountNumber::generate(),
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

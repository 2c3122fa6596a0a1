// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankdata::application::LedgerService;
use bankdata::domain::{Account, Money};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Whole currency units as money
pub fn money(units: i64) -> Money {
    Decimal::new(units, 0)
}

/// Test fixture: Standard account setup
pub struct StandardAccounts;

impl StandardAccounts {
    /// Open an account for John Doe with the given opening deposit (none if zero)
    pub async fn john(service: &LedgerService, opening: Money) -> Result<Account> {
        Self::open(service, "John", "Doe", opening).await
    }

    /// Open an account for Jane Smith with the given opening deposit (none if zero)
    pub async fn jane(service: &LedgerService, opening: Money) -> Result<Account> {
        Self::open(service, "Jane", "Smith", opening).await
    }

    pub async fn open(
        service: &LedgerService,
        first_name: &str,
        last_name: &str,
        opening: Money,
    ) -> Result<Account> {
        let account = service
            .create_account(first_name.to_string(), last_name.to_string())
            .await?;
        if opening > Decimal::ZERO {
            return Ok(service.deposit(&account.account_number, opening).await?);
        }
        Ok(account)
    }
}

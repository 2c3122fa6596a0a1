use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::domain::{Account, AccountId, AccountNumber, Money, NewAccount};

use super::MIGRATION_001_ACCOUNTS;

/// How long a writer waits for the database write lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_ACCOUNT: &str = "SELECT id, account_number, first_name, last_name, balance, version, created_at FROM accounts";

/// Repository for persisting and querying accounts.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_ACCOUNTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a unit of work. Nothing it writes is visible until `commit`;
    /// dropping it without committing rolls everything back.
    ///
    /// The write lock is taken up front (`BEGIN IMMEDIATE`), so concurrent
    /// writers queue on the busy timeout instead of failing to upgrade a
    /// read lock halfway through.
    pub async fn begin(&self) -> Result<UnitOfWork> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .context("Failed to begin transaction")?;
        Ok(UnitOfWork {
            conn,
            finished: false,
        })
    }

    /// Get an account by its account number.
    pub async fn find_account(&self, number: &AccountNumber) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("{} WHERE account_number = ?", SELECT_ACCOUNT))
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Get an account by its primary id.
    pub async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ACCOUNT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account by id")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List all accounts in insertion order.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_ACCOUNT))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    /// Delete every account. Only meant for resetting test databases.
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM accounts")
            .execute(&self.pool)
            .await
            .context("Failed to delete accounts")?;
        Ok(result.rows_affected())
    }
}

/// A single store transaction. Every mutating ledger operation runs inside one.
pub struct UnitOfWork {
    conn: PoolConnection<Sqlite>,
    finished: bool,
}

impl UnitOfWork {
    /// Insert a new account and return it with its assigned id.
    pub async fn insert_account(&mut self, account: &NewAccount) -> Result<Account> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (account_number, first_name, last_name, balance, version, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(account.account_number.as_str())
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.balance.to_string())
        .bind(account.created_at.to_rfc3339())
        .execute(&mut *self.conn)
        .await
        .context("Failed to save account")?;

        Ok(Account {
            id: result.last_insert_rowid(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            account_number: account.account_number.clone(),
            balance: account.balance,
            created_at: account.created_at,
            version: 0,
        })
    }

    /// Get an account by its account number, as seen by this transaction.
    pub async fn find_account(&mut self, number: &AccountNumber) -> Result<Option<Account>> {
        let row = sqlx::query(&format!("{} WHERE account_number = ?", SELECT_ACCOUNT))
            .bind(number.as_str())
            .fetch_optional(&mut *self.conn)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Write a new balance for `account`, guarded by its version.
    /// Returns `None` when the row changed since `account` was read.
    pub async fn update_balance(
        &mut self,
        account: &Account,
        balance: Money,
    ) -> Result<Option<Account>> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(balance.to_string())
        .bind(account.id)
        .bind(account.version)
        .execute(&mut *self.conn)
        .await
        .context("Failed to update balance")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(Account {
            balance,
            version: account.version + 1,
            ..account.clone()
        }))
    }

    pub async fn commit(mut self) -> Result<()> {
        sqlx::query("COMMIT")
            .execute(&mut *self.conn)
            .await
            .context("Failed to commit transaction")?;
        self.finished = true;
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        sqlx::query("ROLLBACK")
            .execute(&mut *self.conn)
            .await
            .context("Failed to roll back transaction")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // Closing the connection discards the open transaction
        if !self.finished {
            self.conn.close_on_drop();
        }
    }
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
    let account_number: String = row.get("account_number");
    let balance_str: String = row.get("balance");
    let created_at_str: String = row.get("created_at");

    Ok(Account {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        account_number: AccountNumber::from(account_number),
        balance: Decimal::from_str(&balance_str)
            .with_context(|| format!("Invalid balance: {}", balance_str))?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .context("Invalid created_at timestamp")?
            .with_timezone(&Utc),
        version: row.get("version"),
    })
}

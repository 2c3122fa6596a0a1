use tracing::{debug, info, instrument, warn};

use crate::domain::{
    credit, ensure_positive, plan_transfer, Account, AccountNumber, Money, NewAccount,
};
use crate::storage::{Repository, UnitOfWork};

use super::LedgerError;

/// The ledger engine. This is the primary interface for any client (API, CLI).
///
/// Every mutating operation opens a [`UnitOfWork`] on entry and either commits
/// it or rolls it back before returning, so callers never observe a
/// half-applied deposit or transfer.
#[derive(Clone)]
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize (create if needed, then migrate) the database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Access the underlying store, e.g. to purge it between tests.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Account operations
    // ========================

    /// Open a new account with a zero balance and a fresh account number.
    #[instrument(skip(self))]
    pub async fn create_account(
        &self,
        first_name: String,
        last_name: String,
    ) -> Result<Account, LedgerError> {
        let mut uow = self.repo.begin().await?;
        let result = uow
            .insert_account(&NewAccount::new(first_name, last_name))
            .await
            .map_err(LedgerError::from);
        let account = finish(uow, result).await?;

        info!(account_number = %account.account_number, id = account.id, "account created");
        Ok(account)
    }

    /// Get an account by its account number.
    pub async fn get_account(&self, account_number: &AccountNumber) -> Result<Account, LedgerError> {
        self.repo
            .find_account(account_number)
            .await?
            .ok_or(LedgerError::AccountNotFound)
    }

    /// Get the current balance of an account.
    pub async fn get_balance(&self, account_number: &AccountNumber) -> Result<Money, LedgerError> {
        Ok(self.get_account(account_number).await?.balance)
    }

    /// List all accounts in the order they were created.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Money movement
    // ========================

    /// Add `amount` to an account's balance.
    #[instrument(skip(self), fields(account_number = %account_number))]
    pub async fn deposit(
        &self,
        account_number: &AccountNumber,
        amount: Money,
    ) -> Result<Account, LedgerError> {
        let mut uow = self.repo.begin().await?;
        let result = apply_deposit(&mut uow, account_number, amount).await;
        let account = finish(uow, result).await?;

        info!(balance = %account.balance, "deposit applied");
        Ok(account)
    }

    /// Move `amount` from one account to another.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// amount, same account, source exists, destination exists, funds.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn transfer(
        &self,
        from: &AccountNumber,
        to: &AccountNumber,
        amount: Money,
    ) -> Result<(), LedgerError> {
        let mut uow = self.repo.begin().await?;
        let result = apply_transfer(&mut uow, from, to, amount).await;
        finish(uow, result).await?;

        info!("transfer applied");
        Ok(())
    }
}

async fn apply_deposit(
    uow: &mut UnitOfWork,
    account_number: &AccountNumber,
    amount: Money,
) -> Result<Account, LedgerError> {
    ensure_positive(amount)?;

    let account = uow
        .find_account(account_number)
        .await?
        .ok_or(LedgerError::AccountNotFound)?;
    let balance = credit(account.balance, amount)?;

    uow.update_balance(&account, balance)
        .await?
        .ok_or(LedgerError::ConcurrentModification)
}

async fn apply_transfer(
    uow: &mut UnitOfWork,
    from: &AccountNumber,
    to: &AccountNumber,
    amount: Money,
) -> Result<(), LedgerError> {
    ensure_positive(amount)?;
    if from == to {
        return Err(LedgerError::SameAccount);
    }

    let source = uow
        .find_account(from)
        .await?
        .ok_or(LedgerError::SourceNotFound)?;
    let destination = uow
        .find_account(to)
        .await?
        .ok_or(LedgerError::DestinationNotFound)?;

    let legs = plan_transfer(source.balance, destination.balance, amount)?;

    uow.update_balance(&source, legs.source_balance)
        .await?
        .ok_or(LedgerError::ConcurrentModification)?;
    uow.update_balance(&destination, legs.destination_balance)
        .await?
        .ok_or(LedgerError::ConcurrentModification)?;

    Ok(())
}

/// Commit on success, roll back on failure.
async fn finish<T>(uow: UnitOfWork, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                // The transaction is discarded on drop either way
                warn!(error = %rollback_err, "rollback failed");
            }
            debug!(error = %err, "operation rejected");
            Err(err)
        }
    }
}

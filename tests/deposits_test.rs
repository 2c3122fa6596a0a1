mod common;

use anyhow::Result;
use bankdata::application::LedgerError;
use bankdata::domain::AccountNumber;
use common::{StandardAccounts, money, test_service};
use rstest::rstest;
use rust_decimal::Decimal;

#[tokio::test]
async fn test_deposit_increases_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = StandardAccounts::john(&service, Decimal::ZERO).await?;
    let updated = service.deposit(&account.account_number, money(100)).await?;

    assert_eq!(updated.balance, money(100));
    assert_eq!(service.get_balance(&account.account_number).await?, money(100));

    Ok(())
}

#[tokio::test]
async fn test_deposits_accumulate_exactly() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = StandardAccounts::john(&service, Decimal::ZERO).await?;
    for _ in 0..10 {
        service
            .deposit(&account.account_number, Decimal::new(1, 1))
            .await?;
    }

    // 10 x 0.1 is exactly 1 with decimal money
    assert_eq!(service.get_balance(&account.account_number).await?, money(1));

    Ok(())
}

#[rstest]
#[case::zero(Decimal::ZERO)]
#[case::negative(Decimal::new(-50, 0))]
#[case::tiny_negative(Decimal::new(-1, 4))]
#[tokio::test]
async fn test_deposit_rejects_non_positive(#[case] amount: Decimal) -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = StandardAccounts::john(&service, money(25)).await?;
    let result = service.deposit(&account.account_number, amount).await;

    assert!(matches!(result, Err(LedgerError::InvalidAmount)));
    assert_eq!(service.get_balance(&account.account_number).await?, money(25));

    Ok(())
}

#[tokio::test]
async fn test_deposit_to_unknown_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .deposit(&AccountNumber::from("non-existing-account"), money(100))
        .await;
    assert!(matches!(result, Err(LedgerError::AccountNotFound)));

    Ok(())
}

#[tokio::test]
async fn test_invalid_amount_reported_before_missing_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .deposit(&AccountNumber::from("non-existing-account"), Decimal::ZERO)
        .await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount)));

    Ok(())
}

#[tokio::test]
async fn test_deposit_overflow_leaves_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = StandardAccounts::john(&service, Decimal::MAX).await?;
    let result = service.deposit(&account.account_number, money(1)).await;

    assert!(matches!(result, Err(LedgerError::AmountOutOfRange)));
    assert_eq!(
        service.get_balance(&account.account_number).await?,
        Decimal::MAX
    );

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_are_serialized() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = StandardAccounts::john(&service, Decimal::ZERO).await?;

    let mut handles = Vec::new();
    for i in 1..=10 {
        let service = service.clone();
        let number = account.account_number.clone();
        handles.push(tokio::spawn(async move {
            service.deposit(&number, money(i)).await
        }));
    }

    // Every deposit waits for the write lock and then succeeds
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.get_balance(&account.account_number).await?, money(55));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_deposits_on_one_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = StandardAccounts::john(&service, Decimal::ZERO).await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        let number = account.account_number.clone();
        handles.push(tokio::spawn(async move {
            service.deposit(&number, money(1)).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.get_balance(&account.account_number).await?, money(20));

    Ok(())
}

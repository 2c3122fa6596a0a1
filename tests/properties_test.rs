mod common;

use bankdata::application::LedgerError;
use common::{StandardAccounts, test_service};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Op {
    DepositJohn(i64),
    DepositJane(i64),
    JohnToJane(i64),
    JaneToJohn(i64),
}

fn cents() -> impl Strategy<Value = i64> {
    -500i64..20_000
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        cents().prop_map(Op::DepositJohn),
        cents().prop_map(Op::DepositJane),
        cents().prop_map(Op::JohnToJane),
        cents().prop_map(Op::JaneToJohn),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Balances never go negative, transfers never create or destroy money,
    /// and rejected operations leave every balance untouched.
    #[test]
    fn ledger_invariants_hold(ops in prop::collection::vec(op(), 1..20)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let (service, _temp) = test_service().await.unwrap();
            let john = StandardAccounts::john(&service, Decimal::ZERO).await.unwrap();
            let jane = StandardAccounts::jane(&service, Decimal::ZERO).await.unwrap();

            let mut deposited = Decimal::ZERO;
            for op in ops {
                let before_john = service.get_balance(&john.account_number).await.unwrap();
                let before_jane = service.get_balance(&jane.account_number).await.unwrap();

                let result = match op {
                    Op::DepositJohn(c) => {
                        let amount = Decimal::new(c, 2);
                        service.deposit(&john.account_number, amount).await.map(|_| amount)
                    }
                    Op::DepositJane(c) => {
                        let amount = Decimal::new(c, 2);
                        service.deposit(&jane.account_number, amount).await.map(|_| amount)
                    }
                    Op::JohnToJane(c) => service
                        .transfer(&john.account_number, &jane.account_number, Decimal::new(c, 2))
                        .await
                        .map(|_| Decimal::ZERO),
                    Op::JaneToJohn(c) => service
                        .transfer(&jane.account_number, &john.account_number, Decimal::new(c, 2))
                        .await
                        .map(|_| Decimal::ZERO),
                };

                let after_john = service.get_balance(&john.account_number).await.unwrap();
                let after_jane = service.get_balance(&jane.account_number).await.unwrap();

                match result {
                    Ok(added) => deposited += added,
                    Err(err) => {
                        assert!(matches!(
                            err,
                            LedgerError::InvalidAmount | LedgerError::InsufficientFunds { .. }
                        ));
                        assert_eq!(after_john, before_john);
                        assert_eq!(after_jane, before_jane);
                    }
                }

                assert!(after_john >= Decimal::ZERO);
                assert!(after_jane >= Decimal::ZERO);
                assert_eq!(after_john + after_jane, deposited);
            }
        });
    }
}

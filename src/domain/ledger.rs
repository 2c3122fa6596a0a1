use super::Money;

/// Balances after a transfer has been applied to both legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLegs {
    pub source_balance: Money,
    pub destination_balance: Money,
}

/// Reject zero and negative amounts.
pub fn ensure_positive(amount: Money) -> Result<(), LedgerViolation> {
    if amount <= Money::ZERO {
        return Err(LedgerViolation::NonPositiveAmount);
    }
    Ok(())
}

/// Compute the balance after crediting `amount`.
pub fn credit(balance: Money, amount: Money) -> Result<Money, LedgerViolation> {
    ensure_positive(amount)?;
    balance
        .checked_add(amount)
        .ok_or(LedgerViolation::OutOfRange)
}

/// Compute both balances for moving `amount` from source to destination.
/// The source may not go below zero; the sum of the two balances is unchanged.
pub fn plan_transfer(
    source_balance: Money,
    destination_balance: Money,
    amount: Money,
) -> Result<TransferLegs, LedgerViolation> {
    ensure_positive(amount)?;
    if source_balance < amount {
        return Err(LedgerViolation::InsufficientFunds {
            balance: source_balance,
            requested: amount,
        });
    }

    let destination_balance = destination_balance
        .checked_add(amount)
        .ok_or(LedgerViolation::OutOfRange)?;

    Ok(TransferLegs {
        source_balance: source_balance - amount,
        destination_balance,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerViolation {
    NonPositiveAmount,
    InsufficientFunds { balance: Money, requested: Money },
    OutOfRange,
}

impl std::fmt::Display for LedgerViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerViolation::NonPositiveAmount => write!(f, "amount must be greater than 0"),
            LedgerViolation::InsufficientFunds { balance, requested } => write!(
                f,
                "insufficient funds: balance {}, requested {}",
                balance, requested
            ),
            LedgerViolation::OutOfRange => write!(f, "resulting balance is out of range"),
        }
    }
}

impl std::error::Error for LedgerViolation {}

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Money is an exact decimal amount. Balances never go below zero.
pub type Money = Decimal;

/// Format money with two decimal places for display.
/// Example: 50 -> "50.00", 12.345 -> "12.35"
pub fn format_money(amount: Money) -> String {
    format!("{:.2}", amount)
}

/// Parse a decimal string into money.
/// Accepts the same number forms as a JSON amount: plain decimals ("50",
/// "12.5", "-3.25") and exponents ("1e2", "2.5E-1"). Thousands separators
/// are rejected.
pub fn parse_money(input: &str) -> Result<Money, ParseMoneyError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseMoneyError::Empty);
    }

    let digits = input.strip_prefix('-').unwrap_or(input);
    if let Some((mantissa, exponent)) = digits.split_once(['e', 'E']) {
        let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        let well_formed = is_plain_decimal(mantissa)
            && !exponent.is_empty()
            && exponent.chars().all(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(ParseMoneyError::InvalidFormat(input.to_string()));
        }
        return Decimal::from_scientific(input)
            .map_err(|_| ParseMoneyError::OutOfRange(input.to_string()));
    }

    if !is_plain_decimal(digits) {
        return Err(ParseMoneyError::InvalidFormat(input.to_string()));
    }

    // Normalise ".5" and "5." before handing off to the decimal parser
    let sign = if input.starts_with('-') { "-" } else { "" };
    let lead = if digits.starts_with('.') { "0" } else { "" };
    let trail = if digits.ends_with('.') { "0" } else { "" };
    let normalized = format!("{}{}{}{}", sign, lead, digits, trail);

    Decimal::from_str(&normalized).map_err(|_| ParseMoneyError::OutOfRange(input.to_string()))
}

fn is_plain_decimal(digits: &str) -> bool {
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits != "."
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    Empty,
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMoneyError::Empty => write!(f, "amount is empty"),
            ParseMoneyError::InvalidFormat(s) => write!(f, "invalid money format: {}", s),
            ParseMoneyError::OutOfRange(s) => write!(f, "amount out of range: {}", s),
        }
    }
}

impl std::error::Error for ParseMoneyError {}

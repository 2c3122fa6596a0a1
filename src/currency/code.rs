use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An ISO-4217 style currency code: three ASCII letters, upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCurrencyCode(pub String);

impl fmt::Display for InvalidCurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid currency code: {}", self.0)
    }
}

impl std::error::Error for InvalidCurrencyCode {}

/// The currencies the service accepts for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySet {
    codes: Vec<CurrencyCode>,
}

impl CurrencySet {
    pub fn new(codes: impl IntoIterator<Item = CurrencyCode>) -> Self {
        let mut unique: Vec<CurrencyCode> = Vec::new();
        for code in codes {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self { codes: unique }
    }

    /// Parse a comma-separated list such as "DKK,USD".
    pub fn parse_list(list: &str) -> Result<Self, InvalidCurrencyCode> {
        let codes = list
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(CurrencyCode::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(codes))
    }

    /// Resolve a raw path segment to a supported code.
    pub fn resolve(&self, raw: &str) -> Option<CurrencyCode> {
        let code = CurrencyCode::from_str(raw).ok()?;
        self.contains(&code).then_some(code)
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for CurrencySet {
    fn default() -> Self {
        Self::new([
            CurrencyCode("DKK".to_string()),
            CurrencyCode("USD".to_string()),
        ])
    }
}

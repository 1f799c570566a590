//! Contract Identifier Value Object
//!
//! Option legs are keyed by (symbol, expiry, strike, right); futures by symbol
//! alone. The exchange-style option code `RELIANCE28JAN212000CE` parses to
//! symbol `RELIANCE`, expiry 2021-01-28, strike 2000, right call.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Errors from parsing a contract code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractParseError {
    /// Empty input.
    #[error("Contract code is empty")]
    Empty,

    /// Input does not follow `SYMBOL DDMONYY STRIKE CE|PE`.
    #[error("Invalid option code '{code}': expected SYMBOL + DDMONYY + STRIKE + CE|PE")]
    InvalidOptionCode {
        /// The rejected code.
        code: String,
    },

    /// Expiry part is not a real calendar date.
    #[error("Invalid expiry in '{code}'")]
    InvalidExpiry {
        /// The rejected code.
        code: String,
    },

    /// Expiry cannot be written as a two-digit year.
    #[error("Expiry {expiry} is outside 2000-2099")]
    ExpiryOutOfRange {
        /// The rejected expiry.
        expiry: NaiveDate,
    },

    /// Future symbol contains characters outside `A-Z 0-9 & _ -`, or reads
    /// as an option code.
    #[error("Invalid future symbol '{symbol}'")]
    InvalidSymbol {
        /// The rejected symbol.
        symbol: String,
    },
}

/// Instrument kind requested when opening a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    /// Option contract (default).
    #[default]
    Option,
    /// Plain future on the symbol.
    Future,
}

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionRight {
    /// Call (CE).
    Call,
    /// Put (PE).
    Put,
}

impl OptionRight {
    /// Exchange suffix for this right.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

/// Normalized key for an option or future instrument.
///
/// Serializes as its exchange code so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContractId {
    /// Option contract.
    Option {
        /// Underlying symbol.
        symbol: String,
        /// Expiry date.
        expiry: NaiveDate,
        /// Strike price.
        strike: Decimal,
        /// Call or put.
        right: OptionRight,
    },
    /// Future on the symbol.
    Future {
        /// Underlying symbol.
        symbol: String,
    },
}

impl ContractId {
    /// Create an option contract.
    ///
    /// Fails unless the contract renders to a code that parses back to itself:
    /// the expiry year must be 2000-2099, the strike non-negative and the
    /// symbol an exchange symbol.
    pub fn option(
        symbol: impl Into<String>,
        expiry: NaiveDate,
        strike: Decimal,
        right: OptionRight,
    ) -> Result<Self, ContractParseError> {
        if !(2000..=2099).contains(&expiry.year()) {
            return Err(ContractParseError::ExpiryOutOfRange { expiry });
        }
        let id = Self::Option {
            symbol: symbol.into().trim().to_uppercase(),
            expiry,
            strike: strike.normalize(),
            right,
        };
        let code = id.to_string();
        match parse_option_code(&code) {
            Ok(parsed) if parsed == id => Ok(id),
            _ => Err(ContractParseError::InvalidOptionCode { code }),
        }
    }

    /// Create a future contract.
    ///
    /// Symbols shaped like an option code are rejected, since the code could
    /// not be told apart from that option when read back.
    pub fn future(symbol: impl Into<String>) -> Result<Self, ContractParseError> {
        Self::parse(&symbol.into(), InstrumentKind::Future)
    }

    /// Parse a contract code as the given kind.
    pub fn parse(code: &str, kind: InstrumentKind) -> Result<Self, ContractParseError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ContractParseError::Empty);
        }

        match kind {
            InstrumentKind::Option => parse_option_code(&code),
            InstrumentKind::Future => {
                let valid = code
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '&' | '_' | '-'));
                if valid && !option_code_regex().is_match(&code) {
                    Ok(Self::Future { symbol: code })
                } else {
                    Err(ContractParseError::InvalidSymbol { symbol: code })
                }
            }
        }
    }

    /// Underlying symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Option { symbol, .. } | Self::Future { symbol } => symbol,
        }
    }

    /// Instrument kind.
    #[must_use]
    pub const fn kind(&self) -> InstrumentKind {
        match self {
            Self::Option { .. } => InstrumentKind::Option,
            Self::Future { .. } => InstrumentKind::Future,
        }
    }

    /// Check if this is an option.
    #[must_use]
    pub const fn is_option(&self) -> bool {
        matches!(self, Self::Option { .. })
    }
}

#[allow(clippy::expect_used)] // Regex is compile-time constant
fn option_code_regex() -> &'static Regex {
    static OPTION_CODE: OnceLock<Regex> = OnceLock::new();
    OPTION_CODE.get_or_init(|| {
        Regex::new(r"^([A-Z][A-Z0-9&_-]*?)(\d{2})([A-Z]{3})(\d{2})(\d+(?:\.\d+)?)(CE|PE)$")
            .expect("option code regex is valid")
    })
}

fn parse_option_code(code: &str) -> Result<ContractId, ContractParseError> {
    let invalid = || ContractParseError::InvalidOptionCode {
        code: code.to_string(),
    };
    let bad_expiry = || ContractParseError::InvalidExpiry {
        code: code.to_string(),
    };

    let caps = option_code_regex().captures(code).ok_or_else(invalid)?;
    let field = |i: usize| caps.get(i).map(|m| m.as_str()).ok_or_else(invalid);

    let symbol = field(1)?;
    let day: u32 = field(2)?.parse().map_err(|_| bad_expiry())?;
    let month_code = field(3)?;
    let month = MONTHS
        .iter()
        .position(|m| *m == month_code)
        .ok_or_else(bad_expiry)?;
    let year: i32 = field(4)?.parse().map_err(|_| bad_expiry())?;
    let strike = Decimal::from_str(field(5)?).map_err(|_| invalid())?;
    let right = match field(6)? {
        "CE" => OptionRight::Call,
        _ => OptionRight::Put,
    };

    #[allow(clippy::cast_possible_truncation)]
    let expiry =
        NaiveDate::from_ymd_opt(2000 + year, month as u32 + 1, day).ok_or_else(bad_expiry)?;

    Ok(ContractId::Option {
        symbol: symbol.to_string(),
        expiry,
        strike: strike.normalize(),
        right,
    })
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Option {
                symbol,
                expiry,
                strike,
                right,
            } => write!(
                f,
                "{symbol}{:02}{}{:02}{strike}{}",
                expiry.day(),
                MONTHS[expiry.month0() as usize],
                expiry.year() % 100,
                right.suffix()
            ),
            Self::Future { symbol } => write!(f, "{symbol}"),
        }
    }
}

/// Untyped codes are options when they carry a CE/PE option code, futures otherwise.
impl FromStr for ContractId {
    type Err = ContractParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if option_code_regex().is_match(&upper) {
            Self::parse(&upper, InstrumentKind::Option)
        } else {
            Self::parse(&upper, InstrumentKind::Future)
        }
    }
}

impl TryFrom<String> for ContractId {
    type Error = ContractParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContractId> for String {
    fn from(value: ContractId) -> Self {
        value.to_string()
    }
}

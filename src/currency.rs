//! Currency codes and compound currency labels

use crate::error::{FxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 4217 style currency code (three upper-case ASCII letters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a code, accepting lower case input
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FxError::SourceFormatError(format!(
                "Invalid currency code: '{}'",
                code
            )));
        }
        Ok(CurrencyCode(code.to_ascii_uppercase()))
    }

    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        CurrencyCode::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Currency code with the free-text description that ECB exports attach to it
///
/// The warehouse writes currencies as `CODE (Description text)`, e.g.
/// `GBP (UK pound sterling)`. The JSON API only carries bare codes, in which
/// case `description` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyLabel {
    pub code: CurrencyCode,
    pub description: Option<String>,
}

impl CurrencyLabel {
    /// Label carrying only a code
    pub fn bare(code: CurrencyCode) -> Self {
        Self {
            code,
            description: None,
        }
    }

    /// Split a compound `CODE (Description)` field.
    ///
    /// The code is the first three characters; the description is the text
    /// between the first `(` and its matching `)`.
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        let head: String = label.chars().take(3).collect();
        let code = CurrencyCode::new(&head).map_err(|_| {
            FxError::SourceFormatError(format!("Invalid currency label: '{}'", label))
        })?;

        Ok(Self {
            code,
            description: parenthesized(label),
        })
    }
}

impl fmt::Display for CurrencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{} ({})", self.code, description),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Text inside the first balanced pair of parentheses
fn parenthesized(text: &str) -> Option<String> {
    let open = text.find('(')?;
    let mut depth = 0usize;
    for (offset, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let inner = text[open + 1..open + offset].trim();
                    return if inner.is_empty() {
                        None
                    } else {
                        Some(inner.to_string())
                    };
                }
            }
            _ => {}
        }
    }
    None
}

/// Ordered currency pair of a cross rate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl CurrencyPair {
    /// Create new currency pair
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { from, to }
    }

    /// Both sides are the same currency
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

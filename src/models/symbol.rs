//! # models::symbol
//!
//! [`Symbol`] — ticker ที่ normalize แล้ว (trim + uppercase).
//! Cache key ทุกตัวสร้างจาก Symbol นี้เท่านั้น

use std::fmt;

use crate::error::AppError;

/// An uppercase instrument identifier, e.g. `AAPL`, `BRK-B`, `^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize one raw token. Returns `Ok(None)` for blank input.
    pub fn parse(raw: &str) -> Result<Option<Self>, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let upper = trimmed.to_uppercase();
        // ต้องมีตัวอักษรหรือตัวเลขอย่างน้อยหนึ่งตัว (".." ไม่ใช่ symbol)
        let valid = upper
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
            && upper.chars().any(|c| c.is_ascii_alphanumeric());

        if !valid {
            return Err(AppError::BadRequest(format!("Invalid symbol: '{trimmed}'")));
        }

        Ok(Some(Self(upper)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a comma-delimited list (`"aapl, msft,,TSLA"`) into symbols.
///
/// Order is kept and duplicates are not removed. An input with no symbols at
/// all is a `BadRequest`.
pub fn parse_symbol_list(raw: &str) -> Result<Vec<Symbol>, AppError> {
    let mut symbols = Vec::new();
    for token in raw.split(',') {
        if let Some(symbol) = Symbol::parse(token)? {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        return Err(AppError::BadRequest("No symbol provided".into()));
    }

    Ok(symbols)
}

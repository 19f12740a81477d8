//! Field parsing utilities for Tydex lines
//!
//! Splits fixed-column item lines into their name, description, unit and
//! value fields, and converts raw tokens into typed values. Conversion
//! failures are reported as [`TydexError::MalformedField`] with the line
//! they came from; nothing is coerced to a default.

use crate::config::{ColumnLayout, ParserConfig};
use crate::error::{Result, SourceLocation, TydexError};
use crate::models::FieldValue;
use std::fmt;
use std::ops::Range;

/// Expected type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float,
    Integer,
    /// Integer when the token has no fractional part or exponent, else float
    Number,
    Text,
    /// Number followed by a unit, e.g. `4000 N`
    Quantity,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Float => write!(f, "float"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
            FieldType::Text => write!(f, "text"),
            FieldType::Quantity => write!(f, "number with unit"),
        }
    }
}

/// Fields of a fixed-column item line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub unit: &'a str,
    pub value: &'a str,
}

/// Converts raw tokens into typed values
#[derive(Debug, Clone)]
pub struct FieldParser {
    decimal_separator: char,
    layout: ColumnLayout,
}

impl FieldParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            decimal_separator: config.decimal_separator,
            layout: config.layout.clone(),
        }
    }

    /// Split an item line by the configured column layout
    pub fn split_item<'a>(&self, raw: &'a str) -> ItemFields<'a> {
        let value_start = self.layout.value_start();
        ItemFields {
            name: char_slice(raw, self.layout.name_range()).trim(),
            description: char_slice(raw, self.layout.description_range()).trim(),
            unit: char_slice(raw, self.layout.unit_range()).trim(),
            value: char_slice(raw, value_start..usize::MAX).trim(),
        }
    }

    /// Parse a token as the given type
    pub fn parse(&self, raw: &str, expected: FieldType, at: &SourceLocation) -> Result<FieldValue> {
        match expected {
            FieldType::Float => self.parse_float(raw, at).map(FieldValue::Float),
            FieldType::Integer => self.parse_integer(raw, at).map(FieldValue::Integer),
            FieldType::Number => self.parse_number(raw, at),
            FieldType::Text => Ok(FieldValue::Text(raw.trim().to_string())),
            FieldType::Quantity => self.parse_quantity(raw, at).map(|(value, _)| value),
        }
    }

    pub fn parse_float(&self, raw: &str, at: &SourceLocation) -> Result<f64> {
        self.normalize_numeric(raw)
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| malformed(raw, FieldType::Float, at))
    }

    pub fn parse_integer(&self, raw: &str, at: &SourceLocation) -> Result<i64> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| malformed(raw, FieldType::Integer, at))
    }

    pub fn parse_number(&self, raw: &str, at: &SourceLocation) -> Result<FieldValue> {
        if let Ok(value) = raw.trim().parse::<i64>() {
            return Ok(FieldValue::Integer(value));
        }

        self.normalize_numeric(raw)
            .and_then(|s| s.parse::<f64>().ok())
            .map(FieldValue::Float)
            .ok_or_else(|| malformed(raw, FieldType::Number, at))
    }

    /// Parse `<number> <unit>`; the unit is whatever follows the number
    pub fn parse_quantity(&self, raw: &str, at: &SourceLocation) -> Result<(FieldValue, String)> {
        let trimmed = raw.trim();
        let (number, unit) = match trimmed.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, unit.trim()),
            None => return Err(malformed(raw, FieldType::Quantity, at)),
        };

        let value = self
            .parse_number(number, at)
            .map_err(|_| malformed(raw, FieldType::Quantity, at))?;
        Ok((value, unit.to_string()))
    }

    /// Best-effort scalar for free-form header values: integer, float, else text
    pub fn infer(&self, raw: &str) -> FieldValue {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return FieldValue::Integer(value);
        }

        match self.normalize_numeric(trimmed).and_then(|s| s.parse::<f64>().ok()) {
            Some(value) => FieldValue::Float(value),
            None => FieldValue::Text(trimmed.to_string()),
        }
    }

    /// Parse a whitespace-separated data row
    pub fn parse_row(&self, text: &str, at: &SourceLocation) -> Result<Vec<f64>> {
        text.split_whitespace()
            .map(|token| self.parse_float(token, at))
            .collect()
    }

    /// Rewrite a numeric token into Rust's float syntax.
    ///
    /// Accepts the configured decimal separator and Fortran `D` exponents;
    /// rejects anything with other characters (so `inf`/`nan` never parse).
    fn normalize_numeric(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for c in trimmed.chars() {
            match c {
                '0'..='9' | '+' | '-' | 'e' | 'E' => normalized.push(c),
                'd' | 'D' => normalized.push('e'),
                '.' if self.decimal_separator == '.' => normalized.push('.'),
                ',' if self.decimal_separator == ',' => normalized.push('.'),
                _ => return None,
            }
        }

        if !normalized.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(normalized)
    }
}

fn malformed(raw: &str, expected: FieldType, at: &SourceLocation) -> TydexError {
    TydexError::MalformedField {
        location: at.clone(),
        raw: raw.trim().to_string(),
        expected: expected.to_string(),
    }
}

/// Slice by character positions, clamped to the string
fn char_slice(s: &str, range: Range<usize>) -> &str {
    let byte_at = |pos: usize| {
        s.char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    };
    let start = byte_at(range.start);
    let end = if range.end == usize::MAX {
        s.len()
    } else {
        byte_at(range.end).max(start)
    };
    &s[start..end]
}

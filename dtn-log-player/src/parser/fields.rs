//! `key=value` token parsing
//!
//! Every declare and event line is a whitespace-separated list of
//! `key=value` tokens. A value containing `|` is a list, anything else is a
//! scalar. [`LineFields`] wraps the parsed tokens together with the source
//! line so typed accessors can report the offending line on failure.

use crate::types::{FieldValue, Fields, PlayerError, Result};
use std::str::FromStr;

/// Split a line into its `key=value` fields
///
/// Tokens without `=` are ignored. Only the first `=` separates key from
/// value, so values may themselves contain `=`.
pub fn parse_fields(line: &str) -> Fields {
    let mut fields = Fields::new();

    for token in line.split_whitespace() {
        if let Some((key, value)) = token.split_once('=') {
            let value = if value.contains('|') {
                FieldValue::List(value.split('|').map(str::to_string).collect())
            } else {
                FieldValue::Scalar(value.to_string())
            };
            fields.insert(key.to_string(), value);
        }
    }

    fields
}

/// Parsed fields of one source line
pub(crate) struct LineFields<'a> {
    number: usize,
    content: &'a str,
    fields: Fields,
}

impl<'a> LineFields<'a> {
    pub fn parse(number: usize, content: &'a str) -> Self {
        Self {
            number,
            content,
            fields: parse_fields(content),
        }
    }

    /// Build a format error pointing at this line
    pub fn error(&self, reason: impl Into<String>) -> PlayerError {
        PlayerError::Format {
            line: self.number,
            content: self.content.to_string(),
            reason: reason.into(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(FieldValue::to_text)
    }

    pub fn require_text(&self, key: &str) -> Result<String> {
        self.text(key)
            .ok_or_else(|| self.error(format!("missing required field `{}`", key)))
    }

    pub fn require_list(&self, key: &str) -> Result<Vec<String>> {
        self.fields
            .get(key)
            .map(FieldValue::to_list)
            .ok_or_else(|| self.error(format!("missing required field `{}`", key)))
    }

    /// Parse a scalar field, falling back to `default` when absent
    pub fn number_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.text(key) {
            Some(raw) => self.parse_number(key, &raw),
            None => Ok(default),
        }
    }

    pub fn require_number<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.require_text(key)?;
        self.parse_number(key, &raw)
    }

    /// Parse every item of a list field
    pub fn number_list<T: FromStr>(&self, key: &str) -> Result<Vec<T>> {
        self.require_list(key)?
            .iter()
            .map(|raw| self.parse_number(key, raw))
            .collect()
    }

    /// Parse a finite floating-point field
    pub fn require_finite(&self, key: &str) -> Result<f64> {
        let value: f64 = self.require_number(key)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.error(format!("field `{}` must be finite, got {}", key, value)))
        }
    }

    fn parse_number<T: FromStr>(&self, key: &str, raw: &str) -> Result<T> {
        raw.trim().parse::<T>().map_err(|_| {
            self.error(format!("field `{}` is not a valid number: {:?}", key, raw))
        })
    }
}

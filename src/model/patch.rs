//! Field-mapping patches
//!
//! A patch is parsed from a JSON object mapping field names to new values.
//! Only known, mutable fields are accepted; everything else is a
//! [`FieldError`] and nothing is written.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::EntityId;

/// Raw field mapping as received from a caller
pub type FieldMap = Map<String, Value>;

/// Field-level validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Field is not part of the entity
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Field exists but cannot be changed
    #[error("field '{0}' is immutable")]
    ImmutableField(String),

    /// Value has the wrong JSON type
    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    /// Value has the right type but is not acceptable
    #[error("field '{field}' is invalid: {reason}")]
    Invalid { field: String, reason: String },

    /// The mapping contains no fields at all
    #[error("no fields to update")]
    Empty,
}

impl FieldError {
    fn wrong_type(field: &str, expected: &'static str) -> Self {
        FieldError::WrongType {
            field: field.to_string(),
            expected,
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        FieldError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A typed partial update parsed from a [`FieldMap`]
pub trait Patch: Sized + Send + Sync + std::fmt::Debug {
    /// Fields that may be changed
    const MUTABLE: &'static [&'static str];

    /// Fields that exist on the entity but may not be changed
    const IMMUTABLE: &'static [&'static str] = &["id"];

    /// Parse and validate a field mapping
    fn from_fields(fields: &FieldMap) -> Result<Self, FieldError>;

    /// Check every key against the known field lists
    fn check_keys(fields: &FieldMap) -> Result<(), FieldError> {
        if fields.is_empty() {
            return Err(FieldError::Empty);
        }
        for key in fields.keys() {
            if Self::IMMUTABLE.contains(&key.as_str()) {
                return Err(FieldError::ImmutableField(key.clone()));
            }
            if !Self::MUTABLE.contains(&key.as_str()) {
                return Err(FieldError::UnknownField(key.clone()));
            }
        }
        Ok(())
    }
}

/// Non-empty trimmed string
pub(crate) fn text_field(field: &str, value: &Value) -> Result<String, FieldError> {
    let s = value
        .as_str()
        .ok_or_else(|| FieldError::wrong_type(field, "a string"))?;
    non_empty(field, s)
}

pub(crate) fn non_empty(field: &str, s: &str) -> Result<String, FieldError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(FieldError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Positive integer identifier
pub(crate) fn id_field(field: &str, value: &Value) -> Result<EntityId, FieldError> {
    let id = value
        .as_i64()
        .ok_or_else(|| FieldError::wrong_type(field, "an integer"))?;
    if id <= 0 {
        return Err(FieldError::invalid(field, "must be a positive identifier"));
    }
    Ok(id)
}

/// RFC 3339 timestamp or plain `YYYY-MM-DD` date
pub(crate) fn timestamp_field(field: &str, value: &Value) -> Result<DateTime<Utc>, FieldError> {
    let s = value
        .as_str()
        .ok_or_else(|| FieldError::wrong_type(field, "a date string"))?;
    parse_timestamp(s).ok_or_else(|| FieldError::invalid(field, format!("'{}' is not a date", s)))
}

/// Parse an RFC 3339 timestamp, or a bare date taken as midnight UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_rfc3339() {
        let ts = parse_timestamp("2021-03-04T05:06:07+02:00").unwrap();
        assert_eq!(ts.hour(), 3);
        assert_eq!(ts.day(), 4);
    }

    #[test]
    fn test_parse_bare_date() {
        let ts = parse_timestamp("1999-12-31").unwrap();
        assert_eq!(ts.year(), 1999);
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_text_field_trims() {
        assert_eq!(text_field("name", &json!("  Ursula ")).unwrap(), "Ursula");
        assert!(matches!(
            text_field("name", &json!("   ")),
            Err(FieldError::Invalid { .. })
        ));
        assert!(matches!(
            text_field("name", &json!(12)),
            Err(FieldError::WrongType { .. })
        ));
    }

    #[test]
    fn test_id_field() {
        assert_eq!(id_field("authorId", &json!(7)).unwrap(), 7);
        assert!(id_field("authorId", &json!(0)).is_err());
        assert!(id_field("authorId", &json!("7")).is_err());
        assert!(id_field("authorId", &json!(1.5)).is_err());
    }
}

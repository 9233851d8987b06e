//! Attribute values and the per-attribute value-state tuple.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value held by one attribute of a field row.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(i64),
    Text(String),
}

impl AttrValue {
    /// Only `Null` and the empty string count as empty; `false` and `0` are
    /// real values.
    ///
    pub fn is_empty(&self) -> bool {
        match self {
            AttrValue::Null => true,
            AttrValue::Text(s) => s.is_empty(),
            AttrValue::Bool(_) | AttrValue::Number(_) => false,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        AttrValue::Text(value.into())
    }

    /// Borrow the value as text when it is textual.
    ///
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Interpret the value as a boolean. Text is never truthy here; imports
    /// coerce checkbox columns before they reach the row.
    ///
    pub fn as_bool(&self) -> bool {
        matches!(self, AttrValue::Bool(true))
    }

    /// Interpret the value as an integer, parsing text when needed.
    ///
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Default for AttrValue {
    fn default() -> Self {
        AttrValue::Null
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value)
    }
}

/// Value-state tuple tracked per attribute per row.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeState {
    pub value: AttrValue,
    pub touched: bool,
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl AttributeState {
    /// Return a fresh, untouched state holding the given value.
    ///
    pub fn new(value: AttrValue) -> Self {
        AttributeState {
            value,
            touched: false,
            is_valid: true,
            error_message: None,
        }
    }

    pub(crate) fn mark_valid(&mut self) {
        self.is_valid = true;
        self.error_message = None;
    }

    pub(crate) fn mark_invalid(&mut self, message: &str) {
        self.is_valid = false;
        self.error_message = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_value_emptiness() {
        assert!(AttrValue::Null.is_empty());
        assert!(AttrValue::text("").is_empty());
        assert!(!AttrValue::text(" ").is_empty());
        assert!(!AttrValue::Bool(false).is_empty());
        assert!(!AttrValue::Number(0).is_empty());
    }

    #[test]
    fn test_attr_value_as_i64() {
        assert_eq!(AttrValue::Number(18).as_i64(), Some(18));
        assert_eq!(AttrValue::text(" 42 ").as_i64(), Some(42));
        assert_eq!(AttrValue::text("forty").as_i64(), None);
        assert_eq!(AttrValue::Null.as_i64(), None);
    }

    #[test]
    fn test_attr_value_untagged_serde() {
        assert_eq!(serde_json::to_string(&AttrValue::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&AttrValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&AttrValue::Number(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&AttrValue::text("abc")).unwrap(),
            "\"abc\""
        );
        let value: AttrValue = serde_json::from_str("false").unwrap();
        assert_eq!(value, AttrValue::Bool(false));
    }

    #[test]
    fn test_attribute_state_marks() {
        let mut state = AttributeState::new(AttrValue::Null);
        assert!(state.is_valid);
        state.mark_invalid("This field is required");
        assert!(!state.is_valid);
        assert_eq!(state.error_message.as_deref(), Some("This field is required"));
        state.mark_valid();
        assert!(state.is_valid);
        assert!(state.error_message.is_none());
    }
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User attribute values and namespaces.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Maximum length of an attribute or property key.
pub const MAX_ATTRIBUTE_KEY_LENGTH: usize = 128;

/// A scalar attribute or goal property value.
///
/// Serialized untagged, so `true`, `42`, `9.5` and `"gold"` appear on the wire
/// as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
}

impl AttributeValue {
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttributeValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			AttributeValue::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			AttributeValue::Float(f) => Some(*f),
			AttributeValue::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttributeValue::String(s) => Some(s),
			_ => None,
		}
	}
}

impl From<bool> for AttributeValue {
	fn from(value: bool) -> Self {
		AttributeValue::Bool(value)
	}
}

impl From<i32> for AttributeValue {
	fn from(value: i32) -> Self {
		AttributeValue::Int(value.into())
	}
}

impl From<i64> for AttributeValue {
	fn from(value: i64) -> Self {
		AttributeValue::Int(value)
	}
}

impl From<u32> for AttributeValue {
	fn from(value: u32) -> Self {
		AttributeValue::Int(value.into())
	}
}

impl From<f32> for AttributeValue {
	fn from(value: f32) -> Self {
		AttributeValue::Float(value.into())
	}
}

impl From<f64> for AttributeValue {
	fn from(value: f64) -> Self {
		AttributeValue::Float(value)
	}
}

impl From<&str> for AttributeValue {
	fn from(value: &str) -> Self {
		AttributeValue::String(value.to_string())
	}
}

impl From<String> for AttributeValue {
	fn from(value: String) -> Self {
		AttributeValue::String(value)
	}
}

impl From<AttributeValue> for serde_json::Value {
	fn from(value: AttributeValue) -> Self {
		match value {
			AttributeValue::Bool(b) => serde_json::Value::Bool(b),
			AttributeValue::Int(i) => serde_json::Value::Number(i.into()),
			AttributeValue::Float(f) => serde_json::Number::from_f64(f)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			AttributeValue::String(s) => serde_json::Value::String(s),
		}
	}
}

impl TryFrom<serde_json::Value> for AttributeValue {
	type Error = serde_json::Value;

	/// Converts a JSON scalar. Arrays, objects and `null` are handed back as
	/// the error value.
	fn try_from(value: serde_json::Value) -> std::result::Result<Self, Self::Error> {
		match value {
			serde_json::Value::Bool(b) => Ok(AttributeValue::Bool(b)),
			serde_json::Value::Number(ref n) => {
				if let Some(i) = n.as_i64() {
					Ok(AttributeValue::Int(i))
				} else if let Some(f) = n.as_f64() {
					Ok(AttributeValue::Float(f))
				} else {
					Err(value)
				}
			}
			serde_json::Value::String(s) => Ok(AttributeValue::String(s)),
			other => Err(other),
		}
	}
}

/// Which attribute map a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeNamespace {
	/// Shared with the backend for targeting.
	Public,
	/// Kept apart from public attributes; can be bulk-cleared.
	Private,
}

impl AttributeNamespace {
	pub fn as_str(&self) -> &'static str {
		match self {
			AttributeNamespace::Public => "public",
			AttributeNamespace::Private => "private",
		}
	}
}

impl std::fmt::Display for AttributeNamespace {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Validates an attribute or property key.
///
/// Keys must be non-blank, at most 128 bytes, and free of control characters.
pub fn validate_attribute_key(key: &str) -> Result<()> {
	if key.trim().is_empty() {
		return Err(CoreError::InvalidAttributeKey("must not be blank".to_string()));
	}
	if key.len() > MAX_ATTRIBUTE_KEY_LENGTH {
		return Err(CoreError::InvalidAttributeKey(format!(
			"longer than {MAX_ATTRIBUTE_KEY_LENGTH} bytes"
		)));
	}
	if key.chars().any(char::is_control) {
		return Err(CoreError::InvalidAttributeKey(format!(
			"contains control characters: {key:?}"
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn scalars_serialize_untagged() {
		assert_eq!(serde_json::to_string(&AttributeValue::from(true)).unwrap(), "true");
		assert_eq!(serde_json::to_string(&AttributeValue::from(42)).unwrap(), "42");
		assert_eq!(serde_json::to_string(&AttributeValue::from("gold")).unwrap(), "\"gold\"");
	}

	#[test]
	fn deserializes_integers_before_floats() {
		let v: AttributeValue = serde_json::from_str("7").unwrap();
		assert_eq!(v, AttributeValue::Int(7));
		let v: AttributeValue = serde_json::from_str("7.5").unwrap();
		assert_eq!(v, AttributeValue::Float(7.5));
	}

	#[test]
	fn json_non_scalars_are_rejected() {
		assert!(AttributeValue::try_from(serde_json::json!([1, 2])).is_err());
		assert!(AttributeValue::try_from(serde_json::json!({"a": 1})).is_err());
		assert!(AttributeValue::try_from(serde_json::Value::Null).is_err());
		assert_eq!(
			AttributeValue::try_from(serde_json::json!("x")),
			Ok(AttributeValue::String("x".to_string()))
		);
	}

	#[test]
	fn accessors() {
		assert_eq!(AttributeValue::from(3).as_f64(), Some(3.0));
		assert_eq!(AttributeValue::from(false).as_bool(), Some(false));
		assert_eq!(AttributeValue::from("a").as_i64(), None);
	}

	#[test]
	fn key_validation() {
		assert!(validate_attribute_key("isProUser").is_ok());
		assert!(validate_attribute_key("").is_err());
		assert!(validate_attribute_key("  ").is_err());
		assert!(validate_attribute_key("bad\nkey").is_err());
		assert!(validate_attribute_key(&"k".repeat(MAX_ATTRIBUTE_KEY_LENGTH + 1)).is_err());
	}

	proptest! {
		#[test]
		fn integer_attributes_survive_json(i in any::<i64>()) {
			let json: serde_json::Value = AttributeValue::Int(i).into();
			prop_assert_eq!(AttributeValue::try_from(json), Ok(AttributeValue::Int(i)));
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helper for building goal properties and attribute maps.

use std::collections::BTreeMap;

use abbi_core::AttributeValue;

/// A builder for goal properties or a batch of user attributes.
///
/// # Example
///
/// ```
/// use abbi::Properties;
///
/// let props = Properties::new()
///     .insert("item_name", "unlimited_calls")
///     .insert("price", 4.99)
///     .insert("is_gift", false);
/// assert_eq!(props.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
	inner: BTreeMap<String, AttributeValue>,
}

impl Properties {
	pub fn new() -> Self {
		Self {
			inner: BTreeMap::new(),
		}
	}

	/// Inserts a key-value pair. A later insert with the same key wins.
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.inner.insert(key.into(), value.into());
		self
	}

	/// Merges another Properties into this one.
	///
	/// If both contain the same key, the value from `other` takes precedence.
	pub fn merge(mut self, other: Properties) -> Self {
		self.inner.extend(other.inner);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn get(&self, key: &str) -> Option<&AttributeValue> {
		self.inner.get(key)
	}

	pub fn into_map(self) -> BTreeMap<String, AttributeValue> {
		self.inner
	}
}

impl From<BTreeMap<String, AttributeValue>> for Properties {
	fn from(inner: BTreeMap<String, AttributeValue>) -> Self {
		Self { inner }
	}
}

impl From<Properties> for BTreeMap<String, AttributeValue> {
	fn from(props: Properties) -> Self {
		props.inner
	}
}

impl From<Properties> for serde_json::Value {
	fn from(props: Properties) -> Self {
		serde_json::Value::Object(
			props
				.inner
				.into_iter()
				.map(|(k, v)| (k, v.into()))
				.collect(),
		)
	}
}

impl<K, V> FromIterator<(K, V)> for Properties
where
	K: Into<String>,
	V: Into<AttributeValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			inner: iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}
}

impl IntoIterator for Properties {
	type Item = (String, AttributeValue);
	type IntoIter = std::collections::btree_map::IntoIter<String, AttributeValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.inner.into_iter()
	}
}

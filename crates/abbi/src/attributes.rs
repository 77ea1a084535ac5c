// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public and private user attribute maps.

use std::collections::BTreeMap;

use abbi_core::{validate_attribute_key, AttributeNamespace, AttributeValue};
use parking_lot::RwLock;
use tracing::warn;

use crate::error::Result;

type AttributeMap = BTreeMap<String, AttributeValue>;

/// Two independent attribute namespaces, each behind its own lock.
#[derive(Default)]
pub struct AttributeStore {
	public: RwLock<AttributeMap>,
	private: RwLock<AttributeMap>,
}

impl AttributeStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn map(&self, namespace: AttributeNamespace) -> &RwLock<AttributeMap> {
		match namespace {
			AttributeNamespace::Public => &self.public,
			AttributeNamespace::Private => &self.private,
		}
	}

	/// Upserts one attribute.
	pub fn set(&self, namespace: AttributeNamespace, key: &str, value: AttributeValue) -> Result<()> {
		validate_attribute_key(key)?;
		self.map(namespace).write().insert(key.to_string(), value);
		Ok(())
	}

	/// Upserts every entry with a valid key under one write lock and returns
	/// the entries that were applied. Invalid keys are skipped.
	pub fn set_many<I>(&self, namespace: AttributeNamespace, entries: I) -> AttributeMap
	where
		I: IntoIterator<Item = (String, AttributeValue)>,
	{
		let accepted: AttributeMap = entries
			.into_iter()
			.filter(|(key, _)| match validate_attribute_key(key) {
				Ok(()) => true,
				Err(e) => {
					warn!(namespace = %namespace, error = %e, "Skipping attribute");
					false
				}
			})
			.collect();

		if !accepted.is_empty() {
			let mut map = self.map(namespace).write();
			for (key, value) in &accepted {
				map.insert(key.clone(), value.clone());
			}
		}
		accepted
	}

	pub fn get(&self, namespace: AttributeNamespace, key: &str) -> Option<AttributeValue> {
		self.map(namespace).read().get(key).cloned()
	}

	pub fn snapshot(&self, namespace: AttributeNamespace) -> AttributeMap {
		self.map(namespace).read().clone()
	}

	/// Empties a namespace and returns how many entries it held.
	pub fn clear(&self, namespace: AttributeNamespace) -> usize {
		let mut map = self.map(namespace).write();
		let count = map.len();
		map.clear();
		count
	}
}

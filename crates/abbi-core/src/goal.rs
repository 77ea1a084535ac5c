// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Goals: named user actions reported for targeting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribute::AttributeValue;
use crate::error::{CoreError, Result};

/// Maximum length of a goal name, in bytes.
pub const MAX_GOAL_NAME_LENGTH: usize = 256;

/// Unique identifier for a reported goal. Time-ordered (UUIDv7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub Uuid);

impl GoalId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for GoalId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for GoalId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A goal as it is queued for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
	pub id: GoalId,
	pub name: String,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub properties: BTreeMap<String, AttributeValue>,
	pub timestamp: DateTime<Utc>,
}

impl Goal {
	/// Creates a goal stamped with a fresh id and the current time.
	///
	/// The name is validated; properties are taken as-is.
	pub fn new(name: &str, properties: BTreeMap<String, AttributeValue>) -> Result<Self> {
		validate_goal_name(name)?;
		Ok(Self {
			id: GoalId::new(),
			name: name.to_string(),
			properties,
			timestamp: Utc::now(),
		})
	}
}

/// Validates a goal name: non-blank, at most 256 bytes, no control characters.
///
/// Goal names are free text ("Bought a blue sword"), so spaces and mixed case
/// are allowed.
pub fn validate_goal_name(name: &str) -> Result<()> {
	if name.trim().is_empty() {
		return Err(CoreError::InvalidGoalName("must not be blank".to_string()));
	}
	if name.len() > MAX_GOAL_NAME_LENGTH {
		return Err(CoreError::InvalidGoalName(format!(
			"longer than {MAX_GOAL_NAME_LENGTH} bytes"
		)));
	}
	if name.chars().any(char::is_control) {
		return Err(CoreError::InvalidGoalName(format!(
			"contains control characters: {name:?}"
		)));
	}
	Ok(())
}

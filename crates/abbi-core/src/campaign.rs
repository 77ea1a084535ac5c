// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Campaign descriptors and trigger validation.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Maximum length of a trigger key, in bytes.
pub const MAX_TRIGGER_NAME_LENGTH: usize = 256;

/// Backend-assigned campaign identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl CampaignId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for CampaignId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Describes a campaign that was displayed or dismissed.
///
/// Handed to the presenter for display and to the campaign delegate on
/// dismissal. `metadata` is passed through from the backend untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInfo {
	pub campaign_id: CampaignId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trigger: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default)]
	pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl CampaignInfo {
	pub fn new(campaign_id: impl Into<String>) -> Self {
		Self {
			campaign_id: CampaignId::new(campaign_id),
			trigger: None,
			title: None,
			metadata: serde_json::Map::new(),
		}
	}

	pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
		self.trigger = Some(trigger.into());
		self
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}
}

/// Validates a trigger key such as `"Show How To Order Credit Card"`.
pub fn validate_trigger_name(name: &str) -> Result<()> {
	if name.trim().is_empty() {
		return Err(CoreError::InvalidTriggerName("must not be blank".to_string()));
	}
	if name.len() > MAX_TRIGGER_NAME_LENGTH {
		return Err(CoreError::InvalidTriggerName(format!(
			"longer than {MAX_TRIGGER_NAME_LENGTH} bytes"
		)));
	}
	if name.chars().any(char::is_control) {
		return Err(CoreError::InvalidTriggerName(format!(
			"contains control characters: {name:?}"
		)));
	}
	Ok(())
}

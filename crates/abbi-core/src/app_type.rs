// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host application categories.
//!
//! Hybrid hosts (webview based) and game engines are started with an explicit
//! [`AppType`] so the backend can pick a compatible campaign renderer.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The category of the host application.
///
/// The numeric codes are part of the wire protocol. `14` is the exclusive
/// upper bound of the range and never a valid type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
	#[default]
	Native,
	Hybrid,
	Cocos2d,
	Unity,
}

impl AppType {
	/// Exclusive upper bound of the wire code range.
	pub const MAX_CODE: i32 = 14;

	/// Returns the wire code for this type.
	pub fn code(&self) -> i32 {
		match self {
			AppType::Native => 10,
			AppType::Hybrid => 11,
			AppType::Cocos2d => 12,
			AppType::Unity => 13,
		}
	}

	/// Parses a wire code.
	pub fn from_code(code: i32) -> Result<Self> {
		match code {
			10 => Ok(AppType::Native),
			11 => Ok(AppType::Hybrid),
			12 => Ok(AppType::Cocos2d),
			13 => Ok(AppType::Unity),
			other => Err(CoreError::InvalidAppType(other)),
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AppType::Native => "native",
			AppType::Hybrid => "hybrid",
			AppType::Cocos2d => "cocos2d",
			AppType::Unity => "unity",
		}
	}
}

impl std::fmt::Display for AppType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for AppType {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"native" => Ok(AppType::Native),
			"hybrid" => Ok(AppType::Hybrid),
			"cocos2d" => Ok(AppType::Cocos2d),
			"unity" => Ok(AppType::Unity),
			_ => Err(format!("invalid app type: {s}")),
		}
	}
}

impl TryFrom<i32> for AppType {
	type Error = CoreError;

	fn try_from(code: i32) -> Result<Self> {
		Self::from_code(code)
	}
}

/// Kind of event reported to the backend.
///
/// Goals are the only event type the SDK emits today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
	Goal,
}

impl EventType {
	pub fn code(&self) -> i32 {
		match self {
			EventType::Goal => 1,
		}
	}
}

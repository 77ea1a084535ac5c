// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application credentials issued by the ABBI console.
//!
//! An application is identified by a public [`AppId`] and authenticated with a
//! [`SecretKey`]. The secret key never appears in `Debug`, `Display`, or
//! serialized output, and its memory is zeroed on drop.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use zeroize::Zeroize;

use crate::error::{CoreError, Result};

/// Maximum length of an application id.
pub const MAX_APP_ID_LENGTH: usize = 64;
/// Minimum length of a secret key.
pub const MIN_SECRET_KEY_LENGTH: usize = 8;
/// Maximum length of a secret key.
pub const MAX_SECRET_KEY_LENGTH: usize = 256;

/// Placeholder printed instead of secret material.
pub const REDACTED: &str = "[REDACTED]";

/// Public application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
	/// Validates and wraps an application id.
	///
	/// Ids are 1-64 ASCII characters drawn from alphanumerics, `-` and `_`.
	pub fn parse(raw: &str) -> Result<Self> {
		let trimmed = raw.trim();
		if trimmed.is_empty() {
			return Err(CoreError::InvalidAppId("must not be empty".to_string()));
		}
		if trimmed.len() > MAX_APP_ID_LENGTH {
			return Err(CoreError::InvalidAppId(format!(
				"longer than {MAX_APP_ID_LENGTH} characters"
			)));
		}
		if !trimmed
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		{
			return Err(CoreError::InvalidAppId(format!(
				"contains invalid characters: {trimmed}"
			)));
		}
		Ok(Self(trimmed.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AppId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Application secret key.
///
/// There is deliberately no `Deref`; call [`SecretKey::expose`] where the raw
/// value is needed (the `Authorization` header).
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey(String);

impl SecretKey {
	/// Validates and wraps a secret key.
	///
	/// Keys are 8-256 printable ASCII characters without whitespace.
	pub fn parse(raw: &str) -> Result<Self> {
		if raw.is_empty() {
			return Err(CoreError::InvalidSecretKey("must not be empty".to_string()));
		}
		if raw.len() < MIN_SECRET_KEY_LENGTH || raw.len() > MAX_SECRET_KEY_LENGTH {
			return Err(CoreError::InvalidSecretKey(format!(
				"length must be between {MIN_SECRET_KEY_LENGTH} and {MAX_SECRET_KEY_LENGTH}"
			)));
		}
		if !raw.chars().all(|c| c.is_ascii_graphic()) {
			return Err(CoreError::InvalidSecretKey(
				"must be printable ASCII without whitespace".to_string(),
			));
		}
		Ok(Self(raw.to_string()))
	}

	/// Returns the raw key.
	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretKey").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Serialize for SecretKey {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

/// A validated application id and secret key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
	pub app_id: AppId,
	pub secret_key: SecretKey,
}

impl Credentials {
	/// Validates both halves of a credential pair.
	pub fn parse(app_id: &str, secret_key: &str) -> Result<Self> {
		Ok(Self {
			app_id: AppId::parse(app_id)?,
			secret_key: SecretKey::parse(secret_key)?,
		})
	}
}

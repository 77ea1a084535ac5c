// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External user identity.

use crate::error::{CoreError, Result};

/// Maximum length of an external user id, in bytes.
pub const MAX_USER_ID_LENGTH: usize = 200;

/// Validates an external user id set through `set_user_id`.
pub fn validate_user_id(user_id: &str) -> Result<()> {
	if user_id.trim().is_empty() {
		return Err(CoreError::InvalidUserId("must not be blank".to_string()));
	}
	if user_id.len() > MAX_USER_ID_LENGTH {
		return Err(CoreError::InvalidUserId(format!(
			"longer than {MAX_USER_ID_LENGTH} bytes"
		)));
	}
	if user_id.chars().any(char::is_control) {
		return Err(CoreError::InvalidUserId(
			"contains control characters".to_string(),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_typical_ids() {
		assert!(validate_user_id("myuserid").is_ok());
		assert!(validate_user_id("user@example.com").is_ok());
	}

	#[test]
	fn rejects_blank_and_overlong() {
		assert!(validate_user_id("").is_err());
		assert!(validate_user_id("   ").is_err());
		assert!(validate_user_id(&"u".repeat(MAX_USER_ID_LENGTH + 1)).is_err());
	}
}

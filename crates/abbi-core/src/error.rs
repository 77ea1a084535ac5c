// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation errors for SDK inputs.

use thiserror::Error;

/// Errors raised when caller-supplied values fail validation.
///
/// None of these ever reach the host application: the SDK facade logs them
/// and drops the offending call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
	#[error("invalid app id: {0}")]
	InvalidAppId(String),

	#[error("invalid secret key: {0}")]
	InvalidSecretKey(String),

	#[error("invalid app type code: {0}")]
	InvalidAppType(i32),

	#[error("invalid goal name: {0}")]
	InvalidGoalName(String),

	#[error("invalid attribute key: {0}")]
	InvalidAttributeKey(String),

	#[error("invalid trigger name: {0}")]
	InvalidTriggerName(String),

	#[error("invalid user id: {0}")]
	InvalidUserId(String),
}

/// A specialized `Result` type for core validation.
pub type Result<T> = std::result::Result<T, CoreError>;

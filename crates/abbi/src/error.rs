// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the ABBI SDK.
//!
//! The public facade never returns these to the host for the core
//! operations; they flow through the background pipeline and the transport
//! and end up as log lines. `flush` and `shutdown` do surface them.

use std::time::Duration;

use abbi_common_http::RetryableError;
use abbi_core::CoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// ABBI SDK errors.
#[derive(Debug, Error)]
pub enum AbbiError {
	/// Caller input failed validation.
	#[error("validation failed: {0}")]
	Validation(#[from] CoreError),

	/// Base URL is missing or not an absolute http(s) URL.
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Server returned an error response.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// Rate limited by the server.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },

	/// Client has been shut down.
	#[error("client has been shut down")]
	ClientShutdown,

	/// The command channel to the background worker is full.
	#[error("outbound queue is full")]
	QueueFull,

	/// The background runtime could not be created.
	#[error("failed to start background runtime: {0}")]
	Runtime(#[source] std::io::Error),

	/// Serialization error.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Configuration could not be loaded.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
}

impl RetryableError for AbbiError {
	fn is_retryable(&self) -> bool {
		match self {
			AbbiError::RequestFailed(e) => e.is_retryable(),
			AbbiError::ServerError { status, .. } => {
				matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
			}
			AbbiError::RateLimited { .. } => true,
			_ => false,
		}
	}

	fn retry_after(&self) -> Option<Duration> {
		match self {
			AbbiError::RateLimited {
				retry_after_secs: Some(secs),
			} => Some(Duration::from_secs(*secs)),
			_ => None,
		}
	}
}

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, AbbiError>;

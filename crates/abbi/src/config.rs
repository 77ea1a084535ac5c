// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration and environment loading.
//!
//! Hosts usually configure the SDK in code through
//! [`AbbiClientBuilder`](crate::AbbiClientBuilder). For server-side or test
//! harness use the same settings can come from the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `ABBI_BASE_URL` | Backend base URL |
//! | `ABBI_URL_SCHEME` | Custom scheme answered by `open_url` |
//! | `ABBI_LINK_HOST` | Universal-link host answered by `open_url` |
//! | `ABBI_FLUSH_INTERVAL_SECS` | Batch flush interval |
//! | `ABBI_REQUEST_TIMEOUT_SECS` | HTTP request timeout |
//! | `ABBI_APP_ID` | Application id |
//! | `ABBI_SECRET_KEY` / `ABBI_SECRET_KEY_FILE` | Application secret key |

use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use abbi_common_http::RetryConfig;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::batch::BatchConfig;

/// Backend used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://sdk.abbi.io";

pub const ENV_BASE_URL: &str = "ABBI_BASE_URL";
pub const ENV_URL_SCHEME: &str = "ABBI_URL_SCHEME";
pub const ENV_LINK_HOST: &str = "ABBI_LINK_HOST";
pub const ENV_FLUSH_INTERVAL_SECS: &str = "ABBI_FLUSH_INTERVAL_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "ABBI_REQUEST_TIMEOUT_SECS";
pub const ENV_APP_ID: &str = "ABBI_APP_ID";
pub const ENV_SECRET_KEY: &str = "ABBI_SECRET_KEY";

/// Errors that can occur when loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Failed to read a `*_FILE` secret.
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// A `*_FILE` variable was set to an empty path.
	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },

	/// A variable was set but could not be parsed.
	#[error("invalid value for {var}: {reason}")]
	InvalidValue { var: String, reason: String },
}

/// Tunables for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Timeout for HTTP requests.
	pub request_timeout: Duration,
	/// Batch configuration for outbound messages.
	pub batch_config: BatchConfig,
	/// Retry configuration for HTTP requests.
	pub retry_config: RetryConfig,
	/// Capacity of the command channel between the facade and the worker.
	/// Calls made while it is full are dropped.
	pub channel_capacity: usize,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
			batch_config: BatchConfig::default(),
			retry_config: RetryConfig::default(),
			channel_capacity: 1024,
		}
	}
}

/// Settings read from `ABBI_*` environment variables. Unset variables are
/// `None` and leave the builder defaults alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSettings {
	pub base_url: Option<String>,
	pub url_scheme: Option<String>,
	pub link_host: Option<String>,
	pub flush_interval: Option<Duration>,
	pub request_timeout: Option<Duration>,
}

impl EnvSettings {
	/// Reads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|var| env::var(var).ok())
	}

	/// Reads settings through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

		Ok(Self {
			base_url: non_empty(ENV_BASE_URL),
			url_scheme: non_empty(ENV_URL_SCHEME),
			link_host: non_empty(ENV_LINK_HOST),
			flush_interval: non_empty(ENV_FLUSH_INTERVAL_SECS)
				.map(|v| parse_secs(ENV_FLUSH_INTERVAL_SECS, &v))
				.transpose()?,
			request_timeout: non_empty(ENV_REQUEST_TIMEOUT_SECS)
				.map(|v| parse_secs(ENV_REQUEST_TIMEOUT_SECS, &v))
				.transpose()?,
		})
	}
}

fn parse_secs(var: &str, value: &str) -> Result<Duration, ConfigError> {
	let secs: u64 = value
		.trim()
		.parse()
		.map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
			var: var.to_string(),
			reason: e.to_string(),
		})?;
	if secs == 0 {
		return Err(ConfigError::InvalidValue {
			var: var.to_string(),
			reason: "must be greater than zero".to_string(),
		});
	}
	Ok(Duration::from_secs(secs))
}

/// Raw credentials read from the environment. Validation happens in `start`.
#[derive(Debug)]
pub struct EnvCredentials {
	pub app_id: String,
	pub secret_key: Zeroizing<String>,
}

/// Loads `ABBI_APP_ID` and `ABBI_SECRET_KEY` (or `ABBI_SECRET_KEY_FILE`).
///
/// Returns `Ok(None)` unless both are present.
pub fn credentials_from_env() -> Result<Option<EnvCredentials>, ConfigError> {
	credentials_from_lookup(|var| env::var(var).ok())
}

/// [`credentials_from_env`] with an injectable variable lookup.
pub fn credentials_from_lookup<F>(lookup: F) -> Result<Option<EnvCredentials>, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let Some(app_id) = lookup(ENV_APP_ID).filter(|v| !v.trim().is_empty()) else {
		return Ok(None);
	};
	let Some(secret_key) = load_secret_with(ENV_SECRET_KEY, &lookup)? else {
		return Ok(None);
	};
	Ok(Some(EnvCredentials { app_id, secret_key }))
}

/// Loads a secret using the `VAR` / `VAR_FILE` convention.
///
/// `VAR_FILE` wins over `VAR`. One trailing newline is stripped from file
/// contents.
pub fn load_secret_with<F>(var: &str, lookup: &F) -> Result<Option<Zeroizing<String>>, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");

	if let Some(path) = lookup(&file_var) {
		if path.is_empty() {
			return Err(ConfigError::EmptyPath { var: file_var });
		}
		let path = PathBuf::from(path);
		let mut contents = Zeroizing::new(
			fs::read_to_string(&path).map_err(|source| ConfigError::Io {
				path: path.clone(),
				source,
			})?,
		);
		if contents.ends_with('\n') {
			contents.pop();
			if contents.ends_with('\r') {
				contents.pop();
			}
		}
		return Ok(Some(contents));
	}

	Ok(lookup(var).map(Zeroizing::new))
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for transient transport failures.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

/// Backoff parameters for [`retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts including the first one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	/// Scale each delay by a random factor in `[0.5, 1.5)`, still capped by
	/// `max_delay`.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A config that never retries.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	/// Delay before retry number `retry` (0-based), before any server hint.
	pub fn backoff(&self, retry: u32) -> Duration {
		let max = self.max_delay.as_secs_f64();
		let exp = self.base_delay.as_secs_f64() * self.backoff_factor.powi(retry as i32);
		let capped = exp.min(max);
		let secs = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};
		// max_delay bounds the jittered delay too.
		Duration::from_secs_f64(secs.min(max))
	}
}

/// Classifies errors for [`retry`].
pub trait RetryableError {
	fn is_retryable(&self) -> bool;

	/// Server-provided minimum wait (`Retry-After`), if any.
	fn retry_after(&self) -> Option<Duration> {
		None
	}
}

/// Status codes worth retrying: throttling, timeouts, and gateway/server
/// failures.
pub fn is_retryable_status(status: StatusCode) -> bool {
	matches!(
		status,
		StatusCode::TOO_MANY_REQUESTS
			| StatusCode::REQUEST_TIMEOUT
			| StatusCode::INTERNAL_SERVER_ERROR
			| StatusCode::BAD_GATEWAY
			| StatusCode::SERVICE_UNAVAILABLE
			| StatusCode::GATEWAY_TIMEOUT
	)
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}
		self.status().map(is_retryable_status).unwrap_or(false)
	}
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `cfg.max_attempts` is reached. The last error is returned.
///
/// A `Retry-After` hint from the error raises the wait, still capped by
/// `max_delay`.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Display,
{
	let max_attempts = cfg.max_attempts.max(1);
	let mut attempt: u32 = 0;

	loop {
		attempt += 1;
		let err = match op().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};

		if !err.is_retryable() {
			debug!(error = %err, attempt, "giving up on non-retryable error");
			return Err(err);
		}
		if attempt >= max_attempts {
			warn!(error = %err, attempt, max_attempts, "retry attempts exhausted");
			return Err(err);
		}

		let mut delay = cfg.backoff(attempt - 1);
		if let Some(hint) = err.retry_after() {
			delay = delay.max(hint.min(cfg.max_delay));
		}
		warn!(
			error = %err,
			attempt,
			max_attempts,
			delay_ms = delay.as_millis() as u64,
			"transient failure, retrying"
		);
		tokio::time::sleep(delay).await;
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the ABBI SDK.
//!
//! This crate provides:
//! - An HTTP client builder that stamps the SDK User-Agent on every request
//! - Retry with exponential backoff and jitter for transient failures

mod client;
mod retry;

pub use client::{builder, new_client_with_timeout, platform, user_agent, SDK_NAME};
pub use retry::{is_retryable_status, retry, RetryConfig, RetryableError};

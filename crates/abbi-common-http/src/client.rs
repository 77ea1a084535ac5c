// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client construction with a consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Library name reported in the User-Agent and in session payloads.
pub const SDK_NAME: &str = "abbi-sdk-rust";

/// Creates a client builder with the SDK User-Agent header.
///
/// Use this when the caller needs further customization (proxy, TLS roots).
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a client with the SDK User-Agent and the given request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).build()
}

/// Returns the SDK User-Agent string.
///
/// Format: `abbi-sdk-rust/{version} ({platform})`, for example
/// `abbi-sdk-rust/0.1.0 (linux-x86_64)`.
pub fn user_agent() -> String {
	format!("{}/{} ({})", SDK_NAME, env!("CARGO_PKG_VERSION"), platform())
}

/// Platform string in `{os}-{arch}` form.
pub fn platform() -> String {
	format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport to the ABBI backend.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Deliver batch | `POST {base}/api/v1/batch` |
//! | Campaign by trigger | `POST {base}/api/v1/campaigns/trigger` |
//! | Campaign by id | `GET {base}/api/v1/campaigns/{id}` |

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use abbi_common_http::{retry, RetryConfig};
use abbi_core::{BatchRequest, CampaignId, CampaignInfo, Credentials, OutboundMessage, TriggerRequest};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;
use url::Url;

use crate::batch::BatchSender;
use crate::campaign::CampaignSource;
use crate::config::ClientConfig;
use crate::error::{AbbiError, Result};
use crate::SDK_VERSION;

pub const HEADER_APP_ID: &str = "X-Abbi-App-Id";
pub const HEADER_SDK_VERSION: &str = "X-Abbi-Sdk-Version";
pub const HEADER_FLAG: &str = "X-Abbi-Flag";

/// Talks JSON over HTTP to the backend. Implements both backend seams.
pub struct HttpTransport {
	http_client: Client,
	base_url: String,
	retry_config: RetryConfig,
	flag: Arc<AtomicI32>,
}

impl HttpTransport {
	/// `flag` is shared with the client so `set_flag` reaches every request.
	pub fn new(base_url: &str, config: &ClientConfig, flag: Arc<AtomicI32>) -> Result<Self> {
		let base_url = normalize_base_url(base_url)?;
		let http_client = abbi_common_http::new_client_with_timeout(config.request_timeout)
			.map_err(AbbiError::RequestFailed)?;

		Ok(Self {
			http_client,
			base_url,
			retry_config: config.retry_config.clone(),
			flag,
		})
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn authorize(&self, request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
		let request = request
			.header(HEADER_APP_ID, credentials.app_id.as_str())
			.header(HEADER_SDK_VERSION, SDK_VERSION)
			.bearer_auth(credentials.secret_key.expose());
		match self.flag.load(Ordering::Relaxed) {
			0 => request,
			flag => request.header(HEADER_FLAG, flag.to_string()),
		}
	}

	async fn fetch_campaign<F>(&self, url: &str, build: F) -> Result<Option<CampaignInfo>>
	where
		F: Fn() -> RequestBuilder,
	{
		let outcome = retry(&self.retry_config, || async { check_status(build().send().await?).await }).await;

		let response = match outcome {
			Ok(response) => response,
			Err(AbbiError::ServerError { status: 404, .. }) => {
				debug!(url = %url, "Campaign not found");
				return Ok(None);
			}
			Err(e) => return Err(e),
		};

		if response.status() == StatusCode::NO_CONTENT {
			return Ok(None);
		}
		Ok(Some(response.json::<CampaignInfo>().await?))
	}
}

#[async_trait::async_trait]
impl BatchSender for HttpTransport {
	async fn send_batch(&self, credentials: &Credentials, messages: Vec<OutboundMessage>) -> Result<()> {
		let url = format!("{}/api/v1/batch", self.base_url);
		let body = BatchRequest {
			app_id: credentials.app_id.as_str().to_string(),
			batch: messages,
		};

		debug!(url = %url, count = body.batch.len(), "Sending message batch");

		retry(&self.retry_config, || async {
			let request = self.authorize(self.http_client.post(&url), credentials).json(&body);
			check_status(request.send().await?).await
		})
		.await?;

		Ok(())
	}
}

#[async_trait::async_trait]
impl CampaignSource for HttpTransport {
	async fn fetch_by_trigger(
		&self,
		credentials: &Credentials,
		request: &TriggerRequest,
	) -> Result<Option<CampaignInfo>> {
		let url = format!("{}/api/v1/campaigns/trigger", self.base_url);
		debug!(url = %url, trigger = %request.trigger, "Fetching campaign by trigger");
		self
			.fetch_campaign(&url, || {
				self.authorize(self.http_client.post(&url), credentials).json(request)
			})
			.await
	}

	async fn fetch_by_id(&self, credentials: &Credentials, id: &CampaignId) -> Result<Option<CampaignInfo>> {
		let url = format!(
			"{}/api/v1/campaigns/{}",
			self.base_url,
			urlencoding::encode(id.as_str())
		);
		debug!(url = %url, "Fetching campaign by id");
		self
			.fetch_campaign(&url, || self.authorize(self.http_client.get(&url), credentials))
			.await
	}
}

/// Accepts absolute http(s) URLs and drops any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
	let parsed = Url::parse(raw.trim()).map_err(|e| AbbiError::InvalidBaseUrl(format!("{raw}: {e}")))?;
	if !matches!(parsed.scheme(), "http" | "https") {
		return Err(AbbiError::InvalidBaseUrl(format!(
			"{raw}: scheme must be http or https"
		)));
	}
	if parsed.host_str().is_none() {
		return Err(AbbiError::InvalidBaseUrl(format!("{raw}: missing host")));
	}
	Ok(raw.trim().trim_end_matches('/').to_string())
}

async fn check_status(response: Response) -> Result<Response> {
	let status = response.status();
	if status == StatusCode::TOO_MANY_REQUESTS {
		let retry_after = response
			.headers()
			.get("Retry-After")
			.and_then(|v| v.to_str().ok())
			.and_then(|s| s.trim().parse().ok());
		return Err(AbbiError::RateLimited {
			retry_after_secs: retry_after,
		});
	}

	if !status.is_success() {
		return Err(AbbiError::ServerError {
			status: status.as_u16(),
			message: response.text().await.unwrap_or_default(),
		});
	}

	Ok(response)
}

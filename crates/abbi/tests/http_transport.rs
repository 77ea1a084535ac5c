// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::AtomicI32;
use std::sync::Arc;
use std::time::Duration;

use abbi::{
	AbbiClient, AbbiError, BatchSender, CampaignId, CampaignInfo, CampaignPresenter, CampaignSource,
	ClientConfig, Credentials, DismissalHandle, HttpTransport, InlineExecutor, OutboundMessage,
	Properties, RetryConfig, SessionId, TriggerRequest,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const APP: &str = "test-app";
const KEY: &str = "sk_test_secret";

fn fast_retry() -> RetryConfig {
	RetryConfig {
		max_attempts: 3,
		base_delay: Duration::from_millis(1),
		max_delay: Duration::from_millis(5),
		backoff_factor: 2.0,
		jitter: false,
	}
}

fn transport(server: &MockServer, retry_config: RetryConfig) -> HttpTransport {
	let config = ClientConfig {
		retry_config,
		..ClientConfig::default()
	};
	HttpTransport::new(&server.uri(), &config, Arc::new(AtomicI32::new(0))).unwrap()
}

fn credentials() -> Credentials {
	Credentials::parse(APP, KEY).unwrap()
}

fn identify() -> OutboundMessage {
	OutboundMessage::Identify {
		session_id: SessionId::new(),
		user_id: "myuserid".to_string(),
		timestamp: Utc::now(),
	}
}

#[derive(Default)]
struct CollectingPresenter {
	presented: Mutex<Vec<CampaignInfo>>,
}

impl CampaignPresenter for CollectingPresenter {
	fn navigate(&self, _deep_link: &Url) -> bool {
		false
	}

	fn present(&self, campaign: CampaignInfo, handle: DismissalHandle) {
		self.presented.lock().push(campaign);
		handle.dismiss();
	}
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
	for _ in 0..500 {
		if condition() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	panic!("condition not met in time");
}

#[tokio::test]
async fn batch_is_posted_with_credentials_headers() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/batch"))
		.and(header("X-Abbi-App-Id", APP))
		.and(header("Authorization", "Bearer sk_test_secret"))
		.and(header("X-Abbi-Sdk-Version", abbi::SDK_VERSION))
		.respond_with(ResponseTemplate::new(202))
		.expect(2)
		.mount(&server)
		.await;

	let client = AbbiClient::builder()
		.base_url(server.uri())
		.retry_config(fast_retry())
		.build()
		.unwrap();
	client.start(APP, KEY);
	client.send_goal(
		"Bought a blue sword",
		Some(Properties::new().insert("item_name", "blue_sword")),
	);
	client.flush().await.unwrap();

	let requests = server.received_requests().await.unwrap();
	assert_eq!(requests.len(), 1);
	assert!(requests[0].headers.get("X-Abbi-Flag").is_none());

	let body: Value = requests[0].body_json().unwrap();
	assert_eq!(body["app_id"], APP);
	assert_eq!(body["batch"][0]["type"], "session_start");
	assert_eq!(body["batch"][0]["app_type"], "native");
	assert_eq!(body["batch"][0]["app_type_code"], 10);
	assert_eq!(body["batch"][1]["type"], "goal");
	assert_eq!(body["batch"][1]["event_type"], 1);
	assert_eq!(body["batch"][1]["goal"]["name"], "Bought a blue sword");
	assert_eq!(body["batch"][1]["goal"]["properties"]["item_name"], "blue_sword");
	assert_eq!(body["batch"][0]["session_id"], body["batch"][1]["session_id"]);

	// Shutdown ends the session and delivers its session_end.
	client.shutdown().await.unwrap();
	let body: Value = server.received_requests().await.unwrap()[1].body_json().unwrap();
	assert_eq!(body["batch"][0]["type"], "session_end");
}

#[tokio::test]
async fn diagnostic_flag_is_sent_when_set() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/batch"))
		.and(header("X-Abbi-Flag", "5"))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let client = AbbiClient::builder()
		.base_url(server.uri())
		.retry_config(fast_retry())
		.build()
		.unwrap();
	client.set_flag(5);
	client.start(APP, KEY);
	client.flush().await.unwrap();

	let body: Value = server.received_requests().await.unwrap()[0].body_json().unwrap();
	assert_eq!(body["batch"][0]["flag"], 5);
}

#[tokio::test]
async fn transient_failures_are_retried_then_reported() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/batch"))
		.respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
		.expect(3)
		.mount(&server)
		.await;

	let result = transport(&server, fast_retry())
		.send_batch(&credentials(), vec![identify()])
		.await;

	match result {
		Err(AbbiError::ServerError { status, message }) => {
			assert_eq!(status, 503);
			assert_eq!(message, "maintenance");
		}
		other => panic!("unexpected result {other:?}"),
	}
}

#[tokio::test]
async fn client_errors_are_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/batch"))
		.respond_with(ResponseTemplate::new(401))
		.expect(1)
		.mount(&server)
		.await;

	let result = transport(&server, fast_retry())
		.send_batch(&credentials(), vec![identify()])
		.await;
	assert!(matches!(result, Err(AbbiError::ServerError { status: 401, .. })));
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/batch"))
		.respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
		.expect(1)
		.mount(&server)
		.await;

	let result = transport(&server, RetryConfig::no_retry())
		.send_batch(&credentials(), vec![identify()])
		.await;
	assert!(matches!(
		result,
		Err(AbbiError::RateLimited {
			retry_after_secs: Some(30)
		})
	));
}

#[tokio::test]
async fn trigger_fetch_sends_request_body() {
	let server = MockServer::start().await;
	let session_id = SessionId::new();
	Mock::given(method("POST"))
		.and(path("/api/v1/campaigns/trigger"))
		.and(header("Authorization", "Bearer sk_test_secret"))
		.and(body_partial_json(json!({
			"app_id": APP,
			"trigger": "Show How To Order Credit Card",
			"user_id": "myuserid",
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"campaign_id": "cmp_7",
			"title": "Ordering a card",
			"metadata": {"variant": "b"}
		})))
		.expect(1)
		.mount(&server)
		.await;

	let request = TriggerRequest {
		app_id: APP.to_string(),
		session_id,
		trigger: "Show How To Order Credit Card".to_string(),
		user_id: Some("myuserid".to_string()),
	};
	let campaign = transport(&server, fast_retry())
		.fetch_by_trigger(&credentials(), &request)
		.await
		.unwrap()
		.unwrap();

	assert_eq!(campaign.campaign_id.as_str(), "cmp_7");
	assert_eq!(campaign.title.as_deref(), Some("Ordering a card"));
	assert_eq!(campaign.metadata["variant"], "b");
}

#[tokio::test]
async fn missing_campaigns_are_none() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/campaigns/trigger"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/api/v1/campaigns/cmp_gone"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;

	let transport = transport(&server, fast_retry());
	let request = TriggerRequest {
		app_id: APP.to_string(),
		session_id: SessionId::new(),
		trigger: "Nope".to_string(),
		user_id: None,
	};
	assert!(transport
		.fetch_by_trigger(&credentials(), &request)
		.await
		.unwrap()
		.is_none());
	assert!(transport
		.fetch_by_id(&credentials(), &CampaignId::new("cmp_gone"))
		.await
		.unwrap()
		.is_none());
}

#[tokio::test]
async fn campaign_preview_fetches_by_id() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/api/v1/campaigns/cmp_42"))
		.and(header("X-Abbi-App-Id", APP))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"campaign_id": "cmp_42"})))
		.expect(1)
		.mount(&server)
		.await;

	let campaign = transport(&server, fast_retry())
		.fetch_by_id(&credentials(), &CampaignId::new("cmp_42"))
		.await
		.unwrap();
	assert_eq!(campaign.map(|c| c.campaign_id), Some(CampaignId::new("cmp_42")));
}

#[tokio::test]
async fn open_url_trigger_reaches_backend_and_presenter() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/v1/campaigns/trigger"))
		.and(body_partial_json(json!({"trigger": "Welcome Back"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"campaign_id": "cmp_1"})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/api/v1/batch"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;

	let presenter = Arc::new(CollectingPresenter::default());
	let client = AbbiClient::builder()
		.base_url(server.uri())
		.retry_config(fast_retry())
		.presenter(presenter.clone())
		.executor(Arc::new(InlineExecutor))
		.build()
		.unwrap();
	client.start(APP, KEY);

	assert!(client.open_url("abbi://trigger/Welcome%20Back", &Default::default()));
	wait_for(|| presenter.presented.lock().len() == 1).await;

	let presented = presenter.presented.lock().clone();
	assert_eq!(presented[0].campaign_id.as_str(), "cmp_1");
	assert_eq!(presented[0].trigger.as_deref(), Some("Welcome Back"));

	client.shutdown().await.unwrap();
}

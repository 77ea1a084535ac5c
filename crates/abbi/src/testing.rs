// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abbi_core::{CampaignId, CampaignInfo, Credentials, OutboundMessage, TriggerRequest};
use parking_lot::Mutex;
use tokio::sync::Notify;
use url::Url;

use crate::batch::BatchSender;
use crate::campaign::{CampaignPresenter, CampaignSource, DismissalHandle};
use crate::delegate::CampaignInfoDelegate;
use crate::error::{AbbiError, Result};

pub fn test_credentials() -> Arc<Credentials> {
	Arc::new(Credentials::parse("test-app", "sk_test_secret").unwrap())
}

/// Polls `condition` while letting background tasks run.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
	for _ in 0..1000 {
		if condition() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(2)).await;
	}
	panic!("condition not met in time");
}

#[derive(Default)]
pub struct RecordingSender {
	batches: Mutex<Vec<(String, Vec<OutboundMessage>)>>,
	should_fail: AtomicBool,
}

impl RecordingSender {
	pub fn set_should_fail(&self, fail: bool) {
		self.should_fail.store(fail, Ordering::SeqCst);
	}

	pub fn batches(&self) -> Vec<(String, Vec<OutboundMessage>)> {
		self.batches.lock().clone()
	}

	pub fn messages(&self) -> Vec<OutboundMessage> {
		self
			.batches
			.lock()
			.iter()
			.flat_map(|(_, msgs)| msgs.iter().cloned())
			.collect()
	}

	pub fn kinds(&self) -> Vec<&'static str> {
		self.messages().iter().map(OutboundMessage::kind).collect()
	}

	pub fn message_count(&self) -> usize {
		self.batches.lock().iter().map(|(_, msgs)| msgs.len()).sum()
	}
}

#[async_trait::async_trait]
impl BatchSender for RecordingSender {
	async fn send_batch(&self, credentials: &Credentials, messages: Vec<OutboundMessage>) -> Result<()> {
		if self.should_fail.load(Ordering::SeqCst) {
			return Err(AbbiError::ServerError {
				status: 500,
				message: "mock failure".to_string(),
			});
		}
		self
			.batches
			.lock()
			.push((credentials.app_id.as_str().to_string(), messages));
		Ok(())
	}
}

#[derive(Default)]
pub struct StaticCampaignSource {
	campaigns: Vec<(String, CampaignInfo)>,
	fail: bool,
	trigger_requests: Mutex<Vec<TriggerRequest>>,
	id_requests: Mutex<Vec<CampaignId>>,
}

impl StaticCampaignSource {
	pub fn with_trigger(trigger: &str, campaign_id: &str) -> Self {
		Self {
			campaigns: vec![(trigger.to_string(), CampaignInfo::new(campaign_id))],
			..Self::default()
		}
	}

	pub fn failing() -> Self {
		Self {
			fail: true,
			..Self::default()
		}
	}

	pub fn trigger_requests(&self) -> Vec<TriggerRequest> {
		self.trigger_requests.lock().clone()
	}

	pub fn id_requests(&self) -> Vec<CampaignId> {
		self.id_requests.lock().clone()
	}
}

#[async_trait::async_trait]
impl CampaignSource for StaticCampaignSource {
	async fn fetch_by_trigger(
		&self,
		_credentials: &Credentials,
		request: &TriggerRequest,
	) -> Result<Option<CampaignInfo>> {
		self.trigger_requests.lock().push(request.clone());
		if self.fail {
			return Err(AbbiError::ServerError {
				status: 503,
				message: "unavailable".to_string(),
			});
		}
		Ok(self
			.campaigns
			.iter()
			.find(|(trigger, _)| *trigger == request.trigger)
			.map(|(_, info)| info.clone()))
	}

	async fn fetch_by_id(&self, _credentials: &Credentials, id: &CampaignId) -> Result<Option<CampaignInfo>> {
		self.id_requests.lock().push(id.clone());
		if self.fail {
			return Err(AbbiError::ServerError {
				status: 503,
				message: "unavailable".to_string(),
			});
		}
		Ok(self
			.campaigns
			.iter()
			.find(|(_, info)| info.campaign_id == *id)
			.map(|(_, info)| info.clone()))
	}
}

/// Backend whose requests never complete.
#[derive(Default)]
pub struct StalledBackend {
	batch_calls: AtomicUsize,
	fetch_calls: AtomicUsize,
	completed: AtomicUsize,
	never: Notify,
}

impl StalledBackend {
	pub fn batch_calls(&self) -> usize {
		self.batch_calls.load(Ordering::SeqCst)
	}

	pub fn fetch_calls(&self) -> usize {
		self.fetch_calls.load(Ordering::SeqCst)
	}

	pub fn completed(&self) -> usize {
		self.completed.load(Ordering::SeqCst)
	}

	async fn stall(&self) {
		self.never.notified().await;
		self.completed.fetch_add(1, Ordering::SeqCst);
	}
}

#[async_trait::async_trait]
impl BatchSender for StalledBackend {
	async fn send_batch(&self, _credentials: &Credentials, _messages: Vec<OutboundMessage>) -> Result<()> {
		self.batch_calls.fetch_add(1, Ordering::SeqCst);
		self.stall().await;
		Ok(())
	}
}

#[async_trait::async_trait]
impl CampaignSource for StalledBackend {
	async fn fetch_by_trigger(
		&self,
		_credentials: &Credentials,
		_request: &TriggerRequest,
	) -> Result<Option<CampaignInfo>> {
		self.fetch_calls.fetch_add(1, Ordering::SeqCst);
		self.stall().await;
		Ok(None)
	}

	async fn fetch_by_id(&self, _credentials: &Credentials, _id: &CampaignId) -> Result<Option<CampaignInfo>> {
		self.fetch_calls.fetch_add(1, Ordering::SeqCst);
		self.stall().await;
		Ok(None)
	}
}

/// Records calls. Drops handles straight away unless built with `holding`.
#[derive(Default)]
pub struct RecordingPresenter {
	hold: bool,
	presented: Mutex<Vec<CampaignInfo>>,
	navigations: Mutex<Vec<String>>,
	events: Mutex<Vec<String>>,
	handles: Mutex<Vec<DismissalHandle>>,
}

impl RecordingPresenter {
	pub fn holding() -> Self {
		Self {
			hold: true,
			..Self::default()
		}
	}

	pub fn presented(&self) -> Vec<CampaignInfo> {
		self.presented.lock().clone()
	}

	pub fn navigations(&self) -> Vec<String> {
		self.navigations.lock().clone()
	}

	/// Navigations and presentations in call order.
	pub fn events(&self) -> Vec<String> {
		self.events.lock().clone()
	}

	pub fn dismiss_all(&self) {
		let handles: Vec<DismissalHandle> = std::mem::take(&mut *self.handles.lock());
		for handle in handles {
			handle.dismiss();
		}
	}
}

impl CampaignPresenter for RecordingPresenter {
	fn navigate(&self, deep_link: &Url) -> bool {
		self.navigations.lock().push(deep_link.to_string());
		self.events.lock().push(format!("navigate:{deep_link}"));
		true
	}

	fn present(&self, campaign: CampaignInfo, handle: DismissalHandle) {
		self
			.events
			.lock()
			.push(format!("present:{}", campaign.campaign_id));
		self.presented.lock().push(campaign);
		if self.hold {
			self.handles.lock().push(handle);
		}
	}
}

#[derive(Default)]
pub struct RecordingDelegate {
	dismissed: Mutex<Vec<CampaignInfo>>,
}

impl RecordingDelegate {
	pub fn dismissed(&self) -> Vec<CampaignInfo> {
		self.dismissed.lock().clone()
	}

	pub fn dismissed_ids(&self) -> Vec<String> {
		self
			.dismissed
			.lock()
			.iter()
			.map(|c| c.campaign_id.as_str().to_string())
			.collect()
	}
}

impl CampaignInfoDelegate for RecordingDelegate {
	fn campaign_did_dismiss(&self, campaign: &CampaignInfo) {
		self.dismissed.lock().push(campaign.clone());
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Campaign fetch and display.
//!
//! A trigger fetches the campaign on the background runtime and, if one comes
//! back, posts its display to the host's [`MainExecutor`]. Only one campaign
//! is on screen at a time; triggers that arrive meanwhile are dropped. The
//! presenter gets a [`DismissalHandle`] and releases the screen by
//! dismissing or dropping it, which also notifies the campaign delegate.

use std::sync::Arc;

use abbi_core::{CampaignId, CampaignInfo, Credentials, TriggerRequest};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use url::Url;

use crate::delegate::DelegateRegistry;
use crate::error::Result;
use crate::executor::MainExecutor;
use crate::session::Session;

/// Looks campaigns up on the backend.
#[async_trait::async_trait]
pub trait CampaignSource: Send + Sync {
	/// Returns the campaign bound to a trigger, bypassing segmentation.
	/// `Ok(None)` means there is no such campaign.
	async fn fetch_by_trigger(
		&self,
		credentials: &Credentials,
		request: &TriggerRequest,
	) -> Result<Option<CampaignInfo>>;

	/// Returns a campaign by id for preview links.
	async fn fetch_by_id(&self, credentials: &Credentials, id: &CampaignId) -> Result<Option<CampaignInfo>>;
}

/// Host UI seam. Both methods are called on the main executor.
pub trait CampaignPresenter: Send + Sync {
	/// Navigates the host to an in-app deep link. Returns whether it did.
	fn navigate(&self, deep_link: &Url) -> bool;

	/// Shows a campaign. The screen stays claimed until `handle` is dismissed
	/// or dropped.
	fn present(&self, campaign: CampaignInfo, handle: DismissalHandle);
}

/// Presenter for hosts without UI: logs and dismisses straight away, so
/// delegates still hear about every campaign.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPresenter;

impl CampaignPresenter for HeadlessPresenter {
	fn navigate(&self, deep_link: &Url) -> bool {
		info!(deep_link = %deep_link, "No presenter installed, ignoring deep link");
		false
	}

	fn present(&self, campaign: CampaignInfo, handle: DismissalHandle) {
		info!(
			campaign_id = %campaign.campaign_id,
			trigger = campaign.trigger.as_deref().unwrap_or(""),
			"No presenter installed, dismissing campaign"
		);
		handle.dismiss();
	}
}

/// Whether a campaign currently holds the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignState {
	Idle,
	OnScreen(CampaignId),
}

/// Proof that a campaign is on screen. Consumed by [`DismissalHandle::dismiss`];
/// dropping it counts as a dismissal.
pub struct DismissalHandle {
	coordinator: Arc<CampaignCoordinator>,
	campaign: CampaignInfo,
	dismissed: bool,
}

impl DismissalHandle {
	pub fn campaign(&self) -> &CampaignInfo {
		&self.campaign
	}

	pub fn dismiss(mut self) {
		self.finish();
	}

	fn finish(&mut self) {
		if !self.dismissed {
			self.dismissed = true;
			self.coordinator.complete(&self.campaign);
		}
	}
}

impl Drop for DismissalHandle {
	fn drop(&mut self) {
		self.finish();
	}
}

impl std::fmt::Debug for DismissalHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DismissalHandle")
			.field("campaign_id", &self.campaign.campaign_id)
			.field("dismissed", &self.dismissed)
			.finish()
	}
}

/// Coordinates fetching, display, and dismissal of campaigns.
pub struct CampaignCoordinator {
	source: Arc<dyn CampaignSource>,
	presenter: Arc<dyn CampaignPresenter>,
	executor: Arc<dyn MainExecutor>,
	runtime: Handle,
	delegates: DelegateRegistry,
	on_screen: Mutex<Option<CampaignId>>,
}

impl CampaignCoordinator {
	pub fn new(
		source: Arc<dyn CampaignSource>,
		presenter: Arc<dyn CampaignPresenter>,
		executor: Arc<dyn MainExecutor>,
		runtime: Handle,
	) -> Self {
		Self {
			source,
			presenter,
			executor,
			runtime,
			delegates: DelegateRegistry::new(),
			on_screen: Mutex::new(None),
		}
	}

	pub fn delegates(&self) -> &DelegateRegistry {
		&self.delegates
	}

	pub fn state(&self) -> CampaignState {
		match self.on_screen.lock().as_ref() {
			Some(id) => CampaignState::OnScreen(id.clone()),
			None => CampaignState::Idle,
		}
	}

	/// Posts navigation to a deep link onto the main executor.
	fn navigate(&self, deep_link: Url) {
		let presenter = Arc::clone(&self.presenter);
		self.executor.execute(Box::new(move || {
			if !presenter.navigate(&deep_link) {
				debug!(deep_link = %deep_link, "Presenter did not navigate");
			}
		}));
	}

	/// Fetches and shows the campaign bound to `trigger`. The deep link, if
	/// any, is navigated before the fetch starts. A trigger suppressed by a
	/// campaign on screen does not navigate.
	pub fn trigger(
		self: &Arc<Self>,
		session: &Session,
		user_id: Option<String>,
		trigger: String,
		deep_link: Option<Url>,
	) {
		if let CampaignState::OnScreen(current) = self.state() {
			debug!(trigger = %trigger, on_screen = %current, "Campaign already on screen, ignoring trigger");
			return;
		}
		if let Some(deep_link) = deep_link {
			self.navigate(deep_link);
		}

		let request = TriggerRequest {
			app_id: session.credentials.app_id.as_str().to_string(),
			session_id: session.id,
			trigger,
			user_id,
		};
		let credentials = Arc::clone(&session.credentials);
		let this = Arc::clone(self);
		self.runtime.spawn(async move {
			match this.source.fetch_by_trigger(&credentials, &request).await {
				Ok(Some(mut campaign)) => {
					if campaign.trigger.is_none() {
						campaign.trigger = Some(request.trigger.clone());
					}
					this.display(campaign);
				}
				Ok(None) => debug!(trigger = %request.trigger, "No campaign for trigger"),
				Err(e) => warn!(trigger = %request.trigger, error = %e, "Campaign fetch failed"),
			}
		});
	}

	/// Fetches and shows a campaign by id.
	pub fn preview(self: &Arc<Self>, session: &Session, id: CampaignId) {
		if let CampaignState::OnScreen(current) = self.state() {
			debug!(campaign_id = %id, on_screen = %current, "Campaign already on screen, ignoring preview");
			return;
		}

		let credentials = Arc::clone(&session.credentials);
		let this = Arc::clone(self);
		self.runtime.spawn(async move {
			match this.source.fetch_by_id(&credentials, &id).await {
				Ok(Some(campaign)) => this.display(campaign),
				Ok(None) => debug!(campaign_id = %id, "Campaign not found"),
				Err(e) => warn!(campaign_id = %id, error = %e, "Campaign fetch failed"),
			}
		});
	}

	fn display(self: &Arc<Self>, campaign: CampaignInfo) {
		{
			let mut slot = self.on_screen.lock();
			if let Some(current) = slot.as_ref() {
				debug!(
					campaign_id = %campaign.campaign_id,
					on_screen = %current,
					"Campaign already on screen, dropping fetched campaign"
				);
				return;
			}
			*slot = Some(campaign.campaign_id.clone());
		}

		info!(campaign_id = %campaign.campaign_id, "Presenting campaign");
		let handle = DismissalHandle {
			coordinator: Arc::clone(self),
			campaign: campaign.clone(),
			dismissed: false,
		};
		let presenter = Arc::clone(&self.presenter);
		self.executor.execute(Box::new(move || presenter.present(campaign, handle)));
	}

	fn complete(&self, campaign: &CampaignInfo) {
		{
			let mut slot = self.on_screen.lock();
			if slot.as_ref() == Some(&campaign.campaign_id) {
				*slot = None;
			}
		}
		debug!(campaign_id = %campaign.campaign_id, "Campaign dismissed");
		self.delegates.notify(self.executor.as_ref(), campaign.clone());
	}
}

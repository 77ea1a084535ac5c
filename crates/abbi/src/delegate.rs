// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Campaign dismissal observer.

use std::sync::{Arc, Weak};

use abbi_core::CampaignInfo;
use parking_lot::RwLock;
use tracing::debug;

use crate::executor::MainExecutor;

/// Receives a callback when a campaign is dismissed.
pub trait CampaignInfoDelegate: Send + Sync {
	fn campaign_did_dismiss(&self, campaign: &CampaignInfo);
}

/// Holds at most one delegate without keeping it alive.
#[derive(Default)]
pub struct DelegateRegistry {
	slot: RwLock<Option<Weak<dyn CampaignInfoDelegate>>>,
}

impl DelegateRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `delegate`, replacing any previous one.
	pub fn set<D: CampaignInfoDelegate + 'static>(&self, delegate: &Arc<D>) {
		let weak: Weak<D> = Arc::downgrade(delegate);
		let weak: Weak<dyn CampaignInfoDelegate> = weak;
		*self.slot.write() = Some(weak);
	}

	pub fn clear(&self) {
		*self.slot.write() = None;
	}

	/// True while a registered delegate is still alive.
	pub fn is_set(&self) -> bool {
		self
			.slot
			.read()
			.as_ref()
			.is_some_and(|weak| weak.strong_count() > 0)
	}

	/// Posts the dismissal callback to `executor`. The delegate is looked up
	/// when the task runs, so one dropped in between is skipped.
	pub fn notify(&self, executor: &dyn MainExecutor, campaign: CampaignInfo) {
		let Some(weak) = self.slot.read().clone() else {
			return;
		};
		executor.execute(Box::new(move || match weak.upgrade() {
			Some(delegate) => delegate.campaign_did_dismiss(&campaign),
			None => debug!(
				campaign_id = %campaign.campaign_id,
				"Campaign delegate is gone, skipping dismissal callback"
			),
		}));
	}
}

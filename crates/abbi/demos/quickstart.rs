// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Starts a session from `ABBI_*` environment variables, reports a goal and
//! some attributes, triggers a campaign, then shuts down.
//!
//! ```text
//! ABBI_APP_ID=my-app ABBI_SECRET_KEY=sk_live_... \
//!     cargo run -p abbi --example quickstart
//! ```

use std::sync::Arc;

use abbi::{AbbiClientBuilder, AppType, CampaignInfo, CampaignInfoDelegate, OpenUrlOptions, Properties};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct LogDismissals;

impl CampaignInfoDelegate for LogDismissals {
	fn campaign_did_dismiss(&self, campaign: &CampaignInfo) {
		info!(campaign_id = %campaign.campaign_id, "Campaign dismissed");
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("abbi=debug")))
		.init();

	let client = AbbiClientBuilder::from_env()?.build()?;

	if !client.start_from_env() {
		info!("ABBI_APP_ID and ABBI_SECRET_KEY not set, starting with demo credentials");
		client.start_with_app_type("demo-app", "sk_demo_0123456789", AppType::Native);
	}

	let delegate = Arc::new(LogDismissals);
	client.set_campaign_info_delegate(&delegate);

	client.set_user_id("myuserid");
	client.set_user_attributes([("isProUser", true)]);
	client.set_private_user_attribute("balance", 1000);

	client.send_goal(
		"Bought a blue sword",
		Some(
			Properties::new()
				.insert("item_name", "blue_sword")
				.insert("price", 4.99),
		),
	);

	client.trigger_with_deep_link("Show How To Order Credit Card", "myapp://cards/order");

	let handled = client.open_url(
		"abbi://trigger/Welcome%20Back",
		&OpenUrlOptions::new().source_application("com.example.mail"),
	);
	info!(handled, "Offered inbound link");

	if let Err(e) = client.flush().await {
		info!(error = %e, "Flush failed, messages were dropped");
	}
	client.shutdown().await?;
	Ok(())
}

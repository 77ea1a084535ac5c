// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for the ABBI mobile marketing platform.
//!
//! The client starts a session with application credentials, reports goals
//! and user attributes, shows campaigns on demand, and recognizes inbound
//! links addressed to the SDK. Every call returns immediately; delivery to
//! the backend happens in batches on a background tokio runtime.
//!
//! # Quick Start
//!
//! ```ignore
//! use abbi::{Abbi, AbbiClient, AppType, OpenUrlOptions, Properties};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AbbiClient::builder()
//!         .base_url("https://sdk.abbi.io")
//!         .link_host("links.example.com")
//!         .build()?;
//!
//!     client.start_with_app_type("my-app", "sk_live_0123456789", AppType::Hybrid);
//!
//!     // Identity and attributes
//!     client.set_user_id("myuserid");
//!     client.set_user_attribute("isProUser", true);
//!     client.set_private_user_attributes([("balance", 1000)]);
//!
//!     // Goals
//!     client.send_goal("Bought a blue sword", Some(Properties::new()
//!         .insert("item_name", "blue_sword")
//!         .insert("price", 4.99)
//!     ));
//!
//!     // Campaigns
//!     client.trigger_with_deep_link("Show How To Order Credit Card", "myapp://cards");
//!
//!     // Inbound links
//!     let handled = client.open_url("abbi://trigger/Welcome", &OpenUrlOptions::new());
//!     assert!(handled);
//!
//!     // Deliver what is queued and stop
//!     client.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! Without an active session every operation except `set_flag` and delegate
//! registration is a no-op. A malformed `start` is logged and leaves no
//! session. `restart` reuses the last credentials that started successfully.
//! The user id and attributes belong to the user and survive restarts.
//!
//! # Host integration
//!
//! | Seam | Default | Purpose |
//! |------|---------|---------|
//! | [`CampaignPresenter`] | [`HeadlessPresenter`] | Shows campaigns, follows deep links |
//! | [`MainExecutor`] | [`RuntimeExecutor`] | Where display and callbacks run |
//! | [`CampaignInfoDelegate`] | none | Hears about dismissals, held weakly |
//! | [`BatchSender`] / [`CampaignSource`] | [`HttpTransport`] | Backend access |
//!
//! # Process-wide access
//!
//! [`Abbi`] mirrors every client operation as an associated function over a
//! single process-wide client. Install one with [`Abbi::install`], or let
//! [`Abbi::start`] build one from `ABBI_*` environment variables.
//!
//! # Graceful Shutdown
//!
//! Call `shutdown()` before the application exits so queued messages are
//! delivered.

pub mod attributes;
pub mod batch;
pub mod campaign;
pub mod client;
pub mod config;
pub mod delegate;
pub mod error;
pub mod executor;
pub mod global;
pub mod properties;
pub mod runtime;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

/// Version of this SDK, sent with every request.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use batch::{BatchConfig, BatchSender};
pub use campaign::{
	CampaignPresenter, CampaignSource, CampaignState, DismissalHandle, HeadlessPresenter,
};
pub use client::{AbbiClient, AbbiClientBuilder, OpenUrlOptions};
pub use config::{ClientConfig, ConfigError, EnvSettings, DEFAULT_BASE_URL};
pub use delegate::CampaignInfoDelegate;
pub use error::{AbbiError, Result};
pub use executor::{InlineExecutor, MainExecutor, QueueExecutor, RuntimeExecutor, Task};
pub use global::Abbi;
pub use properties::Properties;
pub use transport::HttpTransport;

pub use abbi_common_http::RetryConfig;
pub use abbi_core::{
	AppId, AppType, AttributeNamespace, AttributeValue, CampaignId, CampaignInfo, Credentials,
	EventType, Goal, GoalId, OutboundMessage, SdkLink, SecretKey, SessionId, TriggerRequest,
};

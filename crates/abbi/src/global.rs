// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide access point.
//!
//! [`Abbi`] forwards to one [`AbbiClient`] per process. Install a configured
//! client with [`Abbi::install`] before the first call, or let
//! [`Abbi::start`] build one from the `ABBI_*` environment variables.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use abbi_core::{AppType, AttributeValue, SessionId};
use tracing::{debug, error};

use crate::client::{AbbiClient, AbbiClientBuilder, OpenUrlOptions};
use crate::delegate::CampaignInfoDelegate;
use crate::error::{AbbiError, Result};
use crate::properties::Properties;

static CLIENT: OnceLock<AbbiClient> = OnceLock::new();

/// Static facade over the process-wide [`AbbiClient`].
///
/// Calls made before any client exists are no-ops, except the `start`
/// family, `set_flag` and delegate registration, which build one first.
pub struct Abbi;

impl Abbi {
	/// Installs `client` as the process-wide instance. Hands it back if one
	/// is already installed.
	pub fn install(client: AbbiClient) -> std::result::Result<(), AbbiClient> {
		CLIENT.set(client)
	}

	/// The installed client, if any.
	pub fn client() -> Option<&'static AbbiClient> {
		CLIENT.get()
	}

	fn get_or_build() -> Option<&'static AbbiClient> {
		if let Some(client) = CLIENT.get() {
			return Some(client);
		}
		match AbbiClientBuilder::from_env().and_then(AbbiClientBuilder::build) {
			Ok(client) => {
				// Another thread may have won; its client is the one kept.
				let _ = CLIENT.set(client);
				CLIENT.get()
			}
			Err(e) => {
				error!(error = %e, "Failed to build ABBI client");
				None
			}
		}
	}

	fn with_client(operation: &'static str, f: impl FnOnce(&AbbiClient)) {
		match CLIENT.get() {
			Some(client) => f(client),
			None => debug!(operation, "ABBI client not started, ignoring call"),
		}
	}

	pub fn start(app_id: &str, secret_key: &str) {
		if let Some(client) = Self::get_or_build() {
			client.start(app_id, secret_key);
		}
	}

	pub fn start_with_app_type(app_id: &str, secret_key: &str, app_type: AppType) {
		if let Some(client) = Self::get_or_build() {
			client.start_with_app_type(app_id, secret_key, app_type);
		}
	}

	pub fn start_with_app_type_code(app_id: &str, secret_key: &str, code: i32) {
		if let Some(client) = Self::get_or_build() {
			client.start_with_app_type_code(app_id, secret_key, code);
		}
	}

	pub fn start_from_env() -> bool {
		Self::get_or_build().is_some_and(AbbiClient::start_from_env)
	}

	pub fn restart() {
		Self::with_client("restart", AbbiClient::restart);
	}

	pub fn send_goal(name: &str, properties: Option<Properties>) {
		Self::with_client("send_goal", |c| c.send_goal(name, properties));
	}

	pub fn set_user_attribute(key: &str, value: impl Into<AttributeValue>) {
		Self::with_client("set_user_attribute", |c| c.set_user_attribute(key, value));
	}

	pub fn set_user_attributes<I, K, V>(attributes: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		Self::with_client("set_user_attributes", |c| c.set_user_attributes(attributes));
	}

	pub fn set_private_user_attribute(key: &str, value: impl Into<AttributeValue>) {
		Self::with_client("set_private_user_attribute", |c| {
			c.set_private_user_attribute(key, value)
		});
	}

	pub fn set_private_user_attributes<I, K, V>(attributes: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		Self::with_client("set_private_user_attributes", |c| {
			c.set_private_user_attributes(attributes)
		});
	}

	pub fn clear_private_user_attributes() {
		Self::with_client(
			"clear_private_user_attributes",
			AbbiClient::clear_private_user_attributes,
		);
	}

	pub fn set_user_id(user_id: &str) {
		Self::with_client("set_user_id", |c| c.set_user_id(user_id));
	}

	pub fn trigger(name: &str) {
		Self::with_client("trigger", |c| c.trigger(name));
	}

	pub fn trigger_with_deep_link(name: &str, deep_link: &str) {
		Self::with_client("trigger", |c| c.trigger_with_deep_link(name, deep_link));
	}

	pub fn set_campaign_info_delegate<D: CampaignInfoDelegate + 'static>(delegate: &Arc<D>) {
		if let Some(client) = Self::get_or_build() {
			client.set_campaign_info_delegate(delegate);
		}
	}

	pub fn clear_campaign_info_delegate() {
		Self::with_client(
			"clear_campaign_info_delegate",
			AbbiClient::clear_campaign_info_delegate,
		);
	}

	pub fn open_url(url: &str, options: &OpenUrlOptions) -> bool {
		CLIENT.get().is_some_and(|c| c.open_url(url, options))
	}

	pub fn set_flag(flag: i32) {
		if let Some(client) = Self::get_or_build() {
			client.set_flag(flag);
		}
	}

	pub async fn flush() -> Result<()> {
		match CLIENT.get() {
			Some(client) => client.flush().await,
			None => Err(AbbiError::ClientShutdown),
		}
	}

	pub async fn shutdown() -> Result<()> {
		match CLIENT.get() {
			Some(client) => client.shutdown().await,
			None => Ok(()),
		}
	}

	pub fn is_started() -> bool {
		CLIENT.get().is_some_and(AbbiClient::is_started)
	}

	pub fn session_id() -> Option<SessionId> {
		CLIENT.get().and_then(AbbiClient::session_id)
	}

	pub fn app_type() -> Option<AppType> {
		CLIENT.get().and_then(AbbiClient::app_type)
	}

	pub fn user_id() -> Option<String> {
		CLIENT.get().and_then(AbbiClient::user_id)
	}

	pub fn user_attribute(key: &str) -> Option<AttributeValue> {
		CLIENT.get().and_then(|c| c.user_attribute(key))
	}

	pub fn user_attributes() -> BTreeMap<String, AttributeValue> {
		CLIENT.get().map(AbbiClient::user_attributes).unwrap_or_default()
	}

	pub fn private_user_attribute(key: &str) -> Option<AttributeValue> {
		CLIENT.get().and_then(|c| c.private_user_attribute(key))
	}

	pub fn private_user_attributes() -> BTreeMap<String, AttributeValue> {
		CLIENT
			.get()
			.map(AbbiClient::private_user_attributes)
			.unwrap_or_default()
	}

	pub fn flag() -> i32 {
		CLIENT.get().map(AbbiClient::flag).unwrap_or(0)
	}

	pub async fn queue_len() -> usize {
		match CLIENT.get() {
			Some(client) => client.queue_len().await,
			None => 0,
		}
	}
}

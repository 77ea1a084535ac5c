// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recognition of inbound URLs addressed to the SDK.
//!
//! The host application forwards every URL it receives to `open_url`. Only a
//! small set of shapes belong to the SDK:
//!
//! | Shape | Meaning |
//! |-------|---------|
//! | `abbi://trigger/<name>` | Show the campaign bound to trigger `<name>` |
//! | `abbi://campaign/<id>` | Preview campaign `<id>` |
//! | `https://<link_host>/t/<name>` | Universal-link form of `trigger` |
//! | `https://<link_host>/c/<id>` | Universal-link form of `campaign` |
//!
//! The scheme and link host are configurable. Everything else is left to the
//! host application.

use url::Url;

use crate::campaign::{validate_trigger_name, CampaignId};

/// Custom URL scheme the SDK answers to unless configured otherwise.
pub const DEFAULT_URL_SCHEME: &str = "abbi";

/// An inbound URL the SDK knows how to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkLink {
	/// Trigger a campaign by its trigger key.
	Trigger(String),
	/// Preview a specific campaign.
	Campaign(CampaignId),
}

/// Matches URLs against the configured SDK scheme and link host.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
	scheme: String,
	link_host: Option<String>,
}

impl LinkMatcher {
	pub fn new(scheme: impl Into<String>) -> Self {
		Self {
			scheme: scheme.into().to_ascii_lowercase(),
			link_host: None,
		}
	}

	/// Also accept `https://<host>/t/...` and `https://<host>/c/...`.
	pub fn with_link_host(mut self, host: impl Into<String>) -> Self {
		self.link_host = Some(host.into().to_ascii_lowercase());
		self
	}

	pub fn scheme(&self) -> &str {
		&self.scheme
	}

	pub fn link_host(&self) -> Option<&str> {
		self.link_host.as_deref()
	}

	/// Returns the SDK action for `url`, or `None` if the URL is not ours or
	/// is missing its name/id.
	pub fn parse(&self, url: &Url) -> Option<SdkLink> {
		if url.scheme() == self.scheme {
			// abbi://trigger/<name>: the action is the host, the target the path.
			let action = url.host_str()?;
			let target = single_segment(url)?;
			return build_link(action, target);
		}

		if url.scheme() == "https" {
			let host = self.link_host.as_deref()?;
			if url.host_str()? != host {
				return None;
			}
			let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
			let action = match segments.next()? {
				"t" => "trigger",
				"c" => "campaign",
				_ => return None,
			};
			let target = segments.next()?;
			if segments.next().is_some() {
				return None;
			}
			return build_link(action, target);
		}

		None
	}

	/// Parses a raw string first; malformed input is simply not an SDK link.
	pub fn parse_str(&self, raw: &str) -> Option<SdkLink> {
		let url = Url::parse(raw).ok()?;
		self.parse(&url)
	}
}

impl Default for LinkMatcher {
	fn default() -> Self {
		Self::new(DEFAULT_URL_SCHEME)
	}
}

fn single_segment(url: &Url) -> Option<&str> {
	let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
	let first = segments.next()?;
	if segments.next().is_some() {
		return None;
	}
	Some(first)
}

fn build_link(action: &str, encoded_target: &str) -> Option<SdkLink> {
	let target = urlencoding::decode(encoded_target).ok()?.into_owned();
	match action {
		"trigger" => {
			validate_trigger_name(&target).ok()?;
			Some(SdkLink::Trigger(target))
		}
		"campaign" => {
			if target.trim().is_empty() {
				return None;
			}
			Some(SdkLink::Campaign(CampaignId::new(target)))
		}
		_ => None,
	}
}

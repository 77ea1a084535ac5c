// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire payloads exchanged with the ABBI backend.
//!
//! Everything the SDK reports is an [`OutboundMessage`]. Messages are batched
//! client side and posted together in a [`BatchRequest`]. Campaign lookups
//! are request/response and use [`TriggerRequest`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_type::AppType;
use crate::attribute::{AttributeNamespace, AttributeValue};
use crate::goal::Goal;
use crate::session::SessionId;

/// A single message queued for delivery, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
	SessionStart {
		session_id: SessionId,
		app_type: AppType,
		app_type_code: i32,
		sdk_version: String,
		platform: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		user_id: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		flag: Option<i32>,
		timestamp: DateTime<Utc>,
	},
	SessionEnd {
		session_id: SessionId,
		timestamp: DateTime<Utc>,
	},
	Goal {
		session_id: SessionId,
		event_type: i32,
		goal: Goal,
	},
	Attributes {
		session_id: SessionId,
		namespace: AttributeNamespace,
		attributes: BTreeMap<String, AttributeValue>,
		timestamp: DateTime<Utc>,
	},
	ClearPrivateAttributes {
		session_id: SessionId,
		timestamp: DateTime<Utc>,
	},
	Identify {
		session_id: SessionId,
		user_id: String,
		timestamp: DateTime<Utc>,
	},
}

impl OutboundMessage {
	/// The session the message was produced in.
	pub fn session_id(&self) -> SessionId {
		match self {
			OutboundMessage::SessionStart { session_id, .. }
			| OutboundMessage::SessionEnd { session_id, .. }
			| OutboundMessage::Goal { session_id, .. }
			| OutboundMessage::Attributes { session_id, .. }
			| OutboundMessage::ClearPrivateAttributes { session_id, .. }
			| OutboundMessage::Identify { session_id, .. } => *session_id,
		}
	}

	/// Short name of the message type, matching the wire tag.
	pub fn kind(&self) -> &'static str {
		match self {
			OutboundMessage::SessionStart { .. } => "session_start",
			OutboundMessage::SessionEnd { .. } => "session_end",
			OutboundMessage::Goal { .. } => "goal",
			OutboundMessage::Attributes { .. } => "attributes",
			OutboundMessage::ClearPrivateAttributes { .. } => "clear_private_attributes",
			OutboundMessage::Identify { .. } => "identify",
		}
	}
}

/// Body of `POST /api/v1/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
	pub app_id: String,
	pub batch: Vec<OutboundMessage>,
}

/// Body of `POST /api/v1/campaigns/trigger`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
	pub app_id: String,
	pub session_id: SessionId,
	pub trigger: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
}

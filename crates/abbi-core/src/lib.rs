// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the ABBI marketing SDK.
//!
//! This crate holds the domain vocabulary shared by the SDK client (`abbi`)
//! and anything that speaks its wire protocol: credentials, application
//! types, attribute values, goals, campaigns, inbound SDK links, and the
//! JSON payloads posted to the backend. It performs no I/O.
//!
//! # Example
//!
//! ```
//! use abbi_core::{AppType, AttributeValue, Credentials, Goal, LinkMatcher, SdkLink};
//! use std::collections::BTreeMap;
//!
//! let creds = Credentials::parse("my-app", "sk_0123456789").unwrap();
//! assert_eq!(creds.app_id.as_str(), "my-app");
//!
//! assert_eq!(AppType::from_code(11).unwrap(), AppType::Hybrid);
//!
//! let mut props = BTreeMap::new();
//! props.insert("item_name".to_string(), AttributeValue::from("sword"));
//! let goal = Goal::new("Bought a blue sword", props).unwrap();
//! assert_eq!(goal.properties.len(), 1);
//!
//! let link = LinkMatcher::default().parse_str("abbi://trigger/Welcome");
//! assert_eq!(link, Some(SdkLink::Trigger("Welcome".to_string())));
//! ```

pub mod app_type;
pub mod attribute;
pub mod campaign;
pub mod credentials;
pub mod error;
pub mod goal;
pub mod identity;
pub mod link;
pub mod payload;
pub mod session;

pub use app_type::{AppType, EventType};
pub use attribute::{
	validate_attribute_key, AttributeNamespace, AttributeValue, MAX_ATTRIBUTE_KEY_LENGTH,
};
pub use campaign::{validate_trigger_name, CampaignId, CampaignInfo, MAX_TRIGGER_NAME_LENGTH};
pub use credentials::{AppId, Credentials, SecretKey, REDACTED};
pub use error::{CoreError, Result};
pub use goal::{validate_goal_name, Goal, GoalId, MAX_GOAL_NAME_LENGTH};
pub use identity::{validate_user_id, MAX_USER_ID_LENGTH};
pub use link::{LinkMatcher, SdkLink, DEFAULT_URL_SCHEME};
pub use payload::{BatchRequest, OutboundMessage, TriggerRequest};
pub use session::SessionId;

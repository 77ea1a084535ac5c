// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session lifecycle: absent or active, and the credentials to restart with.

use std::sync::Arc;

use abbi_core::{AppType, Credentials, SessionId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// An active SDK session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
	pub id: SessionId,
	pub credentials: Arc<Credentials>,
	pub app_type: AppType,
	pub started_at: DateTime<Utc>,
}

#[derive(Default)]
struct SessionState {
	current: Option<Session>,
	last_known: Option<(Arc<Credentials>, AppType)>,
}

/// Tracks the single active session.
#[derive(Default)]
pub struct SessionManager {
	state: RwLock<SessionState>,
}

impl SessionManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a new session and remembers its credentials for
	/// [`SessionManager::last_known`]. Returns the new session and the one it
	/// replaced.
	pub fn begin(&self, credentials: Credentials, app_type: AppType) -> (Session, Option<Session>) {
		let credentials = Arc::new(credentials);
		let session = Session {
			id: SessionId::new(),
			credentials: Arc::clone(&credentials),
			app_type,
			started_at: Utc::now(),
		};

		let mut state = self.state.write();
		state.last_known = Some((credentials, app_type));
		let previous = state.current.replace(session.clone());
		(session, previous)
	}

	/// Ends the active session, if any. Last-known credentials are kept.
	pub fn end(&self) -> Option<Session> {
		self.state.write().current.take()
	}

	pub fn current(&self) -> Option<Session> {
		self.state.read().current.clone()
	}

	pub fn is_active(&self) -> bool {
		self.state.read().current.is_some()
	}

	/// Credentials and app type of the most recent successful start.
	pub fn last_known(&self) -> Option<(Arc<Credentials>, AppType)> {
		self.state.read().last_known.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn creds(app: &str) -> Credentials {
		Credentials::parse(app, "sk_test_secret").unwrap()
	}

	#[test]
	fn starts_absent() {
		let manager = SessionManager::new();
		assert!(manager.current().is_none());
		assert!(manager.last_known().is_none());
		assert!(!manager.is_active());
	}

	#[test]
	fn begin_replaces_previous_session() {
		let manager = SessionManager::new();
		let (first, previous) = manager.begin(creds("one"), AppType::Native);
		assert!(previous.is_none());

		let (second, previous) = manager.begin(creds("two"), AppType::Unity);
		assert_eq!(previous.map(|s| s.id), Some(first.id));
		assert_ne!(first.id, second.id);
		assert!(second.id > first.id);
		assert_eq!(manager.current().map(|s| s.app_type), Some(AppType::Unity));
	}

	#[test]
	fn end_keeps_last_known() {
		let manager = SessionManager::new();
		manager.begin(creds("one"), AppType::Hybrid);

		assert!(manager.end().is_some());
		assert!(manager.end().is_none());
		assert!(!manager.is_active());

		let (credentials, app_type) = manager.last_known().unwrap();
		assert_eq!(credentials.app_id.as_str(), "one");
		assert_eq!(app_type, AppType::Hybrid);
	}
}

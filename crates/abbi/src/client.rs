// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The SDK client.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abbi_common_http::RetryConfig;
use abbi_core::{
	validate_attribute_key, validate_trigger_name, validate_user_id, AppType, AttributeNamespace,
	AttributeValue, Credentials, EventType, Goal, LinkMatcher, OutboundMessage, SdkLink, SessionId,
	DEFAULT_URL_SCHEME,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::attributes::AttributeStore;
use crate::batch::{BatchProcessor, BatchQueue, BatchSender, QueuedMessage};
use crate::campaign::{
	CampaignCoordinator, CampaignPresenter, CampaignSource, CampaignState, HeadlessPresenter,
};
use crate::config::{self, ClientConfig, EnvSettings, DEFAULT_BASE_URL};
use crate::delegate::CampaignInfoDelegate;
use crate::error::{AbbiError, Result};
use crate::executor::{MainExecutor, RuntimeExecutor};
use crate::properties::Properties;
use crate::runtime::BackgroundRuntime;
use crate::session::{Session, SessionManager};
use crate::transport::HttpTransport;
use crate::SDK_VERSION;

/// Context the host received alongside an inbound URL. Only logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenUrlOptions {
	pub source_application: Option<String>,
	pub annotations: serde_json::Map<String, serde_json::Value>,
}

impl OpenUrlOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn source_application(mut self, source: impl Into<String>) -> Self {
		self.source_application = Some(source.into());
		self
	}

	pub fn annotation(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.annotations.insert(key.into(), value.into());
		self
	}
}

/// Builder for [`AbbiClient`].
pub struct AbbiClientBuilder {
	base_url: Option<String>,
	url_scheme: Option<String>,
	link_host: Option<String>,
	config: ClientConfig,
	presenter: Option<Arc<dyn CampaignPresenter>>,
	executor: Option<Arc<dyn MainExecutor>>,
	batch_sender: Option<Arc<dyn BatchSender>>,
	campaign_source: Option<Arc<dyn CampaignSource>>,
}

impl AbbiClientBuilder {
	pub fn new() -> Self {
		Self {
			base_url: None,
			url_scheme: None,
			link_host: None,
			config: ClientConfig::default(),
			presenter: None,
			executor: None,
			batch_sender: None,
			campaign_source: None,
		}
	}

	/// Starts from the `ABBI_*` environment variables.
	pub fn from_env() -> Result<Self> {
		Ok(Self::new().env_settings(EnvSettings::from_env()?))
	}

	/// Applies every setting present in `settings`.
	pub fn env_settings(mut self, settings: EnvSettings) -> Self {
		if let Some(base_url) = settings.base_url {
			self.base_url = Some(base_url);
		}
		if let Some(scheme) = settings.url_scheme {
			self.url_scheme = Some(scheme);
		}
		if let Some(host) = settings.link_host {
			self.link_host = Some(host);
		}
		if let Some(interval) = settings.flush_interval {
			self.config.batch_config.flush_interval = interval;
		}
		if let Some(timeout) = settings.request_timeout {
			self.config.request_timeout = timeout;
		}
		self
	}

	/// Backend base URL. Defaults to [`DEFAULT_BASE_URL`].
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	/// Custom scheme `open_url` answers to. Defaults to `abbi`.
	pub fn url_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.url_scheme = Some(scheme.into());
		self
	}

	/// Host whose `https://<host>/t/...` and `/c/...` links `open_url` accepts.
	pub fn link_host(mut self, host: impl Into<String>) -> Self {
		self.link_host = Some(host.into());
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.config.batch_config.flush_interval = interval;
		self
	}

	pub fn max_batch_size(mut self, size: usize) -> Self {
		self.config.batch_config.max_batch_size = size;
		self
	}

	pub fn max_queue_size(mut self, size: usize) -> Self {
		self.config.batch_config.max_queue_size = size;
		self
	}

	pub fn channel_capacity(mut self, capacity: usize) -> Self {
		self.config.channel_capacity = capacity;
		self
	}

	pub fn retry_config(mut self, config: RetryConfig) -> Self {
		self.config.retry_config = config;
		self
	}

	pub fn config(mut self, config: ClientConfig) -> Self {
		self.config = config;
		self
	}

	/// Host UI for campaigns. Defaults to [`HeadlessPresenter`].
	pub fn presenter(mut self, presenter: Arc<dyn CampaignPresenter>) -> Self {
		self.presenter = Some(presenter);
		self
	}

	/// Host main context for display and delegate callbacks. Defaults to the
	/// background runtime.
	pub fn executor(mut self, executor: Arc<dyn MainExecutor>) -> Self {
		self.executor = Some(executor);
		self
	}

	/// Replaces HTTP delivery of outbound messages.
	pub fn batch_sender(mut self, sender: Arc<dyn BatchSender>) -> Self {
		self.batch_sender = Some(sender);
		self
	}

	/// Replaces HTTP campaign lookup.
	pub fn campaign_source(mut self, source: Arc<dyn CampaignSource>) -> Self {
		self.campaign_source = Some(source);
		self
	}

	/// Builds the client and starts its background worker.
	pub fn build(self) -> Result<AbbiClient> {
		let flag = Arc::new(AtomicI32::new(0));
		let base_url = self
			.base_url
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

		let config = &self.config;
		let http = || HttpTransport::new(&base_url, config, Arc::clone(&flag)).map(Arc::new);
		let (batch_sender, campaign_source) = match (self.batch_sender, self.campaign_source) {
			(Some(sender), Some(source)) => (sender, source),
			(Some(sender), None) => (sender, http()? as Arc<dyn CampaignSource>),
			(None, Some(source)) => (http()? as Arc<dyn BatchSender>, source),
			(None, None) => {
				let transport = http()?;
				(
					Arc::clone(&transport) as Arc<dyn BatchSender>,
					transport as Arc<dyn CampaignSource>,
				)
			}
		};

		let mut links = LinkMatcher::new(self.url_scheme.as_deref().unwrap_or(DEFAULT_URL_SCHEME));
		if let Some(host) = self.link_host {
			links = links.with_link_host(host);
		}

		let runtime = BackgroundRuntime::new()?;
		let processor = Arc::new(BatchProcessor::new(
			self.config.batch_config.clone(),
			batch_sender,
		));
		let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
		let worker = {
			let processor = Arc::clone(&processor);
			runtime.spawn(async move { processor.run(rx).await })
		};

		let executor: Arc<dyn MainExecutor> = match self.executor {
			Some(executor) => executor,
			None => Arc::new(RuntimeExecutor::new(runtime.handle().clone())),
		};
		let presenter: Arc<dyn CampaignPresenter> = match self.presenter {
			Some(presenter) => presenter,
			None => Arc::new(HeadlessPresenter),
		};
		let campaigns = Arc::new(CampaignCoordinator::new(
			campaign_source,
			presenter,
			executor,
			runtime.handle().clone(),
		));

		info!(
			base_url = %base_url,
			url_scheme = links.scheme(),
			link_host = links.link_host().unwrap_or(""),
			"ABBI client initialized"
		);

		Ok(AbbiClient {
			inner: Arc::new(ClientInner {
				sessions: SessionManager::new(),
				attributes: AttributeStore::new(),
				user_id: RwLock::new(None),
				flag,
				links,
				campaigns,
				processor,
				queue: BatchQueue::new(tx),
				worker: Mutex::new(Some(worker)),
				closed: AtomicBool::new(false),
				lifecycle: Mutex::new(()),
				runtime,
			}),
		})
	}
}

impl Default for AbbiClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct ClientInner {
	sessions: SessionManager,
	attributes: AttributeStore,
	user_id: RwLock<Option<String>>,
	flag: Arc<AtomicI32>,
	links: LinkMatcher,
	campaigns: Arc<CampaignCoordinator>,
	processor: Arc<BatchProcessor>,
	queue: BatchQueue,
	worker: Mutex<Option<JoinHandle<()>>>,
	closed: AtomicBool,
	// Held while a session begins or ends, so its messages queue in order.
	lifecycle: Mutex<()>,
	// Dropped last so background tasks outlive the state above.
	runtime: BackgroundRuntime,
}

/// Client for the ABBI marketing platform.
///
/// Every operation returns immediately. Network work runs on a background
/// tokio runtime and failures end up in the log, never at the caller.
/// Without an active session every operation except
/// [`set_flag`](Self::set_flag) and delegate registration is a no-op.
///
/// Cloning is cheap; clones share one session.
///
/// # Example
///
/// ```no_run
/// use abbi::{AbbiClient, Properties};
///
/// # async fn run() -> abbi::Result<()> {
/// let client = AbbiClient::builder().build()?;
/// client.start("my-app", "sk_live_0123456789");
///
/// client.set_user_id("myuserid");
/// client.set_user_attribute("isProUser", true);
/// client.send_goal(
///     "Bought a blue sword",
///     Some(Properties::new().insert("price", 4.99)),
/// );
/// client.trigger("Show How To Order Credit Card");
///
/// client.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AbbiClient {
	inner: Arc<ClientInner>,
}

impl AbbiClient {
	pub fn builder() -> AbbiClientBuilder {
		AbbiClientBuilder::new()
	}

	// ---- session lifecycle ----

	/// Starts a session for a native application, replacing any prior one.
	/// Malformed credentials are logged and leave no session active.
	pub fn start(&self, app_id: &str, secret_key: &str) {
		self.start_with_app_type(app_id, secret_key, AppType::default());
	}

	/// Starts a session tagged with the host application's type.
	pub fn start_with_app_type(&self, app_id: &str, secret_key: &str, app_type: AppType) {
		if self.is_closed() {
			warn!("start called after shutdown, ignoring");
			return;
		}
		match Credentials::parse(app_id, secret_key) {
			Ok(credentials) => self.begin_session(credentials, app_type),
			Err(e) => self.reject_start(e.into()),
		}
	}

	/// Like [`start_with_app_type`](Self::start_with_app_type) with the
	/// numeric wire code of the app type.
	pub fn start_with_app_type_code(&self, app_id: &str, secret_key: &str, code: i32) {
		if self.is_closed() {
			warn!("start called after shutdown, ignoring");
			return;
		}
		match AppType::from_code(code) {
			Ok(app_type) => self.start_with_app_type(app_id, secret_key, app_type),
			Err(e) => self.reject_start(e.into()),
		}
	}

	/// Starts with `ABBI_APP_ID` and `ABBI_SECRET_KEY` (or
	/// `ABBI_SECRET_KEY_FILE`). Returns whether a session is active afterwards.
	pub fn start_from_env(&self) -> bool {
		match config::credentials_from_env() {
			Ok(Some(env)) => {
				self.start(&env.app_id, &env.secret_key);
				self.is_started()
			}
			Ok(None) => {
				warn!("ABBI_APP_ID or ABBI_SECRET_KEY not set, not starting");
				false
			}
			Err(e) => {
				error!(error = %e, "Failed to load credentials from environment");
				false
			}
		}
	}

	/// Starts a fresh session with the last credentials that started
	/// successfully. No-op if the client never started.
	pub fn restart(&self) {
		if self.is_closed() {
			warn!("restart called after shutdown, ignoring");
			return;
		}
		let Some((credentials, app_type)) = self.inner.sessions.last_known() else {
			debug!("restart called before any successful start, ignoring");
			return;
		};
		self.begin_session((*credentials).clone(), app_type);
	}

	fn begin_session(&self, credentials: Credentials, app_type: AppType) {
		let _lifecycle = self.inner.lifecycle.lock();
		let (session, previous) = self.inner.sessions.begin(credentials, app_type);
		if let Some(previous) = previous {
			self.end_session(&previous);
		}

		let flag = self.flag();
		self.enqueue(
			&session,
			OutboundMessage::SessionStart {
				session_id: session.id,
				app_type,
				app_type_code: app_type.code(),
				sdk_version: SDK_VERSION.to_string(),
				platform: abbi_common_http::platform(),
				user_id: self.user_id(),
				flag: (flag != 0).then_some(flag),
				timestamp: session.started_at,
			},
		);

		// Attributes describe the user, so a new session starts with them.
		for namespace in [AttributeNamespace::Public, AttributeNamespace::Private] {
			let attributes = self.inner.attributes.snapshot(namespace);
			if !attributes.is_empty() {
				self.enqueue(
					&session,
					OutboundMessage::Attributes {
						session_id: session.id,
						namespace,
						attributes,
						timestamp: Utc::now(),
					},
				);
			}
		}

		info!(
			session_id = %session.id,
			app_id = %session.credentials.app_id,
			app_type = %app_type,
			"ABBI session started"
		);
	}

	fn reject_start(&self, error: AbbiError) {
		error!(error = %error, "Rejected ABBI start, no session is active");
		let _lifecycle = self.inner.lifecycle.lock();
		if let Some(previous) = self.inner.sessions.end() {
			self.end_session(&previous);
		}
	}

	fn end_session(&self, session: &Session) {
		self.enqueue(
			session,
			OutboundMessage::SessionEnd {
				session_id: session.id,
				timestamp: Utc::now(),
			},
		);
		info!(session_id = %session.id, "ABBI session ended");
	}

	// ---- goals, attributes, identity ----

	/// Reports a goal with optional properties. Invalid property keys are
	/// dropped; an invalid goal name drops the goal.
	pub fn send_goal(&self, name: &str, properties: Option<Properties>) {
		let Some(session) = self.active_session("send_goal") else {
			return;
		};

		let properties: BTreeMap<String, AttributeValue> = properties
			.map(Properties::into_map)
			.unwrap_or_default()
			.into_iter()
			.filter(|(key, _)| match validate_attribute_key(key) {
				Ok(()) => true,
				Err(e) => {
					warn!(goal = name, error = %e, "Dropping goal property");
					false
				}
			})
			.collect();

		match Goal::new(name, properties) {
			Ok(goal) => {
				debug!(
					goal = %goal.name,
					goal_id = %goal.id,
					properties = goal.properties.len(),
					"Queueing goal"
				);
				self.enqueue(
					&session,
					OutboundMessage::Goal {
						session_id: session.id,
						event_type: EventType::Goal.code(),
						goal,
					},
				);
			}
			Err(e) => warn!(error = %e, "Dropping goal"),
		}
	}

	pub fn set_user_attribute(&self, key: &str, value: impl Into<AttributeValue>) {
		self.set_attribute(AttributeNamespace::Public, key, value.into());
	}

	pub fn set_user_attributes<I, K, V>(&self, attributes: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.set_attributes(
			AttributeNamespace::Public,
			attributes.into_iter().map(|(k, v)| (k.into(), v.into())),
		);
	}

	pub fn set_private_user_attribute(&self, key: &str, value: impl Into<AttributeValue>) {
		self.set_attribute(AttributeNamespace::Private, key, value.into());
	}

	pub fn set_private_user_attributes<I, K, V>(&self, attributes: I)
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<AttributeValue>,
	{
		self.set_attributes(
			AttributeNamespace::Private,
			attributes.into_iter().map(|(k, v)| (k.into(), v.into())),
		);
	}

	pub fn clear_private_user_attributes(&self) {
		let Some(session) = self.active_session("clear_private_user_attributes") else {
			return;
		};
		let cleared = self.inner.attributes.clear(AttributeNamespace::Private);
		debug!(cleared, "Cleared private user attributes");
		self.enqueue(
			&session,
			OutboundMessage::ClearPrivateAttributes {
				session_id: session.id,
				timestamp: Utc::now(),
			},
		);
	}

	fn set_attribute(&self, namespace: AttributeNamespace, key: &str, value: AttributeValue) {
		let Some(session) = self.active_session("set_user_attribute") else {
			return;
		};
		if let Err(e) = self.inner.attributes.set(namespace, key, value.clone()) {
			warn!(namespace = %namespace, error = %e, "Ignoring user attribute");
			return;
		}
		self.enqueue(
			&session,
			OutboundMessage::Attributes {
				session_id: session.id,
				namespace,
				attributes: BTreeMap::from([(key.to_string(), value)]),
				timestamp: Utc::now(),
			},
		);
	}

	fn set_attributes<I>(&self, namespace: AttributeNamespace, entries: I)
	where
		I: IntoIterator<Item = (String, AttributeValue)>,
	{
		let Some(session) = self.active_session("set_user_attributes") else {
			return;
		};
		let applied = self.inner.attributes.set_many(namespace, entries);
		if applied.is_empty() {
			return;
		}
		self.enqueue(
			&session,
			OutboundMessage::Attributes {
				session_id: session.id,
				namespace,
				attributes: applied,
				timestamp: Utc::now(),
			},
		);
	}

	/// Associates the user with an external id, replacing any prior one.
	pub fn set_user_id(&self, user_id: &str) {
		let Some(session) = self.active_session("set_user_id") else {
			return;
		};
		if let Err(e) = validate_user_id(user_id) {
			warn!(error = %e, "Ignoring user id");
			return;
		}
		*self.inner.user_id.write() = Some(user_id.to_string());
		self.enqueue(
			&session,
			OutboundMessage::Identify {
				session_id: session.id,
				user_id: user_id.to_string(),
				timestamp: Utc::now(),
			},
		);
	}

	// ---- campaigns ----

	/// Shows the campaign bound to `name`, bypassing segmentation. Unknown
	/// triggers are ignored.
	pub fn trigger(&self, name: &str) {
		self.request_trigger(name, None);
	}

	/// Navigates to `deep_link`, then shows the campaign bound to `name`.
	/// A malformed deep link is logged and skipped.
	pub fn trigger_with_deep_link(&self, name: &str, deep_link: &str) {
		let deep_link = match Url::parse(deep_link) {
			Ok(url) => Some(url),
			Err(e) => {
				warn!(deep_link, error = %e, "Ignoring malformed deep link");
				None
			}
		};
		self.request_trigger(name, deep_link);
	}

	fn request_trigger(&self, name: &str, deep_link: Option<Url>) {
		let Some(session) = self.active_session("trigger") else {
			return;
		};
		if let Err(e) = validate_trigger_name(name) {
			warn!(error = %e, "Ignoring trigger");
			return;
		}
		debug!(trigger = name, "Requesting campaign");
		self
			.inner
			.campaigns
			.trigger(&session, self.user_id(), name.to_string(), deep_link);
	}

	/// Registers the dismissal observer. The client holds it weakly.
	pub fn set_campaign_info_delegate<D: CampaignInfoDelegate + 'static>(&self, delegate: &Arc<D>) {
		self.inner.campaigns.delegates().set(delegate);
	}

	pub fn clear_campaign_info_delegate(&self) {
		self.inner.campaigns.delegates().clear();
	}

	/// Offers an inbound URL to the SDK. Returns `true` if it was an SDK link
	/// and a session is active to act on it.
	pub fn open_url(&self, url: &str, options: &OpenUrlOptions) -> bool {
		if self.is_closed() {
			return false;
		}
		let Some(link) = self.inner.links.parse_str(url) else {
			debug!(url, "Not an ABBI link");
			return false;
		};
		let Some(session) = self.active_session("open_url") else {
			return false;
		};

		info!(
			url,
			source_application = options.source_application.as_deref().unwrap_or(""),
			annotations = options.annotations.len(),
			"Handling ABBI link"
		);
		match link {
			SdkLink::Trigger(name) => self.inner.campaigns.trigger(&session, self.user_id(), name, None),
			SdkLink::Campaign(id) => self.inner.campaigns.preview(&session, id),
		}
		true
	}

	/// Sets the diagnostic flag sent with requests. `0` clears it.
	pub fn set_flag(&self, flag: i32) {
		self.inner.flag.store(flag, Ordering::Relaxed);
		debug!(flag, "Diagnostic flag set");
	}

	// ---- delivery ----

	/// Delivers every queued message now.
	pub async fn flush(&self) -> Result<()> {
		if self.is_closed() {
			return Err(AbbiError::ClientShutdown);
		}
		self.inner.queue.flush().await
	}

	/// Ends the session, delivers what is queued, and stops the background
	/// worker. Every later call is a no-op.
	pub async fn shutdown(&self) -> Result<()> {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}

		info!("Shutting down ABBI client");
		{
			let _lifecycle = self.inner.lifecycle.lock();
			if let Some(session) = self.inner.sessions.end() {
				self.end_session(&session);
			}
		}

		let result = self.inner.queue.shutdown().await;
		let worker = self.inner.worker.lock().take();
		if let Some(handle) = worker {
			if let Err(e) = handle.await {
				error!(error = %e, "Error waiting for batch worker to stop");
			}
		}

		info!("ABBI client shutdown complete");
		result
	}

	// ---- accessors ----

	pub fn is_started(&self) -> bool {
		!self.is_closed() && self.inner.sessions.is_active()
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	pub fn session_id(&self) -> Option<SessionId> {
		self.inner.sessions.current().map(|s| s.id)
	}

	pub fn app_type(&self) -> Option<AppType> {
		self.inner.sessions.current().map(|s| s.app_type)
	}

	pub fn user_id(&self) -> Option<String> {
		self.inner.user_id.read().clone()
	}

	pub fn user_attribute(&self, key: &str) -> Option<AttributeValue> {
		self.inner.attributes.get(AttributeNamespace::Public, key)
	}

	pub fn user_attributes(&self) -> BTreeMap<String, AttributeValue> {
		self.inner.attributes.snapshot(AttributeNamespace::Public)
	}

	pub fn private_user_attribute(&self, key: &str) -> Option<AttributeValue> {
		self.inner.attributes.get(AttributeNamespace::Private, key)
	}

	pub fn private_user_attributes(&self) -> BTreeMap<String, AttributeValue> {
		self.inner.attributes.snapshot(AttributeNamespace::Private)
	}

	pub fn flag(&self) -> i32 {
		self.inner.flag.load(Ordering::Relaxed)
	}

	pub fn campaign_state(&self) -> CampaignState {
		self.inner.campaigns.state()
	}

	/// Messages held by the batch processor. Messages still in the command
	/// channel are not counted.
	pub async fn queue_len(&self) -> usize {
		self.inner.processor.queue_len().await
	}

	fn active_session(&self, operation: &'static str) -> Option<Session> {
		if self.is_closed() {
			debug!(operation, "Client is shut down, ignoring call");
			return None;
		}
		let session = self.inner.sessions.current();
		if session.is_none() {
			debug!(operation, "No active ABBI session, ignoring call");
		}
		session
	}

	fn enqueue(&self, session: &Session, message: OutboundMessage) {
		let queued = QueuedMessage {
			credentials: Arc::clone(&session.credentials),
			message,
		};
		if let Err(e) = self.inner.queue.try_enqueue(queued) {
			warn!(session_id = %session.id, error = %e, "Message not queued");
		}
	}
}

impl std::fmt::Debug for AbbiClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AbbiClient")
			.field("session_id", &self.session_id())
			.field("closed", &self.is_closed())
			.finish()
	}
}

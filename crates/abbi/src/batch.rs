// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message batching and background flush.
//!
//! The facade pushes [`BatchCommand`]s into a bounded channel without
//! blocking. A single [`BatchProcessor`] task drains the channel into its
//! queue and hands batches to a [`BatchSender`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abbi_core::{Credentials, OutboundMessage};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex, Notify};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{AbbiError, Result};

/// Configuration for the outbound batch queue.
#[derive(Debug, Clone)]
pub struct BatchConfig {
	/// Maximum number of messages to batch before flushing.
	pub max_batch_size: usize,
	/// Interval between automatic flushes.
	pub flush_interval: Duration,
	/// Maximum number of messages to queue before dropping oldest.
	pub max_queue_size: usize,
}

impl Default for BatchConfig {
	fn default() -> Self {
		Self {
			max_batch_size: 20,
			flush_interval: Duration::from_secs(15),
			max_queue_size: 1000,
		}
	}
}

/// A message waiting to be sent, together with the credentials of the
/// session that produced it.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
	pub credentials: Arc<Credentials>,
	pub message: OutboundMessage,
}

/// Command sent to the background flush task.
#[derive(Debug)]
pub enum BatchCommand {
	/// Queue a new message.
	Enqueue(QueuedMessage),
	/// Flush now and report the outcome.
	Flush(oneshot::Sender<Result<()>>),
	/// Flush what is left and stop.
	Shutdown(oneshot::Sender<()>),
}

/// Delivers batches to the backend.
#[async_trait::async_trait]
pub trait BatchSender: Send + Sync {
	/// Send messages that all belong to `credentials`' application.
	async fn send_batch(&self, credentials: &Credentials, messages: Vec<OutboundMessage>)
		-> Result<()>;
}

/// The batch processor that runs in the background.
pub struct BatchProcessor {
	config: BatchConfig,
	sender: Arc<dyn BatchSender>,
	queue: Mutex<VecDeque<QueuedMessage>>,
	shutdown: AtomicBool,
	flush_notify: Notify,
}

impl BatchProcessor {
	pub fn new(config: BatchConfig, sender: Arc<dyn BatchSender>) -> Self {
		Self {
			config,
			sender,
			queue: Mutex::new(VecDeque::new()),
			shutdown: AtomicBool::new(false),
			flush_notify: Notify::new(),
		}
	}

	/// Enqueues a message for batched sending.
	pub async fn enqueue(&self, message: QueuedMessage) -> Result<()> {
		if self.shutdown.load(Ordering::SeqCst) {
			return Err(AbbiError::ClientShutdown);
		}

		let mut queue = self.queue.lock().await;

		while queue.len() >= self.config.max_queue_size.max(1) {
			if let Some(dropped) = queue.pop_front() {
				warn!(
					kind = dropped.message.kind(),
					session_id = %dropped.message.session_id(),
					"Dropped message due to queue overflow"
				);
			}
		}

		queue.push_back(message);

		if queue.len() >= self.config.max_batch_size {
			drop(queue);
			self.flush_notify.notify_one();
		}

		Ok(())
	}

	/// Sends everything queued, one request per run of messages that share
	/// credentials. The first failure is returned after all runs were tried.
	pub async fn flush(&self) -> Result<()> {
		let messages: Vec<QueuedMessage> = {
			let mut queue = self.queue.lock().await;
			queue.drain(..).collect()
		};

		if messages.is_empty() {
			return Ok(());
		}

		debug!(count = messages.len(), "Flushing message batch");

		let mut first_error = None;
		for (credentials, batch) in group_by_credentials(messages) {
			let count = batch.len();
			if let Err(e) = self.sender.send_batch(&credentials, batch).await {
				error!(
					app_id = %credentials.app_id,
					count,
					error = %e,
					"Dropping batch after failed delivery"
				);
				first_error.get_or_insert(e);
			}
		}

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	/// Returns the number of messages currently queued.
	pub async fn queue_len(&self) -> usize {
		self.queue.lock().await.len()
	}

	pub fn is_shutdown(&self) -> bool {
		self.shutdown.load(Ordering::SeqCst)
	}

	/// Runs the background loop until a shutdown command arrives or every
	/// [`BatchQueue`] is dropped.
	pub async fn run(&self, mut commands: mpsc::Receiver<BatchCommand>) {
		info!(
			flush_interval_secs = self.config.flush_interval.as_secs(),
			max_batch_size = self.config.max_batch_size,
			"Starting batch processor"
		);

		let period = self.config.flush_interval.max(Duration::from_millis(1));
		let mut ticker = interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = ticker.tick() => {
					let _ = self.flush().await;
				}
				_ = self.flush_notify.notified() => {
					let _ = self.flush().await;
				}
				command = commands.recv() => match command {
					Some(BatchCommand::Enqueue(message)) => {
						if let Err(e) = self.enqueue(message).await {
							debug!(error = %e, "Discarding message");
						}
					}
					Some(BatchCommand::Flush(ack)) => {
						let _ = ack.send(self.flush().await);
					}
					Some(BatchCommand::Shutdown(ack)) => {
						self.stop().await;
						let _ = ack.send(());
						break;
					}
					None => {
						self.stop().await;
						break;
					}
				},
			}
		}

		info!("Batch processor stopped");
	}

	async fn stop(&self) {
		self.shutdown.store(true, Ordering::SeqCst);
		if let Err(e) = self.flush().await {
			error!(error = %e, "Failed to flush batch on shutdown");
		}
	}
}

fn group_by_credentials(messages: Vec<QueuedMessage>) -> Vec<(Arc<Credentials>, Vec<OutboundMessage>)> {
	let mut groups: Vec<(Arc<Credentials>, Vec<OutboundMessage>)> = Vec::new();
	for QueuedMessage {
		credentials,
		message,
	} in messages
	{
		match groups.last_mut() {
			Some((current, batch)) if Arc::ptr_eq(current, &credentials) || **current == *credentials => {
				batch.push(message)
			}
			_ => groups.push((credentials, vec![message])),
		}
	}
	groups
}

/// Sending half of the processor's command channel.
#[derive(Clone)]
pub struct BatchQueue {
	tx: mpsc::Sender<BatchCommand>,
}

impl BatchQueue {
	pub fn new(tx: mpsc::Sender<BatchCommand>) -> Self {
		Self { tx }
	}

	/// Queues a message without waiting. A full channel drops the message.
	pub fn try_enqueue(&self, message: QueuedMessage) -> Result<()> {
		match self.tx.try_send(BatchCommand::Enqueue(message)) {
			Ok(()) => Ok(()),
			Err(TrySendError::Full(BatchCommand::Enqueue(dropped))) => {
				warn!(
					kind = dropped.message.kind(),
					"Command channel full, dropping message"
				);
				Err(AbbiError::QueueFull)
			}
			Err(TrySendError::Full(_)) => Err(AbbiError::QueueFull),
			Err(TrySendError::Closed(_)) => Err(AbbiError::ClientShutdown),
		}
	}

	/// Flushes everything enqueued before this call and waits for delivery.
	pub async fn flush(&self) -> Result<()> {
		let (ack, done) = oneshot::channel();
		self
			.tx
			.send(BatchCommand::Flush(ack))
			.await
			.map_err(|_| AbbiError::ClientShutdown)?;
		done.await.map_err(|_| AbbiError::ClientShutdown)?
	}

	/// Asks the processor to flush and stop, and waits until it has.
	pub async fn shutdown(&self) -> Result<()> {
		let (ack, done) = oneshot::channel();
		self
			.tx
			.send(BatchCommand::Shutdown(ack))
			.await
			.map_err(|_| AbbiError::ClientShutdown)?;
		done.await.map_err(|_| AbbiError::ClientShutdown)
	}
}

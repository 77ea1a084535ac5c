// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The tokio runtime that background work runs on.

use std::future::Future;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{AbbiError, Result};

/// Runs network work off the caller's thread.
///
/// Always a dedicated single-worker runtime, even when the client is built
/// inside another tokio runtime, so the batch worker lives exactly as long
/// as the client. It is shut down in the background on drop so dropping the
/// client never blocks.
pub struct BackgroundRuntime {
	runtime: Option<Runtime>,
	handle: Handle,
}

impl BackgroundRuntime {
	pub fn new() -> Result<Self> {
		let runtime = Builder::new_multi_thread()
			.worker_threads(1)
			.thread_name("abbi-worker")
			.enable_all()
			.build()
			.map_err(AbbiError::Runtime)?;
		debug!("Started dedicated abbi-worker runtime");
		Ok(Self {
			handle: runtime.handle().clone(),
			runtime: Some(runtime),
		})
	}

	pub fn handle(&self) -> &Handle {
		&self.handle
	}

	pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
	where
		F: Future + Send + 'static,
		F::Output: Send + 'static,
	{
		self.handle.spawn(future)
	}
}

impl Drop for BackgroundRuntime {
	fn drop(&mut self) {
		if let Some(runtime) = self.runtime.take() {
			runtime.shutdown_background();
		}
	}
}

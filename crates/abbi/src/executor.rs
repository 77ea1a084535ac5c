// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The host's main execution context.
//!
//! Campaign display and delegate callbacks must run where the host's UI
//! lives. Hosts hand the client a [`MainExecutor`] that posts closures there.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::runtime::Handle;

/// A unit of work posted to the main context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Posts work to the host's main context.
pub trait MainExecutor: Send + Sync {
	fn execute(&self, task: Task);
}

/// Runs tasks on the background tokio runtime. Used when the host supplies
/// no executor.
#[derive(Debug, Clone)]
pub struct RuntimeExecutor {
	handle: Handle,
}

impl RuntimeExecutor {
	pub fn new(handle: Handle) -> Self {
		Self { handle }
	}
}

impl MainExecutor for RuntimeExecutor {
	fn execute(&self, task: Task) {
		self.handle.spawn(async move { task() });
	}
}

/// Runs tasks immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl MainExecutor for InlineExecutor {
	fn execute(&self, task: Task) {
		task();
	}
}

/// Collects tasks until the host drains them from its own loop with
/// [`QueueExecutor::run_pending`].
#[derive(Default)]
pub struct QueueExecutor {
	tasks: Mutex<VecDeque<Task>>,
}

impl QueueExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.tasks.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.lock().is_empty()
	}

	/// Runs queued tasks in order, including ones they post, and returns how
	/// many ran.
	pub fn run_pending(&self) -> usize {
		let mut ran = 0;
		loop {
			// Released before running so tasks may post more work.
			let next = self.tasks.lock().pop_front();
			match next {
				Some(task) => {
					task();
					ran += 1;
				}
				None => return ran,
			}
		}
	}
}

impl MainExecutor for QueueExecutor {
	fn execute(&self, task: Task) {
		self.tasks.lock().push_back(task);
	}
}

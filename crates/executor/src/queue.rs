use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

type QueueTask = Box<dyn FnOnce() + Send + 'static>;

/// Sizing configuration for a serial queue.
#[derive(Debug, Clone)]
pub struct QueueSpec {
	pub(crate) capacity: usize,
}

impl QueueSpec {
	/// Creates a spec with the given pending-task capacity.
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero.
	#[must_use]
	pub fn with_capacity(capacity: usize) -> Self {
		assert!(capacity > 0, "queue capacity must be > 0");
		Self { capacity }
	}
}

impl Default for QueueSpec {
	fn default() -> Self {
		Self { capacity: 128 }
	}
}

/// Error from submitting work to a serial queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueSubmitError {
	/// The queue no longer accepts work.
	#[error("serial queue closed")]
	Closed,
	/// The queue is at capacity and a non-blocking submit was used.
	#[error("serial queue full")]
	Full,
}

struct QueueState {
	tasks: VecDeque<QueueTask>,
	closed: bool,
}

struct QueueShared {
	name: String,
	capacity: usize,
	state: Mutex<QueueState>,
	task_ready: Condvar,
	slot_free: Condvar,
}

/// Serial work queue: tasks run in submission order, never concurrently,
/// on one dedicated worker thread.
///
/// Intake is bounded; `submit` applies backpressure instead of dropping
/// work. Shutdown closes intake, drains every already-accepted task, then
/// joins the worker.
pub struct SerialQueue {
	shared: Arc<QueueShared>,
	worker_thread: thread::Thread,
	worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl SerialQueue {
	/// Creates a queue with default sizing and starts its worker thread.
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_spec(name, QueueSpec::default())
	}

	/// Creates a queue with explicit sizing and starts its worker thread.
	pub fn with_spec(name: impl Into<String>, spec: QueueSpec) -> Self {
		let shared = Arc::new(QueueShared {
			name: name.into(),
			capacity: spec.capacity,
			state: Mutex::new(QueueState {
				tasks: VecDeque::with_capacity(spec.capacity),
				closed: false,
			}),
			task_ready: Condvar::new(),
			slot_free: Condvar::new(),
		});
		let worker_shared = Arc::clone(&shared);
		let handle = thread::Builder::new()
			.name(format!("strand-queue-{}", shared.name))
			.spawn(move || drain_tasks(&worker_shared))
			.expect("failed to spawn serial queue worker thread");
		tracing::trace!(queue = %shared.name, capacity = spec.capacity, "queue.start");

		Self {
			worker_thread: handle.thread().clone(),
			worker: Mutex::new(Some(handle)),
			shared,
		}
	}

	/// Queue name.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Number of tasks accepted but not yet started.
	pub fn len(&self) -> usize {
		self.shared.state.lock().tasks.len()
	}

	/// Returns true when no accepted task is pending.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns true when the calling thread is this queue's worker thread.
	pub fn is_current(&self) -> bool {
		thread::current().id() == self.worker_thread.id()
	}

	/// Submits one task, waiting for capacity when the queue is full.
	///
	/// Tasks submitted from the same producer run in submission order, never
	/// concurrently with each other. Accepted tasks are never dropped.
	pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<(), QueueSubmitError> {
		let mut state = self.shared.state.lock();
		loop {
			if state.closed {
				return Err(QueueSubmitError::Closed);
			}
			if state.tasks.len() < self.shared.capacity {
				state.tasks.push_back(Box::new(task));
				self.shared.task_ready.notify_one();
				return Ok(());
			}
			self.shared.slot_free.wait(&mut state);
		}
	}

	/// Non-blocking submit. Errors with `Full` when at capacity.
	pub fn try_submit(&self, task: impl FnOnce() + Send + 'static) -> Result<(), QueueSubmitError> {
		let mut state = self.shared.state.lock();
		if state.closed {
			return Err(QueueSubmitError::Closed);
		}
		if state.tasks.len() >= self.shared.capacity {
			return Err(QueueSubmitError::Full);
		}
		state.tasks.push_back(Box::new(task));
		self.shared.task_ready.notify_one();
		Ok(())
	}

	/// Closes intake, drains every accepted task, and joins the worker.
	///
	/// Idempotent. When called from the worker thread itself, only closes
	/// intake; the worker exits once the remaining tasks have drained.
	pub fn shutdown(&self) {
		{
			let mut state = self.shared.state.lock();
			state.closed = true;
		}
		self.shared.task_ready.notify_all();
		self.shared.slot_free.notify_all();

		if self.is_current() {
			return;
		}
		let handle = self.worker.lock().take();
		if let Some(handle) = handle {
			tracing::debug!(queue = %self.shared.name, "queue.shutdown");
			if handle.join().is_err() {
				tracing::error!(queue = %self.shared.name, "queue.worker_panicked");
			}
		}
	}
}

impl Drop for SerialQueue {
	fn drop(&mut self) {
		let mut state = self.shared.state.lock();
		state.closed = true;
		drop(state);
		self.shared.task_ready.notify_all();
		self.shared.slot_free.notify_all();
	}
}

fn drain_tasks(shared: &QueueShared) {
	loop {
		let task = {
			let mut state = shared.state.lock();
			loop {
				if let Some(task) = state.tasks.pop_front() {
					shared.slot_free.notify_one();
					break task;
				}
				if state.closed {
					return;
				}
				shared.task_ready.wait(&mut state);
			}
		};
		// Contain task panics so one bad task cannot take the queue down.
		if panic::catch_unwind(AssertUnwindSafe(move || task())).is_err() {
			tracing::error!(queue = %shared.name, "queue.task_panicked");
		}
	}
}

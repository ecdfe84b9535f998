use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use crate::current::ExecutorScope;
use crate::executor::{ExecutorId, SerialExecutor};
use crate::job::Job;
use crate::queue::{QueueSubmitError, SerialQueue};

/// Hand-off discipline for [`QueueExecutor`] submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handoff {
	/// Return once the queue has accepted the job.
	#[default]
	Async,
	/// Block the submitter until the job has run.
	///
	/// Deterministic hand-off for tests and synchronous embeddings. Must
	/// not be used from the queue's own worker thread.
	Sync,
}

/// Bridges the [`SerialExecutor`] contract onto one [`SerialQueue`].
///
/// Identity is the bridge instance itself: two bridges wrapping the same
/// queue are distinct serialization points.
pub struct QueueExecutor {
	id: ExecutorId,
	name: Arc<str>,
	queue: Arc<SerialQueue>,
	handoff: Handoff,
	enqueued: AtomicU64,
	completed: Arc<AtomicU64>,
}

impl QueueExecutor {
	/// Creates a bridge over `queue` with the default asynchronous hand-off.
	pub fn new(name: impl Into<String>, queue: Arc<SerialQueue>) -> Self {
		Self {
			id: ExecutorId::fresh(),
			name: name.into().into(),
			queue,
			handoff: Handoff::Async,
			enqueued: AtomicU64::new(0),
			completed: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Sets the hand-off discipline.
	#[must_use]
	pub fn handoff(mut self, handoff: Handoff) -> Self {
		self.handoff = handoff;
		self
	}

	/// Bridge name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Underlying serial queue.
	pub fn queue(&self) -> &Arc<SerialQueue> {
		&self.queue
	}

	/// Number of jobs accepted so far.
	pub fn enqueued_jobs(&self) -> u64 {
		self.enqueued.load(Ordering::Relaxed)
	}

	/// Number of jobs that have finished running.
	pub fn completed_jobs(&self) -> u64 {
		self.completed.load(Ordering::Relaxed)
	}

	fn submit(&self, job: Job, done: Option<mpsc::Sender<()>>) -> Result<(), QueueSubmitError> {
		let id = self.id;
		let name = Arc::clone(&self.name);
		let completed = Arc::clone(&self.completed);
		let seq = job.seq();
		self.queue.submit(move || {
			let _scope = ExecutorScope::enter(id);
			job.run();
			completed.fetch_add(1, Ordering::Relaxed);
			tracing::trace!(executor = %name, job = seq, "executor.job_complete");
			if let Some(done) = done {
				let _ = done.send(());
			}
		})
	}
}

impl SerialExecutor for QueueExecutor {
	fn enqueue(&self, job: Job) {
		tracing::trace!(executor = %self.name, job = job.seq(), "executor.enqueue");
		self.enqueued.fetch_add(1, Ordering::Relaxed);
		let result = match self.handoff {
			Handoff::Async => self.submit(job, None),
			Handoff::Sync => {
				assert!(
					!self.queue.is_current(),
					"{self}: synchronous hand-off from its own queue cannot preserve submission order"
				);
				let (done_tx, done_rx) = mpsc::channel();
				let submitted = self.submit(job, Some(done_tx));
				if submitted.is_ok() {
					// A dropped sender means the job unwound before
					// signalling; the submitter resumes either way.
					let _ = done_rx.recv();
					tracing::trace!(executor = %self.name, "executor.after_run");
				}
				submitted
			}
		};
		if let Err(err) = result {
			panic!("{self}: job rejected after shutdown ({err}); isolated work must never be dropped");
		}
	}

	fn identity(&self) -> ExecutorId {
		self.id
	}
}

impl fmt::Display for QueueExecutor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "QueueExecutor({})", self.name)
	}
}

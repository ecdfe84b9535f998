use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// One unit of isolated work, run exactly once.
///
/// A job is uniquely owned by whichever component currently holds it: the
/// producing runtime until enqueue, the executor while it runs. Consumption
/// by value makes duplication and re-submission impossible.
pub struct Job {
	seq: u64,
	run: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
	/// Wraps one pending computation as an enqueueable job.
	pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
		static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);
		Self {
			seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
			run: Box::new(f),
		}
	}

	/// Process-unique sequence number, used for trace correlation.
	pub const fn seq(&self) -> u64 {
		self.seq
	}

	/// Runs the job, consuming it.
	pub fn run(self) {
		(self.run)();
	}
}

impl fmt::Debug for Job {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Job").field("seq", &self.seq).finish_non_exhaustive()
	}
}

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Job;
use crate::current::current_executor;

/// Equality-testable token naming one executor instance.
///
/// Identities are allocated from a process-wide counter, so tokens from
/// unrelated executors always compare unequal. Equality means "the same
/// serialization point", never "the same underlying resource".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutorId(u64);

impl ExecutorId {
	/// Allocates a fresh identity.
	pub fn fresh() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns true when the calling thread is currently driven by this
	/// executor.
	pub fn is_current(self) -> bool {
		current_executor() == Some(self)
	}
}

/// Serialization point for jobs.
///
/// Implementations accept jobs and guarantee non-overlapping, in-order,
/// eventual execution. Work is never dropped silently: an executor that can
/// no longer accept jobs must treat submission as fatal.
pub trait SerialExecutor: Send + Sync {
	/// Accepts one job for execution, taking unique ownership.
	///
	/// The job runs strictly after every previously enqueued job for this
	/// executor and strictly before any later one. Enqueue may block until
	/// the underlying run queue accepts the submission, but not until the
	/// job itself finishes, unless the implementation documents a
	/// synchronous hand-off.
	///
	/// # Panics
	///
	/// Panics when the executor has stopped accepting work.
	fn enqueue(&self, job: Job);

	/// Returns the identity token for same-executor checks.
	fn identity(&self) -> ExecutorId;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_identities_are_distinct() {
		let a = ExecutorId::fresh();
		let b = ExecutorId::fresh();
		assert_ne!(a, b);
		assert_eq!(a, a);
	}

	#[test]
	fn is_current_is_false_off_executor() {
		assert!(!ExecutorId::fresh().is_current());
	}
}

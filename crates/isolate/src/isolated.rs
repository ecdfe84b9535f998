use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc;

use parking_lot::Mutex;
use strand_executor::{Job, SerialExecutor, current_executor};
use tokio::sync::oneshot;

struct IsolatedShared<S> {
	name: String,
	state: Mutex<S>,
	executor: Arc<dyn SerialExecutor>,
}

/// An isolation domain: state serialized through one bound executor.
///
/// The executor binding is established at construction and immutable for the
/// domain's lifetime; rebinding means constructing a new domain. Handles are
/// cheap to clone and share one underlying domain. Any number of domains may
/// bind the same executor; each keeps its own per-domain FIFO ordering.
///
/// Every isolated operation follows the hop protocol: if the caller is
/// already running on the bound executor the closure runs inline, otherwise
/// it is wrapped in a [`Job`], enqueued, and the caller suspends until the
/// job completes.
pub struct Isolated<S> {
	shared: Arc<IsolatedShared<S>>,
}

impl<S> Clone for Isolated<S> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<S: Send + 'static> Isolated<S> {
	/// Creates a domain owning `state`, bound to `executor`.
	pub fn new(name: impl Into<String>, state: S, executor: Arc<dyn SerialExecutor>) -> Self {
		Self {
			shared: Arc::new(IsolatedShared {
				name: name.into(),
				state: Mutex::new(state),
				executor,
			}),
		}
	}

	/// Domain name.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// The bound executor.
	pub fn executor(&self) -> &Arc<dyn SerialExecutor> {
		&self.shared.executor
	}

	/// Returns true when the calling context runs on the bound executor.
	pub fn is_isolated(&self) -> bool {
		current_executor() == Some(self.shared.executor.identity())
	}

	/// Panics when the calling context is not running on the bound executor.
	pub fn assert_isolated(&self) {
		assert!(
			self.is_isolated(),
			"expected to be isolated on the executor bound to '{}'",
			self.shared.name
		);
	}

	/// Runs `f` against the domain state on the bound executor, suspending
	/// the caller until it completes.
	///
	/// A panic inside `f` resumes on the caller; the executor and the domain
	/// stay usable.
	pub async fn call<R>(&self, f: impl FnOnce(&mut S) -> R + Send + 'static) -> R
	where
		R: Send + 'static,
	{
		if self.is_isolated() {
			return self.run_inline(f);
		}

		tracing::trace!(domain = %self.shared.name, "isolate.call");
		let (reply_tx, reply_rx) = oneshot::channel();
		let shared = Arc::clone(&self.shared);
		self.shared.executor.enqueue(Job::new(move || {
			let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
				let mut state = shared.state.lock();
				f(&mut state)
			}));
			let _ = reply_tx.send(outcome);
		}));

		match reply_rx.await {
			Ok(Ok(value)) => value,
			Ok(Err(payload)) => panic::resume_unwind(payload),
			// Accepted jobs always run; a vanished reply is a broken executor.
			Err(_) => panic!("isolated call on '{}' dropped without running", self.shared.name),
		}
	}

	/// Synchronous variant of [`Self::call`] for callers outside an async
	/// context.
	///
	/// The inline-elision branch makes same-executor cross-domain calls from
	/// inside a running job legal: they run immediately instead of
	/// deadlocking behind the caller's own job.
	pub fn call_blocking<R>(&self, f: impl FnOnce(&mut S) -> R + Send + 'static) -> R
	where
		R: Send + 'static,
	{
		if self.is_isolated() {
			return self.run_inline(f);
		}

		tracing::trace!(domain = %self.shared.name, "isolate.call_blocking");
		let (reply_tx, reply_rx) = mpsc::channel();
		let shared = Arc::clone(&self.shared);
		self.shared.executor.enqueue(Job::new(move || {
			let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
				let mut state = shared.state.lock();
				f(&mut state)
			}));
			let _ = reply_tx.send(outcome);
		}));

		match reply_rx.recv() {
			Ok(Ok(value)) => value,
			Ok(Err(payload)) => panic::resume_unwind(payload),
			Err(_) => panic!("isolated call on '{}' dropped without running", self.shared.name),
		}
	}

	/// Fire-and-forget isolated mutation, FIFO with the domain's other jobs.
	pub fn post(&self, f: impl FnOnce(&mut S) + Send + 'static) {
		tracing::trace!(domain = %self.shared.name, "isolate.post");
		let shared = Arc::clone(&self.shared);
		self.shared.executor.enqueue(Job::new(move || {
			let mut state = shared.state.lock();
			f(&mut state);
		}));
	}

	fn run_inline<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
		tracing::trace!(domain = %self.shared.name, "isolate.call_inline");
		// On the bound executor no other domain job can be running, so a
		// held lock here can only be a reentrant call from inside the
		// domain's own closure.
		let Some(mut state) = self.shared.state.try_lock() else {
			panic!("reentrant isolated call on '{}'", self.shared.name);
		};
		f(&mut state)
	}
}

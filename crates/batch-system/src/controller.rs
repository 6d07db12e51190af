use std::{
	fmt,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex, MutexGuard, PoisonError},
	task::{Context, Poll},
};

use tokio::sync::oneshot;
use tracing::{info, instrument, trace};
use uuid::Uuid;

use super::{
	config::ControllerConfig,
	error::SystemError,
	item::{ItemTransform, OutputContext, WorkItem},
	progress::{Emitter, NoopSink, ProgressSink},
	report::BatchReport,
	state::BatchState,
	worker,
};

/// A unique identifier for a batch using the [`uuid`](https://docs.rs/uuid) crate.
pub type BatchId = Uuid;

/// Callback invoked once per batch with its final report.
pub type CompletionCallback = Arc<dyn Fn(&BatchReport) + Send + Sync>;

/// Snapshot of where the controller is in the batch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
	Idle,
	Running,
	Paused,
	/// Cancel was requested, the worker is finishing its in-flight item.
	Cancelling,
}

pub(crate) struct Inner {
	pub config: ControllerConfig,
	sink: Arc<dyn ProgressSink>,
	on_completion: Option<CompletionCallback>,
	current: Mutex<Option<Arc<BatchState>>>,
}

impl Inner {
	fn current_slot(&self) -> MutexGuard<'_, Option<Arc<BatchState>>> {
		self.current.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn current(&self) -> Option<Arc<BatchState>> {
		self.current_slot().clone()
	}

	/// Back to idle, only if `batch_id` is still the live batch.
	pub fn finish(&self, batch_id: BatchId) {
		let mut current = self.current_slot();

		if current.as_ref().is_some_and(|state| state.id == batch_id) {
			*current = None;
		}
	}

	pub fn notify_completion(&self, report: &BatchReport) {
		if let Some(on_completion) = &self.on_completion {
			on_completion(report);
		}
	}
}

/// Builder for a [`BatchController`].
#[derive(Default)]
pub struct BatchControllerBuilder {
	config: ControllerConfig,
	sink: Option<Arc<dyn ProgressSink>>,
	on_completion: Option<CompletionCallback>,
}

impl BatchControllerBuilder {
	#[must_use]
	pub fn config(mut self, config: ControllerConfig) -> Self {
		self.config = config;
		self
	}

	#[must_use]
	pub fn progress_sink(mut self, sink: impl ProgressSink) -> Self {
		self.sink = Some(Arc::new(sink));
		self
	}

	/// Called exactly once per batch, after the controller went back to idle, so the callback
	/// may start the next batch right away.
	#[must_use]
	pub fn on_completion(mut self, callback: impl Fn(&BatchReport) + Send + Sync + 'static) -> Self {
		self.on_completion = Some(Arc::new(callback));
		self
	}

	#[must_use]
	pub fn build(self) -> BatchController {
		BatchController {
			inner: Arc::new(Inner {
				config: self.config,
				sink: self.sink.unwrap_or_else(|| Arc::new(NoopSink)),
				on_completion: self.on_completion,
				current: Mutex::new(None),
			}),
		}
	}
}

/// Owns the lifecycle of one batch at a time: start, pause, resume and cancel, plus the final
/// statistics.
///
/// Cloning is cheap and every clone drives the same batch, so a clone can be handed to a UI
/// thread or moved into the completion callback.
#[derive(Clone)]
pub struct BatchController {
	inner: Arc<Inner>,
}

impl fmt::Debug for BatchController {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BatchController")
			.field("config", &self.inner.config)
			.field("status", &self.status())
			.finish_non_exhaustive()
	}
}

impl Default for BatchController {
	fn default() -> Self {
		Self::new()
	}
}

impl BatchController {
	/// A controller with default config, no progress sink and no completion callback.
	#[must_use]
	pub fn new() -> Self {
		Self::builder().build()
	}

	#[must_use]
	pub fn builder() -> BatchControllerBuilder {
		BatchControllerBuilder::default()
	}

	#[must_use]
	pub fn config(&self) -> &ControllerConfig {
		&self.inner.config
	}

	/// Starts processing `items` in order through `transform` on a background task and returns
	/// right away.
	///
	/// An empty `items` list is reported as a completed batch with zero counts on the spot,
	/// without launching a worker.
	///
	/// Must be called from within a Tokio runtime.
	///
	/// # Errors
	///
	/// [`SystemError::AlreadyRunning`] if a batch is still in progress, which is left untouched.
	#[instrument(skip_all, fields(items = items.len()), err)]
	pub fn start<T: ItemTransform>(
		&self,
		items: Vec<WorkItem>,
		transform: T,
		ctx: OutputContext,
	) -> Result<BatchHandle, SystemError> {
		let mut current = self.inner.current_slot();

		if let Some(state) = current.as_ref() {
			return Err(SystemError::AlreadyRunning(state.id));
		}

		let batch_id = BatchId::new_v4();
		let (done_tx, done_rx) = oneshot::channel();

		if items.is_empty() {
			drop(current);

			info!(%batch_id, "Empty batch, nothing to process");

			let report = BatchReport::empty(batch_id);
			self.inner.sink.on_status_line("No items to process");
			self.inner.notify_completion(&report);

			if done_tx.send(Ok(report)).is_err() {
				trace!("Batch handle dropped before completion");
			}

			return Ok(BatchHandle { batch_id, done_rx });
		}

		let (emitter, forwarder) = Emitter::spawn(Arc::clone(&self.inner.sink));
		let state = Arc::new(BatchState::new(batch_id, items, emitter));
		*current = Some(Arc::clone(&state));
		drop(current);

		info!(%batch_id, total = state.total, "Batch started");
		state
			.emitter
			.status(format!("Starting batch of {} items", state.total));

		worker::launch(
			Arc::clone(&self.inner),
			state,
			transform,
			ctx,
			forwarder,
			done_tx,
		);

		Ok(BatchHandle { batch_id, done_rx })
	}

	/// Stops the worker before its next item, the in-flight one runs to completion.
	///
	/// Returns `false` and does nothing if no batch is running or it is already paused or
	/// cancelled.
	#[instrument(skip(self))]
	pub fn pause(&self) -> bool {
		let Some(state) = self.inner.current() else {
			trace!("No batch running, will not pause");
			return false;
		};

		if !state.pause() {
			trace!(batch_id = %state.id, "Batch already paused or cancelled");
			return false;
		}

		info!(batch_id = %state.id, "Batch paused");
		state
			.emitter
			.status("Paused, the current item will finish first");

		true
	}

	/// Lets a paused worker continue with its next item.
	///
	/// Returns `false` and does nothing if the batch is not paused.
	#[instrument(skip(self))]
	pub fn resume(&self) -> bool {
		let Some(state) = self.inner.current() else {
			trace!("No batch running, will not resume");
			return false;
		};

		if !state.resume() {
			trace!(batch_id = %state.id, "Batch is not paused");
			return false;
		}

		info!(batch_id = %state.id, "Batch resumed");
		state.emitter.status("Resumed");

		true
	}

	/// Cancels the running batch: every item not yet started is abandoned and the worker
	/// leaves after its in-flight item. Confirming with the user is up to the caller.
	///
	/// Returns the number of abandoned items, or `None` if there was nothing to cancel.
	#[instrument(skip(self))]
	pub fn cancel(&self) -> Option<usize> {
		let Some(state) = self.inner.current() else {
			trace!("No batch running, will not cancel");
			return None;
		};

		let abandoned = state.cancel()?;

		info!(batch_id = %state.id, %abandoned, "Batch cancelled");
		state
			.emitter
			.status(format!("Cancelled, {abandoned} items abandoned"));

		Some(abandoned)
	}

	#[must_use]
	pub fn status(&self) -> BatchStatus {
		self.inner
			.current()
			.map_or(BatchStatus::Idle, |state| state.status())
	}

	#[must_use]
	pub fn is_running(&self) -> bool {
		self.inner.current().is_some()
	}

	/// Items still waiting in the queue.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.inner
			.current()
			.map_or(0, |state| state.queue.size())
	}
}

/// Resolves with the [`BatchReport`] once the batch ends.
///
/// Dropping the handle does not cancel the batch.
#[derive(Debug)]
#[must_use = "a `BatchHandle` is the only way to receive the report besides the completion callback"]
pub struct BatchHandle {
	batch_id: BatchId,
	done_rx: oneshot::Receiver<Result<BatchReport, SystemError>>,
}

impl BatchHandle {
	#[must_use]
	pub const fn batch_id(&self) -> BatchId {
		self.batch_id
	}
}

impl Future for BatchHandle {
	type Output = Result<BatchReport, SystemError>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let batch_id = self.batch_id;

		Pin::new(&mut self.done_rx)
			.poll(cx)
			.map(|res| res.unwrap_or(Err(SystemError::WorkerGone(batch_id))))
	}
}

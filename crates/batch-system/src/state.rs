use std::{
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Mutex, MutexGuard, PoisonError,
	},
	time::{Duration, Instant},
};

use super::{
	controller::{BatchId, BatchStatus},
	gate::PauseGate,
	item::WorkItem,
	progress::Emitter,
	queue::JobQueue,
};

#[derive(Debug, Default)]
struct PauseClock {
	paused_at: Option<Instant>,
	accumulated: Duration,
}

impl PauseClock {
	fn total(&self) -> Duration {
		self.accumulated + self.paused_at.map_or(Duration::ZERO, |at| at.elapsed())
	}

	fn stop(&mut self) -> bool {
		let Some(at) = self.paused_at.take() else {
			return false;
		};

		self.accumulated += at.elapsed();

		true
	}
}

/// Live state of one batch, shared by the controller (pause, resume and cancel transitions)
/// and the worker (queue consumption).
///
/// Counters are not kept here: only the worker touches them, so they live on its stack.
#[derive(Debug)]
pub(crate) struct BatchState {
	pub id: BatchId,
	pub total: usize,
	pub started_at: Instant,
	pub queue: JobQueue,
	pub gate: PauseGate,
	pub emitter: Emitter,
	has_cancelled: AtomicBool,
	abandoned: AtomicUsize,
	// Serializes pause/resume/cancel transitions together with the gate they drive
	clock: Mutex<PauseClock>,
}

impl BatchState {
	pub fn new(id: BatchId, items: Vec<WorkItem>, emitter: Emitter) -> Self {
		Self {
			id,
			total: items.len(),
			started_at: Instant::now(),
			queue: items.into_iter().collect(),
			gate: PauseGate::new(),
			emitter,
			has_cancelled: AtomicBool::new(false),
			abandoned: AtomicUsize::new(0),
			clock: Mutex::new(PauseClock::default()),
		}
	}

	fn clock(&self) -> MutexGuard<'_, PauseClock> {
		self.clock.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn has_cancelled(&self) -> bool {
		self.has_cancelled.load(Ordering::Acquire)
	}

	pub fn abandoned(&self) -> usize {
		self.abandoned.load(Ordering::Acquire)
	}

	pub fn status(&self) -> BatchStatus {
		if self.has_cancelled() {
			BatchStatus::Cancelling
		} else if self.clock().paused_at.is_some() {
			BatchStatus::Paused
		} else {
			BatchStatus::Running
		}
	}

	/// Closes the gate, `false` if the batch is already paused or cancelled.
	pub fn pause(&self) -> bool {
		let mut clock = self.clock();

		if self.has_cancelled() || clock.paused_at.is_some() {
			return false;
		}

		clock.paused_at = Some(Instant::now());
		self.gate.pause();

		true
	}

	/// Reopens the gate, `false` if the batch wasn't paused.
	pub fn resume(&self) -> bool {
		let mut clock = self.clock();

		if !clock.stop() {
			return false;
		}

		self.gate.resume();

		true
	}

	/// Flags the batch as cancelled and drains the queue, returning how many items were
	/// abandoned, or `None` if it was already cancelled.
	///
	/// The gate is reopened so a paused worker wakes up, sees the flag and leaves.
	pub fn cancel(&self) -> Option<usize> {
		let mut clock = self.clock();

		if self.has_cancelled.swap(true, Ordering::AcqRel) {
			return None;
		}

		let abandoned = self.queue.drain().len();
		self.abandoned.store(abandoned, Ordering::Release);

		clock.stop();
		self.gate.resume();

		Some(abandoned)
	}

	pub fn paused_for(&self) -> Duration {
		self.clock().total()
	}

	/// Wall time since the batch started, minus everything spent paused.
	pub fn net_elapsed(&self) -> Duration {
		self.started_at.elapsed().saturating_sub(self.paused_for())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use uuid::Uuid;

	use super::*;
	use crate::progress::NoopSink;

	fn state(count: usize) -> (BatchState, tokio::task::JoinHandle<()>) {
		let (emitter, forwarder) = Emitter::spawn(Arc::new(NoopSink));
		let items = (0..count)
			.map(|idx| WorkItem::new(format!("{idx}.dwg"), 1))
			.collect();

		(BatchState::new(Uuid::new_v4(), items, emitter), forwarder)
	}

	#[tokio::test]
	async fn pause_resume_transitions() {
		let (state, _forwarder) = state(2);
		assert_eq!(state.status(), BatchStatus::Running);

		assert!(state.pause());
		assert!(!state.pause());
		assert!(!state.gate.is_open());
		assert_eq!(state.status(), BatchStatus::Paused);

		assert!(state.resume());
		assert!(!state.resume());
		assert!(state.gate.is_open());
		assert_eq!(state.status(), BatchStatus::Running);
	}

	#[tokio::test]
	async fn cancel_drains_queue_once_and_opens_gate() {
		let (state, _forwarder) = state(3);
		assert!(state.queue.dequeue().is_some());
		assert!(state.pause());

		assert_eq!(state.cancel(), Some(2));
		assert_eq!(state.cancel(), None);
		assert_eq!(state.abandoned(), 2);
		assert!(state.queue.is_empty());
		assert!(state.gate.is_open());
		assert_eq!(state.status(), BatchStatus::Cancelling);

		// A cancelled batch can't be paused anymore
		assert!(!state.pause());
	}

	#[tokio::test]
	async fn paused_time_is_excluded_from_elapsed() {
		let (state, _forwarder) = state(1);

		assert!(state.pause());
		std::thread::sleep(Duration::from_millis(30));
		assert!(state.resume());

		let paused = state.paused_for();
		assert!(paused >= Duration::from_millis(30));
		assert!(state.net_elapsed() + paused <= state.started_at.elapsed());
	}
}

use std::sync::Arc;

use async_channel as chan;
use tokio::{spawn, task::JoinHandle};
use tracing::{trace, Instrument};

/// Receiver of human facing batch feedback.
///
/// Calls arrive from a background task in the same order the worker emitted them, never on
/// the caller's own thread. Presentation layers that are single threaded should hand the
/// events over to their own loop, [`ChannelSink`] does exactly that.
pub trait ProgressSink: Send + Sync + 'static {
	fn on_status_line(&self, line: &str);

	fn on_progress(&self, completed: usize, total: usize);

	/// Throughput estimate in bytes per second, net of paused time.
	fn on_throughput(&self, _bytes_per_second: f64) {}
}

/// Default sink, drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
	fn on_status_line(&self, _line: &str) {}

	fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// A single notification as delivered through a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
	StatusLine(String),
	Progress { completed: usize, total: usize },
	Throughput(f64),
}

/// Sink that forwards every notification into a channel, so a foreground loop can apply them
/// on its own execution context.
#[derive(Debug, Clone)]
pub struct ChannelSink {
	events_tx: chan::Sender<ProgressEvent>,
}

impl ChannelSink {
	#[must_use]
	pub fn new() -> (Self, chan::Receiver<ProgressEvent>) {
		let (events_tx, events_rx) = chan::unbounded();

		(Self { events_tx }, events_rx)
	}

	fn forward(&self, event: ProgressEvent) {
		if self.events_tx.try_send(event).is_err() {
			trace!("Progress receiver dropped, discarding event");
		}
	}
}

impl ProgressSink for ChannelSink {
	fn on_status_line(&self, line: &str) {
		self.forward(ProgressEvent::StatusLine(line.to_string()));
	}

	fn on_progress(&self, completed: usize, total: usize) {
		self.forward(ProgressEvent::Progress { completed, total });
	}

	fn on_throughput(&self, bytes_per_second: f64) {
		self.forward(ProgressEvent::Throughput(bytes_per_second));
	}
}

/// Per batch event pipe: the worker and the controller push into it, a forwarder task drains
/// it into the configured [`ProgressSink`] so the sink never runs on the worker's critical path.
#[derive(Debug)]
pub(crate) struct Emitter {
	events_tx: chan::Sender<ProgressEvent>,
}

impl Emitter {
	pub fn spawn(sink: Arc<dyn ProgressSink>) -> (Self, JoinHandle<()>) {
		let (events_tx, events_rx) = chan::unbounded::<ProgressEvent>();

		let forwarder = spawn(
			async move {
				while let Ok(event) = events_rx.recv().await {
					match event {
						ProgressEvent::StatusLine(line) => sink.on_status_line(&line),
						ProgressEvent::Progress { completed, total } => {
							sink.on_progress(completed, total);
						}
						ProgressEvent::Throughput(rate) => sink.on_throughput(rate),
					}
				}

				trace!("Progress forwarder finished");
			}
			.in_current_span(),
		);

		(Self { events_tx }, forwarder)
	}

	fn emit(&self, event: ProgressEvent) {
		if self.events_tx.try_send(event).is_err() {
			trace!("Batch already finished, discarding progress event");
		}
	}

	pub fn status(&self, line: impl Into<String>) {
		self.emit(ProgressEvent::StatusLine(line.into()));
	}

	pub fn progress(&self, completed: usize, total: usize) {
		self.emit(ProgressEvent::Progress { completed, total });
	}

	pub fn throughput(&self, bytes_per_second: f64) {
		self.emit(ProgressEvent::Throughput(bytes_per_second));
	}

	/// Stops accepting events, the forwarder still delivers what is already queued.
	pub fn close(&self) {
		self.events_tx.close();
	}
}

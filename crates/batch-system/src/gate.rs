use tokio::sync::watch;
use tracing::warn;

/// Open/closed signal the batch worker consults before starting each item.
///
/// The gate starts open. Closing it never interrupts an item already in flight, the worker
/// only waits here between items.
#[derive(Debug)]
pub struct PauseGate {
	open_tx: watch::Sender<bool>,
}

impl Default for PauseGate {
	fn default() -> Self {
		Self::new()
	}
}

impl PauseGate {
	#[must_use]
	pub fn new() -> Self {
		let (open_tx, _open_rx) = watch::channel(true);

		Self { open_tx }
	}

	/// Closes the gate, returning whether it was open before.
	pub fn pause(&self) -> bool {
		self.open_tx
			.send_if_modified(|open| std::mem::replace(open, false))
	}

	/// Opens the gate, returning whether it was closed before.
	pub fn resume(&self) -> bool {
		self.open_tx
			.send_if_modified(|open| !std::mem::replace(open, true))
	}

	#[must_use]
	pub fn is_open(&self) -> bool {
		*self.open_tx.borrow()
	}

	/// Waits until the gate is open, returning immediately if it already is.
	pub async fn wait_until_open(&self) {
		let mut open_rx = self.open_tx.subscribe();

		if open_rx.wait_for(|open| *open).await.is_err() {
			// We own the sender, so this can't really happen
			warn!("Pause gate sender dropped while waiting for it to open");
		}
	}
}

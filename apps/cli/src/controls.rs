//! Keyboard and signal controls for a running batch
//!
//! Commands are read line by line from stdin: `p` pauses, `r` resumes, `c` asks to cancel and
//! waits for a `y` confirmation, `s` shows where the batch is. Ctrl-C cancels without asking,
//! a second Ctrl-C gives up waiting for the in-flight item.

use anyhow::{bail, Result};
use async_channel as chan;
use cvt_batch_system::{BatchController, BatchHandle, BatchReport, BatchStatus};
use std::{io, thread};
use tokio::signal;
use tracing::{debug, warn};

use crate::ui::ProgressBarSink;

pub const HELP: &str = "Keys: [p]ause, [r]esume, [c]ancel, [s]tatus, then Enter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
	Pause,
	Resume,
	Cancel,
	Status,
	Help,
	Yes,
	Other,
}

impl Key {
	fn parse(line: &str) -> Self {
		match line.trim().to_ascii_lowercase().as_str() {
			"p" | "pause" => Self::Pause,
			"r" | "resume" => Self::Resume,
			"c" | "cancel" => Self::Cancel,
			"s" | "status" => Self::Status,
			"h" | "?" | "help" => Self::Help,
			"y" | "yes" => Self::Yes,
			_ => Self::Other,
		}
	}
}

/// Turns typed lines into controller calls, holding the cancel confirmation in between.
#[derive(Debug, Default)]
pub struct Controls {
	confirming_cancel: bool,
}

impl Controls {
	/// Applies one input line, returning a message for the user when the controller itself
	/// has nothing to say.
	pub fn handle(&mut self, controller: &BatchController, line: &str) -> Option<String> {
		let key = Key::parse(line);

		if std::mem::take(&mut self.confirming_cancel) {
			if key == Key::Yes {
				return controller
					.cancel()
					.is_none()
					.then(|| "Nothing left to cancel".to_string());
			}

			return Some("Cancel aborted".to_string());
		}

		match key {
			Key::Pause => (!controller.pause()).then(|| "Nothing to pause".to_string()),
			Key::Resume => (!controller.resume()).then(|| "Batch is not paused".to_string()),
			Key::Cancel => match controller.status() {
				BatchStatus::Running | BatchStatus::Paused => {
					self.confirming_cancel = true;
					Some(format!(
						"Cancel the batch? {} pending items will be abandoned [y/N]",
						controller.pending()
					))
				}
				BatchStatus::Cancelling => Some("Already cancelling".to_string()),
				BatchStatus::Idle => Some("No batch running".to_string()),
			},
			Key::Status => Some(format!(
				"{:?}, {} items pending",
				controller.status(),
				controller.pending()
			)),
			Key::Help | Key::Yes | Key::Other => Some(HELP.to_string()),
		}
	}
}

// A plain thread, tokio's stdin would keep the runtime from shutting down while it waits for
// a line that never comes.
fn spawn_stdin_reader() -> Result<chan::Receiver<String>> {
	let (lines_tx, lines_rx) = chan::unbounded();

	thread::Builder::new()
		.name("stdin-controls".to_string())
		.spawn(move || {
			for line in io::stdin().lines() {
				let Ok(line) = line else {
					break;
				};

				if lines_tx.send_blocking(line).is_err() {
					break;
				}
			}
		})?;

	Ok(lines_rx)
}

/// Waits for the batch to end while applying stdin commands (when `interactive`) and Ctrl-C.
pub async fn drive(
	controller: &BatchController,
	mut handle: BatchHandle,
	sink: &ProgressBarSink,
	interactive: bool,
) -> Result<BatchReport> {
	let lines_rx = if interactive {
		sink.note(HELP);
		Some(spawn_stdin_reader()?)
	} else {
		None
	};

	let mut controls = Controls::default();

	loop {
		tokio::select! {
			res = &mut handle => return Ok(res?),

			res = signal::ctrl_c() => {
				res?;

				if controller.cancel().is_none() {
					bail!("Interrupted while waiting for the in-flight item");
				}
				warn!("Batch cancelled by Ctrl-C");
			}

			Some(line) = next_line(lines_rx.as_ref()) => {
				debug!(%line, "Control input");
				if let Some(message) = controls.handle(controller, &line) {
					sink.note(&message);
				}
			}
		}
	}
}

async fn next_line(lines_rx: Option<&chan::Receiver<String>>) -> Option<String> {
	match lines_rx {
		Some(lines_rx) => lines_rx.recv().await.ok(),
		None => std::future::pending().await,
	}
}

//! Progress bar for a running batch

use cvt_batch_system::ProgressSink;
use cvt_utils::units::format_rate;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TEMPLATE: &str =
	"{spinner:.yellow} [{bar:40.blue/grey}] {pos}/{len} {msg} ({elapsed_precise})";

/// A [`ProgressSink`] drawing one bar for the whole batch, with status lines printed above it
#[derive(Clone)]
pub struct ProgressBarSink {
	bar: ProgressBar,
}

impl ProgressBarSink {
	pub fn new() -> Self {
		let bar = ProgressBar::new(0);
		bar.set_style(
			ProgressStyle::with_template(TEMPLATE)
				.unwrap_or_else(|_| ProgressStyle::default_bar())
				.progress_chars("█▉▊▋▌▍▎▏ ")
				.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
		);
		bar.enable_steady_tick(Duration::from_millis(120));

		Self { bar }
	}

	#[cfg(test)]
	fn hidden() -> Self {
		Self {
			bar: ProgressBar::hidden(),
		}
	}

	/// Print a line above the bar, or straight to stderr when the bar is not drawn
	pub fn note(&self, line: &str) {
		if self.bar.is_hidden() {
			eprintln!("{line}");
		} else {
			self.bar.println(line);
		}
	}

	/// Stop the spinner and leave the bar in its final state
	pub fn finish(&self) {
		self.bar.finish();
	}
}

impl Default for ProgressBarSink {
	fn default() -> Self {
		Self::new()
	}
}

impl ProgressSink for ProgressBarSink {
	fn on_status_line(&self, line: &str) {
		self.note(line);
	}

	fn on_progress(&self, completed: usize, total: usize) {
		self.bar.set_length(total as u64);
		self.bar.set_position(completed as u64);
	}

	fn on_throughput(&self, bytes_per_second: f64) {
		self.bar.set_message(format_rate(bytes_per_second));
	}
}

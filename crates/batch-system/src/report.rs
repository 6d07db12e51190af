use std::time::Duration;

use cvt_utils::units::{format_bytes, format_rate, throughput};

use super::{controller::BatchId, item::WorkItem};

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
	/// The queue ran dry.
	Completed,
	/// The batch was cancelled, pending items were abandoned.
	Cancelled,
}

/// An item whose transform failed, with the failure description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
	pub item: WorkItem,
	pub error: String,
}

/// Final tally of a batch, delivered once through the completion callback and the
/// [`BatchHandle`](crate::BatchHandle).
///
/// Succeeded and failed items are kept apart; whether a partial batch counts as a success is
/// up to the caller.
#[derive(Debug, Clone)]
pub struct BatchReport {
	pub batch_id: BatchId,
	pub outcome: BatchOutcome,
	pub converted: usize,
	/// Failures in processing order.
	pub failed: Vec<FailedItem>,
	/// Items drained from the queue by a cancel, never handed to the transform.
	pub abandoned: usize,
	/// Sum of the input sizes of converted items.
	pub total_bytes: u64,
	/// Sum of the output sizes reported by the transform.
	pub output_bytes: u64,
	/// Wall time of the batch minus the time it spent paused.
	pub elapsed: Duration,
}

impl BatchReport {
	pub(crate) const fn empty(batch_id: BatchId) -> Self {
		Self {
			batch_id,
			outcome: BatchOutcome::Completed,
			converted: 0,
			failed: Vec::new(),
			abandoned: 0,
			total_bytes: 0,
			output_bytes: 0,
			elapsed: Duration::ZERO,
		}
	}

	/// Items that reached the transform, successfully or not.
	#[must_use]
	pub fn processed(&self) -> usize {
		self.converted + self.failed.len()
	}

	/// Completed without any failed item.
	#[must_use]
	pub fn is_clean(&self) -> bool {
		self.outcome == BatchOutcome::Completed && self.failed.is_empty()
	}

	#[must_use]
	pub fn elapsed_secs(&self) -> f64 {
		self.elapsed.as_secs_f64()
	}

	/// Average input bytes per second, `None` if no measurable time went by.
	#[must_use]
	pub fn throughput(&self) -> Option<f64> {
		throughput(self.total_bytes, self.elapsed)
	}

	#[must_use]
	pub fn summary_line(&self) -> String {
		let head = match self.outcome {
			BatchOutcome::Completed => "Finished",
			BatchOutcome::Cancelled => "Cancelled",
		};

		let mut line = format!(
			"{head}: {} converted, {} failed",
			self.converted,
			self.failed.len()
		);

		if self.abandoned > 0 {
			line.push_str(&format!(", {} abandoned", self.abandoned));
		}

		line.push_str(&format!(
			"; {} in {:.2}s",
			format_bytes(self.total_bytes),
			self.elapsed_secs()
		));

		if let Some(rate) = self.throughput() {
			line.push_str(&format!(" ({})", format_rate(rate)));
		}

		line
	}
}

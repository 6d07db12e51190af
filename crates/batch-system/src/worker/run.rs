use std::{sync::Arc, time::Duration};

use cvt_utils::units::{format_bytes, format_rate, throughput};
use tokio::{spawn, task::yield_now, time::timeout};
use tracing::{debug, error, trace, warn, Instrument};

use super::super::{
	config::ControllerConfig,
	item::{ItemTransform, OutputContext, TransformOutput, WorkItem},
	report::{BatchOutcome, BatchReport, FailedItem},
	state::BatchState,
};

#[derive(Debug, Default)]
struct Tally {
	converted: usize,
	failed: Vec<FailedItem>,
	total_bytes: u64,
	output_bytes: u64,
}

pub(super) async fn run<T: ItemTransform>(
	state: Arc<BatchState>,
	transform: Arc<T>,
	ctx: Arc<OutputContext>,
	config: ControllerConfig,
) -> BatchReport {
	let item_timeout = config.item_timeout();

	let mut tally = Tally::default();
	let mut completed = 0;

	loop {
		if state.has_cancelled() {
			debug!("Batch cancelled, leaving worker loop");
			break;
		}

		state.gate.wait_until_open().await;

		// Cancel reopens the gate to wake us up
		if state.has_cancelled() {
			debug!("Batch cancelled while paused, leaving worker loop");
			break;
		}

		let Some(item) = state.queue.dequeue() else {
			debug!("Queue is empty, batch complete");
			break;
		};

		trace!(?item, "Processing item");

		match run_transform(&transform, &item, &ctx, item_timeout).await {
			Ok(TransformOutput { bytes }) => {
				tally.converted += 1;
				tally.total_bytes += item.size();
				tally.output_bytes += bytes;

				let mut line = format!("Converted {} ({})", item.display_name(), format_bytes(bytes));
				if let Some(rate) = throughput(tally.total_bytes, state.net_elapsed()) {
					line.push_str(&format!(" at {}", format_rate(rate)));
					state.emitter.throughput(rate);
				}
				state.emitter.status(line);
			}

			Err(description) => {
				warn!(?item, %description, "Item transform failed;");
				state
					.emitter
					.status(format!("Failed {}: {description}", item.display_name()));
				tally.failed.push(FailedItem {
					item,
					error: description,
				});
			}
		}

		completed += 1;
		state.emitter.progress(completed, state.total);

		if config.is_maintenance_due(completed) {
			trace!(%completed, "Running transform maintenance");
			transform.maintenance().await;
			yield_now().await;
		}
	}

	let report = BatchReport {
		batch_id: state.id,
		outcome: if state.has_cancelled() {
			BatchOutcome::Cancelled
		} else {
			BatchOutcome::Completed
		},
		converted: tally.converted,
		failed: tally.failed,
		abandoned: state.abandoned(),
		total_bytes: tally.total_bytes,
		output_bytes: tally.output_bytes,
		elapsed: state.net_elapsed(),
	};

	state.emitter.status(report.summary_line());

	report
}

/// Runs one transform call on its own task, turning errors, panics and timeouts into a
/// failure description.
async fn run_transform<T: ItemTransform>(
	transform: &Arc<T>,
	item: &WorkItem,
	ctx: &Arc<OutputContext>,
	item_timeout: Option<Duration>,
) -> Result<TransformOutput, String> {
	let mut handle = spawn(
		{
			let transform = Arc::clone(transform);
			let item = item.clone();
			let ctx = Arc::clone(ctx);

			async move { transform.transform(&item, &ctx).await }
		}
		.in_current_span(),
	);

	let joined = if let Some(limit) = item_timeout {
		if let Ok(joined) = timeout(limit, &mut handle).await {
			joined
		} else {
			handle.abort();
			return Err(format!("timed out after {limit:?}"));
		}
	} else {
		handle.await
	};

	match joined {
		Ok(res) => res.map_err(|e| e.to_string()),
		Err(e) if e.is_panic() => {
			error!(?item, "Item transform panicked;");
			Err("transform panicked".to_string())
		}
		Err(e) => Err(format!("transform task failed: {e}")),
	}
}

use std::sync::Arc;

use tokio::{spawn, sync::oneshot, task::JoinHandle};
use tracing::{error, info, info_span, trace, Instrument};

use super::{
	controller::Inner,
	error::SystemError,
	item::{ItemTransform, OutputContext},
	report::BatchReport,
	state::BatchState,
};

mod run;

use run::run;

/// Launches the worker loop for one batch on a background task.
///
/// The loop itself runs on an inner task so a panic there still gets the controller back to
/// idle and the handle resolved, with [`SystemError::WorkerGone`].
pub(crate) fn launch<T: ItemTransform>(
	controller: Arc<Inner>,
	state: Arc<BatchState>,
	transform: T,
	ctx: OutputContext,
	forwarder: JoinHandle<()>,
	done_tx: oneshot::Sender<Result<BatchReport, SystemError>>,
) {
	let batch_id = state.id;
	let config = controller.config.clone();

	spawn(
		async move {
			trace!("Batch worker starting...");

			let res = match spawn(
				run(
					Arc::clone(&state),
					Arc::new(transform),
					Arc::new(ctx),
					config,
				)
				.in_current_span(),
			)
			.await
			{
				Ok(report) => Ok(report),
				Err(e) => {
					if e.is_panic() {
						error!(?e, "Batch worker critically failed;");
					} else {
						error!(?e, "Batch worker was aborted;");
					}

					Err(SystemError::WorkerGone(batch_id))
				}
			};

			controller.finish(batch_id);

			// Flush every pending status line before anyone hears about the completion
			state.emitter.close();
			drop(state);
			if let Err(e) = forwarder.await {
				error!(?e, "Progress forwarder failed;");
			}

			if let Ok(report) = &res {
				info!(
					converted = report.converted,
					failed = report.failed.len(),
					abandoned = report.abandoned,
					"Batch finished"
				);
				controller.notify_completion(report);
			}

			if done_tx.send(res).is_err() {
				trace!("Batch handle dropped before completion");
			}
		}
		.instrument(info_span!("batch_worker", %batch_id)),
	);
}

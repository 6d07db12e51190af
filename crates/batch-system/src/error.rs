use thiserror::Error;

use super::controller::BatchId;

/// Bound every [`ItemTransform`](crate::ItemTransform) error must satisfy, so failures can be
/// carried across the worker task boundary and rendered into the final report.
pub trait TransformError: std::error::Error + Send + Sync + 'static {}

impl<T: std::error::Error + Send + Sync + 'static> TransformError for T {}

#[derive(Debug, Error)]
pub enum SystemError {
	#[error("a batch is already running <batch_id='{0}'>")]
	AlreadyRunning(BatchId),
	#[error("batch worker stopped without reporting <batch_id='{0}'>")]
	WorkerGone(BatchId),
}

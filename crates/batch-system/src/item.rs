use std::{
	borrow::Cow,
	future::Future,
	path::{Path, PathBuf},
};

use async_trait::async_trait;

use super::error::TransformError;

/// One unit of work in a batch: the file to process, its size, and where its output belongs
/// relative to the batch output root.
///
/// Items are immutable once enqueued and consumed exactly once by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
	input: PathBuf,
	relative_dir: PathBuf,
	size: u64,
}

impl WorkItem {
	/// A new item whose output goes straight into the output root.
	pub fn new(input: impl Into<PathBuf>, size: u64) -> Self {
		Self {
			input: input.into(),
			relative_dir: PathBuf::new(),
			size,
		}
	}

	/// Places the output of this item in `relative_dir` below the output root, used to mirror
	/// a scanned directory tree.
	#[must_use]
	pub fn with_relative_dir(mut self, relative_dir: impl Into<PathBuf>) -> Self {
		self.relative_dir = relative_dir.into();
		self
	}

	#[must_use]
	pub fn input(&self) -> &Path {
		&self.input
	}

	#[must_use]
	pub fn relative_dir(&self) -> &Path {
		&self.relative_dir
	}

	/// Size in bytes of the input, counted into the batch byte total when the item succeeds.
	#[must_use]
	pub const fn size(&self) -> u64 {
		self.size
	}

	/// Short name used in status lines.
	#[must_use]
	pub fn display_name(&self) -> Cow<'_, str> {
		self.input.file_name().map_or_else(
			|| self.input.to_string_lossy(),
			|name| name.to_string_lossy(),
		)
	}
}

/// Destination context shared by every item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputContext {
	root: PathBuf,
}

impl OutputContext {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Directory where the output of `item` should be written.
	#[must_use]
	pub fn destination_for(&self, item: &WorkItem) -> PathBuf {
		self.root.join(&item.relative_dir)
	}
}

/// What a successful transform hands back to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformOutput {
	/// Size in bytes of the produced artifact.
	pub bytes: u64,
}

impl TransformOutput {
	#[must_use]
	pub const fn new(bytes: u64) -> Self {
		Self { bytes }
	}
}

/// The pluggable operation that turns one [`WorkItem`] into an output artifact.
///
/// The batch worker calls [`ItemTransform::transform`] once per item, strictly one item at a
/// time. Each call runs on its own spawned task, so a panic inside an implementation is
/// recorded as a failed item instead of taking the batch down.
///
/// We're using the [`async_trait`](https://docs.rs/async-trait) crate so implementations can
/// be moved into the worker task and shared with each per-item task.
#[async_trait]
pub trait ItemTransform: Send + Sync + 'static {
	type Error: TransformError;

	async fn transform(
		&self,
		item: &WorkItem,
		ctx: &OutputContext,
	) -> Result<TransformOutput, Self::Error>;

	/// Called every [`maintenance_interval`](crate::ControllerConfig::maintenance_interval)
	/// finished items, a chance to release caches or other resources built up over a long
	/// batch. It has no effect on results.
	async fn maintenance(&self) {}
}

/// An [`ItemTransform`] built from an async closure, see [`from_fn`].
#[derive(Debug, Clone)]
pub struct FnTransform<F>(F);

/// Builds an [`ItemTransform`] from an async closure receiving owned copies of the item and
/// the output context.
pub const fn from_fn<F, Fut, E>(f: F) -> FnTransform<F>
where
	F: Fn(WorkItem, OutputContext) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<TransformOutput, E>> + Send,
	E: TransformError,
{
	FnTransform(f)
}

#[async_trait]
impl<F, Fut, E> ItemTransform for FnTransform<F>
where
	F: Fn(WorkItem, OutputContext) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<TransformOutput, E>> + Send,
	E: TransformError,
{
	type Error = E;

	async fn transform(&self, item: &WorkItem, ctx: &OutputContext) -> Result<TransformOutput, E> {
		(self.0)(item.clone(), ctx.clone()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn destination_mirrors_relative_dir() {
		let ctx = OutputContext::new("/out");

		let flat = WorkItem::new("/in/a.dwg", 1);
		assert_eq!(ctx.destination_for(&flat), PathBuf::from("/out"));

		let nested = WorkItem::new("/in/sub/b.dxf", 1).with_relative_dir("sub");
		assert_eq!(ctx.destination_for(&nested), PathBuf::from("/out/sub"));
	}

	#[test]
	fn display_name_is_file_name() {
		assert_eq!(WorkItem::new("/in/sub/b.dxf", 1).display_name(), "b.dxf");
		assert_eq!(WorkItem::new("/", 1).display_name(), "/");
	}
}

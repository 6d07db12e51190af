//!
//! # Batch System
//!
//! A single worker batch pipeline: hand it an ordered list of files and an [`ItemTransform`],
//! and it processes them one at a time on a background task while the caller keeps control:
//! - Pause and resume between items, the in-flight item always runs to completion;
//! - Cooperative cancel that abandons every item not yet started;
//! - Ordered status lines and progress counts through a [`ProgressSink`];
//! - A final [`BatchReport`] keeping converted and failed items apart, with byte totals and
//!   elapsed time net of pauses;
//! - A failing or even panicking transform only fails its own item, never the batch.
//!
//!
//! ## Basic example
//!
//! ```
//! use cvt_batch_system::{from_fn, BatchController, OutputContext, TransformOutput, WorkItem};
//! use std::convert::Infallible;
//!
//! #[tokio::main]
//! async fn main() {
//!     let controller = BatchController::new();
//!
//!     let items = vec![WorkItem::new("a.dwg", 10), WorkItem::new("b.dwg", 20)];
//!
//!     let handle = controller
//!         .start(
//!             items,
//!             from_fn(|item: WorkItem, _ctx: OutputContext| async move {
//!                 Ok::<_, Infallible>(TransformOutput::new(item.size()))
//!             }),
//!             OutputContext::new("converted"),
//!         )
//!         .unwrap();
//!
//!     let report = handle.await.unwrap();
//!
//!     assert_eq!(report.converted, 2);
//!     assert_eq!(report.total_bytes, 30);
//!     assert!(report.is_clean());
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod config;
mod controller;
mod error;
mod gate;
mod item;
mod progress;
mod queue;
mod report;
mod state;
mod worker;

pub use config::ControllerConfig;
pub use controller::{
	BatchController, BatchControllerBuilder, BatchHandle, BatchId, BatchStatus,
	CompletionCallback,
};
pub use error::{SystemError as BatchSystemError, TransformError};
pub use gate::PauseGate;
pub use item::{from_fn, FnTransform, ItemTransform, OutputContext, TransformOutput, WorkItem};
pub use progress::{ChannelSink, NoopSink, ProgressEvent, ProgressSink};
pub use queue::JobQueue;
pub use report::{BatchOutcome, BatchReport, FailedItem};

//! Concrete pieces around the batch system for CAD conversion: the output format catalog, a
//! directory scan that builds [`WorkItem`](cvt_batch_system::WorkItem) lists, and an
//! [`ItemTransform`](cvt_batch_system::ItemTransform) that drives an external converter
//! executable.

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

pub mod error;
pub mod external;
pub mod format;
pub mod scan;

pub use error::{ConvertError, ScanError};
pub use external::ExternalConverter;
pub use format::{AcadVersion, SourceFormat, TargetFormat, SUPPORTED_EXTENSIONS};
pub use scan::collect_work_items;

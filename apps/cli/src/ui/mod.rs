//! Terminal presentation for batches

pub mod progress;

pub use progress::ProgressBarSink;

use std::path::PathBuf;

use cvt_utils::error::FileIOError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
	#[error("unsupported input format: <path='{}'>", .0.display())]
	UnsupportedInput(PathBuf),
	#[error("converter exited with {status}: {stderr}")]
	ConverterFailed { status: String, stderr: String },
	#[error("converter produced no output: <path='{}'>", .0.display())]
	MissingOutput(PathBuf),
	#[error("converter produced an empty output: <path='{}'>", .0.display())]
	EmptyOutput(PathBuf),

	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

#[derive(Debug, Error)]
pub enum ScanError {
	#[error("nothing to scan at <path='{}'>", .0.display())]
	NotFound(PathBuf),

	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

use std::{fmt::Display, path::Path};

use thiserror::Error;

/// File I/O error that includes the path that caused the error
#[derive(Error, Debug)]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: std::io::Error,
	pub maybe_context: Option<String>,
}

impl Display for FileIOError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"file I/O error{}: {}; path: '{}'",
			self.maybe_context
				.as_ref()
				.map(|ctx| format!(" ({ctx})"))
				.unwrap_or_default(),
			self.source,
			self.path.display()
		)
	}
}

impl FileIOError {
	pub fn from_std_io_err(path: impl AsRef<Path>, source: std::io::Error) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: None,
		}
	}

	pub fn from_std_io_err_with_msg(
		path: impl AsRef<Path>,
		source: std::io::Error,
		msg: impl Into<String>,
	) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: Some(msg.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_includes_context_and_path() {
		let err = FileIOError::from_std_io_err_with_msg(
			"/tmp/drawing.dwg",
			std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
			"reading input",
		);

		let text = err.to_string();
		assert!(text.contains("(reading input)"));
		assert!(text.contains("'/tmp/drawing.dwg'"));
		assert!(text.contains("gone"));
	}

	#[test]
	fn display_without_context() {
		let err = FileIOError::from_std_io_err(
			"out",
			std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
		);

		assert_eq!(err.to_string(), "file I/O error: denied; path: 'out'");
	}
}

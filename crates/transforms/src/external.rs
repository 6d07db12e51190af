use std::{
	io,
	path::{Path, PathBuf},
	process::Stdio,
};

use async_trait::async_trait;
use cvt_batch_system::{ItemTransform, OutputContext, TransformOutput, WorkItem};
use cvt_utils::error::FileIOError;
use tokio::{fs, process::Command};
use tracing::{debug, instrument, warn};

use super::{
	error::ConvertError,
	format::{SourceFormat, TargetFormat},
};

/// Converts drawings by running an external converter executable once per item.
///
/// The executable is called with positional arguments:
/// `<input dir> <output dir> <output format> <input format> <audit 0|1> <recursive 0> <file name>`,
/// and is expected to write `<output dir>/<file stem>.<dwg|dxf>`.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
	executable: PathBuf,
	target: TargetFormat,
	audit: bool,
}

impl ExternalConverter {
	/// `executable` is taken as given, it is never searched for.
	pub fn new(executable: impl Into<PathBuf>, target: TargetFormat) -> Self {
		Self {
			executable: executable.into(),
			target,
			audit: true,
		}
	}

	/// Whether the converter should audit (and repair) drawings while converting, on by default.
	#[must_use]
	pub const fn with_audit(mut self, audit: bool) -> Self {
		self.audit = audit;
		self
	}

	#[must_use]
	pub fn executable(&self) -> &Path {
		&self.executable
	}

	#[must_use]
	pub const fn target(&self) -> TargetFormat {
		self.target
	}

	/// Where the converter will write the output for `input` inside `output_dir`.
	#[must_use]
	pub fn expected_output(&self, input: &Path, output_dir: &Path) -> PathBuf {
		// Only the last extension goes, `plan.v2.dwg` becomes `plan.v2.dxf`
		let mut file_name = input
			.file_stem()
			.unwrap_or(input.as_os_str())
			.to_os_string();
		file_name.push(".");
		file_name.push(self.target.extension());

		output_dir.join(file_name)
	}

	/// `input` and `output_dir` must be absolute, the converter gets directories only.
	fn command(&self, input: &Path, source: SourceFormat, output_dir: &Path) -> Command {
		let mut command = Command::new(&self.executable);

		command
			.arg(input.parent().unwrap_or(input))
			.arg(output_dir)
			.arg(self.target.code())
			.arg(source.as_arg())
			.arg(if self.audit { "1" } else { "0" })
			// One file per call, never recurse
			.arg("0")
			.arg(input.file_name().unwrap_or(input.as_os_str()))
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		command
	}

	async fn verify_output(path: &Path) -> Result<u64, ConvertError> {
		let metadata = match fs::metadata(path).await {
			Ok(metadata) => metadata,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				return Err(ConvertError::MissingOutput(path.to_path_buf()));
			}
			Err(e) => {
				return Err(FileIOError::from_std_io_err_with_msg(
					path,
					e,
					"reading converter output metadata",
				)
				.into());
			}
		};

		if metadata.len() == 0 {
			if let Err(e) = fs::remove_file(path).await {
				warn!(path = %path.display(), ?e, "Failed to remove empty converter output;");
			}

			return Err(ConvertError::EmptyOutput(path.to_path_buf()));
		}

		Ok(metadata.len())
	}
}

/// Resolves `path` against the working directory without touching the file system, so
/// bare names like `plan.dwg` still hand the converter a real directory.
fn absolute(path: &Path) -> Result<PathBuf, FileIOError> {
	std::path::absolute(path)
		.map_err(|e| FileIOError::from_std_io_err_with_msg(path, e, "resolving absolute path"))
}

#[async_trait]
impl ItemTransform for ExternalConverter {
	type Error = ConvertError;

	#[instrument(skip_all, fields(input = %item.input().display(), target = %self.target), err)]
	async fn transform(
		&self,
		item: &WorkItem,
		ctx: &OutputContext,
	) -> Result<TransformOutput, ConvertError> {
		let source = SourceFormat::from_path(item.input())
			.ok_or_else(|| ConvertError::UnsupportedInput(item.input().to_path_buf()))?;

		let input = absolute(item.input())?;
		fs::metadata(&input).await.map_err(|e| {
			FileIOError::from_std_io_err_with_msg(&input, e, "reading input metadata")
		})?;

		let output_dir = absolute(&ctx.destination_for(item))?;
		fs::create_dir_all(&output_dir).await.map_err(|e| {
			FileIOError::from_std_io_err_with_msg(&output_dir, e, "creating output directory")
		})?;

		debug!(executable = %self.executable.display(), "Running converter");

		let output = self
			.command(&input, source, &output_dir)
			.output()
			.await
			.map_err(|e| {
				FileIOError::from_std_io_err_with_msg(
					&self.executable,
					e,
					"spawning converter executable",
				)
			})?;

		if !output.status.success() {
			return Err(ConvertError::ConverterFailed {
				status: output.status.to_string(),
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}

		let bytes = Self::verify_output(&self.expected_output(&input, &output_dir)).await?;

		Ok(TransformOutput::new(bytes))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::format::AcadVersion;

	#[test]
	fn expected_output_swaps_only_the_last_extension() {
		let dxf = ExternalConverter::new("converter", TargetFormat::Dxf(AcadVersion::V2018));
		assert_eq!(
			dxf.expected_output(Path::new("/in/plan.v2.dwg"), Path::new("/out")),
			PathBuf::from("/out/plan.v2.dxf")
		);

		let dwg = ExternalConverter::new("converter", TargetFormat::default());
		assert_eq!(
			dwg.expected_output(Path::new("site.DXF"), Path::new("/out/sub")),
			PathBuf::from("/out/sub/site.dwg")
		);
	}
}

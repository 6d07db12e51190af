use std::{io, path::Path};

use cvt_batch_system::WorkItem;
use cvt_utils::error::FileIOError;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::error::ScanError;

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
	path.extension()
		.and_then(|extension| extension.to_str())
		.is_some_and(|extension| {
			extensions
				.iter()
				.any(|wanted| extension.eq_ignore_ascii_case(wanted))
		})
}

/// Builds the ordered item list for a batch.
///
/// A single file is taken as is, the user picked it explicitly. A directory is walked
/// recursively in file name order, keeping only files with one of `extensions`; each item
/// remembers its directory relative to `input` so outputs can mirror the input tree.
/// Entries that can't be read are logged and skipped.
pub fn collect_work_items(input: &Path, extensions: &[&str]) -> Result<Vec<WorkItem>, ScanError> {
	let metadata = std::fs::metadata(input).map_err(|e| {
		if e.kind() == io::ErrorKind::NotFound {
			ScanError::NotFound(input.to_path_buf())
		} else {
			FileIOError::from_std_io_err_with_msg(input, e, "reading scan root metadata").into()
		}
	})?;

	if metadata.is_file() {
		trace!(path = %input.display(), "Scan root is a single file");
		return Ok(vec![WorkItem::new(input, metadata.len())]);
	}

	let mut items = Vec::new();

	for entry in WalkDir::new(input).sort_by_file_name() {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				warn!(?e, "Skipping unreadable entry while scanning;");
				continue;
			}
		};

		if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
			continue;
		}

		let size = match entry.metadata() {
			Ok(metadata) => metadata.len(),
			Err(e) => {
				warn!(path = %entry.path().display(), ?e, "Skipping file without metadata;");
				continue;
			}
		};

		let relative_dir = entry
			.path()
			.parent()
			.and_then(|parent| parent.strip_prefix(input).ok())
			.unwrap_or_else(|| Path::new(""));

		items.push(WorkItem::new(entry.path(), size).with_relative_dir(relative_dir));
	}

	debug!(root = %input.display(), found = items.len(), "Scanned for work items");

	Ok(items)
}

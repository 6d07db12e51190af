#![allow(dead_code)]

use std::{
	fs,
	os::unix::fs::PermissionsExt,
	path::{Path, PathBuf},
	sync::OnceLock,
};

use cvt_batch_system::WorkItem;
use tempfile::{tempdir, TempDir};

// Writes its arguments into the output so tests can check the command line. Input file names
// starting with `fail`, `empty` or `missing` trigger the matching misbehavior, `where` makes it
// write its input and output directories instead.
const FAKE_CONVERTER: &str = r#"#!/bin/sh
name="$7"
stem="${name%.*}"
case "$3" in
	ACAD*) ext=dwg ;;
	DXF*) ext=dxf ;;
esac
case "$name" in
	fail*) echo "bad drawing $name" >&2; exit 3 ;;
	empty*) : > "$2/$stem.$ext"; exit 0 ;;
	missing*) exit 0 ;;
	where*) printf '%s\n%s' "$1" "$2" > "$2/$stem.$ext"; exit 0 ;;
esac
printf '%s %s %s %s %s' "$3" "$4" "$5" "$6" "$name" > "$2/$stem.$ext"
"#;

// Written once and closed before any test spawns it, so no child inherits a write handle.
pub fn fake_converter() -> &'static Path {
	static SCRIPT: OnceLock<(TempDir, PathBuf)> = OnceLock::new();

	let (_, path) = SCRIPT.get_or_init(|| {
		let dir = tempdir().expect("script dir");
		let path = dir.path().join("fake-converter.sh");
		fs::write(&path, FAKE_CONVERTER).expect("write script");
		fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
		(dir, path)
	});

	path
}

pub fn drawing(dir: &Path, name: &str) -> WorkItem {
	let path = dir.join(name);
	fs::write(&path, b"AC1018 drawing bytes").expect("write drawing");

	WorkItem::new(&path, 20)
}

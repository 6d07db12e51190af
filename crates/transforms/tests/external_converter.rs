#![cfg(unix)]

use std::fs;

use cvt_batch_system::{BatchController, ItemTransform, OutputContext, WorkItem};
use cvt_transforms::{
	collect_work_items, AcadVersion, ConvertError, ExternalConverter, TargetFormat,
	SUPPORTED_EXTENSIONS,
};
use tempfile::tempdir;
use tracing_test::traced_test;

mod common;

use common::{drawing, fake_converter};

#[tokio::test]
#[traced_test]
async fn converts_and_reports_the_output_size() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "plan.dwg");

	let converter = ExternalConverter::new(fake_converter(), TargetFormat::default());
	let result = converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap();

	let written = fs::read_to_string(output.path().join("plan.dwg")).unwrap();
	assert_eq!(written, "ACAD2007 DWG 1 0 plan.dwg");
	assert_eq!(result.bytes, written.len() as u64);
}

#[tokio::test]
async fn passes_target_format_and_audit_flag() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "site.DXF").with_relative_dir("nested/deeper");

	let converter =
		ExternalConverter::new(fake_converter(), TargetFormat::Dxf(AcadVersion::R14))
			.with_audit(false);
	converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap();

	let written = fs::read_to_string(output.path().join("nested/deeper/site.dxf")).unwrap();
	assert_eq!(written, "DXF14 DXF 0 0 site.DXF");
}

#[tokio::test]
async fn dotted_file_names_keep_everything_but_the_last_extension() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "plan.v2.dwg");

	let converter =
		ExternalConverter::new(fake_converter(), TargetFormat::Dxf(AcadVersion::V2013));
	let result = converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap();

	let written = fs::read_to_string(output.path().join("plan.v2.dxf")).unwrap();
	assert_eq!(written, "DXF2013 DWG 1 0 plan.v2.dwg");
	assert_eq!(result.bytes, written.len() as u64);
}

#[tokio::test]
async fn non_zero_exit_carries_stderr() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "fail-broken.dwg");

	let converter = ExternalConverter::new(fake_converter(), TargetFormat::default());
	let err = converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap_err();

	match err {
		ConvertError::ConverterFailed { stderr, .. } => {
			assert_eq!(stderr, "bad drawing fail-broken.dwg");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[tokio::test]
async fn empty_output_is_removed() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "empty.dwg");

	let converter = ExternalConverter::new(fake_converter(), TargetFormat::default());
	let err = converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap_err();

	assert!(matches!(err, ConvertError::EmptyOutput(_)));
	assert!(!output.path().join("empty.dwg").exists());
}

#[tokio::test]
async fn silent_converter_without_output_fails_the_item() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "missing.dxf");

	let converter = ExternalConverter::new(fake_converter(), TargetFormat::default());
	let err = converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap_err();

	assert!(matches!(err, ConvertError::MissingOutput(path) if path.ends_with("missing.dwg")));
}

#[tokio::test]
async fn rejects_inputs_before_spawning_anything() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let converter = ExternalConverter::new(fake_converter(), TargetFormat::default());
	let ctx = OutputContext::new(output.path());

	let step = drawing(input.path(), "part.step");
	assert!(matches!(
		converter.transform(&step, &ctx).await,
		Err(ConvertError::UnsupportedInput(_))
	));

	let gone = WorkItem::new(input.path().join("gone.dwg"), 0);
	assert!(matches!(
		converter.transform(&gone, &ctx).await,
		Err(ConvertError::FileIO(_))
	));

	assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_executable_is_an_item_failure() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	let item = drawing(input.path(), "plan.dwg");

	let converter = ExternalConverter::new(
		input.path().join("no-such-converter"),
		TargetFormat::default(),
	);
	let err = converter
		.transform(&item, &OutputContext::new(output.path()))
		.await
		.unwrap_err();

	assert!(matches!(err, ConvertError::FileIO(_)));
}

#[tokio::test]
#[traced_test]
async fn scanned_tree_converts_through_a_batch() {
	let input = tempdir().unwrap();
	let output = tempdir().unwrap();
	fs::create_dir_all(input.path().join("sub")).unwrap();

	fs::write(input.path().join("a.dwg"), vec![1_u8; 100]).unwrap();
	fs::write(input.path().join("fail-b.dxf"), vec![1_u8; 50]).unwrap();
	fs::write(input.path().join("notes.txt"), b"not a drawing").unwrap();
	fs::write(input.path().join("sub/c.DWG"), vec![1_u8; 300]).unwrap();

	let items = collect_work_items(input.path(), SUPPORTED_EXTENSIONS).unwrap();
	assert_eq!(items.len(), 3);

	let controller = BatchController::new();
	let report = controller
		.start(
			items,
			ExternalConverter::new(fake_converter(), TargetFormat::default()),
			OutputContext::new(output.path()),
		)
		.unwrap()
		.await
		.unwrap();

	assert_eq!(report.converted, 2);
	assert_eq!(report.failed.len(), 1);
	assert!(report.failed[0].item.input().ends_with("fail-b.dxf"));
	assert!(report.failed[0].error.contains("bad drawing"));
	assert_eq!(report.total_bytes, 400);

	assert!(output.path().join("a.dwg").is_file());
	assert!(output.path().join("sub/c.dwg").is_file());
	assert!(!output.path().join("fail-b.dwg").exists());
}

#![allow(dead_code)]

pub mod transforms;

use cvt_batch_system::{ProgressEvent, WorkItem};

use async_channel as chan;

/// One item per size, named `item1.dwg`, `item2.dwg`...
pub fn sized_items(sizes: &[u64]) -> Vec<WorkItem> {
	sizes
		.iter()
		.enumerate()
		.map(|(idx, size)| WorkItem::new(format!("/drawings/item{}.dwg", idx + 1), *size))
		.collect()
}

pub fn drain_events(events_rx: &chan::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
	std::iter::from_fn(|| events_rx.try_recv().ok()).collect()
}

pub fn progress_counts(events: &[ProgressEvent]) -> Vec<(usize, usize)> {
	events
		.iter()
		.filter_map(|event| match event {
			ProgressEvent::Progress { completed, total } => Some((*completed, *total)),
			_ => None,
		})
		.collect()
}

pub fn status_lines(events: &[ProgressEvent]) -> Vec<&str> {
	events
		.iter()
		.filter_map(|event| match event {
			ProgressEvent::StatusLine(line) => Some(line.as_str()),
			_ => None,
		})
		.collect()
}

use cvt_batch_system::{ItemTransform, OutputContext, TransformOutput, WorkItem};

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};

use async_channel as chan;
use async_trait::async_trait;
use thiserror::Error;
use tokio::time::sleep;
use tracing::info;

#[derive(Debug, Error)]
pub enum SampleError {
	#[error("{0}")]
	Rejected(String),
	#[error("permit channel closed")]
	PermitsClosed,
}

/// What the tests can observe about a transform after it was moved into a batch.
#[derive(Debug, Default)]
pub struct Probe {
	processed: Mutex<Vec<WorkItem>>,
	maintenance_calls: AtomicUsize,
}

impl Probe {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn processed(&self) -> Vec<WorkItem> {
		self.processed.lock().unwrap().clone()
	}

	pub fn maintenance_calls(&self) -> usize {
		self.maintenance_calls.load(Ordering::SeqCst)
	}

	fn record(&self, item: &WorkItem) {
		self.processed.lock().unwrap().push(item.clone());
	}
}

/// Reports the item size as output size, with per file name failures, panics and hangs.
#[derive(Debug)]
pub struct SampleTransform {
	probe: Arc<Probe>,
	delay: Option<Duration>,
	failures: HashMap<String, String>,
	panic_on: Option<String>,
	hang_on: Option<String>,
}

impl SampleTransform {
	pub fn new(probe: &Arc<Probe>) -> Self {
		Self {
			probe: Arc::clone(probe),
			delay: None,
			failures: HashMap::new(),
			panic_on: None,
			hang_on: None,
		}
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn failing(mut self, file_name: &str, description: &str) -> Self {
		self.failures
			.insert(file_name.to_string(), description.to_string());
		self
	}

	pub fn panicking_on(mut self, file_name: &str) -> Self {
		self.panic_on = Some(file_name.to_string());
		self
	}

	pub fn hanging_on(mut self, file_name: &str) -> Self {
		self.hang_on = Some(file_name.to_string());
		self
	}
}

#[async_trait]
impl ItemTransform for SampleTransform {
	type Error = SampleError;

	async fn transform(
		&self,
		item: &WorkItem,
		_ctx: &OutputContext,
	) -> Result<TransformOutput, SampleError> {
		self.probe.record(item);

		let name = item.display_name().into_owned();

		if let Some(delay) = self.delay {
			sleep(delay).await;
		}

		if self.panic_on.as_deref() == Some(name.as_str()) {
			panic!("SampleTransform exploded on {name}");
		}

		if self.hang_on.as_deref() == Some(name.as_str()) {
			info!("Hanging forever on {name}");
			std::future::pending::<()>().await;
		}

		if let Some(description) = self.failures.get(&name) {
			return Err(SampleError::Rejected(description.clone()));
		}

		Ok(TransformOutput::new(item.size()))
	}

	async fn maintenance(&self) {
		self.probe.maintenance_calls.fetch_add(1, Ordering::SeqCst);
	}
}

/// Announces every item it starts on `began_rx`, then waits for a permit before finishing it.
#[derive(Debug)]
pub struct GatedTransform {
	began_tx: chan::Sender<WorkItem>,
	permits_rx: chan::Receiver<()>,
}

pub struct GatedControls {
	pub began_rx: chan::Receiver<WorkItem>,
	pub permits_tx: chan::Sender<()>,
}

impl GatedControls {
	pub async fn release(&self, count: usize) {
		for _ in 0..count {
			self.permits_tx.send(()).await.unwrap();
		}
	}
}

impl GatedTransform {
	pub fn new() -> (Self, GatedControls) {
		let (began_tx, began_rx) = chan::unbounded();
		let (permits_tx, permits_rx) = chan::unbounded();

		(
			Self {
				began_tx,
				permits_rx,
			},
			GatedControls {
				began_rx,
				permits_tx,
			},
		)
	}
}

#[async_trait]
impl ItemTransform for GatedTransform {
	type Error = SampleError;

	async fn transform(
		&self,
		item: &WorkItem,
		_ctx: &OutputContext,
	) -> Result<TransformOutput, SampleError> {
		// The test may not care about starts at all
		let _ = self.began_tx.send(item.clone()).await;

		self.permits_rx
			.recv()
			.await
			.map_err(|_| SampleError::PermitsClosed)?;

		Ok(TransformOutput::new(item.size()))
	}
}

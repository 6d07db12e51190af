use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_MAINTENANCE_INTERVAL: usize = 16;

/// Tunables for a [`BatchController`](crate::BatchController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
	/// Finished items between two calls to the transform's maintenance hook, `0` disables it.
	pub maintenance_interval: usize,

	/// Upper bound for a single transform call in milliseconds. Unset means a hung transform
	/// hangs the whole batch.
	pub item_timeout_ms: Option<u64>,
}

impl Default for ControllerConfig {
	fn default() -> Self {
		Self {
			maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
			item_timeout_ms: None,
		}
	}
}

impl ControllerConfig {
	#[must_use]
	pub const fn with_maintenance_interval(mut self, interval: usize) -> Self {
		self.maintenance_interval = interval;
		self
	}

	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	pub const fn with_item_timeout(mut self, timeout: Duration) -> Self {
		self.item_timeout_ms = Some(timeout.as_millis() as u64);
		self
	}

	#[must_use]
	pub fn item_timeout(&self) -> Option<Duration> {
		self.item_timeout_ms
			.filter(|ms| *ms > 0)
			.map(Duration::from_millis)
	}

	pub(crate) const fn is_maintenance_due(&self, completed: usize) -> bool {
		self.maintenance_interval != 0 && completed % self.maintenance_interval == 0
	}
}

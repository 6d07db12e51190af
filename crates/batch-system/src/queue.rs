use std::{
	collections::VecDeque,
	sync::{Mutex, MutexGuard, PoisonError},
};

use super::item::WorkItem;

/// FIFO of pending [`WorkItem`]s shared between the controller and the batch worker.
///
/// An item leaves the queue at the moment the worker hands it to the transform, so
/// [`JobQueue::size`] is always the real remaining work.
#[derive(Debug, Default)]
pub struct JobQueue {
	items: Mutex<VecDeque<WorkItem>>,
}

impl JobQueue {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn items(&self) -> MutexGuard<'_, VecDeque<WorkItem>> {
		// Every critical section here is a single VecDeque call, a poisoned lock still holds
		// a consistent queue
		self.items.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn enqueue(&self, item: WorkItem) {
		self.items().push_back(item);
	}

	/// Removes and returns the head of the queue, `None` once it is empty.
	pub fn dequeue(&self) -> Option<WorkItem> {
		self.items().pop_front()
	}

	/// Removes every pending item, returning them in queue order.
	pub fn drain(&self) -> Vec<WorkItem> {
		self.items().drain(..).collect()
	}

	#[must_use]
	pub fn size(&self) -> usize {
		self.items().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items().is_empty()
	}
}

impl FromIterator<WorkItem> for JobQueue {
	fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
		Self {
			items: Mutex::new(iter.into_iter().collect()),
		}
	}
}

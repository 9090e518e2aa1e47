//! FIFO work queue.

use std::collections::VecDeque;

use super::work::WorkItem;

/// Pending work, served first-in first-out.
///
/// Continuations always go to the back, so every artist's first page is
/// requested before any artist's second page.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Extend<WorkItem> for WorkQueue {
    fn extend<T: IntoIterator<Item = WorkItem>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

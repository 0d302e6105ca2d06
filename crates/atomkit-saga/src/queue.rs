use atomkit_core::{Operation, OperationId, QueuedOperation};

/// Ordered list of operations waiting to run.
///
/// Ids come from a counter that keeps increasing across [`clear`], so an id
/// is never reused within one queue.
///
/// [`clear`]: OperationQueue::clear
#[derive(Debug, Default)]
pub struct OperationQueue {
    operations: Vec<QueuedOperation>,
    last_sequence: u64,
}

impl OperationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an operation and return the id it was assigned.
    pub fn add(&mut self, operation: Operation) -> OperationId {
        self.last_sequence += 1;
        let id = OperationId::from_sequence(self.last_sequence);
        self.operations
            .push(QueuedOperation::new(id.clone(), operation));
        id
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    #[must_use]
    pub fn operations(&self) -> &[QueuedOperation] {
        &self.operations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use atomkit_core::Filter;

    use super::*;

    fn delete(id: i64) -> Operation {
        Operation::delete("widgets", Filter::by_field("id", id)).expect("valid delete")
    }

    #[test]
    fn add_assigns_sequential_ids_in_submission_order() {
        let mut queue = OperationQueue::new();

        let first = queue.add(delete(1));
        let second = queue.add(delete(2));

        assert_eq!(first.as_str(), "op-1");
        assert_eq!(second.as_str(), "op-2");
        let ids: Vec<_> = queue.operations().iter().map(QueuedOperation::id).collect();
        assert_eq!(ids, vec![&first, &second]);
    }

    #[test]
    fn clear_empties_queue_without_reusing_ids() {
        let mut queue = OperationQueue::new();
        queue.add(delete(1));
        queue.add(delete(2));

        queue.clear();
        let next = queue.add(delete(3));

        assert_eq!(queue.len(), 1);
        assert_eq!(next.as_str(), "op-3");
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = OperationQueue::new();

        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }
}

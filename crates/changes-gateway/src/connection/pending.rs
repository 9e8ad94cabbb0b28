//! Pending message buffer
//!
//! FIFO of messages that could not be pushed yet. Draining swaps the whole
//! buffer out under the lock, so anything enqueued afterwards stays put for
//! the next flush and nothing is handed out twice.

use changes_core::ChangeMessage;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct PendingQueue {
    messages: Mutex<VecDeque<ChangeMessage>>,
}

impl PendingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the back
    pub fn push(&self, message: ChangeMessage) {
        self.messages.lock().push_back(message);
    }

    /// Take every buffered message, leaving the buffer empty
    pub fn take_all(&self) -> Vec<ChangeMessage> {
        std::mem::take(&mut *self.messages.lock()).into()
    }

    /// Put a failed batch back in front of whatever arrived since it was taken
    pub fn restore(&self, batch: Vec<ChangeMessage>) {
        let mut messages = self.messages.lock();
        let newer = std::mem::take(&mut *messages);
        messages.extend(batch);
        messages.extend(newer);
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Copy of the buffer in delivery order
    pub fn snapshot(&self) -> Vec<ChangeMessage> {
        self.messages.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use changes_core::DocumentChangeNotification;

    fn doc(name: &str) -> ChangeMessage {
        DocumentChangeNotification::put(name).into()
    }

    fn names(messages: &[ChangeMessage]) -> Vec<&str> {
        messages.iter().map(ChangeMessage::name).collect()
    }

    #[test]
    fn test_take_all_empties_buffer() {
        let queue = PendingQueue::new();
        queue.push(doc("a"));
        queue.push(doc("b"));

        let batch = queue.take_all();
        assert_eq!(names(&batch), ["a", "b"]);
        assert!(queue.is_empty());
        assert!(queue.take_all().is_empty());
    }

    #[test]
    fn test_push_after_take_lands_in_new_buffer() {
        let queue = PendingQueue::new();
        queue.push(doc("a"));
        let batch = queue.take_all();
        queue.push(doc("b"));

        assert_eq!(names(&batch), ["a"]);
        assert_eq!(names(&queue.snapshot()), ["b"]);
    }

    #[test]
    fn test_restore_keeps_batch_ahead_of_newer_messages() {
        let queue = PendingQueue::new();
        queue.push(doc("a"));
        queue.push(doc("b"));
        let batch = queue.take_all();
        queue.push(doc("c"));

        queue.restore(batch);
        assert_eq!(names(&queue.snapshot()), ["a", "b", "c"]);
        assert_eq!(queue.len(), 3);
    }
}

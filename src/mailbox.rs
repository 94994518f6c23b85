//! Single-slot "latest value wins" cell shared between the detector callback
//! and the tick driver.
//!
//! Writers publish a whole immutable value; readers get an `Arc` to the last
//! published one. A reader never sees a partially written value.

use parking_lot::Mutex;
use std::sync::Arc;

/// Overwrite-on-write mailbox
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current value
    pub fn publish(&self, value: T) {
        *self.slot.lock() = Some(Arc::new(value));
    }

    /// Last published value, left in place for later readers
    #[must_use]
    pub fn latest(&self) -> Option<Arc<T>> {
        self.slot.lock().clone()
    }

    pub fn clear(&self) {
        self.slot.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_latest_wins() {
        let mailbox = Mailbox::new();
        assert!(mailbox.latest().is_none());
        mailbox.publish(1);
        mailbox.publish(2);
        assert_eq!(*mailbox.latest().unwrap(), 2);
        mailbox.clear();
        assert!(mailbox.latest().is_none());
    }

    #[test]
    fn test_no_torn_reads() {
        let mailbox = Arc::new(Mailbox::<[u64; 52]>::new());
        let writer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                for i in 0..5_000u64 {
                    mailbox.publish([i; 52]);
                }
            })
        };

        for _ in 0..5_000 {
            if let Some(values) = mailbox.latest() {
                assert!(values.iter().all(|v| *v == values[0]));
            }
        }
        writer.join().unwrap();
    }
}

//! Fixed-capacity circular buffer connecting a producer and a consumer thread.
//!
//! The producer never blocks: when the buffer is full the oldest unread
//! element is overwritten (drop-oldest), favoring producer progress over
//! consumer completeness. The consumer blocks on [`CircularBuffer::consume`]
//! until data arrives or the buffer is shut down, at which point remaining
//! items are drained and then the empty signal is returned.

use parking_lot::{Condvar, Mutex};

struct Inner<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    full: bool,
    shutdown: bool,
}

impl<T> Inner<T> {
    fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    fn len(&self, capacity: usize) -> usize {
        if self.full {
            capacity
        } else if self.head >= self.tail {
            self.head - self.tail
        } else {
            capacity + self.head - self.tail
        }
    }

    fn pop(&mut self, capacity: usize) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.slots[self.tail].take();
        self.full = false;
        self.tail = (self.tail + 1) % capacity;
        value
    }
}

/// Thread-safe circular buffer for the producer-consumer pattern.
///
/// State changes are serialized under a single mutex; one condition variable
/// wakes blocked consumers on push and on shutdown.
pub struct CircularBuffer<T> {
    inner: Mutex<Inner<T>>,
    data_added: Condvar,
    capacity: usize,
}

impl<T> CircularBuffer<T> {
    /// Create a buffer holding at most `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be non-zero");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            inner: Mutex::new(Inner {
                slots: slots.into_boxed_slice(),
                head: 0,
                tail: 0,
                full: false,
                shutdown: false,
            }),
            data_added: Condvar::new(),
            capacity,
        }
    }

    /// Add an element without blocking.
    ///
    /// If the buffer is full the oldest unread element is overwritten.
    /// Pushes after [`CircularBuffer::shutdown`] are silently discarded.
    pub fn push(&self, value: T) {
        {
            let mut inner = self.inner.lock();
            if inner.shutdown {
                return;
            }
            let head = inner.head;
            inner.slots[head] = Some(value);
            if inner.full {
                inner.tail = (inner.tail + 1) % self.capacity;
            }
            inner.head = (inner.head + 1) % self.capacity;
            inner.full = inner.head == inner.tail;
        }
        self.data_added.notify_one();
    }

    /// Remove and return the oldest element, blocking while the buffer is
    /// empty and not shut down.
    ///
    /// After shutdown, remaining elements are still returned in order;
    /// `None` is returned exactly once the buffer is shut down and empty.
    pub fn consume(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        self.data_added
            .wait_while(&mut inner, |inner| inner.is_empty() && !inner.shutdown);
        if inner.shutdown && inner.is_empty() {
            return None;
        }
        inner.pop(self.capacity)
    }

    /// Remove and return the oldest element without blocking.
    ///
    /// Returns `None` if the buffer is empty or has been shut down.
    pub fn try_consume(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        if inner.is_empty() || inner.shutdown {
            return None;
        }
        inner.pop(self.capacity)
    }

    /// Signal shutdown, waking every blocked consumer.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock();
            inner.shutdown = true;
        }
        self.data_added.notify_all();
    }

    /// Empty the buffer and clear the shutdown flag.
    ///
    /// Only safe to call while no consumer is active.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        for slot in inner.slots.iter_mut() {
            *slot = None;
        }
        inner.head = 0;
        inner.tail = 0;
        inner.full = false;
        inner.shutdown = false;
    }

    /// Number of elements currently available for consumption.
    pub fn len(&self) -> usize {
        self.inner.lock().len(self.capacity)
    }

    /// Whether no elements are available.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Whether the buffer is at capacity.
    pub fn is_full(&self) -> bool {
        self.inner.lock().full
    }

    /// Whether shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        self.inner.lock().shutdown
    }

    /// Maximum number of elements, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn push_and_consume_preserve_order() {
        let buffer = CircularBuffer::new(8);
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 5);
        for i in 0..5 {
            assert_eq!(buffer.try_consume(), Some(i));
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let buffer = CircularBuffer::new(3);
        for i in 0..5 {
            buffer.push(i);
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 3);
        // 0 and 1 were overwritten; survivors keep their order
        assert_eq!(buffer.try_consume(), Some(2));
        assert_eq!(buffer.try_consume(), Some(3));
        assert_eq!(buffer.try_consume(), Some(4));
        assert_eq!(buffer.try_consume(), None);
    }

    #[test]
    fn try_consume_refuses_after_shutdown() {
        let buffer = CircularBuffer::new(4);
        buffer.push(1);
        buffer.shutdown();
        assert_eq!(buffer.try_consume(), None);
        // blocking consume still drains the remainder
        assert_eq!(buffer.consume(), Some(1));
        assert_eq!(buffer.consume(), None);
    }

    #[test]
    fn push_after_shutdown_is_discarded() {
        let buffer = CircularBuffer::new(4);
        buffer.shutdown();
        buffer.push(7);
        assert!(buffer.is_empty());
    }

    #[test]
    fn consume_drains_remaining_then_signals_empty() {
        let buffer = CircularBuffer::new(4);
        buffer.push(1);
        buffer.push(2);
        buffer.shutdown();
        assert_eq!(buffer.consume(), Some(1));
        assert_eq!(buffer.consume(), Some(2));
        assert_eq!(buffer.consume(), None);
    }

    #[test]
    fn reset_clears_shutdown() {
        let buffer = CircularBuffer::new(2);
        buffer.push(1);
        buffer.shutdown();
        buffer.reset();
        assert!(!buffer.is_shutdown());
        assert!(buffer.is_empty());
        buffer.push(9);
        assert_eq!(buffer.try_consume(), Some(9));
    }

    #[test]
    fn consume_wakes_on_push() {
        let buffer = Arc::new(CircularBuffer::new(4));
        let consumer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.consume())
        };
        thread::sleep(Duration::from_millis(20));
        buffer.push(42);
        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn consume_wakes_on_shutdown() {
        let buffer: Arc<CircularBuffer<u32>> = Arc::new(CircularBuffer::new(4));
        let consumer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.consume())
        };
        thread::sleep(Duration::from_millis(20));
        buffer.shutdown();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn concurrent_producer_consumer() {
        let buffer = Arc::new(CircularBuffer::new(1024));
        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    buffer.push(i);
                }
                buffer.shutdown();
            })
        };
        let consumer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut received = Vec::new();
                while let Some(v) = buffer.consume() {
                    received.push(v);
                }
                received
            })
        };
        producer.join().unwrap();
        let received = consumer.join().unwrap();
        // capacity exceeds the burst, so nothing is dropped and order holds
        assert_eq!(received, (0..1000).collect::<Vec<_>>());
    }
}

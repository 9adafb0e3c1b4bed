//! Lock-free single-producer/single-consumer byte ring.
//!
//! `head` is written only by [`RingProducer`], `tail` only by
//! [`RingConsumer`]. One slot always stays empty so that `head == tail`
//! means empty and never full.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Smallest ring worth building: one record header plus a short frame.
pub const MIN_CAPACITY: usize = 64;

struct Shared {
    buffer: Box<[AtomicU8]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl Shared {
    fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

pub struct RingProducer {
    shared: Arc<Shared>,
}

pub struct RingConsumer {
    shared: Arc<Shared>,
    scratch: Vec<u8>,
}

/// Builds a ring of `capacity` bytes, of which `capacity - 1` are usable.
pub fn channel(capacity: usize) -> (RingProducer, RingConsumer) {
    let capacity = capacity.max(MIN_CAPACITY);
    let buffer: Box<[AtomicU8]> = (0..capacity).map(|_| AtomicU8::new(0)).collect();

    let shared = Arc::new(Shared {
        buffer,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });

    let producer = RingProducer {
        shared: Arc::clone(&shared),
    };
    let consumer = RingConsumer {
        shared,
        scratch: Vec::with_capacity(capacity),
    };

    (producer, consumer)
}

impl RingProducer {
    /// Copies `header` then `payload` into the ring as one unit.
    ///
    /// Returns `false` and writes nothing when the unit does not fit; the
    /// consumer only ever sees whole units. Never blocks or allocates.
    pub fn try_push(&mut self, header: &[u8], payload: &[u8]) -> bool {
        let capacity = self.shared.capacity();
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);

        let free = (tail + capacity - head - 1) % capacity;
        let required = header.len() + payload.len();
        if required > free {
            return false;
        }

        let mut position = head;
        for byte in header.iter().chain(payload.iter()) {
            self.shared.buffer[position].store(*byte, Ordering::Relaxed);
            position += 1;
            if position == capacity {
                position = 0;
            }
        }

        // Publishing the new head is the only step the consumer can observe.
        self.shared.head.store(position, Ordering::Release);
        true
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

impl RingConsumer {
    /// Hands every byte published so far to `sink` as one contiguous chunk,
    /// in arrival order, then releases the space. Returns the chunk length.
    pub fn drain(&mut self, mut sink: impl FnMut(&[u8])) -> usize {
        let capacity = self.shared.capacity();
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Relaxed);

        let available = (head + capacity - tail) % capacity;
        if available == 0 {
            return 0;
        }

        self.scratch.clear();
        let mut position = tail;
        while position != head {
            self.scratch
                .push(self.shared.buffer[position].load(Ordering::Relaxed));
            position += 1;
            if position == capacity {
                position = 0;
            }
        }

        sink(&self.scratch);

        self.shared.tail.store(head, Ordering::Release);
        available
    }

    /// Bytes published and not yet drained.
    pub fn len(&self) -> usize {
        let capacity = self.shared.capacity();
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Relaxed);
        (head + capacity - tail) % capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }
}

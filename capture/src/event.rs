use crossbeam::queue::ArrayQueue;
use serde::{Serialize, Serializer};
use std::fmt;
use strum_macros::Display;

pub const DETAIL_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
pub enum EventKind {
    #[default]
    None,
    Handshake,
    Deauth,
    Probe,
    NewNetwork,
    AttackFired,
}

/// Short event text kept inline, so events can be built on the receive
/// path without allocating. Longer text is cut at a character boundary.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Detail {
    bytes: [u8; DETAIL_CAPACITY],
    length: usize,
}

impl Default for Detail {
    fn default() -> Self {
        Self {
            bytes: [0; DETAIL_CAPACITY],
            length: 0,
        }
    }
}

impl Detail {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.length]).unwrap_or_default()
    }
}

impl fmt::Write for Detail {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let free = DETAIL_CAPACITY - self.length;
        let mut end = s.len().min(free);
        while !s.is_char_boundary(end) {
            end -= 1;
        }

        self.bytes[self.length..self.length + end].copy_from_slice(&s.as_bytes()[..end]);
        self.length += end;
        Ok(())
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl Serialize for Detail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CaptureEvent {
    pub kind: EventKind,
    pub detail: Detail,
}

impl CaptureEvent {
    pub fn new(kind: EventKind, arguments: fmt::Arguments<'_>) -> Self {
        let mut detail = Detail::default();
        let _ = fmt::Write::write_fmt(&mut detail, arguments);
        Self { kind, detail }
    }
}

impl fmt::Display for CaptureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Lossy event mailbox. When full, posting replaces the oldest unread
/// event; with depth 1 only the latest event survives between polls.
pub struct EventMailbox {
    queue: ArrayQueue<CaptureEvent>,
}

impl EventMailbox {
    pub fn new(depth: usize) -> Self {
        Self {
            queue: ArrayQueue::new(depth.max(1)),
        }
    }

    /// Never blocks. Returns the event that was pushed out, if any.
    pub fn post(&self, event: CaptureEvent) -> Option<CaptureEvent> {
        self.queue.force_push(event)
    }

    pub fn poll(&self) -> Option<CaptureEvent> {
        self.queue.pop()
    }

    /// Like [`EventMailbox::poll`], with an empty mailbox reported as an
    /// event of kind [`EventKind::None`].
    pub fn take(&self) -> CaptureEvent {
        self.poll().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.queue.capacity()
    }
}

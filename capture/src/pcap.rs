use crate::storage::Storage;
use bytes::BufMut;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::time::{Duration, Instant};

pub const MAGIC: u32 = 0xA1B2C3D4;
pub const VERSION_MAJOR: u16 = 2;
pub const VERSION_MINOR: u16 = 4;
pub const THIS_ZONE: i32 = 0;
pub const SIGFIGS: u32 = 0;
pub const SNAPLEN: u32 = 65535;
pub const LINKTYPE_IEEE802_11: u32 = 105;

pub const GLOBAL_HEADER_LENGTH: usize = 24;
pub const RECORD_HEADER_LENGTH: usize = 16;

pub const FILE_PREFIX: &str = "capture_";
pub const FILE_EXTENSION: &str = ".pcap";
pub const MAX_FILE_INDEX: u32 = 9999;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Timestamp {
    pub seconds: u32,
    pub microseconds: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        Self::from(Utc::now())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self {
            // The classic format ends in 2106; later times saturate.
            seconds: u32::try_from(value.timestamp().max(0)).unwrap_or(u32::MAX),
            microseconds: value.timestamp_subsec_micros() % 1_000_000,
        }
    }
}

pub fn global_header() -> [u8; GLOBAL_HEADER_LENGTH] {
    let mut bytes = [0u8; GLOBAL_HEADER_LENGTH];
    let mut buffer = &mut bytes[..];
    buffer.put_u32_le(MAGIC);
    buffer.put_u16_le(VERSION_MAJOR);
    buffer.put_u16_le(VERSION_MINOR);
    buffer.put_i32_le(THIS_ZONE);
    buffer.put_u32_le(SIGFIGS);
    buffer.put_u32_le(SNAPLEN);
    buffer.put_u32_le(LINKTYPE_IEEE802_11);
    bytes
}

/// Record header for a frame of `original_length` bytes. The captured
/// length is capped at the snap length.
pub fn record_header(timestamp: Timestamp, original_length: usize) -> [u8; RECORD_HEADER_LENGTH] {
    let original_length = u32::try_from(original_length).unwrap_or(u32::MAX);

    let mut bytes = [0u8; RECORD_HEADER_LENGTH];
    let mut buffer = &mut bytes[..];
    buffer.put_u32_le(timestamp.seconds);
    buffer.put_u32_le(timestamp.microseconds);
    buffer.put_u32_le(original_length.min(SNAPLEN));
    buffer.put_u32_le(original_length);
    bytes
}

pub fn file_name(index: u32) -> String {
    format!("{FILE_PREFIX}{index}{FILE_EXTENSION}")
}

/// Writes pcap files through a [`Storage`].
///
/// A writer without an open file is "not ready": appends are dropped
/// until [`PcapWriter::open_new_file`] succeeds again.
pub struct PcapWriter<S: Storage> {
    storage: S,
    file: Option<S::File>,
    file_name: Option<String>,
    bytes_written: u64,

    flush_interval: Duration,
    last_flush: Option<Instant>,
}

impl<S: Storage> PcapWriter<S> {
    pub fn new(storage: S, flush_interval: Duration) -> Self {
        Self {
            storage,
            file: None,
            file_name: None,
            bytes_written: 0,

            flush_interval,
            last_flush: None,
        }
    }

    /// Closes the current file and opens the lowest unused
    /// `capture_<N>.pcap`, writing its global header right away.
    pub fn open_new_file(&mut self) -> bool {
        self.close();

        let name = match self.next_file_name() {
            Some(value) => value,
            None => {
                log::error!("No free capture file name up to index {MAX_FILE_INDEX}.");
                return false;
            },
        };

        let mut file = match self.storage.open_append(&name) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Failed to open {name}: {err}");
                return false;
            },
        };

        let header = global_header();
        if let Err(err) = file.write_all(&header).and_then(|_| file.flush()) {
            log::warn!("Failed to write pcap header to {name}: {err}");
            return false;
        }

        log::info!("Opened capture file {name}.");
        self.file = Some(file);
        self.file_name = Some(name);
        self.bytes_written = GLOBAL_HEADER_LENGTH as u64;
        self.last_flush = None;
        true
    }

    fn next_file_name(&self) -> Option<String> {
        (0..=MAX_FILE_INDEX)
            .map(file_name)
            .find(|name| !self.storage.exists(name))
    }

    /// Writes one record header and the frame bytes. No-op when not ready.
    pub fn append_record(&mut self, timestamp: Timestamp, payload: &[u8]) {
        if !self.is_ready() {
            return;
        }

        let captured = payload.len().min(SNAPLEN as usize);
        let header = record_header(timestamp, payload.len());
        self.write_encoded(&header);
        self.write_encoded(&payload[..captured]);
    }

    /// Writes bytes that already are whole pcap records, as produced by
    /// the capture ring. No-op when not ready.
    pub fn write_encoded(&mut self, records: &[u8]) {
        let file = match self.file.as_mut() {
            Some(value) => value,
            None => return,
        };

        match file.write_all(records) {
            Ok(_) => self.bytes_written += records.len() as u64,
            Err(err) => {
                log::warn!(
                    "Write to {} failed: {err}. Writer is not ready.",
                    self.file_name.as_deref().unwrap_or_default()
                );
                self.file = None;
            },
        }
    }

    /// Commits buffered bytes to storage once per flush interval.
    pub fn flush_if_due(&mut self, now: Instant) {
        let last_flush = *self.last_flush.get_or_insert(now);
        if now.duration_since(last_flush) >= self.flush_interval {
            self.flush();
            self.last_flush = Some(now);
        }
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut()
            && let Err(err) = file.flush()
        {
            log::warn!("Flush failed: {err}. Writer is not ready.");
            self.file = None;
        }
    }

    pub fn close(&mut self) {
        self.flush();
        self.file = None;
    }

    pub fn is_ready(&self) -> bool {
        self.file.is_some()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Bytes written to the current file, global header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

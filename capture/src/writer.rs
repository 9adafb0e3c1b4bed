use crate::pcap::PcapWriter;
use crate::ring::RingConsumer;
use crate::settings::CaptureSettings;
use crate::storage::Storage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub const THREAD_NAME: &str = "storage-writer";

/// Consumer side of the pipeline: moves whole records from the capture
/// ring into pcap files. May block on storage; the producer never waits
/// on it.
pub struct StorageWriter<S: Storage> {
    consumer: RingConsumer,
    pcap: PcapWriter<S>,

    drain_interval: Duration,
    retry_interval: Duration,
    max_file_bytes: u64,

    last_retry: Option<Instant>,
    discarded: u64,
}

impl<S: Storage> StorageWriter<S> {
    pub fn new(consumer: RingConsumer, pcap: PcapWriter<S>, settings: &CaptureSettings) -> Self {
        Self {
            consumer,
            pcap,

            drain_interval: settings.drain_interval,
            retry_interval: settings.flush_interval,
            max_file_bytes: settings.max_file_bytes,

            last_retry: None,
            discarded: 0,
        }
    }

    /// One pass: reopen storage if needed, drain the ring, rotate the file
    /// when it grew past the limit, flush when due. Returns drained bytes.
    pub fn cycle(&mut self, now: Instant) -> usize {
        if !self.pcap.is_ready() {
            self.retry_open(now);
        }

        let pcap = &mut self.pcap;
        let discarded = &mut self.discarded;
        let drained = self.consumer.drain(|chunk| {
            if pcap.is_ready() {
                pcap.write_encoded(chunk);
            } else {
                *discarded += chunk.len() as u64;
            }
        });

        if drained > 0 && !self.pcap.is_ready() {
            log::debug!(
                "Storage not ready, discarded {drained} bytes ({} total).",
                self.discarded
            );
        }

        if self.pcap.is_ready() && self.pcap.bytes_written() >= self.max_file_bytes {
            log::info!(
                "{} reached {} bytes, rotating.",
                self.pcap.file_name().unwrap_or_default(),
                self.pcap.bytes_written()
            );
            self.pcap.open_new_file();
        }

        self.pcap.flush_if_due(now);
        drained
    }

    fn retry_open(&mut self, now: Instant) {
        let due = match self.last_retry {
            None => true,
            Some(last_retry) => now.duration_since(last_retry) >= self.retry_interval,
        };
        if !due {
            return;
        }

        self.last_retry = Some(now);
        if self.pcap.open_new_file() {
            self.last_retry = None;
        }
    }

    /// Final drain and flush. Runs on shutdown.
    pub fn finish(&mut self) {
        self.cycle(Instant::now());
        self.pcap.close();
    }

    pub fn run(&mut self, shutdown: &AtomicBool) {
        log::info!("Storage writer started.");
        while !shutdown.load(Ordering::Acquire) {
            self.cycle(Instant::now());
            thread::sleep(self.drain_interval);
        }

        self.finish();
        log::info!("Storage writer stopped. Discarded bytes: {}.", self.discarded);
    }

    /// Bytes drained while storage was unavailable.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn pcap(&self) -> &PcapWriter<S> {
        &self.pcap
    }
}

impl<S> StorageWriter<S>
where
    S: Storage + Send + 'static,
    S::File: Send,
{
    pub fn spawn(mut self, shutdown: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run(&shutdown))
    }
}

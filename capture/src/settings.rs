use std::time::Duration;

pub const DEFAULT_CHANNELS: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];
pub const DEFAULT_HOP_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_RING_CAPACITY: usize = 32 * 1024;
pub const DEFAULT_NETWORK_CAPACITY: usize = 64;
pub const DEFAULT_CLIENT_CAPACITY: usize = 64;
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 1;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_ATTACK_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_ATTACK_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_DEAUTH_BURST: usize = 3;
pub const DEFAULT_DEAUTH_BURST_DELAY: Duration = Duration::from_millis(2);

/// Tunables of the capture pipeline. Built by the binary from its config
/// file; every field has a working default.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureSettings {
    /// Hop order while capturing. Never empty.
    pub channels: Vec<u8>,
    pub hop_interval: Duration,

    pub ring_capacity: usize,
    pub network_capacity: usize,
    pub client_capacity: usize,
    pub event_queue_depth: usize,

    pub flush_interval: Duration,
    pub max_file_bytes: u64,
    pub drain_interval: Duration,

    pub attack_interval: Duration,
    pub attack_timeout: Duration,
    pub deauth_burst: usize,
    pub deauth_burst_delay: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS.to_vec(),
            hop_interval: DEFAULT_HOP_INTERVAL,

            ring_capacity: DEFAULT_RING_CAPACITY,
            network_capacity: DEFAULT_NETWORK_CAPACITY,
            client_capacity: DEFAULT_CLIENT_CAPACITY,
            event_queue_depth: DEFAULT_EVENT_QUEUE_DEPTH,

            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            drain_interval: DEFAULT_DRAIN_INTERVAL,

            attack_interval: DEFAULT_ATTACK_INTERVAL,
            attack_timeout: DEFAULT_ATTACK_TIMEOUT,
            deauth_burst: DEFAULT_DEAUTH_BURST,
            deauth_burst_delay: DEFAULT_DEAUTH_BURST_DELAY,
        }
    }
}

use crate::controller::ControllerState;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Counters shared between the frame producer and readers. Single-word
/// atomics only; nothing here may block.
#[derive(Default)]
pub struct CaptureStats {
    packets: AtomicU64,
    beacons: AtomicU64,
    probes: AtomicU64,
    deauths: AtomicU64,
    handshakes: AtomicU64,
    dropped: AtomicU64,
    channel: AtomicU8,
}

impl CaptureStats {
    pub fn record_packet(&self) {
        self.packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_beacon(&self) {
        self.beacons.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deauth(&self) {
        self.deauths.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handshake(&self) {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    /// A unit refused by the capture ring.
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_channel(&self, channel: u8) {
        self.channel.store(channel, Ordering::Relaxed);
    }

    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, state: ControllerState) -> StatsSnapshot {
        StatsSnapshot {
            packets: self.packets.load(Ordering::Relaxed),
            beacons: self.beacons.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            deauths: self.deauths.load(Ordering::Relaxed),
            handshakes: self.handshakes.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            channel: self.channel(),
            state,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub packets: u64,
    pub beacons: u64,
    pub probes: u64,
    pub deauths: u64,
    pub handshakes: u64,
    pub dropped: u64,
    pub channel: u8,
    pub state: ControllerState,
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] ch {}: packets {}, beacons {}, probes {}, deauths {}, handshakes {}, dropped {}",
            self.state,
            self.channel,
            self.packets,
            self.beacons,
            self.probes,
            self.deauths,
            self.handshakes,
            self.dropped
        )
    }
}

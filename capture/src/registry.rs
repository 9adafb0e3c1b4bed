use dot11::elements::{SSID_MAX_LENGTH, Ssid};
use dot11::mac::{self, MacAddress};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU8, AtomicU32, AtomicU64, AtomicUsize, Ordering};

const SSID_WORDS: usize = SSID_MAX_LENGTH / 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct NetworkRecord {
    pub address: MacAddress,
    pub ssid: Ssid,
    /// dBm; 0 when the driver did not report it.
    pub signal: i8,
    pub channel: u8,
    pub handshake: bool,
    /// Seconds since the Unix epoch.
    pub last_seen: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Observation {
    New(usize),
    Known(usize),
    /// The table is full and the address was not in it.
    Refused,
}

#[derive(Default)]
struct Slot {
    address: AtomicU64,
    ssid: [AtomicU64; SSID_WORDS],
    ssid_length: AtomicU8,
    signal: AtomicI8,
    channel: AtomicU8,
    handshake: AtomicBool,
    last_seen: AtomicU32,
}

impl Slot {
    fn address(&self) -> MacAddress {
        unpack_address(self.address.load(Ordering::Relaxed))
    }

    fn ssid(&self) -> Ssid {
        let mut bytes = [0u8; SSID_MAX_LENGTH];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.ssid.iter()) {
            chunk.copy_from_slice(&word.load(Ordering::Relaxed).to_le_bytes());
        }
        let length = self.ssid_length.load(Ordering::Relaxed) as usize;
        Ssid::new(&bytes[..length.min(SSID_MAX_LENGTH)])
    }

    fn store_ssid(&self, ssid: &Ssid) {
        let mut bytes = [0u8; SSID_MAX_LENGTH];
        bytes[..ssid.len()].copy_from_slice(ssid.as_bytes());
        for (chunk, word) in bytes.chunks_exact(8).zip(self.ssid.iter()) {
            let mut value = [0u8; 8];
            value.copy_from_slice(chunk);
            word.store(u64::from_le_bytes(value), Ordering::Relaxed);
        }
        self.ssid_length.store(ssid.len() as u8, Ordering::Relaxed);
    }
}

fn pack_address(address: &MacAddress) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..mac::LENGTH_BYTES].copy_from_slice(address.bytes());
    u64::from_le_bytes(bytes)
}

fn unpack_address(value: u64) -> MacAddress {
    let bytes = value.to_le_bytes();
    let mut address = [0u8; mac::LENGTH_BYTES];
    address.copy_from_slice(&bytes[..mac::LENGTH_BYTES]);
    MacAddress(address)
}

/// Fixed-capacity table of stations, deduplicated by hardware address.
///
/// Written by the frame producer only; any thread may read. Every field is
/// a single atomic word and a slot becomes visible through the published
/// length only after it is fully written, so readers never see a torn
/// address or a half-filled slot. Once full, new addresses are refused.
///
/// Outside this crate the table is read-only:
///
/// ```compile_fail
/// use capture::registry::NetworkRegistry;
///
/// fn forge(networks: &NetworkRegistry) {
///     networks.mark_handshake(0);
/// }
/// ```
pub struct NetworkRegistry {
    slots: Box<[Slot]>,
    length: AtomicUsize,
}

impl NetworkRegistry {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Slot::default()).collect(),
            length: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.length.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn find_by_address(&self, address: &MacAddress) -> Option<usize> {
        let packed = pack_address(address);
        self.slots[..self.len()]
            .iter()
            .position(|slot| slot.address.load(Ordering::Relaxed) == packed)
    }

    /// Adds a station unless its address is already known. Returns the
    /// index of the new or existing entry, or `None` when the table is full.
    pub(crate) fn insert(
        &self, address: MacAddress, ssid: Ssid, signal: i8, channel: u8, seen: u32,
    ) -> Option<usize> {
        if let Some(index) = self.find_by_address(&address) {
            return Some(index);
        }

        let index = self.len();
        let slot = self.slots.get(index)?;

        slot.address.store(pack_address(&address), Ordering::Relaxed);
        slot.store_ssid(&ssid);
        slot.signal.store(signal, Ordering::Relaxed);
        slot.channel.store(channel, Ordering::Relaxed);
        slot.handshake.store(false, Ordering::Relaxed);
        slot.last_seen.store(seen, Ordering::Relaxed);

        self.length.store(index + 1, Ordering::Release);
        Some(index)
    }

    /// Updates the volatile fields of an existing entry.
    pub(crate) fn refresh(&self, index: usize, signal: i8, channel: u8, seen: u32) {
        if let Some(slot) = self.slots[..self.len()].get(index) {
            slot.signal.store(signal, Ordering::Relaxed);
            slot.channel.store(channel, Ordering::Relaxed);
            slot.last_seen.store(seen, Ordering::Relaxed);
        }
    }

    /// Insert-if-new, otherwise refresh.
    pub(crate) fn observe(
        &self, address: MacAddress, ssid: Ssid, signal: i8, channel: u8, seen: u32,
    ) -> Observation {
        if let Some(index) = self.find_by_address(&address) {
            self.refresh(index, signal, channel, seen);
            return Observation::Known(index);
        }

        match self.insert(address, ssid, signal, channel, seen) {
            Some(index) => Observation::New(index),
            None => Observation::Refused,
        }
    }

    /// Returns `false` when the index is not populated or the flag was
    /// already set.
    pub(crate) fn mark_handshake(&self, index: usize) -> bool {
        match self.slots[..self.len()].get(index) {
            Some(slot) => !slot.handshake.swap(true, Ordering::Relaxed),
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<NetworkRecord> {
        let slot = self.slots[..self.len()].get(index)?;

        Some(NetworkRecord {
            address: slot.address(),
            ssid: slot.ssid(),
            signal: slot.signal.load(Ordering::Relaxed),
            channel: slot.channel.load(Ordering::Relaxed),
            handshake: slot.handshake.load(Ordering::Relaxed),
            last_seen: slot.last_seen.load(Ordering::Relaxed),
        })
    }

    pub fn records(&self) -> impl Iterator<Item = NetworkRecord> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }
}

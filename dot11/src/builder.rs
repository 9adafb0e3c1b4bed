use crate::control::{FrameControl, ManagementSubtype};
use crate::elements::{Ssid, id};
use crate::header::MacHeader;
use crate::mac::MacAddress;
use crate::{classify, header};
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub const DEAUTHENTICATION_LENGTH_BYTES: usize = header::LENGTH_BYTES + REASON_LENGTH_BYTES;
const REASON_LENGTH_BYTES: usize = 2;

/// Duration field used by common drivers for forged management frames. 314 µs.
pub const DURATION: u16 = 0x013A;

/// 100 TU.
pub const BEACON_INTERVAL: u16 = 0x0064;
/// ESS, short preamble, short slot time.
pub const BEACON_CAPABILITY: u16 = 0x0421;

/// 1, 2, 5.5, 11 (basic), 18, 24, 36, 54 Mbit/s.
pub const SUPPORTED_RATES: [u8; 8] = [0x82, 0x84, 0x8B, 0x96, 0x24, 0x30, 0x48, 0x6C];

#[derive(
    Clone, Copy, Debug, Display, Eq, Serialize, Deserialize, PartialEq, TryFromPrimitive,
)]
#[repr(u16)]
pub enum ReasonCode {
    Unspecified = 1,
    AuthenticationExpired = 2,
    StationLeaving = 3,
    Inactivity = 4,
    ApOverloaded = 5,
    Class2FromUnauthenticated = 6,
    Class3FromUnassociated = 7,
    DisassociatedLeaving = 8,
}

fn management_header(
    subtype: ManagementSubtype,
    destination: MacAddress,
    source: MacAddress,
    bssid: MacAddress,
    sequence: u16,
) -> [u8; header::LENGTH_BYTES] {
    MacHeader {
        control: FrameControl::management(subtype),
        duration: DURATION,
        address_1: destination,
        address_2: source,
        address_3: bssid,
        sequence_control: (sequence & 0x0FFF) << 4,
    }
    .bytes()
}

/// Deauthentication frame: 24-byte header followed by the reason code.
pub fn deauthentication(
    destination: MacAddress,
    source: MacAddress,
    bssid: MacAddress,
    sequence: u16,
    reason: ReasonCode,
) -> [u8; DEAUTHENTICATION_LENGTH_BYTES] {
    reason_frame(
        ManagementSubtype::Deauthentication,
        destination,
        source,
        bssid,
        sequence,
        reason,
    )
}

/// Same layout as [`deauthentication`] with the disassociation subtype.
pub fn disassociation(
    destination: MacAddress,
    source: MacAddress,
    bssid: MacAddress,
    sequence: u16,
    reason: ReasonCode,
) -> [u8; DEAUTHENTICATION_LENGTH_BYTES] {
    reason_frame(
        ManagementSubtype::Disassociation,
        destination,
        source,
        bssid,
        sequence,
        reason,
    )
}

fn reason_frame(
    subtype: ManagementSubtype,
    destination: MacAddress,
    source: MacAddress,
    bssid: MacAddress,
    sequence: u16,
    reason: ReasonCode,
) -> [u8; DEAUTHENTICATION_LENGTH_BYTES] {
    let mut frame = [0u8; DEAUTHENTICATION_LENGTH_BYTES];
    frame[..header::LENGTH_BYTES].copy_from_slice(&management_header(
        subtype,
        destination,
        source,
        bssid,
        sequence,
    ));
    frame[header::LENGTH_BYTES..].copy_from_slice(&(reason as u16).to_le_bytes());
    frame
}

/// Broadcast beacon advertising `ssid` from `bssid` on `channel`.
pub fn beacon(ssid: &Ssid, bssid: MacAddress, channel: u8, sequence: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(
        header::LENGTH_BYTES
            + classify::BEACON_FIXED_PARAMETERS_LENGTH
            + 2
            + ssid.len()
            + 2
            + SUPPORTED_RATES.len()
            + 3,
    );

    frame.extend_from_slice(&management_header(
        ManagementSubtype::Beacon,
        MacAddress::BROADCAST,
        bssid,
        bssid,
        sequence,
    ));

    // Timestamp. Filled in by hardware that supports it.
    frame.extend_from_slice(&[0u8; 8]);
    frame.extend_from_slice(&BEACON_INTERVAL.to_le_bytes());
    frame.extend_from_slice(&BEACON_CAPABILITY.to_le_bytes());

    push_element(&mut frame, id::SSID, ssid.as_bytes());
    push_element(&mut frame, id::SUPPORTED_RATES, &SUPPORTED_RATES);
    push_element(&mut frame, id::DS_PARAMETER_SET, &[channel]);

    frame
}

/// Broadcast probe request for `ssid`. An empty SSID is a wildcard probe.
pub fn probe_request(ssid: &Ssid, source: MacAddress, sequence: u16) -> Vec<u8> {
    let mut frame =
        Vec::with_capacity(header::LENGTH_BYTES + 2 + ssid.len() + 2 + SUPPORTED_RATES.len());

    frame.extend_from_slice(&management_header(
        ManagementSubtype::ProbeRequest,
        MacAddress::BROADCAST,
        source,
        MacAddress::BROADCAST,
        sequence,
    ));
    push_element(&mut frame, id::SSID, ssid.as_bytes());
    push_element(&mut frame, id::SUPPORTED_RATES, &SUPPORTED_RATES);

    frame
}

fn push_element(frame: &mut Vec<u8>, id: u8, data: &[u8]) {
    frame.push(id);
    frame.push(data.len() as u8);
    frame.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classification, classify};

    #[test]
    fn test_deauthentication_bytes() {
        let destination = MacAddress::try_from("00:11:22:33:44:55").unwrap();
        let bssid = MacAddress::try_from("66:77:88:99:AA:BB").unwrap();

        let frame = deauthentication(destination, bssid, bssid, 1, ReasonCode::Class3FromUnassociated);

        let hex_actual = "C0 00 3A 01 00 11 22 33 44 55 66 77 88 99 AA BB 66 77 88 99 AA BB 10 00 07 00".replace(" ", "");
        assert_eq!(frame.to_vec(), hex::decode(hex_actual).unwrap());
    }

    #[test]
    fn test_disassociation_subtype() {
        let frame = disassociation(
            MacAddress::BROADCAST,
            MacAddress::default(),
            MacAddress::default(),
            0,
            ReasonCode::Inactivity,
        );
        assert_eq!(frame[0], 0xA0);
        assert_eq!(&frame[24..], &[0x04, 0x00]);
    }

    #[test]
    fn test_sequence_wraps() {
        let frame = deauthentication(
            MacAddress::BROADCAST,
            MacAddress::default(),
            MacAddress::default(),
            0x1001,
            ReasonCode::Unspecified,
        );
        assert_eq!(&frame[22..24], &[0x10, 0x00]);
    }

    #[test]
    fn test_deauthentication_classified() {
        let bssid = MacAddress::try_from("02:00:00:00:00:01").unwrap();
        let frame = deauthentication(MacAddress::BROADCAST, bssid, bssid, 5, ReasonCode::Inactivity);

        let result = classify(&frame, frame.len());
        let deauthentication = match result {
            Classification::Deauthentication(value) => value,
            _ => panic!(),
        };
        assert_eq!(deauthentication.bssid, Some(bssid));
        assert_eq!(deauthentication.reason, Some(ReasonCode::Inactivity as u16));
    }

    #[test]
    fn test_beacon_classified() {
        let bssid = MacAddress::local_unicast([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        let frame = beacon(&Ssid::from("FreeWifi"), bssid, 11, 42);

        assert_eq!(frame.len(), 24 + 12 + 2 + 8 + 2 + 8 + 3);

        let result = classify(&frame, frame.len());
        let advertisement = match result {
            Classification::Beacon(value) => value,
            _ => panic!(),
        };
        assert_eq!(advertisement.bssid, bssid);
        assert_eq!(advertisement.ssid, Ssid::from("FreeWifi"));
        assert_eq!(advertisement.channel, Some(11));
    }

    #[test]
    fn test_probe_request_classified() {
        let source = MacAddress::try_from("02:12:34:56:78:9A").unwrap();
        let frame = probe_request(&Ssid::from("corp"), source, 7);

        let result = classify(&frame, frame.len());
        let advertisement = match result {
            Classification::ProbeRequest(value) => value,
            _ => panic!(),
        };
        assert_eq!(advertisement.transmitter, source);
        assert_eq!(advertisement.ssid, Ssid::from("corp"));
    }

    #[test]
    fn test_reason_code_from_primitive() {
        assert!(matches!(ReasonCode::try_from(7u16), Ok(ReasonCode::Class3FromUnassociated)));
        assert!(ReasonCode::try_from(99u16).is_err());
    }
}

use crate::control::{FrameControl, FrameType, ManagementSubtype};
use crate::elements::Ssid;
use crate::mac::MacAddress;
use crate::{control, elements, header, llc, mac, parser};
use nom::Parser;
use nom::number::le_u16;
use serde::{Deserialize, Serialize};

/// Frames shorter than this are link-layer noise and are ignored.
pub const MIN_FRAME_LENGTH: usize = 10;

/// Timestamp (8), beacon interval (2), capability information (2).
pub const BEACON_FIXED_PARAMETERS_LENGTH: usize = 12;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    /// Below the minimum parseable length.
    Ignored,

    /// A frame of an interesting kind that failed a bounds check.
    Malformed,

    Beacon(Advertisement),
    ProbeRequest(Advertisement),
    Deauthentication(Deauthentication),
    Handshake(Handshake),

    /// Data frame with the protected bit set; its payload is not inspected.
    Protected,

    Other(FrameControl),
}

/// Fields shared by beacons and probe requests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub transmitter: MacAddress,
    pub bssid: MacAddress,
    pub ssid: Ssid,
    pub channel: Option<u8>,
}

/// Deauthentication frames are reported even when truncated right after
/// the first address, so every field past the frame control is optional.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Deauthentication {
    pub receiver: Option<MacAddress>,
    pub transmitter: Option<MacAddress>,
    pub bssid: Option<MacAddress>,
    pub reason: Option<u16>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    pub transmitter: MacAddress,
    pub bssid: Option<MacAddress>,
    pub header_length: usize,
}

/// Classifies a raw 802.11 frame.
///
/// Only the first `length` bytes of `bytes` are ever looked at; frames that
/// are cut short anywhere come back as [`Classification::Malformed`]
/// instead of reading past the end.
pub fn classify(bytes: &[u8], length: usize) -> Classification {
    let frame = parser::declared(bytes, length);
    if frame.len() < MIN_FRAME_LENGTH {
        return Classification::Ignored;
    }

    let control = match control::parse(frame) {
        Ok((_, value)) => value,
        Err(_) => return Classification::Malformed,
    };

    match control.frame_type {
        FrameType::Management => classify_management(frame, control),
        FrameType::Data => classify_data(frame, control),
        FrameType::Control | FrameType::Extension => Classification::Other(control),
    }
}

fn classify_management(frame: &[u8], control: FrameControl) -> Classification {
    match control.management_subtype() {
        Some(ManagementSubtype::Beacon) => {
            match advertisement(frame, BEACON_FIXED_PARAMETERS_LENGTH) {
                Some(value) => Classification::Beacon(value),
                None => Classification::Malformed,
            }
        },
        Some(ManagementSubtype::ProbeRequest) => match advertisement(frame, 0) {
            Some(value) => Classification::ProbeRequest(value),
            None => Classification::Malformed,
        },
        Some(ManagementSubtype::Deauthentication) => {
            Classification::Deauthentication(deauthentication(frame))
        },
        _ => Classification::Other(control),
    }
}

fn advertisement(frame: &[u8], fixed_parameters: usize) -> Option<Advertisement> {
    let (body, header) = header::parse(frame).ok()?;

    // Missing or cut fixed parameters leave an empty body, not a failure:
    // the addresses alone are enough to track the network.
    let elements = body.get(fixed_parameters..).unwrap_or_default();
    let ssid = elements::leading_ssid(elements).unwrap_or_default();
    let channel = elements::ds_channel(elements);

    Some(Advertisement {
        transmitter: header.address_2,
        bssid: header.address_3,
        ssid,
        channel,
    })
}

fn deauthentication(frame: &[u8]) -> Deauthentication {
    let address = |offset: usize| {
        parser::slice_at(frame, offset, mac::LENGTH_BYTES)
            .and_then(|bytes| MacAddress::try_from(bytes).ok())
    };
    let reason = frame
        .get(header::LENGTH_BYTES..)
        .and_then(|body| le_u16::<_, nom::error::Error<&[u8]>>().parse(body).ok())
        .map(|(_, reason)| reason);

    Deauthentication {
        receiver: address(header::ADDRESS_1_OFFSET),
        transmitter: address(header::ADDRESS_2_OFFSET),
        bssid: address(header::ADDRESS_3_OFFSET),
        reason,
    }
}

fn classify_data(frame: &[u8], control: FrameControl) -> Classification {
    if control.is_protected() {
        return Classification::Protected;
    }

    let header_length = control.header_length();
    let payload = match frame.get(header_length..) {
        Some(value) => value,
        None => return Classification::Other(control),
    };

    match llc::parse(payload) {
        Ok((_, snap)) if snap.is_eapol() => {},
        _ => return Classification::Other(control),
    }

    // The EAPOL marker sits past the base header, so the addresses are present.
    match header::parse(frame) {
        Ok((_, header)) => Classification::Handshake(Handshake {
            transmitter: header.transmitter(),
            bssid: header.bssid(),
            header_length,
        }),
        Err(_) => Classification::Malformed,
    }
}

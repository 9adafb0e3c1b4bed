use nom::IResult;
use nom::Parser;
use nom::number::{le_u8, le_u16, le_u32};
use serde::{Deserialize, Serialize};

/// Version 0, no fields. Prepended to injected frames on drivers that
/// expect a radiotap header on transmit.
pub const MINIMAL_HEADER: [u8; 8] = [0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];

pub const FIXED_LENGTH_BYTES: usize = 8;
const PRESENT_WORD_LENGTH_BYTES: usize = 4;

pub mod present {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const DBM_ANTSIGNAL: u32 = 1 << 5;
    pub const EXT: u32 = 1 << 31;
}

/// Frame carries a trailing frame check sequence.
pub const FLAG_FCS: u8 = 0x10;
pub const FCS_LENGTH_BYTES: usize = 4;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Radiotap {
    /// Whole header length; the 802.11 frame starts right after it.
    pub length: usize,
    pub flags: Option<u8>,
    pub frequency: Option<u16>,
    pub signal: Option<i8>,
}

impl Radiotap {
    pub fn has_fcs(&self) -> bool {
        self.flags.is_some_and(|flags| flags & FLAG_FCS != 0)
    }

    pub fn channel(&self) -> Option<u8> {
        self.frequency.and_then(frequency_to_channel)
    }
}

/// Splits a radiotap-prefixed capture into its header and the 802.11
/// frame behind it. A trailing FCS is cut off when the header says one
/// is present.
pub fn strip(bytes: &[u8]) -> Option<(Radiotap, &[u8])> {
    let (_, radiotap) = parse(bytes).ok()?;
    let mut frame = bytes.get(radiotap.length..)?;

    if radiotap.has_fcs() {
        let end = frame.len().checked_sub(FCS_LENGTH_BYTES)?;
        frame = &frame[..end];
    }

    Some((radiotap, frame))
}

pub fn parse(input: &[u8]) -> IResult<&[u8], Radiotap> {
    // Version. 1 byte
    let (rest, _version) = nom::bytes::tag([0x00u8].as_slice()).parse(input)?;
    // Padding. 1 byte
    let (rest, _) = le_u8().parse(rest)?;
    // Header length. 2 bytes
    let (rest, length) = le_u16().parse(rest)?;
    // Present. 4 bytes, chained while the extension bit is set
    let (mut rest, first_present) = le_u32().parse(rest)?;

    let length = length as usize;
    let mut present = first_present;
    let mut offset = FIXED_LENGTH_BYTES;
    while present & present::EXT != 0 {
        (rest, present) = le_u32().parse(rest)?;
        offset += PRESENT_WORD_LENGTH_BYTES;
    }

    let header = match input.get(..length) {
        Some(value) if length >= offset => value,
        _ => return Err(crate::parser::ParserError::ErrorVerify.to_nom(input)),
    };

    let mut radiotap = Radiotap {
        length,
        ..Default::default()
    };
    let mut fields = Fields { header, offset };

    if first_present & present::TSFT != 0 && fields.take(8, 8).is_none() {
        return Ok((&input[length..], radiotap));
    }
    if first_present & present::FLAGS != 0 {
        radiotap.flags = fields.take(1, 1).map(|bytes| bytes[0]);
    }
    if first_present & present::RATE != 0 {
        fields.take(1, 1);
    }
    if first_present & present::CHANNEL != 0 {
        radiotap.frequency = fields
            .take(4, 2)
            .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]));
    }
    if first_present & present::FHSS != 0 {
        fields.take(2, 1);
    }
    if first_present & present::DBM_ANTSIGNAL != 0 {
        radiotap.signal = fields.take(1, 1).map(|bytes| bytes[0] as i8);
    }

    Ok((&input[length..], radiotap))
}

/// Cursor over the radiotap field area. Alignment is counted from the
/// start of the header.
struct Fields<'a> {
    header: &'a [u8],
    offset: usize,
}

impl<'a> Fields<'a> {
    fn take(&mut self, size: usize, align: usize) -> Option<&'a [u8]> {
        let aligned = self.offset.div_ceil(align) * align;
        let bytes = crate::parser::slice_at(self.header, aligned, size)?;
        self.offset = aligned + size;
        Some(bytes)
    }
}

pub fn frequency_to_channel(frequency: u16) -> Option<u8> {
    match frequency {
        2484 => Some(14),
        2412..=2472 => Some(((frequency - 2407) / 5) as u8),
        5160..=5885 => Some(((frequency - 5000) / 5) as u8),
        _ => None,
    }
}

pub fn channel_to_frequency(channel: u8) -> Option<u16> {
    match channel {
        14 => Some(2484),
        1..=13 => Some(2407 + channel as u16 * 5),
        32..=177 => Some(5000 + channel as u16 * 5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_header() {
        let mut bytes = MINIMAL_HEADER.to_vec();
        bytes.extend_from_slice(&[0xC0, 0x00]);

        let (radiotap, frame) = strip(&bytes).unwrap();
        assert_eq!(radiotap.length, 8);
        assert_eq!(radiotap.signal, None);
        assert_eq!(frame, &[0xC0, 0x00]);
    }

    #[test]
    fn test_flags_channel_signal() {
        // Present: FLAGS | RATE | CHANNEL | DBM_ANTSIGNAL
        let hex_actual = "00 00 0F 00 2E 00 00 00 10 02 6C 09 A0 00 C4 80 00 00 00 DE AD BE EF".replace(" ", "");
        let bytes = hex::decode(hex_actual).unwrap();

        let (radiotap, frame) = strip(&bytes).unwrap();
        assert_eq!(radiotap.length, 15);
        assert_eq!(radiotap.flags, Some(0x10));
        assert_eq!(radiotap.frequency, Some(2412));
        assert_eq!(radiotap.channel(), Some(1));
        assert_eq!(radiotap.signal, Some(-60));
        // FCS trimmed.
        assert_eq!(frame, &[0x80, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_tsft_alignment() {
        // Present: TSFT | DBM_ANTSIGNAL. TSFT sits at 8, signal at 16.
        let hex_actual = "00 00 11 00 21 00 00 00 01 02 03 04 05 06 07 08 B5 80 00".replace(" ", "");
        let bytes = hex::decode(hex_actual).unwrap();

        let (radiotap, frame) = strip(&bytes).unwrap();
        assert_eq!(radiotap.signal, Some(-75));
        assert_eq!(frame, &[0x80, 0x00]);
    }

    #[test]
    fn test_extended_present() {
        let hex_actual = "00 00 0D 00 20 00 00 80 00 00 00 00 C8 40 00".replace(" ", "");
        let bytes = hex::decode(hex_actual).unwrap();

        let (radiotap, frame) = strip(&bytes).unwrap();
        assert_eq!(radiotap.signal, Some(-56));
        assert_eq!(frame, &[0x40, 0x00]);
    }

    #[test]
    fn test_length_past_buffer() {
        let bytes = [0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0];
        assert!(strip(&bytes).is_none());
    }

    #[test]
    fn test_unknown_version() {
        let bytes = [0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(strip(&bytes).is_none());
    }

    #[test]
    fn test_truncation_never_panics() {
        let hex_actual = "00 00 11 00 2F 00 00 00 01 02 03 04 05 06 07 08 10 02 6C 09".replace(" ", "");
        let bytes = hex::decode(hex_actual).unwrap();
        for length in 0..=bytes.len() {
            let _ = strip(&bytes[..length]);
        }
    }

    #[test]
    fn test_channels() {
        assert_eq!(frequency_to_channel(2437), Some(6));
        assert_eq!(frequency_to_channel(2484), Some(14));
        assert_eq!(frequency_to_channel(5180), Some(36));
        assert_eq!(frequency_to_channel(900), None);
        assert_eq!(channel_to_frequency(6), Some(2437));
        assert_eq!(channel_to_frequency(0), None);
    }
}

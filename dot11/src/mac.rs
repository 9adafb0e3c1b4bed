use crate::parser::ParserError;
use nom::IResult;
use nom::Parser;
use nom::bytes::take;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use thiserror::Error;

pub const LENGTH_BYTES: usize = 6;
pub const BROADCAST_MAC: [u8; LENGTH_BYTES] = [0xFF; LENGTH_BYTES];

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Serialize, Deserialize, PartialEq)]
pub struct MacAddress(pub [u8; LENGTH_BYTES]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress(BROADCAST_MAC);

    pub fn is_broadcast(&self) -> bool {
        self.0.eq(&BROADCAST_MAC)
    }

    pub fn is_multicast(&self) -> bool {
        if self.is_broadcast() {
            return false;
        }

        self.0[0] & 0b00000001 == 1
    }

    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0b00000010 != 0
    }

    /// Turns arbitrary bytes into a unicast, locally administered address,
    /// the kind a radio may use without colliding with a vendor OUI.
    pub fn local_unicast(mut bytes: [u8; LENGTH_BYTES]) -> Self {
        bytes[0] = (bytes[0] & 0b11111100) | 0b00000010;
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; LENGTH_BYTES] {
        &self.0
    }
}

impl From<[u8; LENGTH_BYTES]> for MacAddress {
    fn from(value: [u8; LENGTH_BYTES]) -> Self {
        Self(value)
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = MacError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes = <[u8; LENGTH_BYTES]>::try_from(value)
            .map_err(|_| MacError::InvalidBytesLength)?;

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<&str> for MacAddress {
    type Error = MacError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let s = value.replace(":", "").replace(".", "").replace("-", "");
        let bytes = hex::decode(&s).map_err(|_| MacError::FailedHexDecode)?;
        let bytes = <[u8; LENGTH_BYTES]>::try_from(bytes)
            .map_err(|_| MacError::InvalidStringLength)?;

        Ok(Self(bytes))
    }
}

impl std::str::FromStr for MacAddress {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MacError {
    #[error("MAC address must be exactly 6 bytes long.")]
    InvalidBytesLength,

    #[error("MAC address is not valid hex.")]
    FailedHexDecode,

    #[error("MAC address string must describe exactly 6 bytes.")]
    InvalidStringLength,
}

pub fn parse(input: &[u8]) -> IResult<&[u8], MacAddress> {
    let (rest, mac_bytes) = take(LENGTH_BYTES).parse(input)?;
    let mac = match MacAddress::try_from(mac_bytes) {
        Ok(mac) => mac,
        Err(_) => return Err(ParserError::ErrorVerify.to_nom(input)),
    };

    Ok((rest, mac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_broadcast() {
        let mac = MacAddress([0xFF; LENGTH_BYTES]);
        assert!(mac.is_broadcast());
        assert!(!mac.is_multicast());
    }

    #[test]
    fn test_is_multicast() {
        let mac = MacAddress::try_from("01:00:5e:02:02:04").unwrap();
        assert!(mac.is_multicast());
    }

    #[test]
    fn test_local_unicast() {
        let mac = MacAddress::local_unicast([0xFF, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(mac.0[0], 0xFE);
        assert!(mac.is_locally_administered());
        assert!(!mac.is_multicast());
    }

    #[test]
    fn test_display_and_parse() {
        let mac: MacAddress = "aa-bb-cc-dd-ee-0f".parse().unwrap();
        assert_eq!(mac.to_string(), "AA:BB:CC:DD:EE:0F");
    }

    #[test]
    fn test_invalid_string_length() {
        assert_eq!(
            MacAddress::try_from("AA:BB:CC"),
            Err(MacError::InvalidStringLength)
        );
    }

    #[test]
    fn test_parse_truncated() {
        let bytes = [0x00, 0x11, 0x22, 0x33, 0x44];
        assert!(parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_leaves_rest() {
        let bytes = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x99];
        let (rest, mac) = parse(&bytes).unwrap();
        assert_eq!(rest, &[0x99]);
        assert_eq!(mac, MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
    }
}

use nom::IResult;
use nom::Parser;
use nom::bytes::take;
use nom::number::le_u8;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt::Formatter;

// Information elements (tag-length-value) in management frame bodies
// IEEE 802.11-2020, 9.4.2
pub const SSID_MAX_LENGTH: usize = 32;

pub mod id {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const DS_PARAMETER_SET: u8 = 3;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Element<'a> {
    pub id: u8,
    pub data: &'a [u8],
}

pub fn parse_element(input: &[u8]) -> IResult<&[u8], Element<'_>> {
    // Element ID. 1 byte
    let (rest, id) = le_u8().parse(input)?;
    // Length. 1 byte
    let (rest, length) = le_u8().parse(rest)?;
    // Information. `length` bytes
    let (rest, data) = take(length).parse(rest)?;

    Ok((rest, Element { id, data }))
}

/// Walks the elements of a frame body. Iteration ends at the first element
/// whose declared length runs past the body.
pub struct Elements<'a> {
    rest: &'a [u8],
}

impl<'a> Elements<'a> {
    pub fn new(body: &'a [u8]) -> Self {
        Self { rest: body }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match parse_element(self.rest) {
            Ok((rest, element)) => {
                self.rest = rest;
                Some(element)
            },
            Err(_) => {
                self.rest = &[];
                None
            },
        }
    }
}

/// SSID from the element that opens a beacon or probe request body.
pub fn leading_ssid(body: &[u8]) -> Option<Ssid> {
    match parse_element(body) {
        Ok((_, element)) if element.id == id::SSID => Some(Ssid::new(element.data)),
        _ => None,
    }
}

/// Current channel from the DS Parameter Set element, if the body has one.
pub fn ds_channel(body: &[u8]) -> Option<u8> {
    Elements::new(body)
        .find(|element| element.id == id::DS_PARAMETER_SET)
        .and_then(|element| element.data.first().copied())
}

/// Network name of at most 32 bytes, stored inline so it can be built on
/// the receive path without allocating.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Ssid {
    bytes: [u8; SSID_MAX_LENGTH],
    length: u8,
}

impl Ssid {
    pub fn new(bytes: &[u8]) -> Self {
        let length = bytes.len().min(SSID_MAX_LENGTH);
        let mut ssid = Self::default();
        ssid.bytes[..length].copy_from_slice(&bytes[..length]);
        ssid.length = length as u8;
        ssid
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length as usize]
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Hidden networks advertise an empty name or one made of zero bytes.
    pub fn is_hidden(&self) -> bool {
        self.as_bytes().iter().all(|byte| *byte == 0)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl From<&str> for Ssid {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl std::fmt::Display for Ssid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_hidden() {
            return write!(f, "<hidden>");
        }

        write!(f, "{}", self.to_string_lossy())
    }
}

impl std::fmt::Debug for Ssid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ssid({:?})", self.to_string_lossy())
    }
}

impl Serialize for Ssid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de> Deserialize<'de> for Ssid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Ssid::from(value.as_str()))
    }
}

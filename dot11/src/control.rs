use crate::parser::ParserError;
use nom::IResult;
use nom::Parser;
use nom::number::le_u8;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

// Frame Control field
// IEEE 802.11-2020, 9.2.4.1
pub const LENGTH_BYTES: usize = 2;

pub const BASE_HEADER_LENGTH: usize = 24;
pub const ADDRESS_4_LENGTH: usize = 6;
pub const QOS_CONTROL_LENGTH: usize = 2;
pub const HT_CONTROL_LENGTH: usize = 4;

// Bit 3 of a data subtype marks the QoS variants (8..15).
const QOS_SUBTYPE_BIT: u8 = 0x08;

pub mod flags {
    pub const TO_DS: u8 = 0x01;
    pub const FROM_DS: u8 = 0x02;
    pub const MORE_FRAGMENTS: u8 = 0x04;
    pub const RETRY: u8 = 0x08;
    pub const POWER_MANAGEMENT: u8 = 0x10;
    pub const MORE_DATA: u8 = 0x20;
    pub const PROTECTED: u8 = 0x40;
    pub const ORDER: u8 = 0x80;
}

#[derive(
    Clone, Copy, Debug, Display, Eq, Serialize, Deserialize, PartialEq, TryFromPrimitive,
)]
#[repr(u8)]
pub enum FrameType {
    Management = 0,
    Control = 1,
    Data = 2,
    Extension = 3,
}

#[derive(
    Clone, Copy, Debug, Display, Eq, Serialize, Deserialize, PartialEq, TryFromPrimitive,
)]
#[repr(u8)]
pub enum ManagementSubtype {
    AssociationRequest = 0,
    AssociationResponse = 1,
    ReassociationRequest = 2,
    ReassociationResponse = 3,
    ProbeRequest = 4,
    ProbeResponse = 5,
    TimingAdvertisement = 6,
    Beacon = 8,
    Atim = 9,
    Disassociation = 10,
    Authentication = 11,
    Deauthentication = 12,
    Action = 13,
    ActionNoAck = 14,

    #[num_enum(alternatives = [7])]
    Reserved = 15,
}

#[derive(Clone, Copy, Debug, Eq, Serialize, Deserialize, PartialEq)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: FrameType,
    pub subtype: u8,
    pub flags: u8,
}

impl FrameControl {
    pub fn new(frame_type: FrameType, subtype: u8, flags: u8) -> Self {
        Self {
            protocol_version: 0,
            frame_type,
            subtype: subtype & 0x0F,
            flags,
        }
    }

    pub fn management(subtype: ManagementSubtype) -> Self {
        Self::new(FrameType::Management, subtype as u8, 0)
    }

    pub fn to_ds(&self) -> bool {
        self.flags & flags::TO_DS != 0
    }

    pub fn from_ds(&self) -> bool {
        self.flags & flags::FROM_DS != 0
    }

    pub fn is_protected(&self) -> bool {
        self.flags & flags::PROTECTED != 0
    }

    pub fn has_order(&self) -> bool {
        self.flags & flags::ORDER != 0
    }

    pub fn is_qos_data(&self) -> bool {
        self.frame_type == FrameType::Data && self.subtype & QOS_SUBTYPE_BIT != 0
    }

    pub fn management_subtype(&self) -> Option<ManagementSubtype> {
        if self.frame_type != FrameType::Management {
            return None;
        }

        ManagementSubtype::try_from(self.subtype).ok()
    }

    /// MAC header length implied by the flags: 24 bytes, plus the fourth
    /// address when both DS bits are set, plus QoS Control for QoS data
    /// subtypes, plus HT Control when the order bit is set.
    pub fn header_length(&self) -> usize {
        let mut length = BASE_HEADER_LENGTH;
        if self.to_ds() && self.from_ds() {
            length += ADDRESS_4_LENGTH;
        }
        if self.is_qos_data() {
            length += QOS_CONTROL_LENGTH;
        }
        if self.has_order() {
            length += HT_CONTROL_LENGTH;
        }

        length
    }

    pub fn bytes(&self) -> [u8; LENGTH_BYTES] {
        [
            (self.subtype << 4) | ((self.frame_type as u8) << 2) | (self.protocol_version & 0x03),
            self.flags,
        ]
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], FrameControl> {
    let (rest, first) = le_u8().parse(input)?;
    let (rest, flags) = le_u8().parse(rest)?;

    let frame_type = FrameType::try_from((first >> 2) & 0x03)
        .map_err(|_| ParserError::ErrorVerify.to_nom(input))?;

    let control = FrameControl {
        protocol_version: first & 0x03,
        frame_type,
        subtype: (first >> 4) & 0x0F,
        flags,
    };

    Ok((rest, control))
}

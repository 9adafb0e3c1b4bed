use crate::control::FrameControl;
use crate::mac::MacAddress;
use crate::{control, mac};
use nom::IResult;
use nom::Parser;
use nom::number::le_u16;
use serde::{Deserialize, Serialize};

// MAC header shared by management and data frames
// IEEE 802.11-2020, 9.3.3.2 / 9.3.2.1
pub const LENGTH_BYTES: usize = control::BASE_HEADER_LENGTH;

pub const DURATION_LENGTH_BYTES: usize = 2;
pub const SEQUENCE_CONTROL_LENGTH_BYTES: usize = 2;

// Offsets inside the header, used by code that only needs one field.
pub const ADDRESS_1_OFFSET: usize = 4;
pub const ADDRESS_2_OFFSET: usize = 10;
pub const ADDRESS_3_OFFSET: usize = 16;

#[derive(Clone, Copy, Debug, Eq, Serialize, Deserialize, PartialEq)]
pub struct MacHeader {
    pub control: FrameControl,
    pub duration: u16,
    pub address_1: MacAddress,
    pub address_2: MacAddress,
    pub address_3: MacAddress,
    pub sequence_control: u16,
}

impl MacHeader {
    /// BSSID according to the distribution-system bits.
    /// Four-address (WDS) frames carry no BSSID.
    pub fn bssid(&self) -> Option<MacAddress> {
        match (self.control.to_ds(), self.control.from_ds()) {
            (false, false) => Some(self.address_3),
            (true, false) => Some(self.address_1),
            (false, true) => Some(self.address_2),
            (true, true) => None,
        }
    }

    pub fn transmitter(&self) -> MacAddress {
        self.address_2
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_control >> 4
    }

    pub fn bytes(&self) -> [u8; LENGTH_BYTES] {
        let mut bytes = [0u8; LENGTH_BYTES];
        bytes[..control::LENGTH_BYTES].copy_from_slice(&self.control.bytes());
        bytes[2..ADDRESS_1_OFFSET].copy_from_slice(&self.duration.to_le_bytes());
        bytes[ADDRESS_1_OFFSET..ADDRESS_2_OFFSET].copy_from_slice(self.address_1.bytes());
        bytes[ADDRESS_2_OFFSET..ADDRESS_3_OFFSET].copy_from_slice(self.address_2.bytes());
        bytes[ADDRESS_3_OFFSET..22].copy_from_slice(self.address_3.bytes());
        bytes[22..LENGTH_BYTES].copy_from_slice(&self.sequence_control.to_le_bytes());
        bytes
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], MacHeader> {
    // Frame Control. 2 bytes
    let (rest, control) = control::parse(input)?;
    // Duration / ID. 2 bytes
    let (rest, duration) = le_u16().parse(rest)?;
    // Address 1 (receiver). 6 bytes
    let (rest, address_1) = mac::parse(rest)?;
    // Address 2 (transmitter). 6 bytes
    let (rest, address_2) = mac::parse(rest)?;
    // Address 3. 6 bytes
    let (rest, address_3) = mac::parse(rest)?;
    // Sequence Control. 2 bytes
    let (rest, sequence_control) = le_u16().parse(rest)?;

    let header = MacHeader {
        control,
        duration,
        address_1,
        address_2,
        address_3,
        sequence_control,
    };

    Ok((rest, header))
}

use nom::IResult;
use nom::Parser;
use nom::bytes::{tag, take};
use nom::number::be_u16;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

// LLC/SNAP encapsulation of data frame payloads
// IEEE 802.2 + RFC 1042
pub const LENGTH_BYTES: usize = 8;

pub const SNAP_PREFIX: [u8; 3] = [0xAA, 0xAA, 0x03];
pub const OUI_LENGTH_BYTES: usize = 3;
pub const ETHER_TYPE_OFFSET: usize = 6;

#[derive(
    Clone, Copy, Debug, Display, Eq, Serialize, Deserialize, PartialEq, TryFromPrimitive,
)]
#[repr(u16)]
pub enum EtherType {
    Ipv4 = 0x0800,
    Arp = 0x0806,
    Ipv6 = 0x86DD,
    Eapol = 0x888E,
}

impl EtherType {
    pub fn bytes(&self) -> [u8; 2] {
        (*self as u16).to_be_bytes()
    }
}

#[derive(Clone, Copy, Debug, Eq, Serialize, Deserialize, PartialEq)]
pub struct Snap {
    pub oui: [u8; OUI_LENGTH_BYTES],
    pub ether_type: u16,
}

impl Snap {
    pub fn is_eapol(&self) -> bool {
        self.ether_type == EtherType::Eapol as u16
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], Snap> {
    // DSAP, SSAP, Control. 3 bytes
    let (rest, _) = tag(SNAP_PREFIX.as_slice()).parse(input)?;
    // Organization code. 3 bytes
    let (rest, oui) = take(OUI_LENGTH_BYTES).parse(rest)?;
    // EtherType. 2 bytes, network order
    let (rest, ether_type) = be_u16().parse(rest)?;

    let mut oui_bytes = [0u8; OUI_LENGTH_BYTES];
    oui_bytes.copy_from_slice(oui);

    Ok((
        rest,
        Snap {
            oui: oui_bytes,
            ether_type,
        },
    ))
}

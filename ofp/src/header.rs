// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The header common to every OpenFlow message.

use crate::parse::{DeParse, DeParseError, LengthError, Parse, ParseError, check_len};
use core::convert::Infallible;
use std::fmt::Display;
use std::num::NonZero;

/// OpenFlow 1.0 message types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display, strum::IntoStaticStr,
)]
#[repr(u8)]
pub enum MessageType {
    /// Symmetric hello.
    #[strum(serialize = "OFPT_HELLO")]
    Hello = 0,
    /// Symmetric error.
    #[strum(serialize = "OFPT_ERROR")]
    Error = 1,
    /// Symmetric echo request.
    #[strum(serialize = "OFPT_ECHO_REQUEST")]
    EchoRequest = 2,
    /// Symmetric echo reply.
    #[strum(serialize = "OFPT_ECHO_REPLY")]
    EchoReply = 3,
    /// Symmetric vendor extension.
    #[strum(serialize = "OFPT_VENDOR")]
    Vendor = 4,
    /// Controller to switch.
    #[strum(serialize = "OFPT_FEATURES_REQUEST")]
    FeaturesRequest = 5,
    /// Switch to controller.
    #[strum(serialize = "OFPT_FEATURES_REPLY")]
    FeaturesReply = 6,
    /// Controller to switch.
    #[strum(serialize = "OFPT_GET_CONFIG_REQUEST")]
    GetConfigRequest = 7,
    /// Switch to controller.
    #[strum(serialize = "OFPT_GET_CONFIG_REPLY")]
    GetConfigReply = 8,
    /// Controller to switch.
    #[strum(serialize = "OFPT_SET_CONFIG")]
    SetConfig = 9,
    /// Async, switch to controller.
    #[strum(serialize = "OFPT_PACKET_IN")]
    PacketIn = 10,
    /// Async, switch to controller.
    #[strum(serialize = "OFPT_FLOW_REMOVED")]
    FlowRemoved = 11,
    /// Async, switch to controller.
    #[strum(serialize = "OFPT_PORT_STATUS")]
    PortStatus = 12,
    /// Controller to switch.
    #[strum(serialize = "OFPT_PACKET_OUT")]
    PacketOut = 13,
    /// Controller to switch.
    #[strum(serialize = "OFPT_FLOW_MOD")]
    FlowMod = 14,
    /// Controller to switch.
    #[strum(serialize = "OFPT_PORT_MOD")]
    PortMod = 15,
    /// Controller to switch.
    #[strum(serialize = "OFPT_STATS_REQUEST")]
    StatsRequest = 16,
    /// Switch to controller.
    #[strum(serialize = "OFPT_STATS_REPLY")]
    StatsReply = 17,
    /// Controller to switch.
    #[strum(serialize = "OFPT_BARRIER_REQUEST")]
    BarrierRequest = 18,
    /// Switch to controller.
    #[strum(serialize = "OFPT_BARRIER_REPLY")]
    BarrierReply = 19,
    /// Controller to switch.
    #[strum(serialize = "OFPT_QUEUE_GET_CONFIG_REQUEST")]
    QueueGetConfigRequest = 20,
    /// Switch to controller.
    #[strum(serialize = "OFPT_QUEUE_GET_CONFIG_REPLY")]
    QueueGetConfigReply = 21,
}

impl MessageType {
    /// The wire value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value.as_u8()
    }
}

/// Display helper for a raw message type which may not be a known [`MessageType`].
#[derive(Debug, Clone, Copy)]
pub struct TypeName(pub u8);

impl Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match MessageType::from_repr(self.0) {
            Some(t) => write!(f, "{t}"),
            None => write!(f, "OFPT_UNKNOWN_{}", self.0),
        }
    }
}

/// The 8 byte header of every OpenFlow message.
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OfpHeader {
    /// Protocol version.
    pub version: u8,
    /// Raw message type, see [`OfpHeader::message_type`].
    pub msg_type: u8,
    /// Length of the whole message including this header.
    pub length: u16,
    /// Transaction id.
    pub xid: u32,
}

impl OfpHeader {
    /// Size of the header on the wire.
    #[allow(clippy::unwrap_used)] // safe due to const eval
    pub const SIZE: NonZero<usize> = NonZero::new(8).unwrap();

    /// The message type, if known.
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_repr(self.msg_type)
    }
}

impl Parse for OfpHeader {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        check_len(buf, OfpHeader::SIZE)?;
        let header = OfpHeader {
            version: buf[0],
            msg_type: buf[1],
            length: u16::from_be_bytes([buf[2], buf[3]]),
            xid: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        };
        Ok((header, OfpHeader::SIZE))
    }
}

impl DeParse for OfpHeader {
    type Error = Infallible;

    fn size(&self) -> NonZero<usize> {
        OfpHeader::SIZE
    }

    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>> {
        if buf.len() < OfpHeader::SIZE.get() {
            return Err(DeParseError::Length(LengthError {
                expected: OfpHeader::SIZE,
                actual: buf.len(),
            }));
        }
        buf[0] = self.version;
        buf[1] = self.msg_type;
        buf[2..4].copy_from_slice(&self.length.to_be_bytes());
        buf[4..8].copy_from_slice(&self.xid.to_be_bytes());
        Ok(OfpHeader::SIZE)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_back() {
        bolero::check!().with_type().for_each(|header: &OfpHeader| {
            let mut buf = [0u8; 8];
            assert_eq!(header.deparse(&mut buf).unwrap(), OfpHeader::SIZE);
            let (parsed, consumed) = OfpHeader::parse(&buf).unwrap();
            assert_eq!(consumed, OfpHeader::SIZE);
            assert_eq!(parsed, *header);
        });
    }

    #[test]
    fn big_endian_fields() {
        let (header, _) = OfpHeader::parse(&[1, 14, 0x00, 0x50, 0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.message_type(), Some(MessageType::FlowMod));
        assert_eq!(header.length, 80);
        assert_eq!(header.xid, 0xdead_beef);
    }

    #[test]
    fn short_header() {
        let err = OfpHeader::parse(&[1, 2, 3]).unwrap_err().into_length();
        assert_eq!(err.expected(), OfpHeader::SIZE);
        assert_eq!(err.actual(), 3);
    }

    #[test]
    fn type_names() {
        assert_eq!(TypeName(13).to_string(), "OFPT_PACKET_OUT");
        assert_eq!(TypeName(99).to_string(), "OFPT_UNKNOWN_99");
        for raw in 0..=21u8 {
            assert_eq!(MessageType::from_repr(raw).unwrap().as_u8(), raw);
        }
        assert_eq!(MessageType::from_repr(22), None);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Message framing and builders.
//!
//! A message is allocated at its fixed size with the header stamped and the body zeroed.
//! Builders which append a variable size tail afterwards re-stamp the length with
//! [`update_openflow_length`].

use crate::action::Action;
use crate::buffer::OfpBuf;
use crate::header::{MessageType, OfpHeader};
use crate::ofp_match::OfpMatch;
use crate::parse::{DeParse, LengthError, Parse, check_len};
use crate::port::{InPort, OFPP_NONE};
use crate::rule::{FlowFormat, Rule};
use crate::xid::XidAllocator;
use crate::{NX_VENDOR_ID, OFP_VERSION};
use std::num::NonZero;
use tracing::debug;

/// Idle or hard timeout value meaning "never expire".
pub const OFP_FLOW_PERMANENT: u16 = 0;
/// Buffer id meaning "no buffered packet".
pub const NO_BUFFER: u32 = u32::MAX;

/// Size of a Nicira vendor message header (OpenFlow header, vendor id, subtype).
pub const NICIRA_HEADER_LEN: usize = 16;
/// Size of a flow mod message without actions.
pub const FLOW_MOD_LEN: usize = 72;
/// Offset of the packet data in a packet in message.
pub const PACKET_IN_DATA_OFFSET: usize = 18;
/// Size of a packet out message without actions or packet.
pub const PACKET_OUT_LEN: usize = 16;

/// Flow mod commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum FlowModCommand {
    /// New flow.
    #[strum(serialize = "OFPFC_ADD")]
    Add = 0,
    /// Modify all matching flows.
    #[strum(serialize = "OFPFC_MODIFY")]
    Modify = 1,
    /// Modify the entry strictly matching wildcards and priority.
    #[strum(serialize = "OFPFC_MODIFY_STRICT")]
    ModifyStrict = 2,
    /// Delete all matching flows.
    #[strum(serialize = "OFPFC_DELETE")]
    Delete = 3,
    /// Delete the entry strictly matching wildcards and priority.
    #[strum(serialize = "OFPFC_DELETE_STRICT")]
    DeleteStrict = 4,
}

/// Why a packet is sent to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u8)]
pub enum PacketInReason {
    /// No matching flow.
    #[strum(serialize = "OFPR_NO_MATCH")]
    NoMatch = 0,
    /// Action explicitly output to controller.
    #[strum(serialize = "OFPR_ACTION")]
    Action = 1,
}

fn stamp(buf: &mut OfpBuf, offset: usize, header: &OfpHeader) {
    header
        .deparse(buf.at_assert(offset, OfpHeader::SIZE.get()))
        .unwrap_or_else(|_| unreachable!());
}

#[allow(clippy::cast_possible_truncation)] // bounded by the assertions
fn wire_len(len: usize) -> u16 {
    assert!(
        len >= OfpHeader::SIZE.get(),
        "message length {len} shorter than its header"
    );
    assert!(
        len <= usize::from(u16::MAX),
        "message length {len} exceeds {}",
        u16::MAX
    );
    len as u16
}

/// Append a `len` byte message of type `msg_type` with transaction id `xid` to `buf`.
///
/// Everything past the header is zeroed.
/// Returns the offset of the new message in `buf`.
///
/// # Panics
///
/// Panics if `len` is shorter than a header or longer than 65535.
pub fn put_openflow_xid(buf: &mut OfpBuf, len: usize, msg_type: MessageType, xid: u32) -> usize {
    let length = wire_len(len);
    let offset = buf.len();
    buf.put_zeros(len);
    let header = OfpHeader {
        version: OFP_VERSION,
        msg_type: msg_type.as_u8(),
        length,
        xid,
    };
    stamp(buf, offset, &header);
    offset
}

/// [`put_openflow_xid`] with a fresh transaction id.
///
/// # Panics
///
/// Panics if `len` is shorter than a header or longer than 65535.
pub fn put_openflow(buf: &mut OfpBuf, len: usize, msg_type: MessageType, xids: &XidAllocator) -> usize {
    put_openflow_xid(buf, len, msg_type, xids.alloc())
}

/// Allocate a `len` byte message of type `msg_type` with transaction id `xid`.
///
/// # Panics
///
/// Panics if `len` is shorter than a header or longer than 65535.
#[must_use]
pub fn make_openflow_xid(len: usize, msg_type: MessageType, xid: u32) -> OfpBuf {
    let mut buf = OfpBuf::with_capacity(len);
    put_openflow_xid(&mut buf, len, msg_type, xid);
    buf
}

/// [`make_openflow_xid`] with a fresh transaction id.
///
/// # Panics
///
/// Panics if `len` is shorter than a header or longer than 65535.
#[must_use]
pub fn make_openflow(len: usize, msg_type: MessageType, xids: &XidAllocator) -> OfpBuf {
    make_openflow_xid(len, msg_type, xids.alloc())
}

/// Allocate a `len` byte Nicira vendor message of the given subtype.
///
/// # Panics
///
/// Panics if `len` is shorter than a Nicira header or longer than 65535.
#[must_use]
pub fn make_nxmsg_xid(len: usize, subtype: u32, xid: u32) -> OfpBuf {
    assert!(
        len >= NICIRA_HEADER_LEN,
        "vendor message length {len} shorter than its header"
    );
    let mut buf = make_openflow_xid(len, MessageType::Vendor, xid);
    let body = buf.at_assert(OfpHeader::SIZE.get(), 8);
    body[..4].copy_from_slice(&NX_VENDOR_ID.to_be_bytes());
    body[4..].copy_from_slice(&subtype.to_be_bytes());
    buf
}

/// [`make_nxmsg_xid`] with a fresh transaction id.
///
/// # Panics
///
/// Panics if `len` is shorter than a Nicira header or longer than 65535.
#[must_use]
pub fn make_nxmsg(len: usize, subtype: u32, xids: &XidAllocator) -> OfpBuf {
    make_nxmsg_xid(len, subtype, xids.alloc())
}

fn set_length(buf: &mut OfpBuf, len: usize) {
    let length = wire_len(len);
    buf.at_assert(2, 2).copy_from_slice(&length.to_be_bytes());
}

/// Set the length of the message at the start of `buf` to the size of `buf`.
///
/// # Panics
///
/// Panics if `buf` does not start with a header or is longer than 65535 bytes.
pub fn update_openflow_length(buf: &mut OfpBuf) {
    set_length(buf, buf.len());
}

/// A flow mod for `rule` without actions.
///
/// The header length already accounts for `actions_len` bytes of actions, which the caller
/// appends.
///
/// # Panics
///
/// Panics if the message would be longer than 65535 bytes.
#[must_use]
pub fn make_flow_mod(
    command: FlowModCommand,
    rule: &Rule,
    actions_len: usize,
    xids: &XidAllocator,
) -> OfpBuf {
    let size = FLOW_MOD_LEN + actions_len;
    let mut buf = OfpBuf::with_capacity(size);
    put_openflow(&mut buf, FLOW_MOD_LEN, MessageType::FlowMod, xids);
    set_length(&mut buf, size);
    rule.to_match(FlowFormat::OpenFlow10)
        .deparse(buf.at_assert(8, OfpMatch::SIZE.get()))
        .unwrap_or_else(|_| unreachable!());
    buf.at_assert(56, 2)
        .copy_from_slice(&(command as u16).to_be_bytes());
    buf.at_assert(62, 2)
        .copy_from_slice(&rule.priority.to_be_bytes());
    buf
}

/// An add flow mod which never expires once idle for `idle_timeout` seconds elapse.
///
/// # Panics
///
/// Panics if the message would be longer than 65535 bytes.
#[must_use]
pub fn make_add_flow(
    rule: &Rule,
    buffer_id: u32,
    idle_timeout: u16,
    actions_len: usize,
    xids: &XidAllocator,
) -> OfpBuf {
    let mut buf = make_flow_mod(FlowModCommand::Add, rule, actions_len, xids);
    buf.at_assert(58, 2)
        .copy_from_slice(&idle_timeout.to_be_bytes());
    buf.at_assert(60, 2)
        .copy_from_slice(&OFP_FLOW_PERMANENT.to_be_bytes());
    buf.at_assert(64, 4).copy_from_slice(&buffer_id.to_be_bytes());
    buf
}

/// A strict delete of `rule`.
#[must_use]
pub fn make_del_flow(rule: &Rule, xids: &XidAllocator) -> OfpBuf {
    let mut buf = make_flow_mod(FlowModCommand::DeleteStrict, rule, 0, xids);
    buf.at_assert(68, 2).copy_from_slice(&OFPP_NONE.to_be_bytes());
    buf
}

/// An add flow mod whose only action outputs to `out_port`.
///
/// No action is included if `out_port` is [`OFPP_NONE`], so matching packets are dropped.
#[must_use]
pub fn make_add_simple_flow(
    rule: &Rule,
    buffer_id: u32,
    out_port: u16,
    idle_timeout: u16,
    xids: &XidAllocator,
) -> OfpBuf {
    if out_port == OFPP_NONE {
        return make_add_flow(rule, buffer_id, idle_timeout, 0, xids);
    }
    let output = Action::encode_output(out_port);
    let mut buf = make_add_flow(rule, buffer_id, idle_timeout, output.len(), xids);
    buf.put(&output);
    buf
}

/// A packet in carrying at most `max_send_len` bytes of `payload`.
///
/// The total length field always holds the size of the whole payload.
/// Packet ins are asynchronous and carry transaction id 0.
#[must_use]
pub fn make_packet_in(
    buffer_id: u32,
    in_port: u16,
    reason: PacketInReason,
    payload: &[u8],
    max_send_len: usize,
) -> OfpBuf {
    let send_len = max_send_len
        .min(payload.len())
        .min(usize::from(u16::MAX) - PACKET_IN_DATA_OFFSET);
    let mut buf = OfpBuf::with_capacity(PACKET_IN_DATA_OFFSET + send_len);
    put_openflow_xid(&mut buf, PACKET_IN_DATA_OFFSET, MessageType::PacketIn, 0);
    let total_len = u16::try_from(payload.len()).unwrap_or(u16::MAX);
    let body = buf.at_assert(8, PACKET_IN_DATA_OFFSET - 8);
    body[..4].copy_from_slice(&buffer_id.to_be_bytes());
    body[4..6].copy_from_slice(&total_len.to_be_bytes());
    body[6..8].copy_from_slice(&in_port.to_be_bytes());
    body[8] = reason as u8;
    buf.put(&payload[..send_len]);
    update_openflow_length(&mut buf);
    if send_len < payload.len() {
        debug!("packet in truncated from {} to {send_len} bytes", payload.len());
    }
    buf
}

/// A packet out applying `actions` to either `packet` or the packet buffered as `buffer_id`.
///
/// # Panics
///
/// Panics if the message would be longer than 65535 bytes.
#[must_use]
pub fn make_packet_out(
    packet: Option<&[u8]>,
    buffer_id: u32,
    in_port: InPort,
    actions: &[u8],
    xids: &XidAllocator,
) -> OfpBuf {
    let packet = packet.unwrap_or_default();
    let size = PACKET_OUT_LEN + actions.len() + packet.len();
    let mut buf = OfpBuf::with_capacity(size);
    put_openflow(&mut buf, PACKET_OUT_LEN, MessageType::PacketOut, xids);
    assert!(
        size <= usize::from(u16::MAX),
        "packet out length {size} exceeds {}",
        u16::MAX
    );
    #[allow(clippy::cast_possible_truncation)] // bounded by the assertion
    let actions_len = actions.len() as u16;
    let body = buf.at_assert(8, PACKET_OUT_LEN - 8);
    body[..4].copy_from_slice(&buffer_id.to_be_bytes());
    body[4..6].copy_from_slice(&in_port.to_wire().to_be_bytes());
    body[6..8].copy_from_slice(&actions_len.to_be_bytes());
    buf.put(actions);
    buf.put(packet);
    update_openflow_length(&mut buf);
    buf
}

/// A packet out sending `packet` to `out_port`.
#[must_use]
pub fn make_unbuffered_packet_out(
    packet: &[u8],
    in_port: InPort,
    out_port: u16,
    xids: &XidAllocator,
) -> OfpBuf {
    make_packet_out(
        Some(packet),
        NO_BUFFER,
        in_port,
        &Action::encode_output(out_port),
        xids,
    )
}

/// A packet out sending the packet buffered as `buffer_id` to `out_port`.
///
/// With `out_port` [`OFPP_NONE`] the message carries no action, which drops the packet.
#[must_use]
pub fn make_buffered_packet_out(
    buffer_id: u32,
    in_port: InPort,
    out_port: u16,
    xids: &XidAllocator,
) -> OfpBuf {
    if out_port == OFPP_NONE {
        return make_packet_out(None, buffer_id, in_port, &[], xids);
    }
    make_packet_out(
        None,
        buffer_id,
        in_port,
        &Action::encode_output(out_port),
        xids,
    )
}

/// An echo request with an empty payload.
#[must_use]
pub fn make_echo_request(xids: &XidAllocator) -> OfpBuf {
    make_openflow(OfpHeader::SIZE.get(), MessageType::EchoRequest, xids)
}

/// The reply to the echo request `request`: the same bytes with the type changed.
///
/// # Errors
///
/// Returns a [`LengthError`] if `request` is shorter than its header or than the length the
/// header declares.
pub fn make_echo_reply(request: &[u8]) -> Result<OfpBuf, LengthError> {
    let (header, _) = OfpHeader::parse(request).map_err(crate::parse::ParseError::into_length)?;
    let declared = NonZero::new(usize::from(header.length).max(OfpHeader::SIZE.get()))
        .unwrap_or(OfpHeader::SIZE);
    check_len(request, declared)?;
    let mut reply = OfpBuf::from_slice(&request[..declared.get()]);
    reply.as_mut()[1] = MessageType::EchoReply.as_u8();
    Ok(reply)
}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;
    use crate::flow::{ETH_TYPE_IP, IPPROTO_TCP};
    use crate::port::{OFPP_FLOOD, OFPP_LOCAL};
    use crate::wildcards::OfpWildcards;
    use pretty_assertions::assert_eq;

    fn header(buf: &OfpBuf) -> OfpHeader {
        OfpHeader::parse(buf.as_ref()).unwrap().0
    }

    fn be16(buf: &OfpBuf, at: usize) -> u16 {
        u16::from_be_bytes([buf.as_ref()[at], buf.as_ref()[at + 1]])
    }

    fn be32(buf: &OfpBuf, at: usize) -> u32 {
        u32::from_be_bytes(buf.as_ref()[at..at + 4].try_into().unwrap())
    }

    fn tcp_rule() -> Rule {
        let m = OfpMatch {
            wildcards: OfpWildcards::IN_PORT | OfpWildcards::DL_SRC,
            dl_type: ETH_TYPE_IP,
            nw_proto: IPPROTO_TCP,
            tp_dst: 443,
            ..OfpMatch::catchall()
        };
        Rule::from_match(&m, 100, FlowFormat::OpenFlow10, 0)
    }

    #[test]
    fn framing() {
        let xids = XidAllocator::new();
        let buf = make_openflow(24, MessageType::FeaturesRequest, &xids);
        assert_eq!(buf.len(), 24);
        assert_eq!(
            header(&buf),
            OfpHeader {
                version: OFP_VERSION,
                msg_type: MessageType::FeaturesRequest.as_u8(),
                length: 24,
                xid: 1,
            }
        );
        assert!(buf.as_ref()[8..].iter().all(|b| *b == 0));
        assert_eq!(header(&make_openflow(8, MessageType::Hello, &xids)).xid, 2);
    }

    #[test]
    fn several_messages_in_one_buffer() {
        let mut buf = OfpBuf::new();
        assert_eq!(put_openflow_xid(&mut buf, 8, MessageType::Hello, 7), 0);
        assert_eq!(put_openflow_xid(&mut buf, 16, MessageType::EchoRequest, 8), 8);
        assert_eq!(buf.len(), 24);
        let (second, _) = OfpHeader::parse(&buf.as_ref()[8..]).unwrap();
        assert_eq!(second.length, 16);
        assert_eq!(second.xid, 8);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn oversize_message_is_a_bug() {
        let _ = make_openflow_xid(70_000, MessageType::Hello, 0);
    }

    #[test]
    #[should_panic(expected = "shorter than its header")]
    fn undersize_message_is_a_bug() {
        let _ = make_openflow_xid(4, MessageType::Hello, 0);
    }

    #[test]
    fn length_update_follows_growth() {
        let mut buf = make_openflow_xid(8, MessageType::EchoRequest, 0);
        buf.put(&[1, 2, 3, 4]);
        assert_eq!(header(&buf).length, 8);
        update_openflow_length(&mut buf);
        assert_eq!(header(&buf).length, 12);
    }

    #[test]
    fn nicira_messages() {
        let buf = make_nxmsg_xid(24, 0x0d, 99);
        let hdr = header(&buf);
        assert_eq!(hdr.message_type(), Some(MessageType::Vendor));
        assert_eq!(hdr.xid, 99);
        assert_eq!(be32(&buf, 8), NX_VENDOR_ID);
        assert_eq!(be32(&buf, 12), 0x0d);
    }

    #[test]
    fn flow_mod_layout() {
        let xids = XidAllocator::new();
        let rule = tcp_rule();
        let buf = make_flow_mod(FlowModCommand::ModifyStrict, &rule, 16, &xids);
        assert_eq!(buf.len(), FLOW_MOD_LEN);
        assert_eq!(header(&buf).length, 88);
        assert_eq!(header(&buf).message_type(), Some(MessageType::FlowMod));
        let (m, _) = OfpMatch::parse(&buf.as_ref()[8..]).unwrap();
        assert_eq!(m, rule.to_match(FlowFormat::OpenFlow10));
        assert_eq!(be16(&buf, 56), FlowModCommand::ModifyStrict as u16);
        assert_eq!(be16(&buf, 62), 100);
    }

    #[test]
    fn simple_flow() {
        let xids = XidAllocator::new();
        let buf = make_add_simple_flow(&tcp_rule(), 42, OFPP_FLOOD, 60, &xids);
        assert_eq!(buf.len(), FLOW_MOD_LEN + 8);
        assert_eq!(usize::from(header(&buf).length), buf.len());
        assert_eq!(be16(&buf, 56), FlowModCommand::Add as u16);
        assert_eq!(be16(&buf, 58), 60);
        assert_eq!(be16(&buf, 60), OFP_FLOW_PERMANENT);
        assert_eq!(be32(&buf, 64), 42);
        assert_eq!(&buf.as_ref()[72..], &Action::encode_output(OFPP_FLOOD));

        let drop = make_add_simple_flow(&tcp_rule(), 42, OFPP_NONE, 60, &xids);
        assert_eq!(drop.len(), FLOW_MOD_LEN);
        assert_eq!(usize::from(header(&drop).length), FLOW_MOD_LEN);
    }

    #[test]
    fn delete_flow() {
        let buf = make_del_flow(&tcp_rule(), &XidAllocator::new());
        assert_eq!(be16(&buf, 56), FlowModCommand::DeleteStrict as u16);
        assert_eq!(be16(&buf, 68), OFPP_NONE);
    }

    #[test]
    fn packet_in_truncates_but_reports_full_length() {
        let payload: Vec<u8> = (0..200).collect();
        let buf = make_packet_in(7, 3, PacketInReason::NoMatch, &payload, 128);
        let hdr = header(&buf);
        assert_eq!(hdr.xid, 0);
        assert_eq!(usize::from(hdr.length), PACKET_IN_DATA_OFFSET + 128);
        assert_eq!(be32(&buf, 8), 7);
        assert_eq!(be16(&buf, 12), 200);
        assert_eq!(be16(&buf, 14), 3);
        assert_eq!(buf.as_ref()[16], PacketInReason::NoMatch as u8);
        assert_eq!(&buf.as_ref()[PACKET_IN_DATA_OFFSET..], &payload[..128]);

        let short = make_packet_in(7, 3, PacketInReason::Action, &payload[..10], 128);
        assert_eq!(short.len(), PACKET_IN_DATA_OFFSET + 10);
        assert_eq!(be16(&short, 12), 10);
    }

    #[test]
    fn packet_out_variants() {
        let xids = XidAllocator::new();
        let packet = [0xaa; 60];
        let buf = make_unbuffered_packet_out(&packet, InPort::Local, 2, &xids);
        assert_eq!(buf.len(), PACKET_OUT_LEN + 8 + 60);
        assert_eq!(usize::from(header(&buf).length), buf.len());
        assert_eq!(be32(&buf, 8), NO_BUFFER);
        assert_eq!(be16(&buf, 12), OFPP_LOCAL);
        assert_eq!(be16(&buf, 14), 8);
        assert_eq!(&buf.as_ref()[16..24], &Action::encode_output(2));
        assert_eq!(&buf.as_ref()[24..], &packet[..]);

        let buffered = make_buffered_packet_out(5, InPort::Number(1), 2, &xids);
        assert_eq!(buffered.len(), PACKET_OUT_LEN + 8);
        assert_eq!(be32(&buffered, 8), 5);

        let dropped = make_buffered_packet_out(5, InPort::Number(1), OFPP_NONE, &xids);
        assert_eq!(dropped.len(), PACKET_OUT_LEN);
        assert_eq!(be16(&dropped, 14), 0);
    }

    #[test]
    fn echo() {
        let xids = XidAllocator::starting_at(40);
        let request = make_echo_request(&xids);
        assert_eq!(request.len(), 8);
        assert_eq!(header(&request).xid, 40);

        let mut with_payload = make_openflow_xid(8, MessageType::EchoRequest, 0x1234);
        with_payload.put(b"ping");
        update_openflow_length(&mut with_payload);
        let reply = make_echo_reply(with_payload.as_ref()).unwrap();
        assert_eq!(header(&reply).message_type(), Some(MessageType::EchoReply));
        assert_eq!(header(&reply).xid, 0x1234);
        assert_eq!(&reply.as_ref()[1..], &with_payload.as_ref()[1..]);
    }

    #[test]
    fn echo_reply_needs_the_whole_request() {
        let request = make_openflow_xid(16, MessageType::EchoRequest, 1);
        let err = make_echo_reply(&request.as_ref()[..12]).unwrap_err();
        assert_eq!(err.expected().get(), 16);
        assert_eq!(err.actual(), 12);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Action lists.
//!
//! An action is a type-length-value record: a 16 bit type, a 16 bit length which is a non-zero
//! multiple of [`OFP_ACTION_ALIGN`], and a type dependent body.
//! Vendor actions nest a second tag (vendor id, then a Nicira subtype) in the body.
//! An action list is a plain concatenation of actions.

use crate::NX_VENDOR_ID;
use crate::buffer::OfpBuf;
use crate::debug_rl;
use crate::error::{BadActionCode, OfpError};
use crate::mac::Mac;
use crate::ratelimit::BAD_OFMSG_RL;
use crate::warn_rl;
use bytes::{BufMut, Bytes};
use std::net::Ipv4Addr;

/// Action lengths are multiples of this many bytes (one "slot").
pub const OFP_ACTION_ALIGN: usize = 8;

/// Size of the common vendor action header (type, length, vendor id, subtype, padding).
pub const NX_ACTION_HEADER_LEN: usize = 16;

/// Size of a register move or register load action.
pub const NX_ACTION_REG_LEN: usize = 24;

/// Top level action types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum ActionType {
    /// Output to switch port.
    #[strum(serialize = "OFPAT_OUTPUT")]
    Output = 0,
    /// Set the 802.1q VLAN id.
    #[strum(serialize = "OFPAT_SET_VLAN_VID")]
    SetVlanVid = 1,
    /// Set the 802.1q priority.
    #[strum(serialize = "OFPAT_SET_VLAN_PCP")]
    SetVlanPcp = 2,
    /// Strip the 802.1q header.
    #[strum(serialize = "OFPAT_STRIP_VLAN")]
    StripVlan = 3,
    /// Ethernet source address.
    #[strum(serialize = "OFPAT_SET_DL_SRC")]
    SetDlSrc = 4,
    /// Ethernet destination address.
    #[strum(serialize = "OFPAT_SET_DL_DST")]
    SetDlDst = 5,
    /// IP source address.
    #[strum(serialize = "OFPAT_SET_NW_SRC")]
    SetNwSrc = 6,
    /// IP destination address.
    #[strum(serialize = "OFPAT_SET_NW_DST")]
    SetNwDst = 7,
    /// IP ToS (DSCP field, 6 bits).
    #[strum(serialize = "OFPAT_SET_NW_TOS")]
    SetNwTos = 8,
    /// TCP/UDP source port.
    #[strum(serialize = "OFPAT_SET_TP_SRC")]
    SetTpSrc = 9,
    /// TCP/UDP destination port.
    #[strum(serialize = "OFPAT_SET_TP_DST")]
    SetTpDst = 10,
    /// Output to queue.
    #[strum(serialize = "OFPAT_ENQUEUE")]
    Enqueue = 11,
    /// Vendor extension.
    #[strum(serialize = "OFPAT_VENDOR")]
    Vendor = 0xffff,
}

/// Nicira vendor action subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum NxActionSubtype {
    /// Re-run the flow table lookup with a different input port.
    #[strum(serialize = "NXAST_RESUBMIT")]
    Resubmit = 1,
    /// Set the tunnel id.
    #[strum(serialize = "NXAST_SET_TUNNEL")]
    SetTunnel = 2,
    /// Drop ARP packets whose source does not match the Ethernet source.
    #[strum(serialize = "NXAST_DROP_SPOOFED_ARP")]
    DropSpoofedArp = 3,
    /// Set the output queue.
    #[strum(serialize = "NXAST_SET_QUEUE")]
    SetQueue = 4,
    /// Restore the queue in place before any set queue action.
    #[strum(serialize = "NXAST_POP_QUEUE")]
    PopQueue = 5,
    /// Copy a bit range between fields.
    #[strum(serialize = "NXAST_REG_MOVE")]
    RegMove = 6,
    /// Load an immediate value into a bit range.
    #[strum(serialize = "NXAST_REG_LOAD")]
    RegLoad = 7,
    /// Free form annotation, no effect on packets.
    #[strum(serialize = "NXAST_NOTE")]
    Note = 8,
}

/// Copy `n_bits` bits from `src[src_ofs..]` to `dst[dst_ofs..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NxRegMove {
    /// Number of bits to copy.
    pub n_bits: u16,
    /// Starting bit in the source field.
    pub src_ofs: u16,
    /// Starting bit in the destination field.
    pub dst_ofs: u16,
    /// Source field, as an NXM header.
    pub src: u32,
    /// Destination field, as an NXM header.
    pub dst: u32,
}

/// Load `value` into a bit range of `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NxRegLoad {
    /// Offset (upper 10 bits) and bit count minus one (lower 6 bits).
    pub ofs_nbits: u16,
    /// Destination field, as an NXM header.
    pub dst: u32,
    /// Value to load.
    pub value: u64,
}

impl NxRegLoad {
    /// Pack an offset and bit count into [`NxRegLoad::ofs_nbits`].
    #[must_use]
    pub const fn pack_ofs_nbits(ofs: u16, n_bits: u16) -> u16 {
        (ofs << 6) | (n_bits.saturating_sub(1) & 0x3f)
    }

    /// First destination bit written.
    #[must_use]
    pub const fn ofs(&self) -> u16 {
        self.ofs_nbits >> 6
    }

    /// Number of destination bits written.
    #[must_use]
    pub const fn n_bits(&self) -> u16 {
        (self.ofs_nbits & 0x3f) + 1
    }
}

/// A Nicira vendor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NxAction<'a> {
    /// Resubmit to the flow table as if received on `in_port`.
    Resubmit {
        /// New input port.
        in_port: u16,
    },
    /// Set the tunnel id.
    SetTunnel {
        /// New tunnel id.
        tun_id: u32,
    },
    /// Drop spoofed ARP packets.
    DropSpoofedArp,
    /// Set the output queue.
    SetQueue {
        /// Queue id.
        queue_id: u32,
    },
    /// Restore the original queue.
    PopQueue,
    /// Register move.
    RegMove(NxRegMove),
    /// Register load.
    RegLoad(NxRegLoad),
    /// Opaque annotation.
    Note(&'a [u8]),
}

/// A decoded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action<'a> {
    /// Output to a port.
    Output {
        /// Output port.
        port: u16,
        /// Bytes to send to the controller when `port` is the controller.
        max_len: u16,
    },
    /// Set the VLAN id (12 bits).
    SetVlanVid(u16),
    /// Set the VLAN priority (3 bits).
    SetVlanPcp(u8),
    /// Strip the VLAN header.
    StripVlan,
    /// Set the Ethernet source address.
    SetDlSrc(Mac),
    /// Set the Ethernet destination address.
    SetDlDst(Mac),
    /// Set the IP source address.
    SetNwSrc(Ipv4Addr),
    /// Set the IP destination address.
    SetNwDst(Ipv4Addr),
    /// Set the IP ToS.
    SetNwTos(u8),
    /// Set the transport source port.
    SetTpSrc(u16),
    /// Set the transport destination port.
    SetTpDst(u16),
    /// Output to a queue of a port.
    Enqueue {
        /// Output port.
        port: u16,
        /// Queue id.
        queue_id: u32,
    },
    /// Nicira vendor action.
    Nicira(NxAction<'a>),
}

fn be16(b: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([b[at], b[at + 1]])
}

fn be32(b: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn be64(b: &[u8], at: usize) -> u64 {
    (u64::from(be32(b, at)) << 32) | u64::from(be32(b, at + 4))
}

fn check_exact_len(kind: u16, len: usize, required: usize) -> Result<(), OfpError> {
    if len != required {
        debug_rl!(
            BAD_OFMSG_RL,
            "action {kind} has invalid length {len} (must be {required})"
        );
        return Err(OfpError::bad_action(BadActionCode::BadLen));
    }
    Ok(())
}

/// One action, not yet decoded.
///
/// The slice spans exactly the declared length of the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAction<'a>(&'a [u8]);

impl<'a> RawAction<'a> {
    /// Wrap the bytes of one action.
    ///
    /// Returns `None` unless `bytes` holds at least the type and length fields.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Option<RawAction<'a>> {
        (bytes.len() >= 4).then_some(RawAction(bytes))
    }

    /// The action type.
    #[must_use]
    pub fn action_type(&self) -> u16 {
        be16(self.0, 0)
    }

    /// The declared length.
    #[must_use]
    pub fn declared_len(&self) -> u16 {
        be16(self.0, 2)
    }

    /// The bytes of the action, header included.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Decode the action, checking its length and arguments.
    ///
    /// Port numbers are not checked here since their legality depends on the switch, see
    /// [`validate_actions`](crate::validate::validate_actions).
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorType::BadAction`](crate::error::ErrorType::BadAction) error describing
    /// the first problem found.
    pub fn decode(&self) -> Result<Action<'a>, OfpError> {
        let b = self.0;
        let kind = self.action_type();
        let len = b.len();
        let Some(action_type) = ActionType::from_repr(kind) else {
            warn_rl!(BAD_OFMSG_RL, "unknown action type {kind}");
            return Err(OfpError::bad_action(BadActionCode::BadType));
        };
        let action = match action_type {
            ActionType::Output => {
                check_exact_len(kind, len, 8)?;
                Action::Output {
                    port: be16(b, 4),
                    max_len: be16(b, 6),
                }
            }
            ActionType::SetVlanVid => {
                check_exact_len(kind, len, 8)?;
                let vid = be16(b, 4);
                if vid & !0x0fff != 0 {
                    return Err(OfpError::bad_action(BadActionCode::BadArgument));
                }
                Action::SetVlanVid(vid)
            }
            ActionType::SetVlanPcp => {
                check_exact_len(kind, len, 8)?;
                let pcp = b[4];
                if pcp & !0x07 != 0 {
                    return Err(OfpError::bad_action(BadActionCode::BadArgument));
                }
                Action::SetVlanPcp(pcp)
            }
            ActionType::StripVlan => {
                check_exact_len(kind, len, 8)?;
                Action::StripVlan
            }
            ActionType::SetDlSrc | ActionType::SetDlDst => {
                check_exact_len(kind, len, 16)?;
                let mac = Mac([b[4], b[5], b[6], b[7], b[8], b[9]]);
                if action_type == ActionType::SetDlSrc {
                    Action::SetDlSrc(mac)
                } else {
                    Action::SetDlDst(mac)
                }
            }
            ActionType::SetNwSrc => {
                check_exact_len(kind, len, 8)?;
                Action::SetNwSrc(Ipv4Addr::from(be32(b, 4)))
            }
            ActionType::SetNwDst => {
                check_exact_len(kind, len, 8)?;
                Action::SetNwDst(Ipv4Addr::from(be32(b, 4)))
            }
            ActionType::SetNwTos => {
                check_exact_len(kind, len, 8)?;
                Action::SetNwTos(b[4])
            }
            ActionType::SetTpSrc => {
                check_exact_len(kind, len, 8)?;
                Action::SetTpSrc(be16(b, 4))
            }
            ActionType::SetTpDst => {
                check_exact_len(kind, len, 8)?;
                Action::SetTpDst(be16(b, 4))
            }
            ActionType::Enqueue => {
                check_exact_len(kind, len, 16)?;
                Action::Enqueue {
                    port: be16(b, 4),
                    queue_id: be32(b, 12),
                }
            }
            ActionType::Vendor => {
                if len < 8 {
                    return Err(OfpError::bad_action(BadActionCode::BadLen));
                }
                if be32(b, 4) != NX_VENDOR_ID {
                    return Err(OfpError::bad_action(BadActionCode::BadVendor));
                }
                Action::Nicira(self.decode_nicira()?)
            }
        };
        Ok(action)
    }

    fn decode_nicira(&self) -> Result<NxAction<'a>, OfpError> {
        let b = self.0;
        let kind = self.action_type();
        let len = b.len();
        if len < NX_ACTION_HEADER_LEN {
            debug_rl!(BAD_OFMSG_RL, "Nicira vendor action only {len} bytes");
            return Err(OfpError::bad_action(BadActionCode::BadLen));
        }
        let Some(subtype) = NxActionSubtype::from_repr(be16(b, 8)) else {
            return Err(OfpError::bad_action(BadActionCode::BadVendorType));
        };
        let action = match subtype {
            NxActionSubtype::Resubmit => {
                check_exact_len(kind, len, NX_ACTION_HEADER_LEN)?;
                NxAction::Resubmit {
                    in_port: be16(b, 10),
                }
            }
            NxActionSubtype::SetTunnel => {
                check_exact_len(kind, len, NX_ACTION_HEADER_LEN)?;
                NxAction::SetTunnel {
                    tun_id: be32(b, 12),
                }
            }
            NxActionSubtype::DropSpoofedArp => {
                check_exact_len(kind, len, NX_ACTION_HEADER_LEN)?;
                NxAction::DropSpoofedArp
            }
            NxActionSubtype::SetQueue => {
                check_exact_len(kind, len, NX_ACTION_HEADER_LEN)?;
                NxAction::SetQueue {
                    queue_id: be32(b, 12),
                }
            }
            NxActionSubtype::PopQueue => {
                check_exact_len(kind, len, NX_ACTION_HEADER_LEN)?;
                NxAction::PopQueue
            }
            NxActionSubtype::RegMove => {
                check_exact_len(kind, len, NX_ACTION_REG_LEN)?;
                NxAction::RegMove(NxRegMove {
                    n_bits: be16(b, 10),
                    src_ofs: be16(b, 12),
                    dst_ofs: be16(b, 14),
                    src: be32(b, 16),
                    dst: be32(b, 20),
                })
            }
            NxActionSubtype::RegLoad => {
                check_exact_len(kind, len, NX_ACTION_REG_LEN)?;
                NxAction::RegLoad(NxRegLoad {
                    ofs_nbits: be16(b, 10),
                    dst: be32(b, 12),
                    value: be64(b, 16),
                })
            }
            NxActionSubtype::Note => NxAction::Note(&b[10..]),
        };
        Ok(action)
    }
}

impl Action<'_> {
    /// The bytes of an output action to `port`.
    #[must_use]
    pub const fn encode_output(port: u16) -> [u8; 8] {
        let [t0, t1] = (ActionType::Output as u16).to_be_bytes();
        let [p0, p1] = port.to_be_bytes();
        [t0, t1, 0, 8, p0, p1, 0, 0]
    }

    /// The type of this action.
    #[must_use]
    pub const fn action_type(&self) -> ActionType {
        match self {
            Action::Output { .. } => ActionType::Output,
            Action::SetVlanVid(_) => ActionType::SetVlanVid,
            Action::SetVlanPcp(_) => ActionType::SetVlanPcp,
            Action::StripVlan => ActionType::StripVlan,
            Action::SetDlSrc(_) => ActionType::SetDlSrc,
            Action::SetDlDst(_) => ActionType::SetDlDst,
            Action::SetNwSrc(_) => ActionType::SetNwSrc,
            Action::SetNwDst(_) => ActionType::SetNwDst,
            Action::SetNwTos(_) => ActionType::SetNwTos,
            Action::SetTpSrc(_) => ActionType::SetTpSrc,
            Action::SetTpDst(_) => ActionType::SetTpDst,
            Action::Enqueue { .. } => ActionType::Enqueue,
            Action::Nicira(_) => ActionType::Vendor,
        }
    }

    /// Append the wire form of this action to `buf`.
    ///
    /// Notes are zero padded to a multiple of [`OFP_ACTION_ALIGN`].
    pub fn encode(&self, buf: &mut OfpBuf) {
        let mut out = Vec::with_capacity(NX_ACTION_REG_LEN);
        out.put_u16(self.action_type() as u16);
        out.put_u16(0); // length, fixed up below
        match *self {
            Action::Output { port, max_len } => {
                out.put_u16(port);
                out.put_u16(max_len);
            }
            Action::SetVlanVid(vid) => {
                out.put_u16(vid);
                out.put_bytes(0, 2);
            }
            Action::SetVlanPcp(pcp) => {
                out.put_u8(pcp);
                out.put_bytes(0, 3);
            }
            Action::StripVlan => out.put_bytes(0, 4),
            Action::SetDlSrc(mac) | Action::SetDlDst(mac) => {
                out.put_slice(&mac.0);
                out.put_bytes(0, 6);
            }
            Action::SetNwSrc(addr) | Action::SetNwDst(addr) => out.put_u32(addr.to_bits()),
            Action::SetNwTos(tos) => {
                out.put_u8(tos);
                out.put_bytes(0, 3);
            }
            Action::SetTpSrc(port) | Action::SetTpDst(port) => {
                out.put_u16(port);
                out.put_bytes(0, 2);
            }
            Action::Enqueue { port, queue_id } => {
                out.put_u16(port);
                out.put_bytes(0, 6);
                out.put_u32(queue_id);
            }
            Action::Nicira(nx) => {
                out.put_u32(NX_VENDOR_ID);
                encode_nicira(&nx, &mut out);
            }
        }
        let padded = out.len().next_multiple_of(OFP_ACTION_ALIGN);
        out.resize(padded, 0);
        let len = u16::try_from(padded).unwrap_or(u16::MAX);
        out[2..4].copy_from_slice(&len.to_be_bytes());
        buf.put(&out);
    }
}

fn encode_nicira(nx: &NxAction<'_>, out: &mut Vec<u8>) {
    match *nx {
        NxAction::Resubmit { in_port } => {
            out.put_u16(NxActionSubtype::Resubmit as u16);
            out.put_u16(in_port);
            out.put_bytes(0, 4);
        }
        NxAction::SetTunnel { tun_id } => {
            out.put_u16(NxActionSubtype::SetTunnel as u16);
            out.put_bytes(0, 2);
            out.put_u32(tun_id);
        }
        NxAction::DropSpoofedArp => {
            out.put_u16(NxActionSubtype::DropSpoofedArp as u16);
            out.put_bytes(0, 6);
        }
        NxAction::SetQueue { queue_id } => {
            out.put_u16(NxActionSubtype::SetQueue as u16);
            out.put_bytes(0, 2);
            out.put_u32(queue_id);
        }
        NxAction::PopQueue => {
            out.put_u16(NxActionSubtype::PopQueue as u16);
            out.put_bytes(0, 6);
        }
        NxAction::RegMove(m) => {
            out.put_u16(NxActionSubtype::RegMove as u16);
            out.put_u16(m.n_bits);
            out.put_u16(m.src_ofs);
            out.put_u16(m.dst_ofs);
            out.put_u32(m.src);
            out.put_u32(m.dst);
        }
        NxAction::RegLoad(l) => {
            out.put_u16(NxActionSubtype::RegLoad as u16);
            out.put_u16(l.ofs_nbits);
            out.put_u32(l.dst);
            out.put_u64(l.value);
        }
        NxAction::Note(note) => {
            out.put_u16(NxActionSubtype::Note as u16);
            out.put_slice(note);
            if out.len() < NX_ACTION_HEADER_LEN {
                out.resize(NX_ACTION_HEADER_LEN, 0);
            }
        }
    }
}

/// A borrowed run of actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actions<'a>(&'a [u8]);

impl<'a> Actions<'a> {
    /// Wrap a run of actions.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Actions<'a> {
        Actions(bytes)
    }

    /// The raw bytes of the run.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    /// Number of [`OFP_ACTION_ALIGN`] sized slots the run spans, rounded down.
    #[must_use]
    pub fn n_slots(&self) -> usize {
        self.0.len() / OFP_ACTION_ALIGN
    }

    /// Returns true iff the run holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Walk the actions of a run which already passed
    /// [`validate_actions`](crate::validate::validate_actions).
    ///
    /// The walk trusts each declared length.
    /// It stops early, rather than reading out of bounds, if the run was not validated.
    #[must_use]
    pub fn iter(&self) -> ActionsIter<'a> {
        ActionsIter { rest: self.0 }
    }
}

impl<'a> IntoIterator for Actions<'a> {
    type Item = RawAction<'a>;
    type IntoIter = ActionsIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the actions of a validated run, see [`Actions::iter`].
#[derive(Debug, Clone)]
pub struct ActionsIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for ActionsIter<'a> {
    type Item = RawAction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < 4 {
            return None;
        }
        let len = usize::from(be16(self.rest, 2));
        if len == 0 || len > self.rest.len() {
            self.rest = &[];
            return None;
        }
        let (action, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(RawAction(action))
    }
}

/// An owned run of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionList(Bytes);

impl ActionList {
    /// Encode `actions` back to back.
    #[must_use]
    pub fn from_actions(actions: &[Action<'_>]) -> ActionList {
        let mut buf = OfpBuf::new();
        for action in actions {
            action.encode(&mut buf);
        }
        ActionList(buf.freeze())
    }

    /// Borrow the run.
    #[must_use]
    pub fn as_actions(&self) -> Actions<'_> {
        Actions(&self.0)
    }

    /// Length of the run in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true iff the run holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Bytes> for ActionList {
    fn from(value: Bytes) -> Self {
        ActionList(value)
    }
}

impl AsRef<[u8]> for ActionList {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;
    use crate::port::OFPP_CONTROLLER;
    use pretty_assertions::assert_eq;

    fn decode_one(action: Action<'_>) -> Action<'static> {
        let list = ActionList::from_actions(&[action]);
        let bytes: &'static [u8] = list.as_ref().to_vec().leak();
        RawAction::new(bytes).unwrap().decode().unwrap()
    }

    #[test]
    fn output_wire_form() {
        assert_eq!(
            Action::encode_output(OFPP_CONTROLLER),
            [0, 0, 0, 8, 0xff, 0xfd, 0, 0]
        );
        let list = ActionList::from_actions(&[Action::Output {
            port: OFPP_CONTROLLER,
            max_len: 0,
        }]);
        assert_eq!(list.as_ref(), &Action::encode_output(OFPP_CONTROLLER));
    }

    #[test]
    fn typed_actions_decode_to_themselves() {
        let actions = [
            Action::Output { port: 1, max_len: 128 },
            Action::SetVlanVid(0xabc),
            Action::SetVlanPcp(7),
            Action::StripVlan,
            Action::SetDlSrc(Mac([2, 0, 0, 0, 0, 1])),
            Action::SetDlDst(Mac([2, 0, 0, 0, 0, 2])),
            Action::SetNwSrc(Ipv4Addr::new(10, 0, 0, 1)),
            Action::SetNwDst(Ipv4Addr::new(10, 0, 0, 2)),
            Action::SetNwTos(0x28),
            Action::SetTpSrc(1000),
            Action::SetTpDst(2000),
            Action::Enqueue { port: 3, queue_id: 9 },
            Action::Nicira(NxAction::Resubmit { in_port: 4 }),
            Action::Nicira(NxAction::SetTunnel { tun_id: 0x1234 }),
            Action::Nicira(NxAction::DropSpoofedArp),
            Action::Nicira(NxAction::SetQueue { queue_id: 5 }),
            Action::Nicira(NxAction::PopQueue),
        ];
        for action in actions {
            assert_eq!(decode_one(action), action);
        }
    }

    #[test]
    fn register_actions_are_24_bytes() {
        let load = NxRegLoad {
            ofs_nbits: NxRegLoad::pack_ofs_nbits(4, 8),
            dst: 0x0001_0004,
            value: 0xab,
        };
        assert_eq!(load.ofs(), 4);
        assert_eq!(load.n_bits(), 8);
        let list = ActionList::from_actions(&[Action::Nicira(NxAction::RegLoad(load))]);
        assert_eq!(list.len(), NX_ACTION_REG_LEN);
        assert_eq!(decode_one(Action::Nicira(NxAction::RegLoad(load))), Action::Nicira(NxAction::RegLoad(load)));
    }

    #[test]
    fn notes_are_padded() {
        let list = ActionList::from_actions(&[Action::Nicira(NxAction::Note(b"hello, world"))]);
        assert_eq!(list.len(), 24);
        let raw = list.as_actions().iter().next().unwrap();
        let Action::Nicira(NxAction::Note(note)) = raw.decode().unwrap() else {
            panic!("not a note");
        };
        assert_eq!(&note[..12], b"hello, world");
        assert!(note[12..].iter().all(|b| *b == 0));
    }

    #[test]
    fn bad_arguments() {
        let mut vid = ActionList::from_actions(&[Action::SetVlanVid(0)]).as_ref().to_vec();
        vid[4] = 0x10;
        assert_eq!(
            RawAction::new(&vid).unwrap().decode(),
            Err(OfpError::bad_action(BadActionCode::BadArgument))
        );
        let pcp = ActionList::from_actions(&[Action::SetVlanPcp(8)]);
        assert_eq!(
            RawAction::new(pcp.as_ref()).unwrap().decode(),
            Err(OfpError::bad_action(BadActionCode::BadArgument))
        );
    }

    #[test]
    fn unknown_types() {
        let unknown = [0, 12, 0, 8, 0, 0, 0, 0];
        assert_eq!(
            RawAction::new(&unknown).unwrap().decode(),
            Err(OfpError::bad_action(BadActionCode::BadType))
        );
        let other_vendor = [0xff, 0xff, 0, 16, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            RawAction::new(&other_vendor).unwrap().decode(),
            Err(OfpError::bad_action(BadActionCode::BadVendor))
        );
        let bad_subtype = [0xff, 0xff, 0, 16, 0, 0, 0x23, 0x20, 0, 99, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            RawAction::new(&bad_subtype).unwrap().decode(),
            Err(OfpError::bad_action(BadActionCode::BadVendorType))
        );
        let short_nicira = [0xff, 0xff, 0, 8, 0, 0, 0x23, 0x20];
        assert_eq!(
            RawAction::new(&short_nicira).unwrap().decode(),
            Err(OfpError::bad_action(BadActionCode::BadLen))
        );
    }

    #[test]
    fn iterator_follows_declared_lengths() {
        let list = ActionList::from_actions(&[
            Action::StripVlan,
            Action::SetDlSrc(Mac::BROADCAST),
            Action::Output { port: 2, max_len: 0 },
        ]);
        let lens: Vec<_> = list
            .as_actions()
            .iter()
            .map(|a| a.declared_len())
            .collect();
        assert_eq!(lens, vec![8, 16, 8]);
        assert_eq!(list.as_actions().n_slots(), 4);
    }

    #[test]
    fn iterator_stops_on_unvalidated_garbage() {
        let bytes = [0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(Actions::new(&bytes).iter().count(), 0);
        let bytes = [0, 0, 0, 64, 0, 0, 0, 0];
        assert_eq!(Actions::new(&bytes).iter().count(), 0);
    }
}

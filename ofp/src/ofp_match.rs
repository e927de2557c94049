// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The on-the-wire match structure, its codec and its canonical form.

use crate::flow::{ETH_TYPE_ARP, ETH_TYPE_IP, IP_DSCP_MASK, IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};
use crate::mac::Mac;
use crate::parse::{DeParse, DeParseError, LengthError, Parse, ParseError, check_len};
use crate::wildcards::OfpWildcards;
use bytes::{Buf, BufMut};
use core::convert::Infallible;
use std::num::NonZero;

/// A wire match (`ofp_match`), decoded to host byte order.
///
/// The wildcard field is kept verbatim, including bits this crate does not understand, so that
/// [`OfpMatch::normalize`] and [`OfpMatch::to_literal_string`] operate on exactly what the peer
/// sent.
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OfpMatch {
    /// Wildcarded fields.
    pub wildcards: OfpWildcards,
    /// Input switch port.
    pub in_port: u16,
    /// Ethernet source address.
    pub dl_src: Mac,
    /// Ethernet destination address.
    pub dl_dst: Mac,
    /// Input VLAN id.
    pub dl_vlan: u16,
    /// Input VLAN priority.
    pub dl_vlan_pcp: u8,
    /// Ethernet frame type.
    pub dl_type: u16,
    /// IP ToS (DSCP field, 6 bits).
    pub nw_tos: u8,
    /// IP protocol or lower 8 bits of ARP opcode.
    pub nw_proto: u8,
    /// IP source address.
    pub nw_src: u32,
    /// IP destination address.
    pub nw_dst: u32,
    /// TCP/UDP source port.
    pub tp_src: u16,
    /// TCP/UDP destination port.
    pub tp_dst: u16,
}

impl Default for OfpMatch {
    fn default() -> Self {
        OfpMatch::catchall()
    }
}

impl OfpMatch {
    /// Size of the structure on the wire.
    #[allow(clippy::unwrap_used)] // safe due to const eval
    pub const SIZE: NonZero<usize> = NonZero::new(40).unwrap();

    /// A match which matches every packet.
    #[must_use]
    pub const fn catchall() -> OfpMatch {
        OfpMatch {
            wildcards: OfpWildcards::OFP_ALL,
            in_port: 0,
            dl_src: Mac::ZERO,
            dl_dst: Mac::ZERO,
            dl_vlan: 0,
            dl_vlan_pcp: 0,
            dl_type: 0,
            nw_tos: 0,
            nw_proto: 0,
            nw_src: 0,
            nw_dst: 0,
            tp_src: 0,
            tp_dst: 0,
        }
    }

    /// Canonicalize the match in place.
    ///
    /// Fields which cannot matter given the Ethernet type and IP protocol are zeroed and, where
    /// that does not change which packets match, wildcarded.
    /// Wildcarded fields are zeroed, every fully wildcarded address count becomes exactly 32 and
    /// wildcard bits outside [`OfpWildcards::OVS_ALL`] are dropped.
    ///
    /// Two matches describing the same set of packets normalize to the same value, and
    /// normalizing is idempotent.
    pub fn normalize(&mut self) {
        let mut wc = self.wildcards & OfpWildcards::OVS_ALL;
        if wc.contains(OfpWildcards::DL_TYPE) {
            // no network or transport matching without a known frame type
            self.dl_type = 0;
            wc |= OfpWildcards::NW | OfpWildcards::TP;
            self.zero_nw();
            self.zero_tp();
        } else if self.dl_type == ETH_TYPE_IP {
            if wc.contains(OfpWildcards::NW_PROTO) {
                self.nw_proto = 0;
                wc |= OfpWildcards::TP;
                self.zero_tp();
            } else if matches!(self.nw_proto, IPPROTO_TCP | IPPROTO_UDP | IPPROTO_ICMP) {
                if wc.contains(OfpWildcards::TP_SRC) {
                    self.tp_src = 0;
                }
                if wc.contains(OfpWildcards::TP_DST) {
                    self.tp_dst = 0;
                }
            } else {
                // always extracted as zero, so an exact match is equivalent
                wc.remove(OfpWildcards::TP);
                self.zero_tp();
            }
            self.mask_nw_addrs(wc);
            if wc.contains(OfpWildcards::NW_TOS) {
                self.nw_tos = 0;
            } else {
                self.nw_tos &= IP_DSCP_MASK;
            }
        } else if self.dl_type == ETH_TYPE_ARP {
            if wc.contains(OfpWildcards::NW_PROTO) {
                self.nw_proto = 0;
            }
            self.mask_nw_addrs(wc);
            self.nw_tos = 0;
            self.zero_tp();
        } else {
            wc |= OfpWildcards::NW | OfpWildcards::TP;
            self.zero_nw();
            self.zero_tp();
        }
        if wc.contains(OfpWildcards::DL_SRC) {
            self.dl_src = Mac::ZERO;
        }
        if wc.contains(OfpWildcards::DL_DST) {
            self.dl_dst = Mac::ZERO;
        }
        if wc.contains(OfpWildcards::IN_PORT) {
            self.in_port = 0;
        }
        if wc.contains(OfpWildcards::DL_VLAN) {
            self.dl_vlan = 0;
        }
        if wc.contains(OfpWildcards::DL_VLAN_PCP) {
            self.dl_vlan_pcp = 0;
        }
        self.wildcards = wc
            .with_nw_src_bits(wc.nw_src_bits().min(OfpWildcards::NW_ALL_BITS))
            .with_nw_dst_bits(wc.nw_dst_bits().min(OfpWildcards::NW_ALL_BITS));
    }

    /// A normalized copy of the match.
    #[must_use]
    pub fn normalized(mut self) -> OfpMatch {
        self.normalize();
        self
    }

    fn zero_nw(&mut self) {
        self.nw_src = 0;
        self.nw_dst = 0;
        self.nw_proto = 0;
        self.nw_tos = 0;
    }

    fn zero_tp(&mut self) {
        self.tp_src = 0;
        self.tp_dst = 0;
    }

    fn mask_nw_addrs(&mut self, wc: OfpWildcards) {
        self.nw_src &= wc.nw_src_netmask();
        self.nw_dst &= wc.nw_dst_netmask();
    }

    /// Render every field at a fixed position without interpreting the wildcards.
    ///
    /// Two renderings placed one above the other line up column for column.
    #[must_use]
    pub fn to_literal_string(&self) -> String {
        format!(
            "wildcards={:#10x}  in_port={:5}  dl_src={}  dl_dst={}  dl_vlan={:5}  \
             dl_vlan_pcp={:3}  dl_type={:#6x}  nw_tos={:#4x}  nw_proto={:#4x}  \
             nw_src={:#10x}  nw_dst={:#10x}  tp_src={:5}  tp_dst={:5}",
            self.wildcards.bits(),
            self.in_port,
            self.dl_src,
            self.dl_dst,
            self.dl_vlan,
            self.dl_vlan_pcp,
            self.dl_type,
            self.nw_tos,
            self.nw_proto,
            self.nw_src,
            self.nw_dst,
            self.tp_src,
            self.tp_dst,
        )
    }
}

impl Parse for OfpMatch {
    type Error = Infallible;

    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>> {
        check_len(buf, OfpMatch::SIZE)?;
        let mut cur = &buf[..OfpMatch::SIZE.get()];
        let wildcards = OfpWildcards::from_bits_retain(cur.get_u32());
        let in_port = cur.get_u16();
        let mut dl_src = [0u8; 6];
        cur.copy_to_slice(&mut dl_src);
        let mut dl_dst = [0u8; 6];
        cur.copy_to_slice(&mut dl_dst);
        let dl_vlan = cur.get_u16();
        let dl_vlan_pcp = cur.get_u8();
        cur.advance(1);
        let dl_type = cur.get_u16();
        let nw_tos = cur.get_u8();
        let nw_proto = cur.get_u8();
        cur.advance(2);
        let parsed = OfpMatch {
            wildcards,
            in_port,
            dl_src: Mac(dl_src),
            dl_dst: Mac(dl_dst),
            dl_vlan,
            dl_vlan_pcp,
            dl_type,
            nw_tos,
            nw_proto,
            nw_src: cur.get_u32(),
            nw_dst: cur.get_u32(),
            tp_src: cur.get_u16(),
            tp_dst: cur.get_u16(),
        };
        Ok((parsed, OfpMatch::SIZE))
    }
}

impl DeParse for OfpMatch {
    type Error = Infallible;

    fn size(&self) -> NonZero<usize> {
        OfpMatch::SIZE
    }

    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>> {
        if buf.len() < OfpMatch::SIZE.get() {
            return Err(DeParseError::Length(LengthError {
                expected: OfpMatch::SIZE,
                actual: buf.len(),
            }));
        }
        let mut out = &mut buf[..OfpMatch::SIZE.get()];
        out.put_u32(self.wildcards.bits());
        out.put_u16(self.in_port);
        out.put_slice(&self.dl_src.0);
        out.put_slice(&self.dl_dst.0);
        out.put_u16(self.dl_vlan);
        out.put_u8(self.dl_vlan_pcp);
        out.put_u8(0);
        out.put_u16(self.dl_type);
        out.put_u8(self.nw_tos);
        out.put_u8(self.nw_proto);
        out.put_bytes(0, 2);
        out.put_u32(self.nw_src);
        out.put_u32(self.nw_dst);
        out.put_u16(self.tp_src);
        out.put_u16(self.tp_dst);
        Ok(OfpMatch::SIZE)
    }
}

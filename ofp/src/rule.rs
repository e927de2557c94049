// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Classifier rules and their conversion to and from wire matches.

use crate::flow::Flow;
use crate::mac::Mac;
use crate::ofp_match::OfpMatch;
use crate::port::InPort;
use crate::wildcards::{FlowWildcardBits, FlowWildcards, OfpWildcards};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tracing::trace;

/// How a flow is expressed on the wire.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum FlowFormat {
    /// Plain OpenFlow 1.0 matching, no tunnel id.
    #[default]
    #[serde(rename = "openflow10")]
    #[strum(serialize = "openflow10")]
    OpenFlow10,
    /// OpenFlow 1.0 matching with the tunnel id carried in the upper 32 bits of the cookie.
    #[serde(rename = "tun_id_from_cookie")]
    #[strum(serialize = "tun_id_from_cookie")]
    TunIdFromCookie,
}

impl FlowFormat {
    /// The wire wildcard bits which are meaningful in this format.
    #[must_use]
    pub const fn legal_wildcards(self) -> OfpWildcards {
        match self {
            FlowFormat::OpenFlow10 => OfpWildcards::OFP_ALL,
            FlowFormat::TunIdFromCookie => OfpWildcards::OVS_ALL,
        }
    }
}

/// A flow, the fields of it which matter, and a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rule {
    /// Field values.
    pub flow: Flow,
    /// Ignored fields.
    pub wc: FlowWildcards,
    /// Priority among overlapping rules, higher wins.
    pub priority: u16,
}

impl Rule {
    /// Build a rule from a wire match.
    ///
    /// An exact match (no legal wildcard bit set) always gets priority [`u16::MAX`].
    /// With [`FlowFormat::TunIdFromCookie`] and an exact tunnel id, the tunnel id is the upper
    /// half of `cookie`.
    /// Wildcarded fields are zero in the resulting flow.
    #[must_use]
    pub fn from_match(m: &OfpMatch, priority: u16, format: FlowFormat, cookie: u64) -> Rule {
        let ofpfw = m.wildcards & format.legal_wildcards();
        let priority = if ofpfw.is_empty() { u16::MAX } else { priority };

        let mut wc = FlowWildcards::from_ofp(ofpfw);
        let tun_id = match format {
            #[allow(clippy::cast_possible_truncation)] // upper half only
            FlowFormat::TunIdFromCookie if !ofpfw.contains(OfpWildcards::TUN_ID) => {
                (cookie >> 32) as u32
            }
            _ => {
                wc.wildcards |= FlowWildcardBits::TUN_ID;
                0
            }
        };

        let flow = Flow {
            tun_id,
            nw_src: Ipv4Addr::from(m.nw_src),
            nw_dst: Ipv4Addr::from(m.nw_dst),
            in_port: InPort::from_wire(m.in_port),
            dl_vlan: m.dl_vlan,
            dl_vlan_pcp: m.dl_vlan_pcp,
            dl_type: m.dl_type,
            tp_src: m.tp_src,
            tp_dst: m.tp_dst,
            dl_src: m.dl_src,
            dl_dst: m.dl_dst,
            nw_proto: m.nw_proto,
            nw_tos: m.nw_tos,
            ..Flow::default()
        };

        let mut rule = Rule { flow, wc, priority };
        rule.zero_wildcarded_fields();
        trace!("rule from match: {rule:?}");
        rule
    }

    /// Express the rule as a wire match.
    ///
    /// The tunnel id wildcard bit is only emitted with [`FlowFormat::TunIdFromCookie`].
    ///
    /// # Panics
    ///
    /// Panics if either address mask of the rule is not a CIDR mask.
    /// Rules built by [`Rule::from_match`] always have CIDR masks.
    #[must_use]
    pub fn to_match(&self, format: FlowFormat) -> OfpMatch {
        let wildcards = self
            .wc
            .to_ofp(matches!(format, FlowFormat::TunIdFromCookie));
        OfpMatch {
            wildcards,
            in_port: self.flow.in_port.to_wire(),
            dl_src: self.flow.dl_src,
            dl_dst: self.flow.dl_dst,
            dl_vlan: self.flow.dl_vlan,
            dl_vlan_pcp: self.flow.dl_vlan_pcp,
            dl_type: self.flow.dl_type,
            nw_tos: self.flow.nw_tos,
            nw_proto: self.flow.nw_proto,
            nw_src: self.flow.nw_src.to_bits(),
            nw_dst: self.flow.nw_dst.to_bits(),
            tp_src: self.flow.tp_src,
            tp_dst: self.flow.tp_dst,
        }
    }

    /// Zero every flow field the wildcards mark as ignored.
    ///
    /// Ethernet destination is handled in two parts: [`FlowWildcardBits::DL_DST`] clears all but
    /// the multicast bit, [`FlowWildcardBits::ETH_MCAST`] clears the multicast bit.
    pub fn zero_wildcarded_fields(&mut self) {
        let wc = self.wc.wildcards;
        let flow = &mut self.flow;
        if wc.contains(FlowWildcardBits::TUN_ID) {
            flow.tun_id = 0;
        }
        for (reg, mask) in flow.regs.iter_mut().zip(self.wc.reg_masks) {
            *reg &= mask;
        }
        flow.nw_src = Ipv4Addr::from(flow.nw_src.to_bits() & self.wc.nw_src_mask);
        flow.nw_dst = Ipv4Addr::from(flow.nw_dst.to_bits() & self.wc.nw_dst_mask);
        if wc.contains(FlowWildcardBits::IN_PORT) {
            flow.in_port = InPort::Number(0);
        }
        if wc.contains(FlowWildcardBits::DL_VLAN) {
            flow.dl_vlan = 0;
        }
        if wc.contains(FlowWildcardBits::DL_VLAN_PCP) {
            flow.dl_vlan_pcp = 0;
        }
        if wc.contains(FlowWildcardBits::DL_TYPE) {
            flow.dl_type = 0;
        }
        if wc.contains(FlowWildcardBits::TP_SRC) {
            flow.tp_src = 0;
        }
        if wc.contains(FlowWildcardBits::TP_DST) {
            flow.tp_dst = 0;
        }
        if wc.contains(FlowWildcardBits::DL_SRC) {
            flow.dl_src = Mac::ZERO;
        }
        if wc.contains(FlowWildcardBits::DL_DST) {
            flow.dl_dst = flow.dl_dst.multicast_bit_only();
        }
        if wc.contains(FlowWildcardBits::ETH_MCAST) {
            flow.dl_dst = flow.dl_dst.without_multicast_bit();
        }
        if wc.contains(FlowWildcardBits::NW_PROTO) {
            flow.nw_proto = 0;
        }
        if wc.contains(FlowWildcardBits::NW_TOS) {
            flow.nw_tos = 0;
        }
    }
}

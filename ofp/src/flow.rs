// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The header fields a rule matches on.

use crate::mac::Mac;
use crate::port::InPort;
use crate::wildcards::FLOW_N_REGS;
use etherparse::{EtherType, IpNumber};
use std::net::Ipv4Addr;

/// Ethernet type of IPv4 frames, in host byte order.
pub const ETH_TYPE_IP: u16 = EtherType::IPV4.0;
/// Ethernet type of ARP frames, in host byte order.
pub const ETH_TYPE_ARP: u16 = EtherType::ARP.0;
/// IP protocol number of TCP.
pub const IPPROTO_TCP: u8 = IpNumber::TCP.0;
/// IP protocol number of UDP.
pub const IPPROTO_UDP: u8 = IpNumber::UDP.0;
/// IP protocol number of ICMP.
pub const IPPROTO_ICMP: u8 = IpNumber::ICMP.0;
/// The bits of the IP ToS byte which carry the DSCP.
pub const IP_DSCP_MASK: u8 = 0xfc;

/// Protocol header fields extracted from a packet or a match.
///
/// All values are in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flow {
    /// Tunnel id (Nicira extension).
    pub tun_id: u32,
    /// Extension registers.
    pub regs: [u32; FLOW_N_REGS],
    /// IP source address.
    pub nw_src: Ipv4Addr,
    /// IP destination address.
    pub nw_dst: Ipv4Addr,
    /// Ingress port.
    pub in_port: InPort,
    /// VLAN id.
    pub dl_vlan: u16,
    /// VLAN priority.
    pub dl_vlan_pcp: u8,
    /// Ethernet frame type.
    pub dl_type: u16,
    /// TCP/UDP source port (ICMP type).
    pub tp_src: u16,
    /// TCP/UDP destination port (ICMP code).
    pub tp_dst: u16,
    /// Ethernet source address.
    pub dl_src: Mac,
    /// Ethernet destination address.
    pub dl_dst: Mac,
    /// IP protocol (ARP opcode, low 8 bits).
    pub nw_proto: u8,
    /// IP ToS, DSCP bits only.
    pub nw_tos: u8,
}

impl Default for Flow {
    fn default() -> Self {
        Flow {
            tun_id: 0,
            regs: [0; FLOW_N_REGS],
            nw_src: Ipv4Addr::UNSPECIFIED,
            nw_dst: Ipv4Addr::UNSPECIFIED,
            in_port: InPort::default(),
            dl_vlan: 0,
            dl_vlan_pcp: 0,
            dl_type: 0,
            tp_src: 0,
            tp_dst: 0,
            dl_src: Mac::ZERO,
            dl_dst: Mac::ZERO,
            nw_proto: 0,
            nw_tos: 0,
        }
    }
}

impl Flow {
    /// Returns true iff the flow describes an IPv4 packet.
    #[must_use]
    pub fn is_ip(&self) -> bool {
        self.dl_type == ETH_TYPE_IP
    }

    /// Returns true iff the flow describes an ARP packet.
    #[must_use]
    pub fn is_arp(&self) -> bool {
        self.dl_type == ETH_TYPE_ARP
    }

    /// Returns true iff the flow describes an IPv4 packet of protocol `proto`.
    #[must_use]
    pub fn is_ip_proto(&self, proto: u8) -> bool {
        self.is_ip() && self.nw_proto == proto
    }
}

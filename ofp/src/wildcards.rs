// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Wildcard bit sets: the wire encoding ([`OfpWildcards`]) and the internal one
//! ([`FlowWildcardBits`] inside [`FlowWildcards`]).
//!
//! Several bits have the same value and meaning in both encodings.
//! Those are listed in [`INVARIANT_BITS`] and checked at compile time.

use crate::netmask::{netmask_to_wcbits, wcbits_to_netmask};
use bitflags::bitflags;
use static_assertions::const_assert_eq;

/// Number of extension registers a flow may match on.
pub const FLOW_N_REGS: usize = 4;

bitflags! {
    /// The wildcard field of an on-the-wire match.
    ///
    /// A set bit means "ignore this field".
    /// The two L3 address sub-fields are counts rather than flags, see
    /// [`OfpWildcards::nw_src_bits`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OfpWildcards: u32 {
        /// Switch input port.
        const IN_PORT = 1 << 0;
        /// VLAN id.
        const DL_VLAN = 1 << 1;
        /// Ethernet source address.
        const DL_SRC = 1 << 2;
        /// Ethernet destination address.
        const DL_DST = 1 << 3;
        /// Ethernet frame type.
        const DL_TYPE = 1 << 4;
        /// IP protocol.
        const NW_PROTO = 1 << 5;
        /// TCP/UDP source port.
        const TP_SRC = 1 << 6;
        /// TCP/UDP destination port.
        const TP_DST = 1 << 7;
        /// Wildcarded bit count of the IP source address.
        const NW_SRC_MASK = 0x3f << OfpWildcards::NW_SRC_SHIFT;
        /// Wildcarded bit count of the IP destination address.
        const NW_DST_MASK = 0x3f << OfpWildcards::NW_DST_SHIFT;
        /// VLAN priority.
        const DL_VLAN_PCP = 1 << 20;
        /// IP ToS (DSCP field, 6 bits).
        const NW_TOS = 1 << 21;
        /// Tunnel id, Nicira extension (only meaningful with [`FlowFormat::TunIdFromCookie`]).
        ///
        /// [`FlowFormat::TunIdFromCookie`]: crate::rule::FlowFormat::TunIdFromCookie
        const TUN_ID = 1 << 22;
    }
}

impl OfpWildcards {
    /// Bit offset of the IP source wildcard count.
    pub const NW_SRC_SHIFT: u32 = 8;
    /// Bit offset of the IP destination wildcard count.
    pub const NW_DST_SHIFT: u32 = 14;
    /// Wildcard count which ignores an entire IPv4 address.
    pub const NW_ALL_BITS: u32 = 32;

    /// Every bit legal in plain OpenFlow 1.0.
    pub const OFP_ALL: OfpWildcards = OfpWildcards::from_bits_retain((1 << 22) - 1);
    /// Every bit legal when the tunnel id travels in the cookie.
    pub const OVS_ALL: OfpWildcards =
        OfpWildcards::from_bits_retain(OfpWildcards::OFP_ALL.bits() | OfpWildcards::TUN_ID.bits());

    /// All bits related to the network layer.
    pub const NW: OfpWildcards = OfpWildcards::NW_SRC_MASK
        .union(OfpWildcards::NW_DST_MASK)
        .union(OfpWildcards::NW_PROTO)
        .union(OfpWildcards::NW_TOS);
    /// All bits related to the transport layer.
    pub const TP: OfpWildcards = OfpWildcards::TP_SRC.union(OfpWildcards::TP_DST);

    /// The number of wildcarded trailing bits of the IP source address.
    #[must_use]
    pub const fn nw_src_bits(self) -> u32 {
        (self.bits() >> OfpWildcards::NW_SRC_SHIFT) & 0x3f
    }

    /// The number of wildcarded trailing bits of the IP destination address.
    #[must_use]
    pub const fn nw_dst_bits(self) -> u32 {
        (self.bits() >> OfpWildcards::NW_DST_SHIFT) & 0x3f
    }

    /// The netmask implied by [`OfpWildcards::nw_src_bits`].
    #[must_use]
    pub const fn nw_src_netmask(self) -> u32 {
        wcbits_to_netmask(self.nw_src_bits())
    }

    /// The netmask implied by [`OfpWildcards::nw_dst_bits`].
    #[must_use]
    pub const fn nw_dst_netmask(self) -> u32 {
        wcbits_to_netmask(self.nw_dst_bits())
    }

    /// Replace the IP source wildcard count.
    #[must_use]
    pub const fn with_nw_src_bits(self, n: u32) -> OfpWildcards {
        let cleared = self.bits() & !OfpWildcards::NW_SRC_MASK.bits();
        OfpWildcards::from_bits_retain(cleared | ((n & 0x3f) << OfpWildcards::NW_SRC_SHIFT))
    }

    /// Replace the IP destination wildcard count.
    #[must_use]
    pub const fn with_nw_dst_bits(self, n: u32) -> OfpWildcards {
        let cleared = self.bits() & !OfpWildcards::NW_DST_MASK.bits();
        OfpWildcards::from_bits_retain(cleared | ((n & 0x3f) << OfpWildcards::NW_DST_SHIFT))
    }
}

bitflags! {
    /// Internal "ignore this field" flags of a [`FlowWildcards`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlowWildcardBits: u32 {
        /// Switch input port.
        const IN_PORT = 1 << 0;
        /// VLAN id.
        const DL_VLAN = 1 << 1;
        /// Ethernet source address.
        const DL_SRC = 1 << 2;
        /// Ethernet destination address, excluding the multicast bit.
        const DL_DST = 1 << 3;
        /// Ethernet frame type.
        const DL_TYPE = 1 << 4;
        /// IP protocol.
        const NW_PROTO = 1 << 5;
        /// TCP/UDP source port.
        const TP_SRC = 1 << 6;
        /// TCP/UDP destination port.
        const TP_DST = 1 << 7;
        /// VLAN priority (same meaning as the wire bit, different value).
        const DL_VLAN_PCP = 1 << 8;
        /// IP ToS (same meaning as the wire bit, different value).
        const NW_TOS = 1 << 9;
        /// Tunnel id.
        const TUN_ID = 1 << 10;
        /// Multicast bit of the Ethernet destination address.
        const ETH_MCAST = 1 << 11;
    }
}

/// Pairs of bits which carry identical meaning and value in both encodings.
pub const INVARIANT_BITS: [(FlowWildcardBits, OfpWildcards); 8] = [
    (FlowWildcardBits::IN_PORT, OfpWildcards::IN_PORT),
    (FlowWildcardBits::DL_VLAN, OfpWildcards::DL_VLAN),
    (FlowWildcardBits::DL_SRC, OfpWildcards::DL_SRC),
    (FlowWildcardBits::DL_DST, OfpWildcards::DL_DST),
    (FlowWildcardBits::DL_TYPE, OfpWildcards::DL_TYPE),
    (FlowWildcardBits::NW_PROTO, OfpWildcards::NW_PROTO),
    (FlowWildcardBits::TP_SRC, OfpWildcards::TP_SRC),
    (FlowWildcardBits::TP_DST, OfpWildcards::TP_DST),
];

const_assert_eq!(FlowWildcardBits::IN_PORT.bits(), OfpWildcards::IN_PORT.bits());
const_assert_eq!(FlowWildcardBits::DL_VLAN.bits(), OfpWildcards::DL_VLAN.bits());
const_assert_eq!(FlowWildcardBits::DL_SRC.bits(), OfpWildcards::DL_SRC.bits());
const_assert_eq!(FlowWildcardBits::DL_DST.bits(), OfpWildcards::DL_DST.bits());
const_assert_eq!(FlowWildcardBits::DL_TYPE.bits(), OfpWildcards::DL_TYPE.bits());
const_assert_eq!(FlowWildcardBits::NW_PROTO.bits(), OfpWildcards::NW_PROTO.bits());
const_assert_eq!(FlowWildcardBits::TP_SRC.bits(), OfpWildcards::TP_SRC.bits());
const_assert_eq!(FlowWildcardBits::TP_DST.bits(), OfpWildcards::TP_DST.bits());

/// The union of [`INVARIANT_BITS`] (the value is shared by both encodings).
pub const WC_INVARIANTS: u32 = (1 << 8) - 1;

const_assert_eq!(
    WC_INVARIANTS,
    FlowWildcardBits::IN_PORT
        .union(FlowWildcardBits::DL_VLAN)
        .union(FlowWildcardBits::DL_SRC)
        .union(FlowWildcardBits::DL_DST)
        .union(FlowWildcardBits::DL_TYPE)
        .union(FlowWildcardBits::NW_PROTO)
        .union(FlowWildcardBits::TP_SRC)
        .union(FlowWildcardBits::TP_DST)
        .bits()
);

/// The wildcards of a [`Rule`](crate::rule::Rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlowWildcards {
    /// Ignored fields.
    pub wildcards: FlowWildcardBits,
    /// Bits of each register which must match (reserved, always zero here).
    pub reg_masks: [u32; FLOW_N_REGS],
    /// Bits of the IP source address which must match.
    pub nw_src_mask: u32,
    /// Bits of the IP destination address which must match.
    pub nw_dst_mask: u32,
}

impl FlowWildcards {
    /// Wildcards which match every field exactly.
    #[must_use]
    pub const fn exact() -> FlowWildcards {
        FlowWildcards {
            wildcards: FlowWildcardBits::empty(),
            reg_masks: [u32::MAX; FLOW_N_REGS],
            nw_src_mask: u32::MAX,
            nw_dst_mask: u32::MAX,
        }
    }

    /// Wildcards which ignore every field.
    #[must_use]
    pub const fn catchall() -> FlowWildcards {
        FlowWildcards {
            wildcards: FlowWildcardBits::all(),
            reg_masks: [0; FLOW_N_REGS],
            nw_src_mask: 0,
            nw_dst_mask: 0,
        }
    }

    /// Translate the internal wildcards to the wire encoding.
    ///
    /// The tunnel id bit is only emitted when `with_tun_id` is set.
    #[must_use]
    pub fn to_ofp(&self, with_tun_id: bool) -> OfpWildcards {
        let mut ofpfw = OfpWildcards::from_bits_retain(self.wildcards.bits() & WC_INVARIANTS)
            .with_nw_src_bits(netmask_to_wcbits(self.nw_src_mask))
            .with_nw_dst_bits(netmask_to_wcbits(self.nw_dst_mask));
        if self.wildcards.contains(FlowWildcardBits::DL_VLAN_PCP) {
            ofpfw |= OfpWildcards::DL_VLAN_PCP;
        }
        if self.wildcards.contains(FlowWildcardBits::NW_TOS) {
            ofpfw |= OfpWildcards::NW_TOS;
        }
        if with_tun_id && self.wildcards.contains(FlowWildcardBits::TUN_ID) {
            ofpfw |= OfpWildcards::TUN_ID;
        }
        ofpfw
    }

    /// Translate wire wildcards (already masked to the legal bits) to the internal encoding.
    ///
    /// The tunnel id bit is left for the caller to decide.
    #[must_use]
    pub fn from_ofp(ofpfw: OfpWildcards) -> FlowWildcards {
        let mut wildcards = FlowWildcardBits::from_bits_retain(ofpfw.bits() & WC_INVARIANTS);
        if ofpfw.contains(OfpWildcards::DL_VLAN_PCP) {
            wildcards |= FlowWildcardBits::DL_VLAN_PCP;
        }
        if ofpfw.contains(OfpWildcards::NW_TOS) {
            wildcards |= FlowWildcardBits::NW_TOS;
        }
        if ofpfw.contains(OfpWildcards::DL_DST) {
            // the wire bit covers the whole address, internally the multicast bit is separate
            wildcards |= FlowWildcardBits::ETH_MCAST;
        }
        FlowWildcards {
            wildcards,
            reg_masks: [0; FLOW_N_REGS],
            nw_src_mask: ofpfw.nw_src_netmask(),
            nw_dst_mask: ofpfw.nw_dst_netmask(),
        }
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use super::OfpWildcards;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for OfpWildcards {
        fn generate<D: Driver>(u: &mut D) -> Option<Self> {
            Some(OfpWildcards::from_bits_retain(u.produce()?))
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Nicira extensible match (NXM) fields, as named by register move and register load actions.
//!
//! An NXM header packs `vendor:16 field:7 hasmask:1 length:8` into 32 bits.

use crate::action::{NxRegLoad, NxRegMove};
use crate::error::{BadActionCode, OfpError};
use crate::flow::{Flow, IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};
use crate::ratelimit::BAD_OFMSG_RL;
use crate::warn_rl;

/// Build an NXM header.
#[must_use]
pub const fn nxm_header(vendor: u16, field: u8, length: u8) -> u32 {
    ((vendor as u32) << 16) | (((field & 0x7f) as u32) << 9) | (length as u32)
}

/// The vendor of an NXM header.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // masked or shifted into range
pub const fn nxm_vendor(header: u32) -> u16 {
    (header >> 16) as u16
}

/// The field number of an NXM header.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // masked or shifted into range
pub const fn nxm_field(header: u32) -> u8 {
    ((header >> 9) & 0x7f) as u8
}

/// Returns true iff the header describes a masked field.
#[must_use]
pub const fn nxm_hasmask(header: u32) -> bool {
    (header >> 8) & 1 == 1
}

/// The payload length in bytes of an NXM header.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // masked or shifted into range
pub const fn nxm_length(header: u32) -> u8 {
    (header & 0xff) as u8
}

/// What a flow must look like for a field to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prereq {
    /// Always present.
    None,
    /// IPv4 packets only.
    Ip,
    /// IPv4 packets of the given protocol only.
    IpProto(u8),
    /// ARP packets only.
    Arp,
}

impl Prereq {
    /// Returns true iff `flow` satisfies the prerequisite.
    #[must_use]
    pub fn is_met(self, flow: &Flow) -> bool {
        match self {
            Prereq::None => true,
            Prereq::Ip => flow.is_ip(),
            Prereq::IpProto(proto) => flow.is_ip_proto(proto),
            Prereq::Arp => flow.is_arp(),
        }
    }
}

/// A known NXM field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NxmField {
    /// Conventional name.
    pub name: &'static str,
    /// Unmasked header.
    pub header: u32,
    /// Presence requirement.
    pub prereq: Prereq,
    /// Whether actions may write to the field.
    pub writable: bool,
}

impl NxmField {
    /// Width of the field in bits.
    #[must_use]
    pub const fn n_bits(&self) -> u32 {
        nxm_length(self.header) as u32 * 8
    }
}

const fn of(name: &'static str, field: u8, len: u8, prereq: Prereq) -> NxmField {
    NxmField {
        name,
        header: nxm_header(0x0000, field, len),
        prereq,
        writable: false,
    }
}

const fn nx(name: &'static str, field: u8, len: u8) -> NxmField {
    NxmField {
        name,
        header: nxm_header(0x0001, field, len),
        prereq: Prereq::None,
        writable: true,
    }
}

/// The VLAN TCI field, the only writable OpenFlow field.
pub const NXM_OF_VLAN_TCI: NxmField = NxmField {
    writable: true,
    ..of("NXM_OF_VLAN_TCI", 4, 2, Prereq::None)
};

/// Every field this crate knows.
pub static NXM_FIELDS: [NxmField; 23] = [
    of("NXM_OF_IN_PORT", 0, 2, Prereq::None),
    of("NXM_OF_ETH_DST", 1, 6, Prereq::None),
    of("NXM_OF_ETH_SRC", 2, 6, Prereq::None),
    of("NXM_OF_ETH_TYPE", 3, 2, Prereq::None),
    NXM_OF_VLAN_TCI,
    of("NXM_OF_IP_TOS", 5, 1, Prereq::Ip),
    of("NXM_OF_IP_PROTO", 6, 1, Prereq::Ip),
    of("NXM_OF_IP_SRC", 7, 4, Prereq::Ip),
    of("NXM_OF_IP_DST", 8, 4, Prereq::Ip),
    of("NXM_OF_TCP_SRC", 9, 2, Prereq::IpProto(IPPROTO_TCP)),
    of("NXM_OF_TCP_DST", 10, 2, Prereq::IpProto(IPPROTO_TCP)),
    of("NXM_OF_UDP_SRC", 11, 2, Prereq::IpProto(IPPROTO_UDP)),
    of("NXM_OF_UDP_DST", 12, 2, Prereq::IpProto(IPPROTO_UDP)),
    of("NXM_OF_ICMP_TYPE", 13, 1, Prereq::IpProto(IPPROTO_ICMP)),
    of("NXM_OF_ICMP_CODE", 14, 1, Prereq::IpProto(IPPROTO_ICMP)),
    of("NXM_OF_ARP_OP", 15, 2, Prereq::Arp),
    of("NXM_OF_ARP_SPA", 16, 4, Prereq::Arp),
    of("NXM_OF_ARP_TPA", 17, 4, Prereq::Arp),
    nx("NXM_NX_TUN_ID", 16, 8),
    nx("NXM_NX_REG0", 0, 4),
    nx("NXM_NX_REG1", 1, 4),
    nx("NXM_NX_REG2", 2, 4),
    nx("NXM_NX_REG3", 3, 4),
];

/// Find a field by its (unmasked) header.
#[must_use]
pub fn lookup(header: u32) -> Option<&'static NxmField> {
    NXM_FIELDS.iter().find(|f| f.header == header)
}

/// Checks the fields named by register actions against the flow they will apply to.
pub trait FieldChecker {
    /// Check a register move.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the move cannot apply to `flow`.
    fn check_reg_move(&self, action: &NxRegMove, flow: &Flow) -> Result<(), OfpError>;

    /// Check a register load.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the load cannot apply to `flow`.
    fn check_reg_load(&self, action: &NxRegLoad, flow: &Flow) -> Result<(), OfpError>;
}

/// [`FieldChecker`] backed by [`NXM_FIELDS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NxmFields;

const BAD_ARGUMENT: OfpError = OfpError::bad_action(BadActionCode::BadArgument);

/// Look up `header` and check that bits `[ofs, ofs + n_bits)` exist in `flow`.
fn field_ok(header: u32, ofs: u32, n_bits: u32, flow: &Flow) -> Result<&'static NxmField, OfpError> {
    let Some(field) = lookup(header) else {
        warn_rl!(BAD_OFMSG_RL, "unknown NXM field {header:#x}");
        return Err(BAD_ARGUMENT);
    };
    if n_bits == 0 || ofs + n_bits > field.n_bits() {
        warn_rl!(
            BAD_OFMSG_RL,
            "bits {ofs}..{end} outside {name} ({width} bits)",
            end = ofs + n_bits,
            name = field.name,
            width = field.n_bits()
        );
        return Err(BAD_ARGUMENT);
    }
    if !field.prereq.is_met(flow) {
        warn_rl!(BAD_OFMSG_RL, "{} not present in flow", field.name);
        return Err(BAD_ARGUMENT);
    }
    Ok(field)
}

fn writable(field: &NxmField) -> Result<(), OfpError> {
    if field.writable {
        Ok(())
    } else {
        warn_rl!(BAD_OFMSG_RL, "{} is not writable", field.name);
        Err(BAD_ARGUMENT)
    }
}

impl FieldChecker for NxmFields {
    fn check_reg_move(&self, action: &NxRegMove, flow: &Flow) -> Result<(), OfpError> {
        let n_bits = u32::from(action.n_bits);
        field_ok(action.src, u32::from(action.src_ofs), n_bits, flow)?;
        let dst = field_ok(action.dst, u32::from(action.dst_ofs), n_bits, flow)?;
        writable(dst)
    }

    fn check_reg_load(&self, action: &NxRegLoad, flow: &Flow) -> Result<(), OfpError> {
        let n_bits = u32::from(action.n_bits());
        let dst = field_ok(action.dst, u32::from(action.ofs()), n_bits, flow)?;
        writable(dst)?;
        if n_bits < 64 && action.value >> n_bits != 0 {
            warn_rl!(
                BAD_OFMSG_RL,
                "value {value:#x} does not fit in {n_bits} bits",
                value = action.value
            );
            return Err(BAD_ARGUMENT);
        }
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! OpenFlow port numbers and the internal ingress port type.

use std::fmt::Display;

/// Maximum number of physical switch ports.
pub const OFPP_MAX: u16 = 0xff00;
/// Send the packet out the input port.
pub const OFPP_IN_PORT: u16 = 0xfff8;
/// Perform the actions in the flow table (packet-out only).
pub const OFPP_TABLE: u16 = 0xfff9;
/// Process with normal L2/L3 switching.
pub const OFPP_NORMAL: u16 = 0xfffa;
/// All physical ports except the input port and those disabled by STP.
pub const OFPP_FLOOD: u16 = 0xfffb;
/// All physical ports except the input port.
pub const OFPP_ALL: u16 = 0xfffc;
/// Send to the controller.
pub const OFPP_CONTROLLER: u16 = 0xfffd;
/// The local openflow "port".
pub const OFPP_LOCAL: u16 = 0xfffe;
/// Not associated with a physical port.
pub const OFPP_NONE: u16 = 0xffff;

/// The reserved virtual ports which are always a legal output target.
pub const VIRTUAL_OUTPUT_PORTS: [u16; 7] = [
    OFPP_IN_PORT,
    OFPP_TABLE,
    OFPP_NORMAL,
    OFPP_FLOOD,
    OFPP_ALL,
    OFPP_CONTROLLER,
    OFPP_LOCAL,
];

/// The ingress port of a flow, as the datapath sees it.
///
/// The datapath has its own notion of the local port which is distinct from the
/// [`OFPP_LOCAL`] number used on the wire.
/// [`InPort::from_wire`] never produces `Number(OFPP_LOCAL)`.
#[cfg_attr(any(test, feature = "bolero"), derive(bolero::TypeGenerator))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InPort {
    /// The datapath's local port.
    Local,
    /// Any other port, by number.
    Number(u16),
}

impl Default for InPort {
    fn default() -> Self {
        InPort::Number(0)
    }
}

impl InPort {
    /// Map a wire port number to the internal representation.
    #[must_use]
    pub const fn from_wire(port: u16) -> InPort {
        match port {
            OFPP_LOCAL => InPort::Local,
            port => InPort::Number(port),
        }
    }

    /// Map the internal representation back to a wire port number.
    #[must_use]
    pub const fn to_wire(self) -> u16 {
        match self {
            InPort::Local => OFPP_LOCAL,
            InPort::Number(port) => port,
        }
    }
}

impl Display for InPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InPort::Local => write!(f, "LOCAL"),
            InPort::Number(port) => write!(f, "{port}"),
        }
    }
}

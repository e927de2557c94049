// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![forbid(unsafe_code)] // Validation logic should always be strictly safe
#![deny(missing_docs, clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(clippy::module_name_repetitions)]

//! Wire-level encoding, decoding and validation of OpenFlow 1.0 messages.
//!
//! This crate sits at the boundary where bytes received from a switch or controller become
//! typed data.
//! It converts between the wire [`OfpMatch`] and the internal [`Rule`] representation,
//! canonicalizes matches ([`OfpMatch::normalize`]), frames and builds outgoing messages,
//! validates action lists and walks the variable length collections embedded in received
//! messages.
//!
//! [`OfpMatch`]: ofp_match::OfpMatch
//! [`OfpMatch::normalize`]: ofp_match::OfpMatch::normalize
//! [`Rule`]: rule::Rule

pub mod action;
pub mod buffer;
pub mod check;
pub mod config;
pub mod error;
pub mod error_msg;
pub mod factory;
pub mod flow;
pub mod header;
pub mod mac;
pub mod message;
pub mod netmask;
pub mod nxm;
pub mod ofp_match;
pub mod parse;
pub mod port;
pub mod ratelimit;
pub mod rule;
pub mod stats;
pub mod validate;
pub mod wildcards;
pub mod xid;

/// The OpenFlow wire protocol version spoken by this crate.
pub const OFP_VERSION: u8 = 0x01;

/// The vendor id of the Nicira extensions.
pub const NX_VENDOR_ID: u32 = 0x0000_2320;

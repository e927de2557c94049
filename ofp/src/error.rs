// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! OpenFlow error descriptors.
//!
//! An [`OfpError`] names a vendor namespace, an error type and a code within that type.
//! It can be folded into a single `i32` ([`OfpError::to_raw`]) which shares its value space with
//! positive errno values: bit 30 is set for protocol errors, bits 29 to 26 hold the vendor tag,
//! bits 25 to 16 the type and bits 15 to 0 the code.

use crate::NX_VENDOR_ID;
use std::fmt::Display;

/// A vendor namespace of error types, as carried in a raw error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VendorTag(u8);

impl VendorTag {
    /// Errors defined by OpenFlow itself.
    pub const OPENFLOW: VendorTag = VendorTag(0);
    /// Nicira extension errors.
    pub const NICIRA: VendorTag = VendorTag(1);

    /// Largest tag which fits in a raw error code.
    pub const MAX: u8 = 0xf;

    /// Create a vendor tag.
    ///
    /// # Errors
    ///
    /// Returns the argument if it does not fit the 4 bit tag field.
    pub const fn new(tag: u8) -> Result<VendorTag, u8> {
        if tag > VendorTag::MAX {
            return Err(tag);
        }
        Ok(VendorTag(tag))
    }

    /// The raw tag value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// The vendor id of this namespace, if known.
    ///
    /// The core namespace has vendor id 0.
    #[must_use]
    pub const fn vendor_id(self) -> Option<u32> {
        match self {
            VendorTag::OPENFLOW => Some(0),
            VendorTag::NICIRA => Some(NX_VENDOR_ID),
            _ => None,
        }
    }
}

/// Core OpenFlow error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum ErrorType {
    /// Hello protocol failed.
    #[strum(serialize = "OFPET_HELLO_FAILED")]
    HelloFailed = 0,
    /// Request was not understood.
    #[strum(serialize = "OFPET_BAD_REQUEST")]
    BadRequest = 1,
    /// Error in action description.
    #[strum(serialize = "OFPET_BAD_ACTION")]
    BadAction = 2,
    /// Problem modifying a flow entry.
    #[strum(serialize = "OFPET_FLOW_MOD_FAILED")]
    FlowModFailed = 3,
    /// Port mod request failed.
    #[strum(serialize = "OFPET_PORT_MOD_FAILED")]
    PortModFailed = 4,
    /// Queue operation failed.
    #[strum(serialize = "OFPET_QUEUE_OP_FAILED")]
    QueueOpFailed = 5,
}

/// Codes of [`ErrorType::BadRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum BadRequestCode {
    /// Header version not supported.
    #[strum(serialize = "OFPBRC_BAD_VERSION")]
    BadVersion = 0,
    /// Message type not supported.
    #[strum(serialize = "OFPBRC_BAD_TYPE")]
    BadType = 1,
    /// Stats request type not supported.
    #[strum(serialize = "OFPBRC_BAD_STAT")]
    BadStat = 2,
    /// Vendor not supported.
    #[strum(serialize = "OFPBRC_BAD_VENDOR")]
    BadVendor = 3,
    /// Vendor subtype not supported.
    #[strum(serialize = "OFPBRC_BAD_SUBTYPE")]
    BadSubtype = 4,
    /// Permissions error.
    #[strum(serialize = "OFPBRC_EPERM")]
    Eperm = 5,
    /// Wrong request length for type.
    #[strum(serialize = "OFPBRC_BAD_LEN")]
    BadLen = 6,
    /// Specified buffer has already been used.
    #[strum(serialize = "OFPBRC_BUFFER_EMPTY")]
    BufferEmpty = 7,
    /// Specified buffer does not exist.
    #[strum(serialize = "OFPBRC_BUFFER_UNKNOWN")]
    BufferUnknown = 8,
}

/// Codes of [`ErrorType::BadAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum BadActionCode {
    /// Unknown action type.
    #[strum(serialize = "OFPBAC_BAD_TYPE")]
    BadType = 0,
    /// Length problem in actions.
    #[strum(serialize = "OFPBAC_BAD_LEN")]
    BadLen = 1,
    /// Unknown vendor id specified.
    #[strum(serialize = "OFPBAC_BAD_VENDOR")]
    BadVendor = 2,
    /// Unknown action type for vendor id.
    #[strum(serialize = "OFPBAC_BAD_VENDOR_TYPE")]
    BadVendorType = 3,
    /// Problem validating output port.
    #[strum(serialize = "OFPBAC_BAD_OUT_PORT")]
    BadOutPort = 4,
    /// Bad action argument.
    #[strum(serialize = "OFPBAC_BAD_ARGUMENT")]
    BadArgument = 5,
    /// Permissions error.
    #[strum(serialize = "OFPBAC_EPERM")]
    Eperm = 6,
    /// Can't handle this many actions.
    #[strum(serialize = "OFPBAC_TOO_MANY")]
    TooMany = 7,
    /// Problem validating output queue.
    #[strum(serialize = "OFPBAC_BAD_QUEUE")]
    BadQueue = 8,
}

/// Codes of [`ErrorType::FlowModFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::FromRepr, strum::Display)]
#[repr(u16)]
pub enum FlowModFailedCode {
    /// Flow not added because of full tables.
    #[strum(serialize = "OFPFMFC_ALL_TABLES_FULL")]
    AllTablesFull = 0,
    /// Attempted to add overlapping flow with the check overlap flag set.
    #[strum(serialize = "OFPFMFC_OVERLAP")]
    Overlap = 1,
    /// Permissions error.
    #[strum(serialize = "OFPFMFC_EPERM")]
    Eperm = 2,
    /// Flow not added because of non-zero idle or hard timeout.
    #[strum(serialize = "OFPFMFC_BAD_EMERG_TIMEOUT")]
    BadEmergTimeout = 3,
    /// Unknown command.
    #[strum(serialize = "OFPFMFC_BAD_COMMAND")]
    BadCommand = 4,
    /// Unsupported action list.
    #[strum(serialize = "OFPFMFC_UNSUPPORTED")]
    Unsupported = 5,
}

/// Error type of a Nicira error wrapped in a core error message.
pub const NXET_VENDOR: u16 = 0xb0c2;
/// Error code of a Nicira error wrapped in a core error message.
pub const NXVC_VENDOR_ERROR: u16 = 0;

/// A protocol error: vendor namespace, type and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OfpError {
    /// Namespace of `err_type`.
    pub vendor: VendorTag,
    /// Error type (10 bits).
    pub err_type: u16,
    /// Error code.
    pub code: u16,
}

impl OfpError {
    const MARKER: i32 = 1 << 30;

    /// Largest error type which fits in a raw error code.
    pub const MAX_TYPE: u16 = 0x3ff;

    /// Create a protocol error.
    ///
    /// # Panics
    ///
    /// Panics if `err_type` exceeds [`OfpError::MAX_TYPE`].
    #[must_use]
    pub const fn new(vendor: VendorTag, err_type: u16, code: u16) -> OfpError {
        assert!(err_type <= OfpError::MAX_TYPE, "error type exceeds 10 bits");
        OfpError {
            vendor,
            err_type,
            code,
        }
    }

    /// A core [`ErrorType::BadRequest`] error.
    #[must_use]
    pub const fn bad_request(code: BadRequestCode) -> OfpError {
        OfpError::new(VendorTag::OPENFLOW, ErrorType::BadRequest as u16, code as u16)
    }

    /// A core [`ErrorType::BadAction`] error.
    #[must_use]
    pub const fn bad_action(code: BadActionCode) -> OfpError {
        OfpError::new(VendorTag::OPENFLOW, ErrorType::BadAction as u16, code as u16)
    }

    /// A core [`ErrorType::FlowModFailed`] error.
    #[must_use]
    pub const fn flow_mod_failed(code: FlowModFailedCode) -> OfpError {
        OfpError::new(
            VendorTag::OPENFLOW,
            ErrorType::FlowModFailed as u16,
            code as u16,
        )
    }

    /// A Nicira extension error.
    #[must_use]
    pub const fn nicira(err_type: u16, code: u16) -> OfpError {
        OfpError::new(VendorTag::NICIRA, err_type, code)
    }

    /// Fold into the shared integer error space.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        OfpError::MARKER
            | ((self.vendor.0 as i32) << 26)
            | ((self.err_type as i32) << 16)
            | self.code as i32
    }

    /// Unfold from the shared integer error space.
    ///
    /// Returns `None` for values which are not protocol errors (see [`is_ofp_error`]).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // fields are masked before the cast
    pub const fn from_raw(raw: i32) -> Option<OfpError> {
        if !is_ofp_error(raw) {
            return None;
        }
        let raw = u32::from_ne_bytes(raw.to_ne_bytes());
        Some(OfpError {
            vendor: VendorTag(((raw >> 26) & 0xf) as u8),
            err_type: ((raw >> 16) & 0x3ff) as u16,
            code: (raw & 0xffff) as u16,
        })
    }
}

/// Returns true iff `raw` is a protocol error rather than an errno value.
#[must_use]
pub const fn is_ofp_error(raw: i32) -> bool {
    u32::from_ne_bytes(raw.to_ne_bytes()) & 0xffff_0000 != 0
}

impl core::error::Error for OfpError {}

impl Display for OfpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.vendor != VendorTag::OPENFLOW {
            return write!(
                f,
                "vendor {} error type {} code {}",
                self.vendor.0, self.err_type, self.code
            );
        }
        let Some(err_type) = ErrorType::from_repr(self.err_type) else {
            return write!(f, "error type {} code {}", self.err_type, self.code);
        };
        let code = match err_type {
            ErrorType::BadRequest => BadRequestCode::from_repr(self.code).map(|c| c.to_string()),
            ErrorType::BadAction => BadActionCode::from_repr(self.code).map(|c| c.to_string()),
            ErrorType::FlowModFailed => {
                FlowModFailedCode::from_repr(self.code).map(|c| c.to_string())
            }
            _ => None,
        };
        match code {
            Some(code) => write!(f, "{err_type}({code})"),
            None => write!(f, "{err_type}(code {})", self.code),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raw_layout() {
        let err = OfpError::bad_action(BadActionCode::BadOutPort);
        assert_eq!(err.to_raw(), (1 << 30) | (2 << 16) | 4);
        let err = OfpError::nicira(3, 7);
        assert_eq!(err.to_raw(), (1 << 30) | (1 << 26) | (3 << 16) | 7);
    }

    #[test]
    fn errno_values_are_not_protocol_errors() {
        assert!(!is_ofp_error(0));
        assert!(!is_ofp_error(2)); // ENOENT
        assert_eq!(OfpError::from_raw(0xffff), None);
        assert!(is_ofp_error(OfpError::bad_request(BadRequestCode::BadVersion).to_raw()));
    }

    #[test]
    fn raw_round_trip() {
        bolero::check!()
            .with_type()
            .for_each(|(vendor, err_type, code): &(u8, u16, u16)| {
                let err = OfpError::new(
                    VendorTag(vendor & VendorTag::MAX),
                    err_type & OfpError::MAX_TYPE,
                    *code,
                );
                assert_eq!(OfpError::from_raw(err.to_raw()), Some(err));
            });
    }

    #[test]
    fn vendor_ids() {
        assert_eq!(VendorTag::OPENFLOW.vendor_id(), Some(0));
        assert_eq!(VendorTag::NICIRA.vendor_id(), Some(NX_VENDOR_ID));
        assert_eq!(VendorTag::new(2).map(VendorTag::vendor_id), Ok(None));
        assert_eq!(VendorTag::new(16), Err(16));
    }

    #[test]
    fn display_names() {
        assert_eq!(
            OfpError::bad_request(BadRequestCode::BadLen).to_string(),
            "OFPET_BAD_REQUEST(OFPBRC_BAD_LEN)"
        );
        assert_eq!(
            OfpError::new(VendorTag::OPENFLOW, 4, 1).to_string(),
            "OFPET_PORT_MOD_FAILED(code 1)"
        );
        assert_eq!(
            OfpError::nicira(1, 2).to_string(),
            "vendor 1 error type 1 code 2"
        );
    }
}

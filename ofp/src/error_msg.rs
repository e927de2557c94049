// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Error messages sent back to a peer.

use crate::buffer::OfpBuf;
use crate::error::{NXET_VENDOR, NXVC_VENDOR_ERROR, OfpError, VendorTag};
use crate::header::{MessageType, OfpHeader};
use crate::message::make_openflow_xid;
use crate::parse::Parse;
use crate::ratelimit::ERROR_MSG_RL;
use crate::warn_rl;
use tracing::debug;

/// Most bytes of the offending request echoed in an error message.
pub const ERROR_ECHO_MAX: usize = 64;

/// Size of an error message without echoed data.
pub const ERROR_MSG_LEN: usize = 12;

/// Size of the vendor error block (vendor id, type, code) of an extension error.
pub const NX_VENDOR_ERROR_LEN: usize = 8;

/// Reasons an error message cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorMsgError {
    /// The code is an errno style value rather than a protocol error.
    #[error("{0} is not an OpenFlow error code")]
    NotAnOfpError(i32),
    /// The vendor namespace of the error has no known vendor id.
    #[error("error {error} has unknown vendor tag {}", .error.vendor.as_u8())]
    UnknownVendor {
        /// The error which could not be encoded.
        error: OfpError,
    },
}

/// The transaction id of `request` and the bytes of it to echo: the length its header declares,
/// capped to [`ERROR_ECHO_MAX`] and to what is actually there.
fn echo_of(request: &[u8]) -> (u32, &[u8]) {
    match OfpHeader::parse(request) {
        Ok((header, _)) => {
            let len = usize::from(header.length)
                .min(ERROR_ECHO_MAX)
                .min(request.len());
            if len < usize::from(header.length).min(ERROR_ECHO_MAX) {
                debug!(
                    "echoing {len} bytes of a request declaring {} bytes",
                    header.length
                );
            }
            (header.xid, &request[..len])
        }
        Err(e) => {
            debug!("request to echo has no header: {}", e.into_length());
            (0, &[])
        }
    }
}

/// Build the error message reporting `error`, a raw error code, to the sender of `request`.
///
/// The message reuses the transaction id of `request` and echoes up to [`ERROR_ECHO_MAX`]
/// bytes of it, never more than its header declares or than `request` holds.
/// Without a request, or with one too short to carry a header, the transaction id is 0 and
/// nothing is echoed.
/// Errors outside the core namespace are wrapped in a Nicira vendor error.
///
/// # Errors
///
/// Fails if `error` is not a protocol error or if its vendor tag is unknown.
pub fn make_error_msg(error: i32, request: Option<&[u8]>) -> Result<OfpBuf, ErrorMsgError> {
    let Some(ofp_error) = OfpError::from_raw(error) else {
        warn_rl!(
            ERROR_MSG_RL,
            "invalid OpenFlow error code {error} ({})",
            std::io::Error::from_raw_os_error(error)
        );
        return Err(ErrorMsgError::NotAnOfpError(error));
    };
    let vendor_id = if ofp_error.vendor == VendorTag::OPENFLOW {
        None
    } else {
        let Some(vendor_id) = ofp_error.vendor.vendor_id() else {
            warn_rl!(
                ERROR_MSG_RL,
                "error {error:x} contains invalid vendor code {}",
                ofp_error.vendor.as_u8()
            );
            return Err(ErrorMsgError::UnknownVendor { error: ofp_error });
        };
        Some(vendor_id)
    };
    let (xid, echo) = request.map_or((0, &[][..]), echo_of);

    let mut buf = match vendor_id {
        None => {
            let mut buf = make_openflow_xid(ERROR_MSG_LEN + echo.len(), MessageType::Error, xid);
            let body = buf.at_assert(8, 4);
            body[..2].copy_from_slice(&ofp_error.err_type.to_be_bytes());
            body[2..].copy_from_slice(&ofp_error.code.to_be_bytes());
            buf
        }
        Some(vendor_id) => {
            let mut buf = make_openflow_xid(
                ERROR_MSG_LEN + NX_VENDOR_ERROR_LEN + echo.len(),
                MessageType::Error,
                xid,
            );
            let body = buf.at_assert(8, 4 + NX_VENDOR_ERROR_LEN);
            body[..2].copy_from_slice(&NXET_VENDOR.to_be_bytes());
            body[2..4].copy_from_slice(&NXVC_VENDOR_ERROR.to_be_bytes());
            body[4..8].copy_from_slice(&vendor_id.to_be_bytes());
            body[8..10].copy_from_slice(&ofp_error.err_type.to_be_bytes());
            body[10..].copy_from_slice(&ofp_error.code.to_be_bytes());
            buf
        }
    };
    let at = buf.len() - echo.len();
    buf.at_assert(at, echo.len()).copy_from_slice(echo);
    Ok(buf)
}

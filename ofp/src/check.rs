// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Envelope checks for received messages.

use crate::action::{ActionList, OFP_ACTION_ALIGN};
use crate::buffer::OfpBuf;
use crate::error::{BadRequestCode, OfpError};
use crate::header::{MessageType, OfpHeader, TypeName};
use crate::ratelimit::BAD_OFMSG_RL;
use crate::warn_rl;

const BAD_TYPE: OfpError = OfpError::bad_request(BadRequestCode::BadType);
const BAD_LEN: OfpError = OfpError::bad_request(BadRequestCode::BadLen);

fn check_type(header: &OfpHeader, want: MessageType) -> Result<(), OfpError> {
    if header.msg_type != want.as_u8() {
        warn_rl!(
            BAD_OFMSG_RL,
            "received bad message type {} (expected {want})",
            TypeName(header.msg_type)
        );
        return Err(BAD_TYPE);
    }
    Ok(())
}

/// Check that `header` describes a message of type `want` which is exactly `size` bytes long.
///
/// # Errors
///
/// Returns a bad type error on a type mismatch, otherwise a bad length error on a size mismatch.
pub fn check_ofp_message(header: &OfpHeader, want: MessageType, size: usize) -> Result<(), OfpError> {
    check_type(header, want)?;
    let got = usize::from(header.length);
    if got != size {
        warn_rl!(
            BAD_OFMSG_RL,
            "received {want} message of length {got} (expected {size})"
        );
        return Err(BAD_LEN);
    }
    Ok(())
}

/// Check that `header` describes a message of type `want` made of a `min_size` byte fixed part
/// followed by whole `elt_size` byte elements.
///
/// Returns the number of elements.
///
/// # Errors
///
/// Returns a bad type error on a type mismatch.
/// A message shorter than `min_size`, or with a partial trailing element, is a bad length error.
///
/// # Panics
///
/// Panics if `elt_size` is zero.
pub fn check_ofp_message_array(
    header: &OfpHeader,
    want: MessageType,
    min_size: usize,
    elt_size: usize,
) -> Result<usize, OfpError> {
    assert!(elt_size > 0, "zero sized array element");
    check_type(header, want)?;
    let got = usize::from(header.length);
    if got < min_size {
        warn_rl!(
            BAD_OFMSG_RL,
            "received {want} message of length {got} (expected at least {min_size})"
        );
        return Err(BAD_LEN);
    }
    let excess = got - min_size;
    let rem = excess % elt_size;
    if rem != 0 {
        warn_rl!(
            BAD_OFMSG_RL,
            "received {want} message of bad length {got}: the excess over {min_size} ({excess}) \
             is not evenly divisible by {elt_size} (remainder is {rem})"
        );
        return Err(BAD_LEN);
    }
    Ok(excess / elt_size)
}

/// Remove an `actions_len` byte action run from the front of `buf`.
///
/// Only the framing is checked here, see [`crate::validate::validate_actions`] for the contents.
///
/// # Errors
///
/// Returns a bad length error, leaving `buf` untouched, if `actions_len` is not a whole number
/// of slots or exceeds what `buf` holds.
pub fn pull_actions(buf: &mut OfpBuf, actions_len: usize) -> Result<ActionList, OfpError> {
    if actions_len % OFP_ACTION_ALIGN != 0 {
        warn_rl!(
            BAD_OFMSG_RL,
            "OpenFlow message actions length {actions_len} is not a multiple of {OFP_ACTION_ALIGN}"
        );
        return Err(BAD_LEN);
    }
    match buf.try_pull(actions_len) {
        Ok(bytes) => Ok(ActionList::from(bytes)),
        Err(e) => {
            warn_rl!(
                BAD_OFMSG_RL,
                "OpenFlow message actions length {actions_len} exceeds remaining message length ({})",
                e.available
            );
            Err(BAD_LEN)
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;
    use crate::action::Action;
    use crate::OFP_VERSION;
    use tracing_test::traced_test;

    fn header(msg_type: MessageType, length: u16) -> OfpHeader {
        OfpHeader {
            version: OFP_VERSION,
            msg_type: msg_type.as_u8(),
            length,
            xid: 0,
        }
    }

    #[test]
    fn fixed_size() {
        let hdr = header(MessageType::EchoRequest, 8);
        assert_eq!(check_ofp_message(&hdr, MessageType::EchoRequest, 8), Ok(()));
    }

    #[test]
    #[traced_test]
    fn wrong_type_wins_over_wrong_length() {
        let hdr = header(MessageType::Hello, 12);
        assert_eq!(
            check_ofp_message(&hdr, MessageType::EchoRequest, 8),
            Err(BAD_TYPE)
        );
        assert!(logs_contain(
            "received bad message type OFPT_HELLO (expected OFPT_ECHO_REQUEST)"
        ));
    }

    #[test]
    #[traced_test]
    fn unknown_type_is_named_by_number() {
        let hdr = OfpHeader {
            msg_type: 99,
            ..header(MessageType::Hello, 8)
        };
        assert_eq!(check_ofp_message(&hdr, MessageType::Hello, 8), Err(BAD_TYPE));
        assert!(logs_contain("received bad message type OFPT_UNKNOWN_99"));
    }

    #[test]
    #[traced_test]
    fn wrong_length() {
        let hdr = header(MessageType::FlowMod, 80);
        assert_eq!(check_ofp_message(&hdr, MessageType::FlowMod, 72), Err(BAD_LEN));
        assert!(logs_contain(
            "received OFPT_FLOW_MOD message of length 80 (expected 72)"
        ));
    }

    #[test]
    fn array_counts_elements() {
        let hdr = header(MessageType::FeaturesReply, 32 + 3 * 48);
        assert_eq!(
            check_ofp_message_array(&hdr, MessageType::FeaturesReply, 32, 48),
            Ok(3)
        );
        let hdr = header(MessageType::FeaturesReply, 32);
        assert_eq!(
            check_ofp_message_array(&hdr, MessageType::FeaturesReply, 32, 48),
            Ok(0)
        );
    }

    #[test]
    #[traced_test]
    fn array_too_short() {
        let hdr = header(MessageType::FeaturesReply, 16);
        assert_eq!(
            check_ofp_message_array(&hdr, MessageType::FeaturesReply, 32, 48),
            Err(BAD_LEN)
        );
        assert!(logs_contain("(expected at least 32)"));
    }

    #[test]
    #[traced_test]
    fn array_partial_element() {
        let hdr = header(MessageType::FeaturesReply, 32 + 50);
        assert_eq!(
            check_ofp_message_array(&hdr, MessageType::FeaturesReply, 32, 48),
            Err(BAD_LEN)
        );
        assert!(logs_contain("is not evenly divisible by 48 (remainder is 2)"));
    }

    #[test]
    fn pull_exact_run() {
        let mut buf = OfpBuf::from_slice(&Action::encode_output(1));
        buf.put(&Action::encode_output(2));
        buf.put(b"packet");
        let actions = pull_actions(&mut buf, 16).unwrap();
        assert_eq!(actions.len(), 16);
        assert_eq!(actions.as_actions().iter().count(), 2);
        assert_eq!(buf.as_ref(), b"packet");
    }

    #[test]
    #[traced_test]
    fn pull_misaligned_run() {
        let mut buf = OfpBuf::from_slice(&[0; 16]);
        assert_eq!(pull_actions(&mut buf, 12).unwrap_err(), BAD_LEN);
        assert_eq!(buf.len(), 16);
        assert!(logs_contain("actions length 12 is not a multiple of 8"));
    }

    #[test]
    #[traced_test]
    fn pull_past_the_end() {
        let mut buf = OfpBuf::from_slice(&[0; 8]);
        assert_eq!(pull_actions(&mut buf, 16).unwrap_err(), BAD_LEN);
        assert_eq!(buf.len(), 8);
        assert!(logs_contain(
            "actions length 16 exceeds remaining message length (8)"
        ));
    }

    #[test]
    fn pull_nothing() {
        let mut buf = OfpBuf::from_slice(&[1, 2]);
        assert!(pull_actions(&mut buf, 0).unwrap().is_empty());
        assert_eq!(buf.len(), 2);
    }
}

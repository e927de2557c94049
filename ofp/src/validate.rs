// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Action list validation.

use crate::action::{Action, ActionType, Actions, NxAction, OFP_ACTION_ALIGN, RawAction};
use crate::debug_rl;
use crate::error::{BadActionCode, OfpError};
use crate::flow::Flow;
use crate::nxm::{FieldChecker, NxmFields};
use crate::port::{OFPP_IN_PORT, VIRTUAL_OUTPUT_PORTS};
use crate::ratelimit::BAD_OFMSG_RL;
use crate::warn_rl;

const BAD_LEN: OfpError = OfpError::bad_action(BadActionCode::BadLen);
const BAD_OUT_PORT: OfpError = OfpError::bad_action(BadActionCode::BadOutPort);

/// Check that `port` is a legal output port on a switch with at most `max_ports` ports.
///
/// # Errors
///
/// Returns a bad output port error unless `port` is one of the virtual output ports or a
/// physical port below `max_ports`.
pub fn check_output_port(port: u16, max_ports: u16) -> Result<(), OfpError> {
    if VIRTUAL_OUTPUT_PORTS.contains(&port) || port < max_ports {
        return Ok(());
    }
    warn_rl!(BAD_OFMSG_RL, "unknown output port {port:x}");
    Err(BAD_OUT_PORT)
}

fn check_enqueue_port(port: u16, max_ports: u16) -> Result<(), OfpError> {
    if port < max_ports || port == OFPP_IN_PORT {
        return Ok(());
    }
    warn_rl!(BAD_OFMSG_RL, "unknown enqueue port {port:x}");
    Err(BAD_OUT_PORT)
}

fn check_action(
    raw: RawAction<'_>,
    flow: &Flow,
    max_ports: u16,
    checker: &impl FieldChecker,
) -> Result<(), OfpError> {
    match raw.decode()? {
        Action::Output { port, .. } => check_output_port(port, max_ports),
        Action::Enqueue { port, .. } => check_enqueue_port(port, max_ports),
        Action::Nicira(NxAction::RegMove(mv)) => checker.check_reg_move(&mv, flow),
        Action::Nicira(NxAction::RegLoad(load)) => checker.check_reg_load(&load, flow),
        _ => Ok(()),
    }
}

/// Validate every action of a run for a flow with the given fields, on a switch with at most
/// `max_ports` ports.
///
/// Register actions are checked against the built in field table, see [`NxmFields`].
///
/// # Errors
///
/// Returns the protocol error describing the first invalid action.
pub fn validate_actions(actions: Actions<'_>, flow: &Flow, max_ports: u16) -> Result<(), OfpError> {
    validate_actions_with(actions, flow, max_ports, &NxmFields)
}

/// [`validate_actions`] with a caller supplied register field checker.
///
/// # Errors
///
/// Returns the protocol error describing the first invalid action.
pub fn validate_actions_with(
    actions: Actions<'_>,
    flow: &Flow,
    max_ports: u16,
    checker: &impl FieldChecker,
) -> Result<(), OfpError> {
    let bytes = actions.as_bytes();
    if bytes.len() % OFP_ACTION_ALIGN != 0 {
        debug_rl!(
            BAD_OFMSG_RL,
            "actions length {} is not a multiple of {OFP_ACTION_ALIGN}",
            bytes.len()
        );
        return Err(BAD_LEN);
    }
    let total_slots = actions.n_slots();
    let mut slot = 0;
    while slot < total_slots {
        let at = slot * OFP_ACTION_ALIGN;
        let len = usize::from(u16::from_be_bytes([bytes[at + 2], bytes[at + 3]]));
        let n_slots = len / OFP_ACTION_ALIGN;
        let slots_left = total_slots - slot;
        if n_slots > slots_left {
            debug_rl!(
                BAD_OFMSG_RL,
                "action requires {n_slots} slots but only {slots_left} remain"
            );
            return Err(BAD_LEN);
        } else if len == 0 {
            debug_rl!(BAD_OFMSG_RL, "action has invalid length 0");
            return Err(BAD_LEN);
        } else if len % OFP_ACTION_ALIGN != 0 {
            debug_rl!(
                BAD_OFMSG_RL,
                "action length {len} is not a multiple of {OFP_ACTION_ALIGN}"
            );
            return Err(BAD_LEN);
        }
        let Some(raw) = RawAction::new(&bytes[at..at + len]) else {
            return Err(BAD_LEN);
        };
        check_action(raw, flow, max_ports, checker)?;
        slot += n_slots;
    }
    Ok(())
}

/// Returns true iff `action`, an already validated output or enqueue action, forwards to `port`.
#[must_use]
pub fn action_outputs_to_port(action: RawAction<'_>, port: u16) -> bool {
    let target = || {
        action
            .as_bytes()
            .get(4..6)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
    };
    match ActionType::from_repr(action.action_type()) {
        Some(ActionType::Output | ActionType::Enqueue) => target() == Some(port),
        _ => false,
    }
}

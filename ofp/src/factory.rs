// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`OfpFactory`]: the operations which depend on an [`OfpConfig`].

use crate::action::Actions;
use crate::buffer::OfpBuf;
use crate::config::{ConfigError, OfpConfig};
use crate::error::OfpError;
use crate::flow::Flow;
use crate::message::{
    PacketInReason, make_add_simple_flow, make_del_flow, make_echo_request, make_packet_in,
};
use crate::ofp_match::OfpMatch;
use crate::rule::Rule;
use crate::validate::validate_actions;
use crate::xid::XidAllocator;
use tracing::debug;

/// Builds and checks messages according to a configuration, drawing transaction ids from its
/// own allocator.
#[derive(Debug)]
pub struct OfpFactory {
    config: OfpConfig,
    xids: XidAllocator,
}

impl OfpFactory {
    /// Create a factory with a fresh transaction id allocator.
    ///
    /// # Errors
    ///
    /// Fails if `config` is inconsistent.
    pub fn new(config: OfpConfig) -> Result<OfpFactory, ConfigError> {
        OfpFactory::with_xids(config, XidAllocator::new())
    }

    /// Create a factory drawing transaction ids from `xids`.
    ///
    /// # Errors
    ///
    /// Fails if `config` is inconsistent.
    pub fn with_xids(config: OfpConfig, xids: XidAllocator) -> Result<OfpFactory, ConfigError> {
        config.validate()?;
        debug!("protocol factory using {} flows", config.flow_format);
        Ok(OfpFactory { config, xids })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &OfpConfig {
        &self.config
    }

    /// The allocator transaction ids are drawn from.
    #[must_use]
    pub fn xids(&self) -> &XidAllocator {
        &self.xids
    }

    /// Convert a wire match in the configured flow format.
    #[must_use]
    pub fn rule_from_match(&self, m: &OfpMatch, priority: u16, cookie: u64) -> Rule {
        Rule::from_match(m, priority, self.config.flow_format, cookie)
    }

    /// Convert a rule to a wire match in the configured flow format.
    #[must_use]
    pub fn rule_to_match(&self, rule: &Rule) -> OfpMatch {
        rule.to_match(self.config.flow_format)
    }

    /// Validate `actions` against the configured port count.
    ///
    /// # Errors
    ///
    /// Returns the protocol error describing the first invalid action.
    pub fn validate_actions(&self, actions: Actions<'_>, flow: &Flow) -> Result<(), OfpError> {
        validate_actions(actions, flow, self.config.max_ports)
    }

    /// A packet in carrying at most the configured miss send length of `payload`.
    #[must_use]
    pub fn packet_in(
        &self,
        buffer_id: u32,
        in_port: u16,
        reason: PacketInReason,
        payload: &[u8],
    ) -> OfpBuf {
        make_packet_in(
            buffer_id,
            in_port,
            reason,
            payload,
            usize::from(self.config.miss_send_len),
        )
    }

    /// An add flow mod with the configured idle timeout forwarding to `out_port`.
    #[must_use]
    pub fn add_simple_flow(&self, rule: &Rule, buffer_id: u32, out_port: u16) -> OfpBuf {
        make_add_simple_flow(
            rule,
            buffer_id,
            out_port,
            self.config.idle_timeout,
            &self.xids,
        )
    }

    /// A strict delete flow mod for `rule`.
    #[must_use]
    pub fn del_flow(&self, rule: &Rule) -> OfpBuf {
        make_del_flow(rule, &self.xids)
    }

    /// An empty echo request.
    #[must_use]
    pub fn echo_request(&self) -> OfpBuf {
        make_echo_request(&self.xids)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;
    use crate::action::Action;
    use crate::config::OfpConfigBuilder;
    use crate::error::BadActionCode;
    use crate::header::OfpHeader;
    use crate::message::{FLOW_MOD_LEN, PACKET_IN_DATA_OFFSET};
    use crate::parse::Parse;
    use crate::rule::FlowFormat;

    fn factory(max_ports: u16) -> OfpFactory {
        let config = OfpConfigBuilder::default()
            .max_ports(max_ports)
            .miss_send_len(32)
            .idle_timeout(10)
            .flow_format(FlowFormat::TunIdFromCookie)
            .build()
            .unwrap();
        OfpFactory::with_xids(config, XidAllocator::starting_at(100)).unwrap()
    }

    #[test]
    fn inconsistent_config_is_refused() {
        let config = OfpConfig {
            max_ports: 0,
            ..OfpConfig::default()
        };
        assert!(OfpFactory::new(config).is_err());
    }

    #[test]
    fn uses_configured_port_count() {
        let f = factory(8);
        let out = Action::encode_output(9);
        assert_eq!(
            f.validate_actions(Actions::new(&out), &Flow::default()),
            Err(OfpError::bad_action(BadActionCode::BadOutPort))
        );
        let out = Action::encode_output(7);
        assert_eq!(f.validate_actions(Actions::new(&out), &Flow::default()), Ok(()));
    }

    #[test]
    fn uses_configured_flow_format() {
        let f = factory(8);
        let m = OfpMatch::catchall().normalized();
        let rule = f.rule_from_match(&m, 5, 0x1234_5678_0000_0000);
        assert_eq!(rule.flow.tun_id, 0x1234_5678);
        assert_eq!(f.rule_to_match(&rule), m);
    }

    #[test]
    fn uses_configured_lengths_and_xids() {
        let f = factory(8);
        let msg = f.packet_in(1, 2, PacketInReason::NoMatch, &[0; 100]);
        assert_eq!(msg.len(), PACKET_IN_DATA_OFFSET + 32);

        let rule = f.rule_from_match(&OfpMatch::catchall(), 1, 0);
        let msg = f.add_simple_flow(&rule, u32::MAX, 3);
        assert_eq!(msg.len(), FLOW_MOD_LEN + 8);
        assert_eq!(u16::from_be_bytes([msg.as_ref()[58], msg.as_ref()[59]]), 10);
        assert_eq!(OfpHeader::parse(msg.as_ref()).unwrap().0.xid, 100);
        assert_eq!(OfpHeader::parse(f.del_flow(&rule).as_ref()).unwrap().0.xid, 101);
        assert_eq!(OfpHeader::parse(f.echo_request().as_ref()).unwrap().0.xid, 102);
    }
}

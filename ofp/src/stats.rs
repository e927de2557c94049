// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Flow statistics replies.
//!
//! The body of a flow stats reply is a sequence of variable length records, each a fixed
//! [`FLOW_STATS_LEN`] byte part followed by the actions of the flow.

use crate::action::{Actions, OFP_ACTION_ALIGN};
use crate::buffer::OfpBuf;
use crate::header::OfpHeader;
use crate::ofp_match::OfpMatch;
use crate::parse::{DeParse, Parse};
use crate::ratelimit::BAD_OFMSG_RL;
use crate::warn_rl;
use bytes::{Buf, BufMut};
use tracing::debug;

/// Offset of the body in a stats reply (header, stats type, flags).
pub const STATS_REPLY_BODY_OFFSET: usize = 12;
/// Size of a flow stats record without actions.
pub const FLOW_STATS_LEN: usize = 88;

/// Stats type of flow stats requests and replies.
pub const OFPST_FLOW: u16 = 1;

/// One flow of a flow stats reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStats<'a> {
    /// Table the flow lives in.
    pub table_id: u8,
    /// Match of the flow.
    pub flow_match: OfpMatch,
    /// Time the flow has been alive, whole seconds.
    pub duration_sec: u32,
    /// Time the flow has been alive beyond `duration_sec`, nanoseconds.
    pub duration_nsec: u32,
    /// Priority of the flow.
    pub priority: u16,
    /// Seconds of inactivity before expiry.
    pub idle_timeout: u16,
    /// Seconds before expiry.
    pub hard_timeout: u16,
    /// Opaque controller issued identifier.
    pub cookie: u64,
    /// Packets matched.
    pub packet_count: u64,
    /// Bytes matched.
    pub byte_count: u64,
    /// Actions of the flow.
    pub actions: Actions<'a>,
}

impl<'a> FlowStats<'a> {
    fn decode(record: &'a [u8]) -> Option<FlowStats<'a>> {
        let (flow_match, _) = OfpMatch::parse(record.get(4..44)?).ok()?;
        let mut cur = record.get(44..FLOW_STATS_LEN)?;
        let duration_sec = cur.get_u32();
        let duration_nsec = cur.get_u32();
        let priority = cur.get_u16();
        let idle_timeout = cur.get_u16();
        let hard_timeout = cur.get_u16();
        cur.advance(6);
        Some(FlowStats {
            table_id: record[2],
            flow_match,
            duration_sec,
            duration_nsec,
            priority,
            idle_timeout,
            hard_timeout,
            cookie: cur.get_u64(),
            packet_count: cur.get_u64(),
            byte_count: cur.get_u64(),
            actions: Actions::new(&record[FLOW_STATS_LEN..]),
        })
    }

    /// Size of the record on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        FLOW_STATS_LEN + self.actions.as_bytes().len()
    }

    /// Append the record to `buf`.
    ///
    /// # Panics
    ///
    /// Panics if the record is longer than 65535 bytes.
    pub fn encode(&self, buf: &mut OfpBuf) {
        let len = self.wire_len();
        assert!(
            len <= usize::from(u16::MAX),
            "flow stats record of {len} bytes"
        );
        #[allow(clippy::cast_possible_truncation)] // bounded by the assertion
        let len = len as u16;
        let mut fixed = Vec::with_capacity(FLOW_STATS_LEN);
        fixed.put_u16(len);
        fixed.put_u8(self.table_id);
        fixed.put_u8(0);
        fixed.put_bytes(0, OfpMatch::SIZE.get());
        self.flow_match
            .deparse(&mut fixed[4..])
            .unwrap_or_else(|_| unreachable!());
        fixed.put_u32(self.duration_sec);
        fixed.put_u32(self.duration_nsec);
        fixed.put_u16(self.priority);
        fixed.put_u16(self.idle_timeout);
        fixed.put_u16(self.hard_timeout);
        fixed.put_bytes(0, 6);
        fixed.put_u64(self.cookie);
        fixed.put_u64(self.packet_count);
        fixed.put_u64(self.byte_count);
        buf.put(&fixed);
        buf.put(self.actions.as_bytes());
    }
}

/// Iterator over the records of a flow stats reply.
///
/// Iteration stops at the end of the body or at the first malformed record.
/// A malformed record is logged and ends the iteration for good.
#[derive(Debug, Clone)]
pub struct FlowStatsIter<'a> {
    rest: &'a [u8],
}

impl<'a> FlowStatsIter<'a> {
    /// Iterate over the records of `reply`, a whole stats reply message.
    ///
    /// Only the bytes covered by the length in the header of `reply` are read.
    #[must_use]
    pub fn new(reply: &'a [u8]) -> FlowStatsIter<'a> {
        let declared = OfpHeader::parse(reply)
            .map_or(0, |(header, _)| usize::from(header.length));
        let end = declared.min(reply.len());
        if end < declared {
            debug!("stats reply declares {declared} bytes but only {end} are present");
        }
        FlowStatsIter {
            rest: reply.get(STATS_REPLY_BODY_OFFSET..end).unwrap_or_default(),
        }
    }

    /// Iterate over the records of a reply body.
    #[must_use]
    pub fn from_body(body: &'a [u8]) -> FlowStatsIter<'a> {
        FlowStatsIter { rest: body }
    }

    fn stop(&mut self) -> Option<FlowStats<'a>> {
        self.rest = &[];
        None
    }
}

impl<'a> Iterator for FlowStatsIter<'a> {
    type Item = FlowStats<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let left = self.rest.len();
        if left < FLOW_STATS_LEN {
            if left > 0 {
                warn_rl!(BAD_OFMSG_RL, "{left} leftover bytes in flow stats reply");
            }
            return self.stop();
        }
        let len = usize::from(u16::from_be_bytes([self.rest[0], self.rest[1]]));
        if len < FLOW_STATS_LEN {
            warn_rl!(
                BAD_OFMSG_RL,
                "flow stats length {len} is shorter than min {FLOW_STATS_LEN}"
            );
            return self.stop();
        }
        if len > left {
            warn_rl!(
                BAD_OFMSG_RL,
                "flow stats length {len} but only {left} bytes left"
            );
            return self.stop();
        }
        let rem = (len - FLOW_STATS_LEN) % OFP_ACTION_ALIGN;
        if rem != 0 {
            warn_rl!(
                BAD_OFMSG_RL,
                "flow stats length {len} has {rem} bytes left over in final action"
            );
            return self.stop();
        }
        let (record, rest) = self.rest.split_at(len);
        self.rest = rest;
        FlowStats::decode(record).or_else(|| self.stop())
    }
}

impl core::iter::FusedIterator for FlowStatsIter<'_> {}

#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in test code
#[cfg(test)]
mod test {
    use super::*;
    use crate::action::{Action, ActionList};
    use crate::header::MessageType;
    use crate::message::{make_openflow_xid, update_openflow_length};
    use crate::wildcards::OfpWildcards;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn record(actions: &ActionList, cookie: u64) -> FlowStats<'_> {
        FlowStats {
            table_id: 0,
            flow_match: OfpMatch {
                wildcards: OfpWildcards::OFP_ALL ^ OfpWildcards::IN_PORT,
                in_port: 3,
                ..OfpMatch::catchall()
            },
            duration_sec: 10,
            duration_nsec: 500,
            priority: 0x8000,
            idle_timeout: 60,
            hard_timeout: 0,
            cookie,
            packet_count: 7,
            byte_count: 700,
            actions: actions.as_actions(),
        }
    }

    fn reply(records: &[FlowStats<'_>], trailing: &[u8]) -> OfpBuf {
        let mut buf = make_openflow_xid(STATS_REPLY_BODY_OFFSET, MessageType::StatsReply, 1);
        buf.at_assert(8, 2).copy_from_slice(&OFPST_FLOW.to_be_bytes());
        for r in records {
            r.encode(&mut buf);
        }
        buf.put(trailing);
        update_openflow_length(&mut buf);
        buf
    }

    #[test]
    fn one_record_then_end() {
        let actions = ActionList::from_actions(&[Action::Output { port: 1, max_len: 0 }]);
        let rec = record(&actions, 42);
        let msg = reply(&[rec], &[]);
        let mut iter = FlowStatsIter::new(msg.as_ref());
        assert_eq!(iter.next(), Some(rec));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn records_keep_their_actions() {
        let none = ActionList::default();
        let two = ActionList::from_actions(&[Action::StripVlan, Action::Output { port: 2, max_len: 0 }]);
        let msg = reply(&[record(&none, 1), record(&two, 2)], &[]);
        let got: Vec<_> = FlowStatsIter::new(msg.as_ref()).collect();
        assert_eq!(got.len(), 2);
        assert!(got[0].actions.is_empty());
        assert_eq!(got[1].actions.iter().count(), 2);
        assert_eq!(got[1].wire_len(), FLOW_STATS_LEN + 16);
        assert_eq!(got[1].cookie, 2);
    }

    #[test]
    #[traced_test]
    fn leftover_bytes() {
        let none = ActionList::default();
        let msg = reply(&[record(&none, 1)], &[1, 2, 3]);
        let mut iter = FlowStatsIter::new(msg.as_ref());
        assert!(iter.next().is_some());
        assert_eq!(iter.next(), None);
        assert!(logs_contain("3 leftover bytes in flow stats reply"));
    }

    #[test]
    #[traced_test]
    fn short_record_length() {
        let none = ActionList::default();
        let mut msg = reply(&[record(&none, 1)], &[]);
        msg.at_assert(STATS_REPLY_BODY_OFFSET, 2)
            .copy_from_slice(&40u16.to_be_bytes());
        assert_eq!(FlowStatsIter::new(msg.as_ref()).next(), None);
        assert!(logs_contain("flow stats length 40 is shorter than min 88"));
    }

    #[test]
    #[traced_test]
    fn record_past_the_end() {
        let none = ActionList::default();
        let mut msg = reply(&[record(&none, 1)], &[]);
        msg.at_assert(STATS_REPLY_BODY_OFFSET, 2)
            .copy_from_slice(&96u16.to_be_bytes());
        assert_eq!(FlowStatsIter::new(msg.as_ref()).next(), None);
        assert!(logs_contain("flow stats length 96 but only 88 bytes left"));
    }

    #[test]
    #[traced_test]
    fn partial_action() {
        let none = ActionList::default();
        let mut msg = reply(&[record(&none, 1)], &[0; 4]);
        msg.at_assert(STATS_REPLY_BODY_OFFSET, 2)
            .copy_from_slice(&92u16.to_be_bytes());
        assert_eq!(FlowStatsIter::new(msg.as_ref()).next(), None);
        assert!(logs_contain("flow stats length 92 has 4 bytes left over in final action"));
    }

    #[test]
    fn bytes_past_the_declared_length_are_ignored() {
        let none = ActionList::default();
        let msg = reply(&[record(&none, 1)], &[]);
        let mut bytes = msg.as_ref().to_vec();
        bytes.extend_from_slice(&[0xff; 20]);
        assert_eq!(FlowStatsIter::new(&bytes).count(), 1);
    }

    #[test]
    fn empty_and_truncated_replies() {
        let msg = reply(&[], &[]);
        assert_eq!(FlowStatsIter::new(msg.as_ref()).next(), None);
        assert_eq!(FlowStatsIter::new(&msg.as_ref()[..4]).next(), None);
        assert_eq!(FlowStatsIter::from_body(&[]).next(), None);
    }
}

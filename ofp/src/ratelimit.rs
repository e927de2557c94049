// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Rate limiting for diagnostics triggered by peer input.
//!
//! A misbehaving peer can send the same malformed message indefinitely, so complaints about
//! peer input go through a token bucket.
//! Use the [`warn_rl!`](crate::warn_rl) and [`debug_rl!`](crate::debug_rl) macros rather than
//! calling [`RateLimit::check`] directly.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Milli-tokens one message costs.
const MSG_COST: u64 = 1000;

/// Shared by the complaints about malformed messages.
pub(crate) static BAD_OFMSG_RL: RateLimit = RateLimit::new(1, 5);

/// Shared by the complaints about unencodable error codes.
pub(crate) static ERROR_MSG_RL: RateLimit = RateLimit::new(1, 5);

/// Outcome of a [`RateLimit`] check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Log the message.
    /// `dropped` messages were suppressed since the last one logged.
    Emit {
        /// Number of suppressed messages.
        dropped: u64,
    },
    /// Drop the message.
    Suppress,
}

#[derive(Debug)]
struct Bucket {
    milli_tokens: u64,
    last: Option<Instant>,
    dropped: u64,
}

/// A token bucket: `per_minute` messages per minute on average, at most `burst` at once.
#[derive(Debug)]
pub struct RateLimit {
    per_minute: u32,
    burst: u32,
    bucket: Mutex<Bucket>,
}

impl RateLimit {
    /// Create a full bucket.
    #[must_use]
    pub const fn new(per_minute: u32, burst: u32) -> RateLimit {
        RateLimit {
            per_minute,
            burst,
            bucket: Mutex::new(Bucket {
                milli_tokens: burst as u64 * MSG_COST,
                last: None,
                dropped: 0,
            }),
        }
    }

    /// Decide whether a message may be logged now.
    ///
    /// Rate limiting is disabled in unit tests so that every diagnostic can be asserted on.
    pub fn check(&self) -> Verdict {
        if cfg!(test) {
            return Verdict::Emit { dropped: 0 };
        }
        self.check_at(Instant::now())
    }

    /// Decide whether a message may be logged at time `now`.
    pub fn check_at(&self, now: Instant) -> Verdict {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let capacity = u64::from(self.burst) * MSG_COST;
        if let Some(last) = bucket.last {
            let elapsed_ms = u64::try_from(now.saturating_duration_since(last).as_millis())
                .unwrap_or(u64::MAX);
            // one message is MSG_COST milli-tokens, a minute is 60_000 ms
            let refill = elapsed_ms.saturating_mul(u64::from(self.per_minute)) / 60;
            bucket.milli_tokens = bucket.milli_tokens.saturating_add(refill).min(capacity);
        }
        bucket.last = Some(now);
        if bucket.milli_tokens >= MSG_COST {
            bucket.milli_tokens -= MSG_COST;
            let dropped = core::mem::take(&mut bucket.dropped);
            Verdict::Emit { dropped }
        } else {
            bucket.dropped += 1;
            Verdict::Suppress
        }
    }
}

/// Log at `warn` level through a [`RateLimit`].
#[macro_export]
macro_rules! warn_rl {
    ($rl:expr, $($arg:tt)+) => {
        if let $crate::ratelimit::Verdict::Emit { dropped } = $rl.check() {
            if dropped > 0 {
                ::tracing::warn!("dropped {dropped} log messages due to excessive rate");
            }
            ::tracing::warn!($($arg)+);
        }
    };
}

/// Log at `debug` level through a [`RateLimit`].
#[macro_export]
macro_rules! debug_rl {
    ($rl:expr, $($arg:tt)+) => {
        if let $crate::ratelimit::Verdict::Emit { dropped } = $rl.check() {
            if dropped > 0 {
                ::tracing::debug!("dropped {dropped} log messages due to excessive rate");
            }
            ::tracing::debug!($($arg)+);
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn burst_then_suppress() {
        let rl = RateLimit::new(1, 5);
        let t0 = Instant::now();
        for _ in 0..5 {
            assert_eq!(rl.check_at(t0), Verdict::Emit { dropped: 0 });
        }
        assert_eq!(rl.check_at(t0), Verdict::Suppress);
        assert_eq!(rl.check_at(t0), Verdict::Suppress);
    }

    #[test]
    fn refill_reports_dropped_count() {
        let rl = RateLimit::new(1, 1);
        let t0 = Instant::now();
        assert_eq!(rl.check_at(t0), Verdict::Emit { dropped: 0 });
        assert_eq!(rl.check_at(t0 + Duration::from_secs(1)), Verdict::Suppress);
        assert_eq!(rl.check_at(t0 + Duration::from_secs(2)), Verdict::Suppress);
        assert_eq!(
            rl.check_at(t0 + Duration::from_secs(62)),
            Verdict::Emit { dropped: 2 }
        );
        assert_eq!(
            rl.check_at(t0 + Duration::from_secs(63)),
            Verdict::Suppress
        );
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let rl = RateLimit::new(60, 2);
        let t0 = Instant::now();
        assert_eq!(rl.check_at(t0), Verdict::Emit { dropped: 0 });
        let later = t0 + Duration::from_secs(3600);
        assert_eq!(rl.check_at(later), Verdict::Emit { dropped: 0 });
        assert_eq!(rl.check_at(later), Verdict::Emit { dropped: 0 });
        assert_eq!(rl.check_at(later), Verdict::Suppress);
    }

    #[test]
    fn disabled_in_unit_tests() {
        let rl = RateLimit::new(1, 0);
        for _ in 0..10 {
            assert_eq!(rl.check(), Verdict::Emit { dropped: 0 });
        }
    }
}

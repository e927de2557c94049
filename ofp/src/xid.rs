// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Transaction id allocation.

use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out transaction ids for outgoing messages: 1, 2, 3, ...
///
/// Safe to share between threads; no id is handed out twice until the counter wraps.
#[derive(Debug)]
pub struct XidAllocator {
    next: AtomicU32,
}

static GLOBAL: XidAllocator = XidAllocator::new();

impl XidAllocator {
    /// A fresh allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> XidAllocator {
        XidAllocator::starting_at(1)
    }

    /// A fresh allocator whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u32) -> XidAllocator {
        XidAllocator {
            next: AtomicU32::new(first),
        }
    }

    /// The process-wide allocator.
    #[must_use]
    pub fn global() -> &'static XidAllocator {
        &GLOBAL
    }

    /// Take the next id.
    pub fn alloc(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for XidAllocator {
    fn default() -> Self {
        XidAllocator::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn starts_at_one() {
        let xids = XidAllocator::new();
        assert_eq!(xids.alloc(), 1);
        assert_eq!(xids.alloc(), 2);
        assert_eq!(xids.alloc(), 3);
    }

    #[test]
    fn global_ids_increase() {
        let first = XidAllocator::global().alloc();
        let second = XidAllocator::global().alloc();
        assert!(second > first);
    }

    #[test]
    fn concurrent_ids_are_unique() {
        let xids = Arc::new(XidAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let xids = Arc::clone(&xids);
                std::thread::spawn(move || (0..1000).map(|_| xids.alloc()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = BTreeSet::new();
        for handle in handles {
            for xid in handle.join().unwrap_or_default() {
                assert!(seen.insert(xid), "duplicate xid {xid}");
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! [`OfpBuf`]: the growable byte buffer which holds OpenFlow messages.

use bytes::{Bytes, BytesMut};
use core::fmt::Debug;
use tracing::trace;

/// A growable buffer holding one or more OpenFlow messages.
///
/// Builders append to the tail of the buffer, receivers pull validated prefixes off its head.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OfpBuf(BytesMut);

/// Error indicating that the buffer is not long enough to remove the requested number of bytes.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("buffer holds {available} bytes, cannot remove {requested}")]
pub struct BufferNotLongEnough {
    /// Number of bytes requested.
    pub requested: usize,
    /// Number of bytes in the buffer.
    pub available: usize,
}

impl OfpBuf {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> OfpBuf {
        OfpBuf(BytesMut::new())
    }

    /// Create an empty buffer which can hold `capacity` bytes without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> OfpBuf {
        OfpBuf(BytesMut::with_capacity(capacity))
    }

    /// Create a buffer holding a copy of `data`.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> OfpBuf {
        OfpBuf(BytesMut::from(data))
    }

    /// Number of bytes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true iff the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `len` zero bytes and return the newly appended region.
    pub fn put_zeros(&mut self, len: usize) -> &mut [u8] {
        let start = self.0.len();
        self.0.resize(start + len, 0);
        &mut self.0[start..]
    }

    /// Append a copy of `data` and return the newly appended region.
    pub fn put(&mut self, data: &[u8]) -> &mut [u8] {
        let start = self.0.len();
        self.0.extend_from_slice(data);
        &mut self.0[start..]
    }

    /// Remove the first `len` bytes of the buffer and return them.
    ///
    /// # Errors
    ///
    /// Returns [`BufferNotLongEnough`] (and leaves the buffer untouched) if fewer than `len` bytes
    /// are held.
    pub fn try_pull(&mut self, len: usize) -> Result<Bytes, BufferNotLongEnough> {
        if len > self.0.len() {
            return Err(BufferNotLongEnough {
                requested: len,
                available: self.0.len(),
            });
        }
        trace!("pulling {len} of {} bytes", self.0.len());
        Ok(self.0.split_to(len).freeze())
    }

    /// Mutable access to `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the requested range is not inside the buffer.
    /// Callers only ever address regions they have themselves appended.
    pub fn at_assert(&mut self, offset: usize, len: usize) -> &mut [u8] {
        assert!(
            offset + len <= self.0.len(),
            "range {offset}..{end} outside buffer of {size} bytes",
            end = offset + len,
            size = self.0.len()
        );
        &mut self.0[offset..offset + len]
    }

    /// Convert into an immutable, cheaply cloneable byte container.
    #[must_use]
    pub fn freeze(self) -> Bytes {
        self.0.freeze()
    }
}

impl AsRef<[u8]> for OfpBuf {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl AsMut<[u8]> for OfpBuf {
    fn as_mut(&mut self) -> &mut [u8] {
        self.0.as_mut()
    }
}

impl From<Vec<u8>> for OfpBuf {
    fn from(value: Vec<u8>) -> Self {
        OfpBuf(BytesMut::from(&value[..]))
    }
}

impl Debug for OfpBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OfpBuf").field("len", &self.0.len()).finish()
    }
}

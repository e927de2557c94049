// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Wire structure parsing traits

use core::convert::Infallible;
use std::num::NonZero;

/// A fixed layout wire structure which can be decoded from a byte slice.
pub trait Parse: Sized {
    /// Error returned when the bytes are long enough but do not describe a legal value.
    type Error: core::error::Error;

    /// Parse from a buffer.
    ///
    /// Returns the parsed value and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns an error in the event that parsing fails.
    fn parse(buf: &[u8]) -> Result<(Self, NonZero<usize>), ParseError<Self::Error>>;
}

/// A fixed layout wire structure which can be encoded into a byte slice.
pub trait DeParse {
    /// Error returned when the value cannot be serialized.
    type Error;

    /// The number of bytes [`DeParse::deparse`] will write.
    fn size(&self) -> NonZero<usize>;

    /// Write the structure to a buffer, big-endian, with all padding zeroed.
    ///
    /// Returns the number of bytes written in the event of success.
    ///
    /// # Errors
    ///
    /// Will return an error if there is not enough space in the buffer
    /// or if serialization fails from some other (implementation-dependent) reason.
    fn deparse(&self, buf: &mut [u8]) -> Result<NonZero<usize>, DeParseError<Self::Error>>;
}

/// A buffer was too short for the structure read from or written to it.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected at least {expected} bytes, got {actual}")]
pub struct LengthError {
    pub(crate) expected: NonZero<usize>,
    pub(crate) actual: usize,
}

impl LengthError {
    /// The number of bytes which were required.
    #[must_use]
    pub fn expected(&self) -> NonZero<usize> {
        self.expected
    }

    /// The number of bytes which were available.
    #[must_use]
    pub fn actual(&self) -> usize {
        self.actual
    }
}

/// Returns `Ok(())` iff `buf` holds at least `expected` bytes.
pub(crate) fn check_len(buf: &[u8], expected: NonZero<usize>) -> Result<(), LengthError> {
    if buf.len() < expected.get() {
        return Err(LengthError {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Errors which may occur when parsing a wire structure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError<E: core::error::Error> {
    /// The input is too short.
    #[error(transparent)]
    Length(LengthError),
    /// The bytes do not describe a legal value.
    #[error(transparent)]
    Invalid(E),
}

impl<E: core::error::Error> From<LengthError> for ParseError<E> {
    fn from(value: LengthError) -> Self {
        ParseError::Length(value)
    }
}

impl ParseError<Infallible> {
    /// Strip the (impossible) `Invalid` case from a parse error.
    #[must_use]
    pub fn into_length(self) -> LengthError {
        match self {
            ParseError::Length(e) => e,
            ParseError::Invalid(never) => match never {},
        }
    }
}

/// Errors which may occur when writing a wire structure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeParseError<E> {
    /// The output buffer is too short.
    #[error(transparent)]
    Length(LengthError),
    /// The value cannot be serialized.
    #[error(transparent)]
    Invalid(E),
}

impl<E> From<LengthError> for DeParseError<E> {
    fn from(value: LengthError) -> Self {
        DeParseError::Length(value)
    }
}

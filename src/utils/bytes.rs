//! Byte-slice utilities for bounds-oriented parsing.
//!
//! Two layers:
//! - **Option layer** (`read_*`): zero-cost helpers that return `Option<T>`.
//! - **Result layer** (`*_r`): wrappers that map `None` to
//!   [`TemplateError::Truncated`] with a human-readable label.
//!
//! All numeric reads are **big-endian** (IPFIX is network byte order).
//! Offsets are `usize` and are interpreted relative to the slice you pass in.

use crate::err::TemplateError;

/// Read `N` raw bytes at `offset`.
///
/// Returns `None` if the range is out of bounds.
pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    let bytes: [u8; N] = buf.get(offset..end)?.try_into().ok()?;
    Some(bytes)
}

/// Read a `u16` (big-endian) at `offset`.
pub(crate) fn read_u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    Some(u16::from_be_bytes(read_array::<2>(buf, offset)?))
}

/// Read a `u32` (big-endian) at `offset`.
pub(crate) fn read_u32_be(buf: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_be_bytes(read_array::<4>(buf, offset)?))
}

#[inline]
fn truncated(what: &'static str, offset: usize, need: usize, len: usize) -> TemplateError {
    TemplateError::Truncated {
        what,
        offset,
        need,
        have: len.saturating_sub(offset),
    }
}

/// Read a `u16` (big-endian) at `offset`, or return [`TemplateError::Truncated`].
pub(crate) fn read_u16_be_r(
    buf: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<u16, TemplateError> {
    read_u16_be(buf, offset).ok_or_else(|| truncated(what, offset, 2, buf.len()))
}

/// Read a `u32` (big-endian) at `offset`, or return [`TemplateError::Truncated`].
pub(crate) fn read_u32_be_r(
    buf: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<u32, TemplateError> {
    read_u32_be(buf, offset).ok_or_else(|| truncated(what, offset, 4, buf.len()))
}

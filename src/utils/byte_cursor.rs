use crate::err::Result;
use crate::utils::bytes;

/// A lightweight cursor over an immutable byte slice.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`, intended for
/// parsing records that are already in memory with explicit bounds control
/// and without IO-style error plumbing.
///
/// All reads are big-endian and advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn u16_named(&mut self, what: &'static str) -> Result<u16> {
        let v = bytes::read_u16_be_r(self.buf, self.pos, what)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub(crate) fn u32_named(&mut self, what: &'static str) -> Result<u32> {
        let v = bytes::read_u32_be_r(self.buf, self.pos, what)?;
        self.pos += 4;
        Ok(v)
    }
}

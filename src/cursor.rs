//! Char-aware cursor over the uncommitted buffer.
//!
//! The overlay scanner moves either by a matcher's byte length or by one
//! whole character, so the cursor never lands inside a UTF-8 sequence.

use crate::TokenRange;

/// A cursor for left-to-right scanning of a `str`.
///
/// # Example
/// ```
/// use streammark::cursor::Cursor;
///
/// let mut cursor = Cursor::new("héllo");
/// cursor.bump_char();
/// cursor.bump_char();
/// assert_eq!(cursor.offset(), 3);
/// assert_eq!(cursor.rest(), "llo");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of `input`.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset from the start of input.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Number of bytes remaining.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Check if cursor is at end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The unscanned remainder of the input.
    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Peek the current character without advancing.
    #[inline]
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Advance by `n` bytes. `n` must end on a char boundary.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        debug_assert!(self.input.is_char_boundary(self.pos + n));
        self.pos += n;
    }

    /// Advance past the current character. Returns false at EOF.
    #[inline]
    pub fn bump_char(&mut self) -> bool {
        match self.peek_char() {
            Some(c) => {
                self.pos += c.len_utf8();
                true
            }
            None => false,
        }
    }

    /// Range covering the next `len` bytes, without advancing.
    #[inline]
    pub fn range_ahead(&self, len: usize, hidden: bool) -> TokenRange {
        TokenRange::from_usize(self.pos, self.pos + len, hidden)
    }
}

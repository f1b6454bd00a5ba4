//! Compact range representation for overlay masks.
//!
//! Uses `u32` offsets: the overlay only ever scans the trailing,
//! uncommitted block, which is far below 4GB.

/// Half-open byte range `[start, end)` into the uncommitted buffer, tagged
/// with the hiding flag of the matcher that consumed it.
///
/// # Example
/// ```
/// use streammark::TokenRange;
///
/// let input = "**bold";
/// let marker = TokenRange::new(0, 2, true);
/// assert_eq!(marker.slice(input), "**");
/// assert!(marker.hidden);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TokenRange {
    pub start: u32,
    pub end: u32,
    /// Characters in this range are dropped from the masked text.
    pub hidden: bool,
}

impl TokenRange {
    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, end: u32, hidden: bool) -> Self {
        Self { start, end, hidden }
    }

    /// Create a range from usize values.
    ///
    /// # Panics
    /// Panics if either value exceeds `u32::MAX`.
    #[inline]
    pub fn from_usize(start: usize, end: usize, hidden: bool) -> Self {
        let (Ok(start), Ok(end)) = (u32::try_from(start), u32::try_from(end)) else {
            panic!("range {start}..{end} exceeds u32 offsets");
        };
        Self { start, end, hidden }
    }

    /// Get the text this range refers to.
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start_usize()..self.end_usize()]
    }

    /// Length of the range in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub const fn start_usize(&self) -> usize {
        self.start as usize
    }

    #[inline]
    pub const fn end_usize(&self) -> usize {
        self.end as usize
    }

    /// Check if this range contains a byte position.
    #[inline]
    pub const fn contains(&self, pos: usize) -> bool {
        pos >= self.start_usize() && pos < self.end_usize()
    }

    /// Check if two ranges share at least one position.
    #[inline]
    pub const fn overlaps(&self, other: &TokenRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<TokenRange> for std::ops::Range<usize> {
    #[inline]
    fn from(r: TokenRange) -> Self {
        r.start_usize()..r.end_usize()
    }
}

//! Overlay tokenizer for the trailing, uncommitted block.
//!
//! One left-to-right pass per chunk over the whole uncommitted text:
//! 1. The context stack is tried innermost first. A failing entry is
//!    popped and the next older entry gets the same position.
//! 2. Otherwise each series' first matcher is tried in table order and the
//!    first hit opens a new entry.
//! 3. Otherwise the cursor moves one character.
//!
//! No backtracking: a failed attempt is never retried at a later position.
//! Only entries still open when the pass ends contribute masks; completed
//! constructs are left as markdown for the converter and failed ones are
//! plain text. Nothing survives between passes.

pub mod mask;

use smallvec::{SmallVec, smallvec};

use crate::TokenRange;
use crate::cursor::Cursor;
use crate::limits::{INLINE_RANGES_PER_ENTRY, INLINE_STACK_DEPTH};
use crate::series::{SeriesTable, TokenSeries};

pub use mask::{UncertaintyMarker, mask};

/// One in-progress attempt to satisfy a token series.
#[derive(Debug, Clone)]
pub struct ContextEntry<'t> {
    series: &'t TokenSeries,
    /// Index of the next matcher expected.
    next: usize,
    ranges: SmallVec<[TokenRange; INLINE_RANGES_PER_ENTRY]>,
}

impl<'t> ContextEntry<'t> {
    #[inline]
    pub fn series(&self) -> &'t TokenSeries {
        self.series
    }

    #[inline]
    pub fn next_index(&self) -> usize {
        self.next
    }

    #[inline]
    pub fn ranges(&self) -> &[TokenRange] {
        &self.ranges
    }

    #[inline]
    fn is_satisfied(&self) -> bool {
        self.next == self.series.len()
    }
}

/// Result of one overlay pass.
#[derive(Debug, Clone, Default)]
pub struct Overlay<'t> {
    ranges: Vec<TokenRange>,
    open: SmallVec<[&'t str; INLINE_STACK_DEPTH]>,
    completed: usize,
    failed: usize,
}

impl<'t> Overlay<'t> {
    /// Masked ranges, ordered by start, non-overlapping.
    #[inline]
    pub fn ranges(&self) -> &[TokenRange] {
        &self.ranges
    }

    /// Names of the series still open at the end of the text, oldest first.
    #[inline]
    pub fn open_series(&self) -> &[&'t str] {
        &self.open
    }

    /// Series fully matched during the pass.
    #[inline]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Series abandoned during the pass.
    #[inline]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// True if nothing in the text is uncertain.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.open.is_empty()
    }
}

/// Scan `text` against `table`.
pub fn scan<'t>(table: &'t SeriesTable, text: &str) -> Overlay<'t> {
    let mut scanner = OverlayScanner::new(table);
    let mut cursor = Cursor::new(text);
    while !cursor.is_eof() {
        scanner.step(&mut cursor);
    }
    scanner.finish()
}

/// Context stack plus per-pass counters.
#[derive(Debug)]
pub struct OverlayScanner<'t> {
    table: &'t SeriesTable,
    stack: SmallVec<[ContextEntry<'t>; INLINE_STACK_DEPTH]>,
    completed: usize,
    failed: usize,
}

impl<'t> OverlayScanner<'t> {
    pub fn new(table: &'t SeriesTable) -> Self {
        Self {
            table,
            stack: SmallVec::new(),
            completed: 0,
            failed: 0,
        }
    }

    /// Open entries, oldest first.
    #[inline]
    pub fn stack(&self) -> &[ContextEntry<'t>] {
        &self.stack
    }

    /// Consume at least one character at the cursor.
    pub fn step(&mut self, cursor: &mut Cursor<'_>) {
        if self.continue_open(cursor) || self.open_series(cursor) {
            return;
        }
        cursor.bump_char();
    }

    fn continue_open(&mut self, cursor: &mut Cursor<'_>) -> bool {
        while let Some(entry) = self.stack.last_mut() {
            let series = entry.series;
            let matcher = &series.matchers()[entry.next];
            let len = matcher.matching.match_len(cursor.rest());
            if len == 0 {
                self.stack.pop();
                self.failed += 1;
                continue;
            }

            entry.ranges.push(cursor.range_ahead(len, matcher.hiding));
            entry.next += 1;
            if entry.is_satisfied() {
                self.stack.pop();
                self.completed += 1;
            }
            cursor.advance(len);
            return true;
        }
        false
    }

    fn open_series(&mut self, cursor: &mut Cursor<'_>) -> bool {
        for series in self.table.iter() {
            let Some(first) = series.matchers().first() else {
                continue;
            };
            let len = first.matching.match_len(cursor.rest());
            if len == 0 {
                continue;
            }

            let entry = ContextEntry {
                series,
                next: 1,
                ranges: smallvec![cursor.range_ahead(len, first.hiding)],
            };
            if entry.is_satisfied() {
                self.completed += 1;
            } else {
                self.stack.push(entry);
            }
            cursor.advance(len);
            return true;
        }
        false
    }

    /// Collect the ranges of the entries left open.
    pub fn finish(self) -> Overlay<'t> {
        let mut ranges: Vec<TokenRange> = self
            .stack
            .iter()
            .flat_map(|entry| entry.ranges.iter().copied())
            .collect();
        ranges.sort_by_key(|r| r.start);

        Overlay {
            ranges,
            open: self.stack.iter().map(|e| e.series.name()).collect(),
            completed: self.completed,
            failed: self.failed,
        }
    }
}

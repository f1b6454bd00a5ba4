//! streammark: flicker-free rendering of markdown that arrives in pieces.
//!
//! Text streamed token by token is full of half-written syntax: an
//! unterminated `**`, a `[` whose link has not arrived yet. Rendering it
//! as-is makes markers flash on screen and vanish a moment later. This
//! crate keeps a buffer of the uncommitted text and, on every chunk:
//!
//! 1. commits each top-level block that a following block has closed,
//! 2. scans the trailing block for token series that are still open,
//! 3. hides their markers, wraps their visible text in an uncertainty
//!    span, and renders the result as the speculative view.
//!
//! # Design Principles
//! - Markdown semantics belong to the converter; the overlay only masks
//! - No backtracking: one greedy pass over the trailing block per chunk
//! - Nothing carried between passes except the buffer
//! - Configuration is validated up front, never mid-scan
//!
//! # Example
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use streammark::{MarkdownMachine, SeriesTable};
//!
//! let committed = Rc::new(RefCell::new(String::new()));
//! let sink = committed.clone();
//! let machine = MarkdownMachine::builder(SeriesTable::default())
//!     .on_processed_content(move |html| sink.borrow_mut().push_str(html))
//!     .build();
//!
//! machine.eat("# Title\n\nSome *text*").unwrap();
//! assert_eq!(*committed.borrow(), "<h1>Title</h1>\n");
//! machine.finish_eating().unwrap();
//! assert!(committed.borrow().ends_with("<p>Some <em>text</em></p>\n"));
//! ```

pub mod convert;
pub mod cursor;
pub mod error;
pub mod feed;
pub mod limits;
pub mod machine;
pub mod overlay;
pub mod range;
pub mod series;

// Re-export primary types
pub use convert::{BlockKind, BlockToken, CmarkConverter, MarkdownConverter};
pub use error::{ConfigError, StreamError};
pub use feed::{CancelHandle, ChunkFeeder, FeedConfig, FeedOutcome};
pub use machine::{ContentReporter, MachineBuilder, MarkdownMachine};
pub use overlay::{Overlay, UncertaintyMarker};
pub use range::TokenRange;
pub use series::{Matcher, SeriesTable, TokenMatcher, TokenSeries};

/// Markdown dialect options for the default converter.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// GFM pipe tables.
    pub tables: bool,
    /// `~~strikethrough~~`.
    pub strikethrough: bool,
    /// `- [x]` task list items.
    pub task_lists: bool,
    /// `[^note]` footnotes.
    pub footnotes: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: false,
            footnotes: false,
        }
    }
}

/// Mask `text` with the default series table and marker, without
/// rendering.
///
/// # Example
/// ```
/// assert_eq!(
///     streammark::mask_pending("see [the docs"),
///     "see <span class=\"uncertain\">the docs</span>"
/// );
/// ```
pub fn mask_pending(text: &str) -> String {
    let table = SeriesTable::default();
    let overlay = overlay::scan(&table, text);
    overlay::mask(text, overlay.ranges(), &UncertaintyMarker::default())
}

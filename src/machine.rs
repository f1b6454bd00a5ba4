//! The streaming markdown machine.
//!
//! Per chunk: append to the buffer, commit every block that a later block
//! has closed, then mask and render what is left as the speculative view.

use std::cell::RefCell;
use std::fmt;

use memchr::memmem;
use tracing::{debug, trace, warn};

use crate::convert::{CmarkConverter, MarkdownConverter};
use crate::error::StreamError;
use crate::overlay::{self, UncertaintyMarker};
use crate::series::SeriesTable;
use crate::Options;

/// Receives rendered HTML.
pub type ContentReporter = Box<dyn FnMut(&str)>;

struct State {
    buffer: String,
    on_processed: ContentReporter,
    on_in_processing: ContentReporter,
}

/// Incremental markdown renderer that hides half-formed syntax.
///
/// Committed blocks are reported once each through the processed-content
/// callback (append semantics). The speculative view of the trailing block
/// is reported through the in-processing callback on every call and
/// replaces the previous one.
///
/// Calling back into the machine from one of its callbacks fails with
/// [`StreamError::Reentrant`].
///
/// # Example
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use streammark::{MarkdownMachine, SeriesTable};
///
/// let pending = Rc::new(RefCell::new(String::new()));
/// let sink = pending.clone();
/// let machine = MarkdownMachine::builder(SeriesTable::default())
///     .on_in_processing_content(move |html| *sink.borrow_mut() = html.to_string())
///     .build();
///
/// machine.eat("**Hello").unwrap();
/// assert_eq!(*pending.borrow(), "<p><span class=\"uncertain\">Hello</span></p>\n");
/// machine.eat("**").unwrap();
/// assert_eq!(*pending.borrow(), "<p><strong>Hello</strong></p>\n");
/// ```
pub struct MarkdownMachine<C = CmarkConverter> {
    table: SeriesTable,
    converter: C,
    marker: UncertaintyMarker,
    state: RefCell<State>,
}

impl MarkdownMachine<CmarkConverter> {
    /// Start configuring a machine with the default converter.
    pub fn builder(table: SeriesTable) -> MachineBuilder<CmarkConverter> {
        MachineBuilder::new(table)
    }
}

impl<C: MarkdownConverter> MarkdownMachine<C> {
    /// Feed the next chunk of text.
    ///
    /// # Panics
    /// Panics if the uncommitted text grows past
    /// [`MAX_PENDING_LEN`](crate::limits::MAX_PENDING_LEN) bytes.
    pub fn eat(&self, chunk: &str) -> Result<(), StreamError> {
        let mut state = self.lock()?;
        let state = &mut *state;

        state.buffer.push_str(chunk);
        self.commit_closed_blocks(state);

        let overlay = overlay::scan(&self.table, &state.buffer);
        trace!(
            len = state.buffer.len(),
            open = ?overlay.open_series(),
            completed = overlay.completed(),
            failed = overlay.failed(),
            "overlay pass"
        );
        let masked = overlay::mask(&state.buffer, overlay.ranges(), &self.marker);
        let html = self.converter.render(&masked);
        (state.on_in_processing)(&html);

        Ok(())
    }

    /// End of stream: commit whatever is left, unmasked, and clear the
    /// speculative view.
    pub fn finish_eating(&self) -> Result<(), StreamError> {
        let mut state = self.lock()?;
        let state = &mut *state;

        if !state.buffer.is_empty() {
            let html = self.converter.render(&state.buffer);
            debug!(len = state.buffer.len(), "stream finished");
            state.buffer.clear();
            if !html.is_empty() {
                (state.on_processed)(&html);
            }
        }
        (state.on_in_processing)("");

        Ok(())
    }

    /// Drop the buffer without reporting anything.
    pub fn reset(&self) -> Result<(), StreamError> {
        self.lock()?.buffer.clear();
        Ok(())
    }

    /// The text not yet committed.
    pub fn pending_text(&self) -> Result<String, StreamError> {
        Ok(self.lock()?.buffer.clone())
    }

    #[inline]
    pub fn table(&self) -> &SeriesTable {
        &self.table
    }

    #[inline]
    pub fn converter(&self) -> &C {
        &self.converter
    }

    fn lock(&self) -> Result<std::cell::RefMut<'_, State>, StreamError> {
        self.state.try_borrow_mut().map_err(|_| {
            warn!("rejected re-entrant call into markdown machine");
            StreamError::Reentrant
        })
    }

    /// Every block except the last is closed by the one after it. Blocks
    /// that render to nothing are dropped without a report.
    fn commit_closed_blocks(&self, state: &mut State) {
        let tokens = self.converter.parse_blocks(&state.buffer);
        let closed = tokens.len().saturating_sub(1);

        for token in tokens.into_iter().take(closed) {
            if !token.kind.is_separator() {
                let html = self.converter.render_block(&token);
                debug!(kind = ?token.kind, len = token.raw.len(), "committed block");
                if !html.is_empty() {
                    (state.on_processed)(&html);
                }
            }
            if let Some(at) = memmem::find(state.buffer.as_bytes(), token.raw.as_bytes()) {
                state.buffer.replace_range(at..at + token.raw.len(), "");
            }
        }
    }
}

impl<C> fmt::Debug for MarkdownMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("MarkdownMachine");
        d.field("series", &self.table.len());
        match self.state.try_borrow() {
            Ok(state) => d.field("buffer", &state.buffer),
            Err(_) => d.field("buffer", &"<busy>"),
        };
        d.finish()
    }
}

/// Builder for [`MarkdownMachine`].
pub struct MachineBuilder<C = CmarkConverter> {
    table: SeriesTable,
    converter: C,
    marker: UncertaintyMarker,
    on_processed: ContentReporter,
    on_in_processing: ContentReporter,
}

impl MachineBuilder<CmarkConverter> {
    pub fn new(table: SeriesTable) -> Self {
        Self {
            table,
            converter: CmarkConverter::default(),
            marker: UncertaintyMarker::default(),
            on_processed: Box::new(|_| {}),
            on_in_processing: Box::new(|_| {}),
        }
    }

    /// Configure the default converter.
    pub fn options(mut self, options: &Options) -> Self {
        self.converter = CmarkConverter::new(options);
        self
    }
}

impl<C: MarkdownConverter> MachineBuilder<C> {
    /// Swap in another converter.
    pub fn converter<D: MarkdownConverter>(self, converter: D) -> MachineBuilder<D> {
        MachineBuilder {
            table: self.table,
            converter,
            marker: self.marker,
            on_processed: self.on_processed,
            on_in_processing: self.on_in_processing,
        }
    }

    pub fn marker(mut self, marker: UncertaintyMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Called once per committed block.
    pub fn on_processed_content(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_processed = Box::new(f);
        self
    }

    /// Called once per chunk with the full speculative view.
    pub fn on_in_processing_content(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_in_processing = Box::new(f);
        self
    }

    pub fn build(self) -> MarkdownMachine<C> {
        MarkdownMachine {
            table: self.table,
            converter: self.converter,
            marker: self.marker,
            state: RefCell::new(State {
                buffer: String::new(),
                on_processed: self.on_processed,
                on_in_processing: self.on_in_processing,
            }),
        }
    }
}

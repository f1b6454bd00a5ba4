//! Markdown-to-HTML conversion seam.
//!
//! The machine never interprets markdown itself. It asks a converter to
//! split text into top-level blocks and to render HTML, and only prepares
//! what goes in.

use memchr::{memchr_iter, memrchr};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, html};

use crate::Options;

/// Coarse type tag for a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Whitespace between blocks. Never rendered.
    Separator,
    Paragraph,
    Heading,
    CodeBlock,
    BlockQuote,
    List,
    Html,
    Rule,
    Table,
    /// Anything else, including text that renders to nothing such as
    /// link reference definitions.
    Other,
}

impl BlockKind {
    #[inline]
    pub fn is_separator(self) -> bool {
        self == Self::Separator
    }
}

/// A top-level block and its raw source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockToken {
    pub kind: BlockKind,
    pub raw: String,
}

impl BlockToken {
    pub fn new(kind: BlockKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }
}

/// External markdown converter.
///
/// `parse_blocks` must return tokens whose raws, concatenated in order,
/// reproduce the input. Every token but the last is taken as closed.
pub trait MarkdownConverter {
    /// Split text into top-level blocks.
    fn parse_blocks(&self, text: &str) -> Vec<BlockToken>;

    /// Render a single block.
    fn render_block(&self, token: &BlockToken) -> String {
        self.render(&token.raw)
    }

    /// Render a whole document.
    fn render(&self, text: &str) -> String;
}

/// [`MarkdownConverter`] backed by `pulldown-cmark`.
#[derive(Debug, Clone, Copy)]
pub struct CmarkConverter {
    options: pulldown_cmark::Options,
}

impl CmarkConverter {
    pub fn new(options: &Options) -> Self {
        let mut flags = pulldown_cmark::Options::empty();
        if options.tables {
            flags.insert(pulldown_cmark::Options::ENABLE_TABLES);
        }
        if options.strikethrough {
            flags.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
        }
        if options.task_lists {
            flags.insert(pulldown_cmark::Options::ENABLE_TASKLISTS);
        }
        if options.footnotes {
            flags.insert(pulldown_cmark::Options::ENABLE_FOOTNOTES);
        }
        Self { options: flags }
    }
}

impl Default for CmarkConverter {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl MarkdownConverter for CmarkConverter {
    fn parse_blocks(&self, text: &str) -> Vec<BlockToken> {
        let mut spans = Vec::new();
        let mut depth = 0usize;
        // Indented code survives blank lines; the next indented line extends it.
        let mut last_indented_code = false;

        for (event, range) in Parser::new_ext(text, self.options).into_offset_iter() {
            match event {
                Event::Start(tag) => {
                    if depth == 0 {
                        last_indented_code =
                            matches!(tag, Tag::CodeBlock(CodeBlockKind::Indented));
                        spans.push((block_kind(&tag), range));
                    }
                    depth += 1;
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Rule if depth == 0 => {
                    last_indented_code = false;
                    spans.push((BlockKind::Rule, range));
                }
                _ if depth == 0 => {
                    last_indented_code = false;
                    spans.push((BlockKind::Other, range));
                }
                _ => {}
            }
        }

        tile(text, spans, last_indented_code)
    }

    fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        html::push_html(&mut out, Parser::new_ext(text, self.options));
        out
    }
}

fn block_kind(tag: &Tag<'_>) -> BlockKind {
    match tag {
        Tag::Paragraph => BlockKind::Paragraph,
        Tag::Heading { .. } => BlockKind::Heading,
        Tag::CodeBlock(_) => BlockKind::CodeBlock,
        Tag::BlockQuote(_) => BlockKind::BlockQuote,
        Tag::List(_) => BlockKind::List,
        Tag::HtmlBlock => BlockKind::Html,
        Tag::Table(_) => BlockKind::Table,
        _ => BlockKind::Other,
    }
}

/// Turn block spans into tokens that cover `text` without gaps.
///
/// Text between blocks becomes its own token, except for indentation on the
/// line a block starts on, which stays with the block. Whitespace after the
/// last block only becomes a separator once it forms a blank line; before
/// that the next chunk may still continue the block, so it stays attached.
/// A trailing block that `continues` past blank lines keeps all of it.
fn tile(
    text: &str,
    spans: Vec<(BlockKind, std::ops::Range<usize>)>,
    continues: bool,
) -> Vec<BlockToken> {
    let mut tokens = Vec::with_capacity(spans.len() * 2 + 1);
    let mut pos = 0;

    for (kind, range) in spans {
        let start = range.start.max(pos);
        let end = range.end.max(start);
        let lead = pos + line_indent_start(&text[pos..start]);
        if lead > pos {
            tokens.push(gap(&text[pos..lead]));
        }
        if end > lead {
            tokens.push(BlockToken::new(kind, &text[lead..end]));
        }
        pos = end;
    }

    if pos < text.len() {
        let tail = &text[pos..];
        match tokens.last_mut() {
            Some(last) if is_blank(tail) && (continues || !closes_block(&last.raw, tail)) => {
                last.raw.push_str(tail);
            }
            _ => tokens.push(gap(tail)),
        }
    }

    tokens
}

/// Offset in `between` where the indentation of the following block's
/// line begins, or `between.len()` when that line holds anything else.
fn line_indent_start(between: &str) -> usize {
    let line = memrchr(b'\n', between.as_bytes()).map_or(0, |i| i + 1);
    if between[line..].bytes().all(|b| matches!(b, b' ' | b'\t')) {
        line
    } else {
        between.len()
    }
}

fn gap(raw: &str) -> BlockToken {
    let kind = if is_blank(raw) {
        BlockKind::Separator
    } else {
        BlockKind::Other
    };
    BlockToken::new(kind, raw)
}

#[inline]
fn is_blank(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// A blank line follows `block` once two line endings separate it from
/// whatever comes next.
fn closes_block(block: &str, tail: &str) -> bool {
    let own = usize::from(block.ends_with('\n'));
    own + memchr_iter(b'\n', tail.as_bytes()).count() >= 2
}

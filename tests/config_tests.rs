//! Token series tables, custom converters and configuration errors.

use std::cell::RefCell;
use std::rc::Rc;

use streammark::{
    BlockKind, BlockToken, ConfigError, MarkdownConverter, MarkdownMachine, Matcher, SeriesTable,
    TokenMatcher, TokenSeries,
};

const STRIKE_TABLE: &str = r#"[
    {"name": "strike", "tokens": [
        {"literal": "~~", "hiding": true},
        {"pattern": "[^~]+", "hiding": false},
        {"literal": "~~", "hiding": true}
    ]}
]"#;

fn pending_view(table: SeriesTable, input: &str) -> String {
    let pending = Rc::new(RefCell::new(String::new()));
    let sink = pending.clone();
    let machine = MarkdownMachine::builder(table)
        .on_in_processing_content(move |html| *sink.borrow_mut() = html.to_string())
        .build();
    machine.eat(input).unwrap();
    let view = pending.borrow().clone();
    view
}

#[test]
fn test_json_table_masks_strikethrough() {
    let table = SeriesTable::from_json(STRIKE_TABLE).unwrap();
    assert_eq!(
        pending_view(table.clone(), "~~gone"),
        "<p><span class=\"uncertain\">gone</span></p>\n"
    );
    assert_eq!(pending_view(table, "~~gone~~"), "<p><del>gone</del></p>\n");
}

#[test]
fn test_json_table_ignores_default_series() {
    let table = SeriesTable::from_json(STRIKE_TABLE).unwrap();
    assert_eq!(pending_view(table, "**raw"), "<p>**raw</p>\n");
}

#[test]
fn test_empty_table_masks_nothing() {
    let table = SeriesTable::new(vec![]).unwrap();
    assert_eq!(pending_view(table, "[half"), "<p>[half</p>\n");
}

#[test]
fn test_visible_only_series_wraps_without_hiding() {
    let table = SeriesTable::new(vec![TokenSeries::new(
        "mention",
        vec![
            Matcher::visible(TokenMatcher::literal("@")),
            Matcher::visible(TokenMatcher::pattern("[a-z]+").unwrap()),
            Matcher::hidden(TokenMatcher::literal(" ")),
        ],
    )])
    .unwrap();
    assert_eq!(
        pending_view(table, "hi @bob"),
        "<p>hi <span class=\"uncertain\">@bob</span></p>\n"
    );
}

#[test]
fn test_error_messages() {
    let err = SeriesTable::new(vec![TokenSeries::new("bare", vec![])]).unwrap_err();
    assert_eq!(err.to_string(), "token series `bare` has no matchers");

    let err = SeriesTable::from_json(
        r#"[{"name": "loose", "tokens": [{"pattern": "x?", "hiding": true}]}]"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "matcher 0 of token series `loose` can match the empty string"
    );
}

#[test]
fn test_json_missing_hiding_flag() {
    let err = SeriesTable::from_json(r#"[{"name": "x", "tokens": [{"literal": "x"}]}]"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn test_too_many_series() {
    let series = (0..=streammark::limits::MAX_SERIES)
        .map(|i| TokenSeries::new(format!("s{i}"), vec![Matcher::hidden(TokenMatcher::literal("x"))]))
        .collect();
    let err = SeriesTable::new(series).unwrap_err();
    assert!(matches!(err, ConfigError::TooManySeries { .. }));
}

/// Treats every line as a block and renders it upper-cased.
struct LineConverter;

impl MarkdownConverter for LineConverter {
    fn parse_blocks(&self, text: &str) -> Vec<BlockToken> {
        text.split_inclusive('\n')
            .map(|line| BlockToken::new(BlockKind::Paragraph, line))
            .collect()
    }

    fn render(&self, text: &str) -> String {
        text.to_uppercase()
    }
}

#[test]
fn test_custom_converter() {
    let processed: Rc<RefCell<Vec<String>>> = Rc::default();
    let pending = Rc::new(RefCell::new(String::new()));
    let (p, q) = (processed.clone(), pending.clone());
    let machine = MarkdownMachine::builder(SeriesTable::default())
        .converter(LineConverter)
        .on_processed_content(move |html| p.borrow_mut().push(html.to_string()))
        .on_in_processing_content(move |html| *q.borrow_mut() = html.to_string())
        .build();

    machine.eat("one\ntwo\n_thr").unwrap();
    assert_eq!(*processed.borrow(), ["ONE\n", "TWO\n"]);
    assert_eq!(*pending.borrow(), "<SPAN CLASS=\"UNCERTAIN\">THR</SPAN>");
}

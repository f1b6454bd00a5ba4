//! Token series: the table of syntax constructs the overlay recognizes.
//!
//! A series is an ordered list of matchers (`[`, link text, `]`, `(`, url,
//! `)`). Each matcher either hides the characters it consumes or lets them
//! render inside the uncertainty marker until the series completes.

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::limits;

/// A single match rule, applied at offset 0 of the unscanned text.
#[derive(Debug, Clone)]
pub enum TokenMatcher {
    /// Exact literal prefix.
    Literal(String),
    /// Anchored regular expression.
    Pattern(Regex),
}

impl TokenMatcher {
    /// Literal matcher.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Compile a pattern anchored to the start of the unscanned text.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})"))
            .size_limit(limits::MAX_PATTERN_SIZE)
            .build()?;
        Ok(Self::Pattern(regex))
    }

    /// Length in bytes of the match at the start of `text`, or 0 for none.
    ///
    /// An empty match is indistinguishable from no match, which keeps the
    /// scan moving forward.
    #[inline]
    pub fn match_len(&self, text: &str) -> usize {
        match self {
            Self::Literal(lit) => {
                if text.starts_with(lit.as_str()) {
                    lit.len()
                } else {
                    0
                }
            }
            Self::Pattern(regex) => regex.find(text).map_or(0, |m| m.end()),
        }
    }

    fn can_match_empty(&self) -> bool {
        match self {
            Self::Literal(lit) => lit.is_empty(),
            Self::Pattern(regex) => regex.is_match(""),
        }
    }
}

/// A matcher plus its hiding flag.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub matching: TokenMatcher,
    /// Consumed characters never render while the series is open.
    pub hiding: bool,
}

impl Matcher {
    pub fn hidden(matching: TokenMatcher) -> Self {
        Self {
            matching,
            hiding: true,
        }
    }

    pub fn visible(matching: TokenMatcher) -> Self {
        Self {
            matching,
            hiding: false,
        }
    }
}

/// One syntactic construct as an ordered sequence of matchers.
#[derive(Debug, Clone)]
pub struct TokenSeries {
    name: String,
    matchers: Vec<Matcher>,
}

impl TokenSeries {
    pub fn new(name: impl Into<String>, matchers: Vec<Matcher>) -> Self {
        Self {
            name: name.into(),
            matchers,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

/// Validated, immutable token series table.
///
/// Order matters: when several series can open at the same position the
/// first one registered wins.
#[derive(Debug, Clone)]
pub struct SeriesTable {
    series: Vec<TokenSeries>,
}

impl SeriesTable {
    /// Validate a table.
    ///
    /// Rejects empty series, matchers that can match the empty string,
    /// duplicate names, and tables beyond the configured limits.
    pub fn new(series: Vec<TokenSeries>) -> Result<Self, ConfigError> {
        if series.len() > limits::MAX_SERIES {
            return Err(ConfigError::TooManySeries {
                count: series.len(),
                limit: limits::MAX_SERIES,
            });
        }

        Self::validate(&series)?;
        Ok(Self { series })
    }

    fn validate(series: &[TokenSeries]) -> Result<(), ConfigError> {
        let mut names = FxHashSet::default();
        for s in series {
            if s.is_empty() {
                return Err(ConfigError::EmptySeries {
                    name: s.name.clone(),
                });
            }
            if s.len() > limits::MAX_MATCHERS_PER_SERIES {
                return Err(ConfigError::TooManyMatchers {
                    name: s.name.clone(),
                    count: s.len(),
                    limit: limits::MAX_MATCHERS_PER_SERIES,
                });
            }
            if let Some(index) = s.matchers.iter().position(|m| m.matching.can_match_empty()) {
                return Err(ConfigError::EmptyMatch {
                    series: s.name.clone(),
                    index,
                });
            }
            if !names.insert(s.name.as_str()) {
                return Err(ConfigError::DuplicateSeries {
                    name: s.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Compile and validate deserialized definitions.
    pub fn from_defs(defs: Vec<SeriesDef>) -> Result<Self, ConfigError> {
        let mut series = Vec::with_capacity(defs.len());
        for def in defs {
            let mut matchers = Vec::with_capacity(def.tokens.len());
            for (index, token) in def.tokens.into_iter().enumerate() {
                let matching = match token.matching {
                    MatchingDef::Literal(lit) => TokenMatcher::Literal(lit),
                    MatchingDef::Pattern(pattern) => TokenMatcher::pattern(&pattern)
                        .map_err(|source| ConfigError::InvalidPattern {
                            series: def.name.clone(),
                            index,
                            source,
                        })?,
                };
                matchers.push(Matcher {
                    matching,
                    hiding: token.hiding,
                });
            }
            series.push(TokenSeries::new(def.name, matchers));
        }
        Self::new(series)
    }

    /// Parse a JSON table.
    ///
    /// ```
    /// use streammark::SeriesTable;
    ///
    /// let table = SeriesTable::from_json(
    ///     r#"[{"name": "strike", "tokens": [
    ///         {"literal": "~~", "hiding": true},
    ///         {"pattern": "[^~]+", "hiding": false},
    ///         {"literal": "~~", "hiding": true}
    ///     ]}]"#,
    /// ).unwrap();
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let defs: Vec<SeriesDef> = serde_json::from_str(json)?;
        Self::from_defs(defs)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, TokenSeries> {
        self.series.iter()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&TokenSeries> {
        self.series.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Default for SeriesTable {
    /// Links, bold and italic in both delimiter flavors.
    fn default() -> Self {
        Self {
            series: default_series(),
        }
    }
}

/// Serialized form of a token series.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesDef {
    pub name: String,
    pub tokens: Vec<MatcherDef>,
}

/// Serialized form of a matcher: `{"literal": "**", "hiding": true}` or
/// `{"pattern": "[^*]+", "hiding": false}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherDef {
    #[serde(flatten)]
    pub matching: MatchingDef,
    pub hiding: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingDef {
    Literal(String),
    Pattern(String),
}

/// The built-in series, in priority order.
pub fn default_series() -> Vec<TokenSeries> {
    vec![
        TokenSeries::new(
            "link",
            vec![
                hidden("["),
                Matcher::visible(builtin_pattern(r"[^\]]+")),
                hidden("]"),
                hidden("("),
                Matcher::hidden(builtin_pattern(r"[^)]+")),
                hidden(")"),
            ],
        ),
        emphasis("bold-asterisk", "**", '*', 2),
        emphasis("bold-underline", "__", '_', 2),
        emphasis("italic-asterisk", "*", '*', 1),
        emphasis("italic-underline", "_", '_', 1),
    ]
}

/// Opening run, text that neither starts with a space nor contains the
/// delimiter, then the closing delimiter one character at a time.
fn emphasis(name: &str, open: &str, delim: char, close_len: usize) -> TokenSeries {
    let escaped = regex::escape(&delim.to_string());
    let mut matchers = vec![
        hidden(open),
        Matcher::visible(builtin_pattern(&format!("[^{escaped} ][^{escaped}]*"))),
    ];
    for _ in 0..close_len {
        matchers.push(hidden(delim.to_string()));
    }
    TokenSeries::new(name, matchers)
}

fn hidden(lit: impl Into<String>) -> Matcher {
    Matcher::hidden(TokenMatcher::literal(lit))
}

fn builtin_pattern(pattern: &str) -> TokenMatcher {
    TokenMatcher::pattern(pattern).expect("built-in pattern compiles")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match_len() {
        let m = TokenMatcher::literal("**");
        assert_eq!(m.match_len("**bold"), 2);
        assert_eq!(m.match_len("*bold"), 0);
        assert_eq!(m.match_len(""), 0);
    }

    #[test]
    fn test_pattern_is_anchored() {
        let m = TokenMatcher::pattern("[^*]+").unwrap();
        assert_eq!(m.match_len("abc*"), 3);
        assert_eq!(m.match_len("*abc"), 0);
    }

    #[test]
    fn test_pattern_alternation_stays_anchored() {
        let m = TokenMatcher::pattern("a|b").unwrap();
        assert_eq!(m.match_len("xb"), 0);
        assert_eq!(m.match_len("bx"), 1);
    }

    #[test]
    fn test_default_table_order() {
        let table = SeriesTable::default();
        let names: Vec<_> = table.iter().map(TokenSeries::name).collect();
        assert_eq!(
            names,
            [
                "link",
                "bold-asterisk",
                "bold-underline",
                "italic-asterisk",
                "italic-underline"
            ]
        );
        assert_eq!(table.get(0).unwrap().len(), 6);
        assert_eq!(table.get(1).unwrap().len(), 4);
        assert_eq!(table.get(3).unwrap().len(), 3);
    }

    #[test]
    fn test_default_table_validates() {
        assert!(SeriesTable::new(default_series()).is_ok());
    }

    #[test]
    fn test_emphasis_text_rejects_leading_space() {
        let table = SeriesTable::default();
        let text = &table.get(1).unwrap().matchers()[1];
        assert!(!text.hiding);
        assert_eq!(text.matching.match_len(" Hello"), 0);
        assert_eq!(text.matching.match_len("Hello World*"), 11);
    }

    #[test]
    fn test_rejects_empty_series() {
        let err = SeriesTable::new(vec![TokenSeries::new("nothing", vec![])]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySeries { ref name } if name == "nothing"));
    }

    #[test]
    fn test_rejects_empty_matching_pattern() {
        let series = TokenSeries::new(
            "star",
            vec![
                hidden("*"),
                Matcher::visible(TokenMatcher::pattern("[^*]*").unwrap()),
            ],
        );
        let err = SeriesTable::new(vec![series]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMatch { index: 1, .. }));
    }

    #[test]
    fn test_rejects_empty_literal() {
        let series = TokenSeries::new("blank", vec![hidden("")]);
        let err = SeriesTable::new(vec![series]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMatch { index: 0, .. }));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let a = TokenSeries::new("dup", vec![hidden("~")]);
        let b = TokenSeries::new("dup", vec![hidden("=")]);
        let err = SeriesTable::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSeries { .. }));
    }

    #[test]
    fn test_rejects_too_many_matchers() {
        let matchers = (0..=limits::MAX_MATCHERS_PER_SERIES)
            .map(|_| hidden("x"))
            .collect();
        let err = SeriesTable::new(vec![TokenSeries::new("long", matchers)]).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyMatchers { .. }));
    }

    #[test]
    fn test_from_json_invalid_pattern() {
        let err = SeriesTable::from_json(
            r#"[{"name": "bad", "tokens": [{"pattern": "[", "hiding": true}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref series, index: 0, .. } if series == "bad"));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = SeriesTable::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}

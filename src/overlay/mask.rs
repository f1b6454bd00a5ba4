//! Masked-string reconstruction.
//!
//! Hidden characters vanish. Visible covered characters are kept, and each
//! contiguous covered run is wrapped in one uncertainty marker.

use crate::TokenRange;

/// The wrapper emitted around uncertain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncertaintyMarker {
    open: String,
    close: &'static str,
}

impl UncertaintyMarker {
    /// `<span class="{class}">`, with the class attribute-escaped.
    pub fn with_class(class: &str) -> Self {
        Self {
            open: format!(
                "<span class=\"{}\">",
                html_escape::encode_double_quoted_attribute(class)
            ),
            close: "</span>",
        }
    }

    #[inline]
    pub fn open_tag(&self) -> &str {
        &self.open
    }

    #[inline]
    pub fn close_tag(&self) -> &str {
        self.close
    }
}

impl Default for UncertaintyMarker {
    fn default() -> Self {
        Self::with_class("uncertain")
    }
}

/// Rebuild `text` with `ranges` applied.
///
/// `ranges` must be sorted by start and must not overlap, which holds for
/// the output of a single overlay pass.
///
/// # Example
/// ```
/// use streammark::{TokenRange, UncertaintyMarker};
/// use streammark::overlay::mask;
///
/// let ranges = [TokenRange::new(0, 2, true), TokenRange::new(2, 7, false)];
/// let masked = mask("**Hello", &ranges, &UncertaintyMarker::default());
/// assert_eq!(masked, "<span class=\"uncertain\">Hello</span>");
/// ```
pub fn mask(text: &str, ranges: &[TokenRange], marker: &UncertaintyMarker) -> String {
    debug_assert!(
        ranges.windows(2).all(|w| w[0].end <= w[1].start),
        "overlay ranges must be sorted and disjoint"
    );

    let mut out = String::with_capacity(text.len() + marker.open.len() + marker.close.len());
    let mut in_run = false;
    let mut next = 0;

    for (i, c) in text.char_indices() {
        while next < ranges.len() && ranges[next].end_usize() <= i {
            next += 1;
        }

        match ranges.get(next).filter(|r| r.contains(i)) {
            Some(range) => {
                if !in_run {
                    out.push_str(&marker.open);
                    in_run = true;
                }
                if !range.hidden {
                    out.push(c);
                }
            }
            None => {
                if in_run {
                    out.push_str(marker.close);
                    in_run = false;
                }
                out.push(c);
            }
        }
    }

    if in_run {
        out.push_str(marker.close);
    }
    out
}

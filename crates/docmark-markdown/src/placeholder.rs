//! Image placeholder markers.
//!
//! Markers are short, unstyled ASCII so the document service keeps each one
//! inside a single text run after insertion.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

const MARKER_PREFIX: &str = "<<docmark-img-";
const MARKER_SUFFIX: &str = ">>";

/// Returns the marker text for the image with the given ordinal.
pub fn placeholder_marker(ordinal: usize) -> String {
    format!("{MARKER_PREFIX}{ordinal}{MARKER_SUFFIX}")
}

/// A marker located in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub ordinal: usize,
    /// Byte range of the whole marker within the searched text.
    pub range: Range<usize>,
}

/// Finds every well-formed marker in `text`, in order of appearance.
pub fn find_markers(text: &str) -> Vec<MarkerMatch> {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let regex = MARKER.get_or_init(|| {
        Regex::new(&format!(
            "{}([0-9]+){}",
            regex::escape(MARKER_PREFIX),
            regex::escape(MARKER_SUFFIX)
        ))
        .expect("marker regex is valid")
    });

    regex
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let ordinal = captures.get(1)?.as_str().parse().ok()?;
            Some(MarkerMatch {
                ordinal,
                range: whole.range(),
            })
        })
        .collect()
}

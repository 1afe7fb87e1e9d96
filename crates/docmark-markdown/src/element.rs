use serde::Serialize;

/// Inline emphasis flags carried by a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
}

impl Emphasis {
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.code || self.strikethrough)
    }
}

/// A run of text sharing one emphasis and link target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineSpan {
    pub text: String,
    pub emphasis: Emphasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl InlineSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::default(),
            link: None,
        }
    }

    pub fn styled(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
            link: None,
        }
    }

    pub fn is_styled(&self) -> bool {
        !self.emphasis.is_plain() || self.link.is_some()
    }

    fn same_style(&self, other: &InlineSpan) -> bool {
        self.emphasis == other.emphasis && self.link == other.link
    }
}

/// One block-level element. The position of an element in the parsed
/// sequence is its identity; image ordinals are counted in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkdownElement {
    Heading {
        level: u8,
        spans: Vec<InlineSpan>,
    },
    Paragraph {
        spans: Vec<InlineSpan>,
    },
    ListItem {
        ordered: bool,
        depth: usize,
        spans: Vec<InlineSpan>,
    },
    Table {
        rows: Vec<Vec<Vec<InlineSpan>>>,
    },
    ImageRef {
        original_ref: String,
        is_remote: bool,
        alt: String,
    },
    HorizontalRule,
    CodeBlock {
        text: String,
    },
}

impl MarkdownElement {
    pub fn is_list_item(&self) -> bool {
        matches!(self, MarkdownElement::ListItem { .. })
    }
}

/// Appends `span`, merging it into the previous span when both share a style.
pub(crate) fn push_span(spans: &mut Vec<InlineSpan>, span: InlineSpan) {
    if span.text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut() {
        if last.same_style(&span) {
            last.text.push_str(&span.text);
            return;
        }
    }
    spans.push(span);
}

/// Trims leading whitespace of the first span and trailing whitespace of the
/// last, dropping spans that become empty.
pub(crate) fn trim_spans(spans: &mut Vec<InlineSpan>) {
    while let Some(first) = spans.first_mut() {
        let trimmed = first.text.trim_start();
        if trimmed.is_empty() {
            spans.remove(0);
            continue;
        }
        if trimmed.len() != first.text.len() {
            first.text = trimmed.to_string();
        }
        break;
    }
    while let Some(last) = spans.last_mut() {
        let trimmed = last.text.trim_end();
        if trimmed.is_empty() {
            spans.pop();
            continue;
        }
        if trimmed.len() != last.text.len() {
            last.text = trimmed.to_string();
        }
        break;
    }
}

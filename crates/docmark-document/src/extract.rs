use crate::model::{ElementKind, StructuralElement};

/// Budget and separators used by [`extract_text_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Maximum output size in UTF-8 bytes; zero or negative means unlimited.
    pub max_bytes: i64,
    pub row_separator: String,
    pub column_separator: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_bytes: 0,
            row_separator: "\n".into(),
            column_separator: "\t".into(),
        }
    }
}

impl ExtractOptions {
    pub fn with_max_bytes(max_bytes: i64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }
}

/// Extracts plain text with default separators.
pub fn extract_text(content: &[StructuralElement], max_bytes: i64) -> String {
    extract_text_with(content, &ExtractOptions::with_max_bytes(max_bytes))
}

/// Walks `content` in document order, concatenating text runs, separating
/// table rows and cells, and stopping the whole walk once the budget is
/// spent. Output never exceeds the budget; a fragment that would overflow is
/// cut at the last character boundary that fits.
pub fn extract_text_with(content: &[StructuralElement], options: &ExtractOptions) -> String {
    let limit = usize::try_from(options.max_bytes)
        .ok()
        .filter(|limit| *limit > 0);
    let mut extractor = Extractor {
        out: String::new(),
        limit,
        options,
    };
    extractor.elements(content);
    extractor.out
}

struct Extractor<'a> {
    out: String,
    limit: Option<usize>,
    options: &'a ExtractOptions,
}

impl Extractor<'_> {
    /// Each method returns `false` once the budget is exhausted; callers
    /// stop immediately and pass the signal up.
    fn elements(&mut self, content: &[StructuralElement]) -> bool {
        content.iter().all(|element| self.element(element))
    }

    fn element(&mut self, element: &StructuralElement) -> bool {
        match element.kind() {
            ElementKind::Paragraph(paragraph) => paragraph
                .elements
                .iter()
                .filter_map(|run| run.text_run.as_ref())
                .all(|run| self.append(&run.content)),
            ElementKind::Table(table) => {
                let options = self.options;
                for (row_index, row) in table.table_rows.iter().enumerate() {
                    if row_index > 0 && !self.append(&options.row_separator) {
                        return false;
                    }
                    for (cell_index, cell) in row.table_cells.iter().enumerate() {
                        if cell_index > 0 && !self.append(&options.column_separator) {
                            return false;
                        }
                        if !self.elements(&cell.content) {
                            return false;
                        }
                    }
                }
                true
            }
            ElementKind::TableOfContents(toc) => self.elements(&toc.content),
            ElementKind::Other => true,
        }
    }

    fn append(&mut self, text: &str) -> bool {
        let Some(limit) = self.limit else {
            self.out.push_str(text);
            return true;
        };

        let remaining = limit.saturating_sub(self.out.len());
        if remaining == 0 {
            return false;
        }
        if text.len() > remaining {
            let mut cut = remaining;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            self.out.push_str(&text[..cut]);
            return false;
        }
        self.out.push_str(text);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, ParagraphElement, TextRun};

    fn paragraph(text: &str) -> StructuralElement {
        StructuralElement {
            paragraph: Some(Paragraph {
                elements: vec![ParagraphElement {
                    text_run: Some(TextRun {
                        content: text.into(),
                    }),
                    ..ParagraphElement::default()
                }],
            }),
            ..StructuralElement::default()
        }
    }

    #[test]
    fn cuts_multibyte_text_at_char_boundary() {
        let content = vec![paragraph("héllo\n")];
        assert_eq!(extract_text(&content, 2), "h");
        assert_eq!(extract_text(&content, 3), "hé");
    }

    #[test]
    fn exhausted_budget_stops_following_elements() {
        let content = vec![paragraph("abc"), paragraph("def")];
        assert_eq!(extract_text(&content, 3), "abc");
        assert_eq!(extract_text(&content, 4), "abcd");
    }
}

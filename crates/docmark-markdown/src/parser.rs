use std::sync::OnceLock;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::element::{push_span, trim_spans, Emphasis, InlineSpan, MarkdownElement};

/// Parses markdown into a flat, ordered element sequence.
///
/// Parsing is total: constructs outside the supported subset (block quotes,
/// raw HTML, footnotes) degrade to plain paragraphs or text. List items are
/// not nested into a tree; their nesting is carried as `depth`.
pub fn parse(source: &str) -> Vec<MarkdownElement> {
    let source = strip_front_matter(source);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut state = ParseState::default();
    for event in Parser::new_ext(source, options) {
        state.process(event);
    }
    state.finish()
}

/// True when `reference` starts with a URI scheme (`https:`, `data:`, ...).
/// Single-letter schemes are rejected so Windows drive paths stay local.
pub fn is_remote_reference(reference: &str) -> bool {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").expect("scheme regex is valid"))
        .is_match(reference.trim())
}

fn strip_front_matter(source: &str) -> &str {
    let Some(rest) = source.strip_prefix("---\n") else {
        return source;
    };
    match rest.find("\n---\n") {
        Some(end) => &rest[end + 5..],
        None => source,
    }
}

#[derive(Default)]
struct ParseState {
    elements: Vec<MarkdownElement>,
    spans: Vec<InlineSpan>,

    bold: usize,
    italic: usize,
    strikethrough: usize,
    links: Vec<String>,

    heading: Option<u8>,
    code_block: Option<String>,
    lists: Vec<bool>,
    table: Option<TableBuilder>,
    image: Option<ImageBuilder>,
    /// Images met inside a list item, heading or table, emitted once that
    /// element closes.
    deferred: Vec<MarkdownElement>,
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<Vec<InlineSpan>>>,
    current_row: Vec<Vec<InlineSpan>>,
}

struct ImageBuilder {
    dest: String,
    alt: String,
    standalone: bool,
}

impl ParseState {
    fn process(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => {
                if let Some(image) = &mut self.image {
                    image.alt.push_str(&code);
                } else {
                    let mut emphasis = self.emphasis();
                    emphasis.code = true;
                    self.push(code.into_string(), emphasis);
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let html = html.trim_end_matches('\n').to_string();
                self.push(html, self.emphasis());
            }
            Event::SoftBreak => self.push(" ".into(), self.emphasis()),
            Event::HardBreak => self.push("\n".into(), self.emphasis()),
            Event::Rule => {
                self.flush_inline();
                self.elements.push(MarkdownElement::HorizontalRule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_inline();
                self.heading = Some(heading_depth(level));
            }
            Tag::CodeBlock(_) => {
                self.flush_inline();
                self.code_block = Some(String::new());
            }
            Tag::List(first_number) => {
                self.flush_inline();
                self.lists.push(first_number.is_some());
            }
            Tag::Item | Tag::BlockQuote { .. } | Tag::HtmlBlock => self.flush_inline(),
            Tag::Table(_) => {
                self.flush_inline();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = &mut self.table {
                    table.current_row.clear();
                }
            }
            Tag::TableCell => self.spans.clear(),
            Tag::Strong => self.bold += 1,
            Tag::Emphasis => self.italic += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.into_string()),
            Tag::Image { dest_url, .. } => {
                let standalone =
                    self.table.is_none() && self.heading.is_none() && self.lists.is_empty();
                if standalone {
                    self.flush_inline();
                }
                self.image = Some(ImageBuilder {
                    dest: dest_url.into_string(),
                    alt: String::new(),
                    standalone,
                });
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading { .. } => {
                if let Some(level) = self.heading.take() {
                    let mut spans = std::mem::take(&mut self.spans);
                    trim_spans(&mut spans);
                    if !spans.is_empty() {
                        self.elements.push(MarkdownElement::Heading { level, spans });
                    }
                    self.flush_deferred();
                }
            }
            TagEnd::Paragraph | TagEnd::Item | TagEnd::BlockQuote { .. } | TagEnd::HtmlBlock => {
                self.flush_inline()
            }
            TagEnd::CodeBlock => {
                if let Some(text) = self.code_block.take() {
                    let text = text.strip_suffix('\n').unwrap_or(&text).to_string();
                    self.elements.push(MarkdownElement::CodeBlock { text });
                }
            }
            TagEnd::List { .. } => {
                self.flush_inline();
                self.lists.pop();
            }
            TagEnd::TableCell => {
                let mut spans = std::mem::take(&mut self.spans);
                trim_spans(&mut spans);
                if let Some(table) = &mut self.table {
                    table.current_row.push(spans);
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = &mut self.table {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.elements
                        .push(MarkdownElement::Table { rows: table.rows });
                    self.flush_deferred();
                }
            }
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            TagEnd::Link => {
                self.links.pop();
            }
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    let element = MarkdownElement::ImageRef {
                        is_remote: is_remote_reference(&image.dest),
                        original_ref: image.dest,
                        alt: image.alt,
                    };
                    if image.standalone {
                        self.elements.push(element);
                    } else {
                        self.deferred.push(element);
                    }
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: CowStr<'_>) {
        if let Some(code) = &mut self.code_block {
            code.push_str(&text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(&text);
        } else {
            self.push(text.into_string(), self.emphasis());
        }
    }

    fn emphasis(&self) -> Emphasis {
        Emphasis {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code: false,
            strikethrough: self.strikethrough > 0,
        }
    }

    fn push(&mut self, text: String, emphasis: Emphasis) {
        let span = InlineSpan {
            text,
            emphasis,
            link: self.links.last().cloned(),
        };
        push_span(&mut self.spans, span);
    }

    /// Closes pending inline content as a paragraph, or as a list item when
    /// inside a list, followed by any images it held.
    fn flush_inline(&mut self) {
        if self.table.is_some() || self.heading.is_some() {
            return;
        }
        let mut spans = std::mem::take(&mut self.spans);
        trim_spans(&mut spans);
        if !spans.is_empty() {
            let element = match self.lists.last() {
                Some(&ordered) => MarkdownElement::ListItem {
                    ordered,
                    depth: self.lists.len() - 1,
                    spans,
                },
                None => MarkdownElement::Paragraph { spans },
            };
            self.elements.push(element);
        }
        self.flush_deferred();
    }

    fn flush_deferred(&mut self) {
        self.elements.append(&mut self.deferred);
    }

    fn finish(mut self) -> Vec<MarkdownElement> {
        self.flush_inline();
        self.elements
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

//! Writes an element sequence back out as markdown.
//!
//! The output stays inside the subset [`parse`](crate::parse) understands, so
//! parsing rendered output yields the same elements for ordinary documents.

use crate::element::{InlineSpan, MarkdownElement};

const LIST_INDENT: &str = "    ";

pub fn render(elements: &[MarkdownElement]) -> String {
    let mut out = String::new();
    for (index, element) in elements.iter().enumerate() {
        match element {
            MarkdownElement::Heading { level, spans } => {
                out.push_str(&"#".repeat(usize::from((*level).clamp(1, 6))));
                out.push(' ');
                out.push_str(&render_line(spans));
                out.push_str("\n\n");
            }
            MarkdownElement::Paragraph { spans } => {
                out.push_str(&render_line(spans));
                out.push_str("\n\n");
            }
            MarkdownElement::ListItem {
                ordered,
                depth,
                spans,
            } => {
                out.push_str(&LIST_INDENT.repeat(*depth));
                out.push_str(if *ordered { "1. " } else { "- " });
                out.push_str(&render_line(spans));
                out.push('\n');
                let list_continues = elements
                    .get(index + 1)
                    .is_some_and(MarkdownElement::is_list_item);
                if !list_continues {
                    out.push('\n');
                }
            }
            MarkdownElement::Table { rows } => render_table(&mut out, rows),
            MarkdownElement::ImageRef {
                original_ref, alt, ..
            } => {
                out.push_str("![");
                out.push_str(&escape_text(alt));
                out.push_str("](");
                out.push_str(&destination(original_ref));
                out.push_str(")\n\n");
            }
            MarkdownElement::HorizontalRule => out.push_str("***\n\n"),
            MarkdownElement::CodeBlock { text } => {
                let fence = "`".repeat((longest_backtick_run(text) + 1).max(3));
                out.push_str(&fence);
                out.push('\n');
                if !text.is_empty() {
                    out.push_str(text);
                    out.push('\n');
                }
                out.push_str(&fence);
                out.push_str("\n\n");
            }
        }
    }

    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_table(out: &mut String, rows: &[Vec<Vec<InlineSpan>>]) {
    let Some(header) = rows.first() else {
        return;
    };
    if header.is_empty() {
        return;
    }
    push_row(out, header);
    out.push('|');
    for _ in header {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in &rows[1..] {
        push_row(out, row);
    }
    out.push('\n');
}

fn push_row(out: &mut String, row: &[Vec<InlineSpan>]) {
    out.push('|');
    for cell in row {
        out.push(' ');
        out.push_str(&render_inline(cell));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Renders spans that open a line, escaping block markers at the start.
fn render_line(spans: &[InlineSpan]) -> String {
    let rendered = render_inline(spans);
    escape_line_start(&rendered)
}

fn render_inline(spans: &[InlineSpan]) -> String {
    let mut out = String::new();
    let mut index = 0;
    while index < spans.len() {
        let link = &spans[index].link;
        let mut end = index + 1;
        while end < spans.len() && spans[end].link == *link {
            end += 1;
        }
        match link {
            Some(dest) => {
                out.push('[');
                for span in &spans[index..end] {
                    out.push_str(&render_span(span));
                }
                out.push_str("](");
                out.push_str(&destination(dest));
                out.push(')');
            }
            None => {
                for span in &spans[index..end] {
                    out.push_str(&render_span(span));
                }
            }
        }
        index = end;
    }
    out
}

fn render_span(span: &InlineSpan) -> String {
    let emphasis = span.emphasis;
    if emphasis.code {
        return wrap(&code_span(&span.text), emphasis.bold, emphasis.italic, emphasis.strikethrough);
    }

    let text = span.text.as_str();
    let body = text.trim();
    if body.is_empty() || emphasis.is_plain() {
        return escape_text(text);
    }
    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];
    format!(
        "{}{}{}",
        escape_text(leading),
        wrap(&escape_text(body), emphasis.bold, emphasis.italic, emphasis.strikethrough),
        escape_text(trailing)
    )
}

fn wrap(inner: &str, bold: bool, italic: bool, strikethrough: bool) -> String {
    let mut open = String::new();
    if strikethrough {
        open.push_str("~~");
    }
    if bold {
        open.push_str("**");
    }
    if italic {
        open.push('*');
    }
    let close: String = open.chars().rev().collect();
    format!("{open}{inner}{close}")
}

fn code_span(text: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(text) + 1);
    let pad = text.starts_with('`') || text.ends_with('`') || text.starts_with(' ');
    if pad {
        format!("{ticks} {text} {ticks}")
    } else {
        format!("{ticks}{text}{ticks}")
    }
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn destination(dest: &str) -> String {
    if dest.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", dest.replace('<', "%3C").replace('>', "%3E"))
    } else {
        dest.to_string()
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>' | '|' | '~' | '&' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\\n"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_line_start(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some('#' | '-' | '+' | '=') => format!("\\{line}"),
        Some(first) if first.is_ascii_digit() => {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            match line[digits..].chars().next() {
                Some(marker @ ('.' | ')')) => {
                    format!("{}\\{}{}", &line[..digits], marker, &line[digits + 1..])
                }
                _ => line.to_string(),
            }
        }
        _ => line.to_string(),
    }
}

//! Markdown front half of docmark: a total parser producing a flat element
//! sequence, a renderer that writes the supported subset back out, and the
//! compiler that lowers elements into index-addressed edit operations.

mod compile;
mod element;
mod parser;
mod placeholder;
mod render;
mod units;

pub use compile::{
    compile, compile_inline, compile_with, CompileOptions, CompiledDocument, EditOperation, ImagePlaceholder,
    TableDescriptor, TextStyle, TABLE_ANCHOR,
};
pub use docmark_config::NumberStyle;
pub use element::{Emphasis, InlineSpan, MarkdownElement};
pub use parser::{is_remote_reference, parse};
pub use placeholder::{find_markers, placeholder_marker, MarkerMatch};
pub use render::render;
pub use units::{utf16_len, utf16_offset};

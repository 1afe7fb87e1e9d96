mod dump;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docmark_config::{Config, LoadOptions};
use docmark_core::{
    load_payload, CatScope, Docmark, DocmarkError, DocumentInfo, PayloadSource, PlaceholderRange,
};
use docmark_document::{TabSummary, UNTITLED_TAB};
use docmark_markdown::{compile_with, parse, render, CompileOptions, CompiledDocument, EditOperation};
use serde::Serialize;

pub use dump::DumpDocuments;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options)?;
    log::debug!(
        "configuration layers: {:?}",
        config
            .sources
            .layers
            .iter()
            .map(|layer| layer.kind)
            .collect::<Vec<_>>()
    );

    match cli.command {
        Command::Compile(args) => handle_compile(&config, args),
        Command::Render(args) => handle_render(args),
        Command::Cat(args) => handle_cat(config, args),
        Command::ListTabs(args) => handle_list_tabs(config, args),
        Command::Info(args) => handle_info(config, args),
        Command::Locate(args) => handle_locate(config, args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn handle_compile(config: &Config, args: CompileArgs) -> Result<i32> {
    let CompileArgs {
        source,
        base_offset,
        format,
    } = args;
    if base_offset == 0 {
        return Ok(report(DocmarkError::InvalidInput(
            "base offset must be at least 1".to_string(),
        )));
    }

    let payload = match load_payload(source.payload_source()) {
        Ok(payload) => payload,
        Err(err) => return Ok(report(err)),
    };
    let options = CompileOptions::from(&config.compile);
    let compiled = compile_with(&parse(&payload.text), base_offset, &options);

    match format.unwrap_or(CompileFormatValue::Plain) {
        CompileFormatValue::Plain => emit(&describe_compiled(&compiled))?,
        CompileFormatValue::Json => emit_json(&compiled)?,
    }
    Ok(0)
}

fn handle_render(args: RenderArgs) -> Result<i32> {
    let payload = match load_payload(args.source.payload_source()) {
        Ok(payload) => payload,
        Err(err) => return Ok(report(err)),
    };
    emit(&render(&parse(&payload.text)))?;
    Ok(0)
}

fn handle_cat(config: Config, args: CatArgs) -> Result<i32> {
    let CatArgs {
        dump,
        max_bytes,
        tab,
        all_tabs,
        json,
    } = args;
    let documents = DumpDocuments::load(&dump)?;
    let docmark = Docmark::bootstrap(config, &documents);

    let scope = match (tab, all_tabs) {
        (Some(query), _) => CatScope::Tab(query),
        (None, true) => CatScope::AllTabs,
        (None, false) => CatScope::Body,
    };
    match docmark.cat(documents.document_id(), &scope, max_bytes) {
        Ok(output) if json => emit_json(&output)?,
        Ok(output) => print!("{}", output.to_text()),
        Err(err) => return Ok(report(err)),
    }
    Ok(0)
}

fn handle_list_tabs(config: Config, args: DumpArgs) -> Result<i32> {
    let documents = DumpDocuments::load(&args.dump)?;
    let docmark = Docmark::bootstrap(config, &documents);

    let tabs = match docmark.list_tabs(documents.document_id()) {
        Ok(tabs) => tabs,
        Err(err) => return Ok(report(err)),
    };
    if args.json {
        emit_json(&TabsJson { tabs: &tabs })?;
    } else if tabs.is_empty() {
        eprintln!("no tabs");
    } else {
        emit(&describe_tabs(&tabs))?;
    }
    Ok(0)
}

fn handle_info(config: Config, args: DumpArgs) -> Result<i32> {
    let documents = DumpDocuments::load(&args.dump)?;
    let docmark = Docmark::bootstrap(config, &documents);

    let info = match docmark.info(documents.document_id()) {
        Ok(info) => info,
        Err(err) => return Ok(report(err)),
    };
    if args.json {
        emit_json(&info)?;
    } else {
        emit(&describe_info(&info))?;
    }
    Ok(0)
}

fn handle_locate(config: Config, args: LocateArgs) -> Result<i32> {
    let LocateArgs { dump, images, json } = args;
    let documents = DumpDocuments::load(&dump)?;
    let docmark = Docmark::bootstrap(config, &documents);

    let ranges = match docmark.locate_images(documents.document_id(), images) {
        Ok(ranges) => ranges,
        Err(err) => return Ok(report(err)),
    };
    if json {
        emit_json(&LocateJson {
            expected: images,
            placeholders: &ranges,
        })?;
    } else {
        emit(&describe_ranges(&ranges))?;
    }
    // Fewer matches than requested is reported but not fatal.
    Ok(0)
}


fn report(err: DocmarkError) -> i32 {
    eprintln!("docmark: {err}");
    i32::from(err.exit_code() as u8)
}

fn describe_compiled(compiled: &CompiledDocument) -> String {
    let mut out = format!(
        "base offset: {}\nend offset: {}\ntext: {:?}\n",
        compiled.base_offset,
        compiled.end_offset(),
        compiled.plain_text
    );

    out.push_str("operations:\n");
    for operation in &compiled.operations {
        out.push_str(&format!("  {}\n", describe_operation(operation)));
    }

    out.push_str("tables:\n");
    for (index, table) in compiled.tables.iter().enumerate() {
        out.push_str(&format!(
            "  #{index} at {}: {}x{}\n",
            table.start_offset,
            table.rows(),
            table.cols()
        ));
    }
    for (table, row) in &compiled.padded_rows {
        out.push_str(&format!("  padded row {row} of table #{table}\n"));
    }

    out.push_str("placeholders:\n");
    for placeholder in &compiled.placeholders {
        out.push_str(&format!(
            "  {} at {}: {} ({})\n",
            placeholder.marker,
            placeholder.offset,
            placeholder.original_ref,
            if placeholder.is_remote { "remote" } else { "local" }
        ));
    }
    out
}

fn describe_operation(operation: &EditOperation) -> String {
    match operation {
        EditOperation::InsertText { offset, text } => format!("insert {offset} {text:?}"),
        EditOperation::ApplyTextStyle {
            start_offset,
            end_offset,
            style,
        } => {
            let mut flags = Vec::new();
            if style.bold {
                flags.push("bold".to_string());
            }
            if style.italic {
                flags.push("italic".to_string());
            }
            if style.strikethrough {
                flags.push("strikethrough".to_string());
            }
            if style.monospace {
                flags.push("monospace".to_string());
            }
            if let Some(link) = &style.link {
                flags.push(format!("link={link}"));
            }
            format!("style {start_offset}..{end_offset} {}", flags.join(","))
        }
        EditOperation::ApplyParagraphStyle {
            start_offset,
            end_offset,
            heading_level,
        } => format!("heading {start_offset}..{end_offset} level {heading_level}"),
        EditOperation::InsertTable { offset, rows, cols } => {
            format!("table {offset} {rows}x{cols}")
        }
        EditOperation::InsertInlineImage { offset, source_url } => {
            format!("image {offset} {source_url}")
        }
    }
}

fn describe_tabs(tabs: &[TabSummary]) -> String {
    tabs.iter()
        .map(|tab| {
            let title = if tab.title.is_empty() {
                UNTITLED_TAB
            } else {
                &tab.title
            };
            format!(
                "{}\t{}\t{}{}",
                tab.id,
                tab.index,
                "  ".repeat(tab.nesting_level),
                title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_info(info: &DocumentInfo) -> String {
    let mut lines = vec![format!("id\t{}", info.id), format!("title\t{}", info.title)];
    if !info.revision_id.is_empty() {
        lines.push(format!("revision\t{}", info.revision_id));
    }
    if let Some(link) = &info.link {
        lines.push(format!("link\t{link}"));
    }
    lines.join("\n")
}

fn describe_ranges(ranges: &[PlaceholderRange]) -> String {
    ranges
        .iter()
        .map(|range| format!("{}\t{}\t{}", range.ordinal, range.start_index, range.end_index))
        .collect::<Vec<_>>()
        .join("\n")
}

fn emit(content: &str) -> Result<()> {
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct TabsJson<'a> {
    tabs: &'a [TabSummary],
}

#[derive(Serialize)]
struct LocateJson<'a> {
    expected: usize,
    placeholders: &'a [PlaceholderRange],
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Compile markdown into document mutations and read document dumps",
    propagate_version = true
)]
struct Cli {
    /// Configuration file overriding `.docmark.toml` discovery
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile markdown into text, operations, tables and image placeholders
    Compile(CompileArgs),
    /// Re-emit markdown in the normalised form the parser round-trips
    Render(RenderArgs),
    /// Print the plain text of a document dump
    Cat(CatArgs),
    /// List the tabs of a document dump
    ListTabs(DumpArgs),
    /// Show document metadata and its web link
    Info(DumpArgs),
    /// Locate image placeholders in a document dump
    Locate(LocateArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Markdown file, or `-` for stdin
    #[arg(value_name = "FILE", required_unless_present = "content")]
    file: Option<PathBuf>,
    /// Inline markdown instead of a file (`\n`, `\t` and `\\` are expanded)
    #[arg(long, value_name = "TEXT", conflicts_with = "file")]
    content: Option<String>,
}

impl SourceArgs {
    fn payload_source(self) -> PayloadSource {
        match (self.content, self.file) {
            (Some(content), _) => PayloadSource::Inline(content),
            (None, Some(file)) if file.as_os_str() == "-" => PayloadSource::Stdin,
            (None, Some(file)) => PayloadSource::File(file),
            (None, None) => PayloadSource::Stdin,
        }
    }
}

#[derive(Args)]
struct CompileArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Index the compiled text will be inserted at
    #[arg(long = "base-offset", default_value_t = 1)]
    base_offset: usize,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<CompileFormatValue>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args)]
struct CatArgs {
    /// Document JSON dump
    #[arg(value_name = "DOC")]
    dump: PathBuf,
    /// Byte budget (0 or negative for unlimited); defaults to configuration
    #[arg(long = "max-bytes", allow_negative_numbers = true)]
    max_bytes: Option<i64>,
    /// Read a single tab by id or title
    #[arg(long, conflicts_with = "all_tabs")]
    tab: Option<String>,
    /// Read every tab with a header per tab
    #[arg(long = "all-tabs")]
    all_tabs: bool,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DumpArgs {
    /// Document JSON dump
    #[arg(value_name = "DOC")]
    dump: PathBuf,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LocateArgs {
    /// Document JSON dump
    #[arg(value_name = "DOC")]
    dump: PathBuf,
    /// Number of image placeholders the document should hold
    #[arg(long)]
    images: usize,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompileFormatValue {
    Plain,
    Json,
}

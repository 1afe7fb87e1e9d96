//! Configuration primitives and loader for the docmark toolkit.
//!
//! The loader resolves configuration using a precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Parsed settings are normalised into typed structures so downstream crates
//! can operate without touching raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".docmark.toml";

const DEFAULT_MAX_BYTES: i64 = 2_000_000;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub extract: ExtractSettings,
    pub compile: CompileSettings,
    pub images: ImageSettings,
    pub sources: ConfigSources,
}

/// Settings for plain-text extraction (`cat`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSettings {
    /// Byte budget for extracted text; zero or negative means unlimited.
    pub max_bytes: i64,
    pub row_separator: String,
    pub column_separator: String,
}

/// Settings that shape the text emitted by the markdown compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileSettings {
    pub bullet: String,
    pub indent: String,
    pub rule_text: String,
    pub number_style: NumberStyle,
}

/// Numbering applied to ordered list items.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NumberStyle {
    Decimal,
    LowerAlpha,
}

impl NumberStyle {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "decimal" => Some(NumberStyle::Decimal),
            "lower-alpha" => Some(NumberStyle::LowerAlpha),
            _ => None,
        }
    }
}

/// Settings covering local image uploads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSettings {
    pub max_upload_bytes: u64,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn default() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = defaults_layer(ConfigSource::default());
        let mut source_layers = vec![ConfigSource::default()];

        let git_config_path = find_git_root(&working_dir).map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            extract: resolved.extract,
            compile: resolved.compile,
            images: resolved.images,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Settings built purely from the built-in defaults, without touching disk.
    pub fn builtin() -> Self {
        let resolved = defaults_layer(ConfigSource::default())
            .finalize()
            .unwrap_or_else(|err| panic!("built-in docmark defaults are invalid: {err}"));
        Config {
            extract: resolved.extract,
            compile: resolved.compile,
            images: resolved.images,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default()],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        extract: ExtractPartial {
            max_bytes: Some(Located::new(DEFAULT_MAX_BYTES, source.clone())),
            row_separator: Some(Located::new("\n".into(), source.clone())),
            column_separator: Some(Located::new("\t".into(), source.clone())),
        },
        compile: CompilePartial {
            bullet: Some(Located::new("• ".into(), source.clone())),
            indent: Some(Located::new("\t".into(), source.clone())),
            rule_text: Some(Located::new("---".into(), source.clone())),
            number_style: Some(Located::new("decimal".into(), source.clone())),
        },
        images: ImagesPartial {
            max_upload_bytes: Some(Located::new(DEFAULT_MAX_UPLOAD_BYTES, source)),
        },
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    extract: ExtractPartial,
    compile: CompilePartial,
    images: ImagesPartial,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        self.extract.merge(other.extract);
        self.compile.merge(other.compile);
        self.images.merge(other.images);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let max_bytes = required(self.extract.max_bytes, "extract.max_bytes", &mut errors);
        let row_separator =
            required(self.extract.row_separator, "extract.row_separator", &mut errors);
        let column_separator = required(
            self.extract.column_separator,
            "extract.column_separator",
            &mut errors,
        );

        let bullet = required(self.compile.bullet, "compile.bullet", &mut errors);
        let indent = required(self.compile.indent, "compile.indent", &mut errors);
        let rule_text = required(self.compile.rule_text, "compile.rule_text", &mut errors);
        let number_style = self
            .compile
            .number_style
            .and_then(|located| match NumberStyle::parse(&located.value) {
                Some(style) => Some(style),
                None => {
                    errors.push(
                        ConfigValidationError::new(
                            Some(located.source.clone()),
                            format!(
                                "unknown number style '{}' (expected decimal or lower-alpha)",
                                located.value
                            ),
                        )
                        .with_context("compile.number_style"),
                    );
                    None
                }
            });

        if let Some(located) = &bullet {
            if located.value.contains('\n') {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source.clone()),
                        "bullet cannot contain a newline".into(),
                    )
                    .with_context("compile.bullet"),
                );
            }
        }

        let max_upload_bytes = required(
            self.images.max_upload_bytes,
            "images.max_upload_bytes",
            &mut errors,
        );
        if let Some(located) = &max_upload_bytes {
            if located.value == 0 {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source.clone()),
                        "must be greater than zero".into(),
                    )
                    .with_context("images.max_upload_bytes"),
                );
            }
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            extract: ExtractSettings {
                max_bytes: value_or(max_bytes, DEFAULT_MAX_BYTES),
                row_separator: value_or(row_separator, "\n".into()),
                column_separator: value_or(column_separator, "\t".into()),
            },
            compile: CompileSettings {
                bullet: value_or(bullet, "• ".into()),
                indent: value_or(indent, "\t".into()),
                rule_text: value_or(rule_text, "---".into()),
                number_style: number_style.unwrap_or(NumberStyle::Decimal),
            },
            images: ImageSettings {
                max_upload_bytes: value_or(max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES),
            },
        })
    }
}

fn required<T>(
    located: Option<Located<T>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<Located<T>> {
    if located.is_none() {
        errors.push(
            ConfigValidationError::new(None, "missing value".into()).with_context(context),
        );
    }
    located
}

fn value_or<T>(located: Option<Located<T>>, fallback: T) -> T {
    located.map(|located| located.value).unwrap_or(fallback)
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    extract: ExtractSettings,
    compile: CompileSettings,
    images: ImageSettings,
}

#[derive(Clone, Debug, Default)]
struct ExtractPartial {
    max_bytes: Option<Located<i64>>,
    row_separator: Option<Located<String>>,
    column_separator: Option<Located<String>>,
}

impl ExtractPartial {
    fn merge(&mut self, other: ExtractPartial) {
        if other.max_bytes.is_some() {
            self.max_bytes = other.max_bytes;
        }
        if other.row_separator.is_some() {
            self.row_separator = other.row_separator;
        }
        if other.column_separator.is_some() {
            self.column_separator = other.column_separator;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct CompilePartial {
    bullet: Option<Located<String>>,
    indent: Option<Located<String>>,
    rule_text: Option<Located<String>>,
    number_style: Option<Located<String>>,
}

impl CompilePartial {
    fn merge(&mut self, other: CompilePartial) {
        if other.bullet.is_some() {
            self.bullet = other.bullet;
        }
        if other.indent.is_some() {
            self.indent = other.indent;
        }
        if other.rule_text.is_some() {
            self.rule_text = other.rule_text;
        }
        if other.number_style.is_some() {
            self.number_style = other.number_style;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ImagesPartial {
    max_upload_bytes: Option<Located<u64>>,
}

impl ImagesPartial {
    fn merge(&mut self, other: ImagesPartial) {
        if other.max_upload_bytes.is_some() {
            self.max_upload_bytes = other.max_upload_bytes;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    extract: Option<RawExtract>,
    #[serde(default)]
    compile: Option<RawCompile>,
    #[serde(default)]
    images: Option<RawImages>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            extract: self
                .extract
                .map(|extract| extract.into_partial(source.clone()))
                .unwrap_or_default(),
            compile: self
                .compile
                .map(|compile| compile.into_partial(source.clone()))
                .unwrap_or_default(),
            images: self
                .images
                .map(|images| images.into_partial(source))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExtract {
    #[serde(default)]
    max_bytes: Option<i64>,
    #[serde(default)]
    row_separator: Option<String>,
    #[serde(default)]
    column_separator: Option<String>,
}

impl RawExtract {
    fn into_partial(self, source: ConfigSource) -> ExtractPartial {
        ExtractPartial {
            max_bytes: self
                .max_bytes
                .map(|value| Located::new(value, source.clone())),
            row_separator: self
                .row_separator
                .map(|value| Located::new(value, source.clone())),
            column_separator: self
                .column_separator
                .map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCompile {
    #[serde(default)]
    bullet: Option<String>,
    #[serde(default)]
    indent: Option<String>,
    #[serde(default)]
    rule_text: Option<String>,
    #[serde(default)]
    number_style: Option<String>,
}

impl RawCompile {
    fn into_partial(self, source: ConfigSource) -> CompilePartial {
        CompilePartial {
            bullet: self.bullet.map(|value| Located::new(value, source.clone())),
            indent: self.indent.map(|value| Located::new(value, source.clone())),
            rule_text: self
                .rule_text
                .map(|value| Located::new(value, source.clone())),
            number_style: self
                .number_style
                .map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawImages {
    #[serde(default)]
    max_upload_bytes: Option<u64>,
}

impl RawImages {
    fn into_partial(self, source: ConfigSource) -> ImagesPartial {
        ImagesPartial {
            max_upload_bytes: self
                .max_upload_bytes
                .map(|value| Located::new(value, source)),
        }
    }
}

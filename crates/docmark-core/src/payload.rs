use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{DocmarkError, DocmarkResult};

/// Where update or create content comes from.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    File(PathBuf),
    Stdin,
    /// Command-line text; `\n`, `\t` and `\\` escapes are expanded.
    Inline(String),
}

/// Loaded content plus the directory local image paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    pub base_dir: Option<PathBuf>,
}

impl Payload {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            base_dir: None,
        }
    }
}

pub fn load_payload(source: PayloadSource) -> DocmarkResult<Payload> {
    match source {
        PayloadSource::File(path) => {
            let text = std::fs::read_to_string(&path).map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => {
                    DocmarkError::NotFound(format!("file not found: {}", path.display()))
                }
                _ => DocmarkError::InvalidInput(format!(
                    "failed to read '{}': {err}",
                    path.display()
                )),
            })?;
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .filter(|dir| !dir.as_os_str().is_empty())
                .or_else(|| Some(PathBuf::from(".")));
            Ok(Payload { text, base_dir })
        }
        PayloadSource::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| DocmarkError::InvalidInput(format!("failed to read stdin: {err}")))?;
            Ok(Payload::inline(text))
        }
        PayloadSource::Inline(raw) => Ok(Payload::inline(unescape(&raw)?)),
    }
}

fn unescape(raw: &str) -> DocmarkResult<String> {
    let mut output = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('\\') => output.push('\\'),
            Some(other) => {
                return Err(DocmarkError::InvalidInput(format!(
                    "unsupported escape sequence: \\{other}"
                )))
            }
            None => {
                return Err(DocmarkError::InvalidInput(
                    "unterminated escape sequence".to_string(),
                ))
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_inline_escapes() {
        let payload = load_payload(PayloadSource::Inline("# Hi\\n\\n- a\\t\\\\".into())).unwrap();
        assert_eq!(payload.text, "# Hi\n\n- a\t\\");
        assert_eq!(payload.base_dir, None);
    }

    #[test]
    fn rejects_unknown_escape() {
        let err = unescape("bad\\q").unwrap_err();
        assert!(matches!(err, DocmarkError::InvalidInput(_)));
    }

    #[test]
    fn file_payload_remembers_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "hello").unwrap();
        let payload = load_payload(PayloadSource::File(path)).unwrap();
        assert_eq!(payload.text, "hello");
        assert_eq!(payload.base_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_payload(PayloadSource::File("/nonexistent/notes.md".into())).unwrap_err();
        assert!(matches!(err, DocmarkError::NotFound(_)));
    }
}

use std::io;

use docmark_document::ServiceError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    InvalidInput = 2,
    OffsetInvariant = 3,
    Transport = 4,
    PartialApply = 5,
    Io = 6,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NotFound),
            2 => Some(Self::InvalidInput),
            3 => Some(Self::OffsetInvariant),
            4 => Some(Self::Transport),
            5 => Some(Self::PartialApply),
            6 => Some(Self::Io),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DocmarkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("offset invariant violated: {0}")]
    OffsetInvariant(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{step} stopped after {completed} of {total} steps: {source}")]
    PartialApply {
        step: &'static str,
        completed: usize,
        total: usize,
        #[source]
        source: Box<DocmarkError>,
    },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl DocmarkError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::NotFound(_) => ExitCode::NotFound,
            Self::OffsetInvariant(_) => ExitCode::OffsetInvariant,
            Self::Transport(_) => ExitCode::Transport,
            Self::PartialApply { .. } => ExitCode::PartialApply,
            Self::Io(_) => ExitCode::Io,
        }
    }

    /// Maps a service failure for `what`, naming the missing resource.
    pub(crate) fn from_service(err: ServiceError, what: impl FnOnce() -> String) -> Self {
        match err {
            ServiceError::NotFound(_) => Self::NotFound(what()),
            other => other.into(),
        }
    }
}

impl From<ServiceError> for DocmarkError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(resource) => Self::NotFound(format!("not found: {resource}")),
            ServiceError::Transport(message) => Self::Transport(message),
            ServiceError::Unsupported(message) => {
                Self::Transport(format!("unsupported operation: {message}"))
            }
        }
    }
}

pub type DocmarkResult<T> = Result<T, DocmarkError>;

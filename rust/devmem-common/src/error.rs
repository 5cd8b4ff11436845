use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn alignment(offset: usize, word_size: usize) -> Error {
        Error(ErrorKind::AlignmentViolation { offset, word_size }.into())
    }

    pub fn resource_unavailable(path: impl AsRef<Path>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::ResourceUnavailable {
                path: path.as_ref().to_path_buf(),
                source,
            }
            .into(),
        )
    }

    pub fn out_of_range(element: impl Into<String>, index: usize, limit: usize) -> Error {
        Error(
            ErrorKind::OutOfRange {
                element: element.into(),
                index,
                limit,
            }
            .into(),
        )
    }

    pub fn unsupported(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::Unsupported {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }

    pub fn is_alignment_violation(&self) -> bool {
        matches!(self.kind(), ErrorKind::AlignmentViolation { .. })
    }

    pub fn is_resource_unavailable(&self) -> bool {
        matches!(self.kind(), ErrorKind::ResourceUnavailable { .. })
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfRange { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unsupported { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("offset {offset:#x} is not aligned to the {word_size}-byte word size")]
    AlignmentViolation { offset: usize, word_size: usize },

    #[error("backing resource '{}' is unavailable: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{element} {index:#x} is out of range (limit {limit:#x})")]
    OutOfRange {
        element: String,
        index: usize,
        limit: usize,
    },

    #[error("unsupported operation: {operation}")]
    Unsupported { operation: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

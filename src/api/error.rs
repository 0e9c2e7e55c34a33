use std::io;

use thiserror::Error;

use super::value::SlotType;
use crate::render::RenderError;

/// Failure of a foreign call. Every variant aborts the calling execution
/// unit; none of them take the host process down.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Expected argument {slot} to have type {expected}, got {got} instead")]
    TypeMismatch {
        slot: usize,
        expected: SlotType,
        got: SlotType,
    },

    #[error("missing option")]
    MissingOption,

    #[error("invalid option '{0}'")]
    InvalidOption(String),

    #[error("Can't {action} closed {class}")]
    Closed {
        action: &'static str,
        class: &'static str,
    },

    #[error("{0} is already closed")]
    AlreadyClosed(&'static str),

    #[error("expected a {expected} object, got {got}")]
    WrongClass {
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0} object is already in use")]
    Busy(&'static str),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to load font: {0}")]
    Font(#[from] RenderError),

    #[error("{0}")]
    Invalid(String),

    /// Not a failure: a request to stop the script run with this status.
    #[error("exit requested with status {0}")]
    Exit(i32),
}

impl ApiError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        ApiError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

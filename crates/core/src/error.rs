//! Classified error model.
//!
//! Every storefront operation reports failures as a [`CoreError`]: a
//! machine-checkable [`ErrorKind`], a short message meant for the caller, and the
//! original cause kept for diagnostics.

use serde::Serialize;
use thiserror::Error;

/// Boxed, thread-safe error used as the diagnostic cause of a [`CoreError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used across the storefront operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Machine-checkable error category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified storefront error.
///
/// `Display` renders the user-facing message only; the cause is reachable through
/// [`std::error::Error::source`] and [`CoreError::diagnostic`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad input: unknown field, wrong value type, malformed pagination.
    #[error("{message}")]
    Validation {
        message: String,
        #[source]
        cause: BoxError,
    },

    /// The addressed record does not exist.
    #[error("{message}")]
    NotFound {
        message: String,
        #[source]
        cause: BoxError,
    },

    /// Storage or transaction failure not otherwise classified.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        cause: BoxError,
    },
}

impl CoreError {
    pub fn validation(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Validation {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::NotFound {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn internal(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation { .. } => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Short, user-facing message.
    pub fn message(&self) -> &str {
        match self {
            CoreError::Validation { message, .. }
            | CoreError::NotFound { message, .. }
            | CoreError::Internal { message, .. } => message,
        }
    }

    /// The original failure this error was classified from.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            CoreError::Validation { cause, .. }
            | CoreError::NotFound { cause, .. }
            | CoreError::Internal { cause, .. } => cause.as_ref(),
        }
    }

    /// Developer-facing rendering of the full cause chain (`outer: inner: ...`).
    pub fn diagnostic(&self) -> String {
        let mut rendered = self.cause().to_string();
        let mut next = self.cause().source();
        while let Some(err) = next {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            next = err.source();
        }
        rendered
    }
}

//! # Sticker Pipeline Error Handling
//!
//! Every fallible operation of the sticker pipeline returns [`StickerError`].
//! The variants follow the failure taxonomy of the pipeline itself:
//!
//! - `InvalidImage`: the sheet is too small for the requested grid
//! - `Decode` / `Encode`: a payload could not be read or written
//! - `ConcurrentMutation`: a segment already has a mutation in flight
//! - `RemoteOperation`: the backend failed or was unreachable
//! - `Scale`, `Config`, `Validation`, `Io`: supporting failures
//!
//! Each error carries an [`ErrorContext`] with severity, retry hints and
//! free-form metadata, filled in through the builder-style `with_*` methods.
//!
//! ## Usage
//!
//! ```rust
//! use sticker_grid::error::{Retryable, StickerError};
//!
//! let error = StickerError::remote("upscale", Some(502), "bad gateway")
//!     .with_context("upscaling sticker 3 to 1024px")
//!     .with_recovery_suggestion("Try the upscale again");
//!
//! assert_eq!(error.category(), "remote_operation");
//! assert!(error.is_retryable());
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

use sticker_scale::cpu::ScaleError;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect one operation; the working set is intact
    Error,
    /// Fatal errors that cannot be recovered from
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Whether this error is retryable
    pub retryable: bool,
    /// Additional metadata as key-value pairs
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            retryable: false,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }
}

/// Base error type for the sticker pipeline
#[derive(Debug)]
pub enum StickerError {
    /// Sheet too small for the requested grid (a cell dimension is zero)
    InvalidImage {
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
        context: ErrorContext,
    },
    /// Payload is not a decodable image
    Decode {
        what: String,
        reason: String,
        context: ErrorContext,
    },
    /// Pixels could not be serialized to the output format
    Encode {
        what: String,
        reason: String,
        context: ErrorContext,
    },
    /// A second mutation targeted a segment that is already mutating
    ConcurrentMutation {
        segment_id: u32,
        context: ErrorContext,
    },
    /// The delegated backend returned a failure or was unreachable
    RemoteOperation {
        operation: String,
        status: Option<u16>,
        message: String,
        context: ErrorContext,
    },
    /// Resampling failed
    Scale {
        operation: String,
        source: ScaleError,
        context: ErrorContext,
    },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Argument validation errors
    Validation {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl StickerError {
    /// Create an invalid-image error for a sheet that cannot hold the grid
    pub fn invalid_image(width: u32, height: u32, rows: u32, cols: u32) -> Self {
        Self::InvalidImage {
            width,
            height,
            rows,
            cols,
            context: ErrorContext::new(),
        }
    }

    /// Create a decode error
    pub fn decode(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an encode error
    pub fn encode(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            what: what.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a concurrent-mutation error
    pub fn concurrent_mutation(segment_id: u32) -> Self {
        Self::ConcurrentMutation {
            segment_id,
            context: ErrorContext::new(),
        }
    }

    /// Create a remote operation error. These are always retryable by the
    /// caller; nothing in the pipeline retries on its own.
    pub fn remote(
        operation: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            status,
            message: message.into(),
            context: ErrorContext::new(),
        }
        .retryable()
    }

    /// Create a scaling error
    pub fn scale(operation: impl Into<String>, source: ScaleError) -> Self {
        Self::Scale {
            operation: operation.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
        .with_severity(ErrorSeverity::Fatal)
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Attach a path to an I/O error; no-op for other variants
    pub fn with_path(mut self, p: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(p.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Mark as retryable
    pub fn retryable(mut self) -> Self {
        self.context_mut().retryable = true;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidImage { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::ConcurrentMutation { context, .. } => context,
            Self::RemoteOperation { context, .. } => context,
            Self::Scale { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::InvalidImage { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::ConcurrentMutation { context, .. } => context,
            Self::RemoteOperation { context, .. } => context,
            Self::Scale { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidImage { .. } => "invalid_image",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::ConcurrentMutation { .. } => "concurrent_mutation",
            Self::RemoteOperation { .. } => "remote_operation",
            Self::Scale { .. } => "scale",
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for StickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StickerError::InvalidImage {
                width,
                height,
                rows,
                cols,
                ..
            } => {
                write!(
                    f,
                    "Image {}x{} is too small for a {}x{} grid",
                    width, height, rows, cols
                )
            }
            StickerError::Decode { what, reason, .. } => {
                write!(f, "Failed to decode {}: {}", what, reason)
            }
            StickerError::Encode { what, reason, .. } => {
                write!(f, "Failed to encode {}: {}", what, reason)
            }
            StickerError::ConcurrentMutation { segment_id, .. } => {
                write!(f, "Sticker {} is already being updated", segment_id)
            }
            StickerError::RemoteOperation {
                operation,
                status,
                message,
                ..
            } => {
                if let Some(status) = status {
                    write!(f, "Remote {} failed (HTTP {}): {}", operation, status, message)
                } else {
                    write!(f, "Remote {} failed: {}", operation, message)
                }
            }
            StickerError::Scale {
                operation, source, ..
            } => {
                write!(f, "Resampling failed during {}: {}", operation, source)
            }
            StickerError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            StickerError::Validation {
                field,
                constraint,
                value,
                ..
            } => {
                write!(
                    f,
                    "Validation failed for '{}': {} (value: {})",
                    field, constraint, value
                )
            }
            StickerError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(f, "I/O error during {} on '{}': {}", operation, path, source)
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
        }
    }
}

impl StdError for StickerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Scale { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type StickerResult<T> = Result<T, StickerError>;

/// Trait for errors that can be retried by the caller
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;
}

impl Retryable for StickerError {
    fn is_retryable(&self) -> bool {
        self.context().retryable
            || matches!(
                self,
                Self::RemoteOperation { .. } | Self::ConcurrentMutation { .. } | Self::Io { .. }
            )
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for StickerError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for StickerError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Transient errors may succeed when the same request is repeated
    pub fn is_transient(error: &StickerError) -> bool {
        matches!(
            error,
            StickerError::RemoteOperation { .. } | StickerError::ConcurrentMutation { .. }
        )
    }

    /// Fatal errors cannot succeed without changing the input
    pub fn is_fatal(error: &StickerError) -> bool {
        matches!(
            error,
            StickerError::Config { .. }
                | StickerError::InvalidImage { .. }
                | StickerError::Decode { .. }
        ) || error.severity() == ErrorSeverity::Fatal
    }
}

impl From<std::io::Error> for StickerError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for StickerError {
    fn from(error: serde_json::Error) -> Self {
        Self::config("json", "<file>", error.to_string())
    }
}

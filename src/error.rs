//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;

/// Exit codes for ocrfind.
///
/// - 0: Success (every base name resolved and merged)
/// - 1: General error (configuration or unexpected failure)
/// - 2: Unresolved (completed, some base names had no archive match)
/// - 3: Partial success (completed, some merge operations failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Every base name was resolved and merged.
    Success = 0,
    /// Configuration or unexpected failure; nothing was merged.
    GeneralError = 1,
    /// Completed, but at least one base name went to the unresolved bucket.
    Unresolved = 2,
    /// Completed, but at least one copy, move or rename failed.
    PartialSuccess = 3,
    /// Interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "OF000",
            Self::GeneralError => "OF001",
            Self::Unresolved => "OF002",
            Self::PartialSuccess => "OF003",
            Self::Interrupted => "OF130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "OF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Set when the failure came from configuration
    pub configuration: bool,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            configuration: err.downcast_ref::<ConfigError>().is_some(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

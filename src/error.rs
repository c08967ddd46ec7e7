//! Error types for the quire library
//!
//! Every failure the node-creation protocol can surface maps onto one variant
//! here. I/O errors always carry the step that produced them ("creating node
//! file", "writing binder", ...), so the rendered message tells the user which
//! part of the transaction failed.

use crate::core::diagnostic::Diagnostic;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// The main error type for all library operations
#[derive(Error, Debug)]
pub enum QuireError {
    /// A user-supplied field failed validation; nothing was touched on disk
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// The node id generator failed; nothing was touched on disk
    #[error("generating node id: {reason}")]
    Generation { reason: String },

    /// I/O failure, labelled with the step that produced it
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A size-limited read refused an oversized file
    #[error(
        "{}{} exceeds size limit ({size} > {limit} bytes)",
        step_prefix(.context),
        .path.display()
    )]
    FileTooLarge {
        context: String,
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// Destination is read-only according to its mode bits
    #[error("{}{} is read-only", step_prefix(.context), .path.display())]
    ReadOnly { context: String, path: PathBuf },

    /// A node file with the requested name already exists
    #[error("{}node file already exists: {}", step_prefix(.context), .path.display())]
    NodeExists { context: String, path: PathBuf },

    /// A node header or binder document could not be parsed
    #[error("{context}: {reason}")]
    Parse { context: String, reason: String },

    /// The binder engine reported at least one error-severity diagnostic
    #[error("binder mutation rejected: {}", render_diagnostics(.diagnostics))]
    Diagnostic { diagnostics: Vec<Diagnostic> },

    /// Undoing an earlier step failed too; both failures are reported
    #[error("{cause}; rollback also failed: {rollback}")]
    Rollback {
        cause: Box<QuireError>,
        rollback: Box<QuireError>,
    },

    /// The editor configuration is empty or whitespace-only
    #[error("no editor configured (set ${var})")]
    EditorNotConfigured { var: String },

    /// The editor process could not be started
    #[error("launching editor {program}: {source}")]
    EditorLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The editor exited unsuccessfully
    #[error("editor {program} exited with {status}")]
    EditorExit { program: String, status: ExitStatus },

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, QuireError>;

fn join_steps(step: &str, context: &str) -> String {
    if context.is_empty() {
        step.to_string()
    } else {
        format!("{}: {}", step, context)
    }
}

/// `"step: "`, or nothing for an empty step
fn step_prefix(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("{}: ", context)
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| format!("{}: {}", d.code, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl QuireError {
    /// Create a new input validation error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new id generation error
    pub fn generation(reason: impl Into<String>) -> Self {
        Self::Generation {
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the step that produced it
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a new parse error
    pub fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create a new oversized-file error
    pub fn file_too_large(path: impl Into<PathBuf>, size: u64, limit: u64) -> Self {
        Self::FileTooLarge {
            context: String::new(),
            path: path.into(),
            size,
            limit,
        }
    }

    /// Create a new read-only destination error
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self::ReadOnly {
            context: String::new(),
            path: path.into(),
        }
    }

    /// Create a new node-exists error
    pub fn node_exists(path: impl Into<PathBuf>) -> Self {
        Self::NodeExists {
            context: String::new(),
            path: path.into(),
        }
    }

    /// Combine a failure with the failure of its rollback
    pub fn rollback(cause: QuireError, rollback: QuireError) -> Self {
        Self::Rollback {
            cause: Box::new(cause),
            rollback: Box::new(rollback),
        }
    }

    /// Prefix the context of a file-level error with an outer step.
    ///
    /// Validation, diagnostic and editor errors already name their cause and
    /// are returned unchanged.
    pub fn within(self, step: &str) -> Self {
        match self {
            Self::Io { context, source } => Self::Io {
                context: join_steps(step, &context),
                source,
            },
            Self::Parse { context, reason } => Self::Parse {
                context: join_steps(step, &context),
                reason,
            },
            Self::FileTooLarge {
                context,
                path,
                size,
                limit,
            } => Self::FileTooLarge {
                context: join_steps(step, &context),
                path,
                size,
                limit,
            },
            Self::ReadOnly { context, path } => Self::ReadOnly {
                context: join_steps(step, &context),
                path,
            },
            Self::NodeExists { context, path } => Self::NodeExists {
                context: join_steps(step, &context),
                path,
            },
            other => other,
        }
    }

    /// True for I/O errors caused by a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if re-running the same command after fixing its input can succeed
    /// without any cleanup
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidInput { .. }
            | Self::Generation { .. }
            | Self::Diagnostic { .. }
            | Self::EditorNotConfigured { .. }
            | Self::NodeExists { .. } => true,
            Self::Io { source, .. } => !matches!(
                source.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::NotFound
            ),
            Self::FileTooLarge { .. }
            | Self::ReadOnly { .. }
            | Self::Parse { .. }
            | Self::Yaml(_) => false,
            Self::EditorLaunch { .. } | Self::EditorExit { .. } => true,
            // a failed rollback leaves an orphaned node behind
            Self::Rollback { .. } => false,
        }
    }
}

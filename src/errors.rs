//! Typed error hierarchy for manta-review.
//!
//! One enum per collaborator, plus `ReviewError` for the orchestrator:
//! - `RenderError`: markdown to PDF conversion failures
//! - `TransportError`: device bridge (adb) failures
//! - `LedgerError`: review ledger lookups, transitions and persistence
//! - `ReviewError`: round-trip failures surfaced to callers

use std::path::PathBuf;
use thiserror::Error;

/// Errors from rendering a source document into a paginated artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Source document not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to launch renderer '{command}': {source}")]
    ToolMissing {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer exited with code {exit_code}: {stderr}")]
    Failed { exit_code: i32, stderr: String },

    #[error("Renderer reported success but produced no file at {0}")]
    NoOutput(PathBuf),

    #[error("Failed to prepare stylesheet: {0}")]
    Stylesheet(#[source] std::io::Error),
}

/// Errors from the device transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("No ADB devices found. Ensure the tablet is connected via wireless ADB (adb connect <ip>).")]
    NoDevice,

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Remote path does not exist: {0}")]
    RemoteMissing(String),
}

/// Errors from the review ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No review recorded for '{0}'")]
    NotFound(String),

    #[error("Review for '{0}' is already completed")]
    InvalidTransition(String),

    #[error("Failed to write ledger at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the round-trip orchestrator.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot derive a file name from '{0}'")]
    InvalidPath(String),
}

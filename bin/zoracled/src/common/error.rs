use std::{convert::Infallible, path::PathBuf};

use zoracle::{ResolveError, SandboxError};

use crate::executor::ExecutorError;

/// Error types for the zoracled commands
#[derive(Debug, thiserror::Error)]
pub enum ZoracledError {
    /// Failed to read or write a file
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },

    /// Failed to write to stdout
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Invalid JSON input
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// The file being parsed
        path: PathBuf,
        /// The underlying error
        source: serde_json::Error,
    },

    /// Failed to serialize output
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid WebAssembly text
    #[error("Invalid wat for oracle script {id}: {reason}")]
    InvalidWat {
        /// The oracle script id
        id: u64,
        /// Parser message
        reason: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Executor error
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// Sandbox setup error
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// The resolution pass aborted
    #[error("Resolution aborted: {0}")]
    Resolve(#[from] ResolveError<Infallible>),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type for the zoracled commands
pub type Result<T> = std::result::Result<T, ZoracledError>;

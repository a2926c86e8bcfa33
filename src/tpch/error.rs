//! Error types for the benchmark harness
//!
//! One error enum covers every failure class the harness distinguishes;
//! leaf operations return these upward and the scheduler escalates any
//! phase failure to a failed run.

use std::fmt;
use std::io;

/// Main error type for benchmark harness operations
#[derive(Debug, Clone)]
pub enum BenchmarkError {
    /// The delta files disagree with each other or with the expected row
    /// layout. Fatal for the stream's refresh; nothing may be committed.
    DataIntegrity { message: String, path: String },

    /// Database unreachable. Fatal for the affected phase or stream.
    Connection {
        message: String,
        source: Option<String>,
    },

    /// A single statement failed. Aborts the remaining work of its stream.
    QueryExecution {
        message: String,
        query: String,
        source: Option<String>,
    },

    /// Missing or unreadable delta, delete or query file.
    Io { message: String, path: String },

    /// A metric required by a score formula has no recorded samples.
    Metrics { message: String, metric: String },

    /// Invalid harness configuration.
    Config { message: String },
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkError::DataIntegrity { message, path } => {
                if path.is_empty() {
                    write!(f, "Data integrity error: {}", message)
                } else {
                    write!(f, "Data integrity error in '{}': {}", path, message)
                }
            }
            BenchmarkError::Connection { message, source } => {
                if let Some(s) = source {
                    write!(f, "Connection error: {} ({})", message, s)
                } else {
                    write!(f, "Connection error: {}", message)
                }
            }
            BenchmarkError::QueryExecution {
                message,
                query,
                source,
            } => {
                if let Some(s) = source {
                    write!(f, "Execution error in '{}': {} ({})", query, message, s)
                } else if query.is_empty() {
                    write!(f, "Execution error: {}", message)
                } else {
                    write!(f, "Execution error in '{}': {}", query, message)
                }
            }
            BenchmarkError::Io { message, path } => {
                write!(f, "IO error for '{}': {}", path, message)
            }
            BenchmarkError::Metrics { message, metric } => {
                write!(f, "Metrics error for '{}': {}", metric, message)
            }
            BenchmarkError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for BenchmarkError {}

impl From<io::Error> for BenchmarkError {
    fn from(err: io::Error) -> Self {
        BenchmarkError::Io {
            message: err.to_string(),
            path: String::new(),
        }
    }
}

/// Result type alias for benchmark harness operations
pub type BenchmarkResult<T> = Result<T, BenchmarkError>;

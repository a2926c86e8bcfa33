//! Database executor abstraction
//!
//! The harness talks to the benchmark database through one narrow
//! capability, implemented once per target driver. Every execution unit
//! (the power connection, each throughput query worker, the refresh
//! supervisor) obtains its own connection from an [`ExecutorFactory`].

use crate::tpch::error::{BenchmarkError, BenchmarkResult};
use async_trait::async_trait;
use std::path::Path;

/// One open connection to the benchmark database
///
/// Statement execution is blocking from the unit's point of view: the
/// harness has no cancellation or timeout semantics, so a stalled call
/// stalls its unit. Transaction control is explicit; refresh functions
/// commit exactly once per invocation.
#[async_trait]
pub trait QueryExecutor: Send {
    /// Execute one SQL statement
    async fn execute(&mut self, sql: &str) -> BenchmarkResult<()>;

    /// Execute the contents of a SQL file verbatim
    ///
    /// Default implementation reads the file and delegates to
    /// [`execute`](Self::execute); drivers with server-side file support
    /// can override.
    async fn execute_file(&mut self, path: &Path) -> BenchmarkResult<()> {
        let sql = std::fs::read_to_string(path).map_err(|e| BenchmarkError::Io {
            message: e.to_string(),
            path: path.display().to_string(),
        })?;
        self.execute(&sql).await
    }

    /// Bulk-copy a delimited file into a table (used by the load phase)
    async fn bulk_load(&mut self, path: &Path, table: &str) -> BenchmarkResult<()>;

    /// Commit the current transaction
    async fn commit(&mut self) -> BenchmarkResult<()>;

    /// Close the connection
    async fn close(&mut self) -> BenchmarkResult<()>;
}

/// Hands out one connection per execution unit
#[async_trait]
pub trait ExecutorFactory: Send + Sync {
    /// Open a new connection to the benchmark database
    async fn connect(&self) -> BenchmarkResult<Box<dyn QueryExecutor>>;
}

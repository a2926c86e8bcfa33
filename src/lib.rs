//! # tpch-harness
//!
//! A driver for TPC-H style database performance benchmarks. The harness
//! merges refresh deltas in a valid insert order, schedules the power and
//! throughput test phases with correct per-stream permutations, persists
//! per-operation timing artifacts and reduces them into the three
//! composite benchmark scores.
//!
//! Concrete database drivers live outside this crate: they implement the
//! [`tpch::QueryExecutor`] capability and hand out connections through a
//! [`tpch::ExecutorFactory`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tpch_harness::tpch::{
//!     BenchmarkConfig, BenchmarkResult, ExecutorFactory, MetricsAggregator, QueryExecutor,
//!     QueryPermutations, ResultStore, StreamCountTable, StreamScheduler,
//! };
//!
//! struct MyDriver;
//!
//! #[async_trait::async_trait]
//! impl QueryExecutor for MyDriver {
//!     async fn execute(&mut self, _sql: &str) -> BenchmarkResult<()> {
//!         // hand the statement to the database driver
//!         Ok(())
//!     }
//!
//!     async fn bulk_load(&mut self, _path: &Path, _table: &str) -> BenchmarkResult<()> {
//!         Ok(())
//!     }
//!
//!     async fn commit(&mut self) -> BenchmarkResult<()> {
//!         Ok(())
//!     }
//!
//!     async fn close(&mut self) -> BenchmarkResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct MyFactory;
//!
//! #[async_trait::async_trait]
//! impl ExecutorFactory for MyFactory {
//!     async fn connect(&self) -> BenchmarkResult<Box<dyn QueryExecutor>> {
//!         Ok(Box::new(MyDriver))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> BenchmarkResult<()> {
//!     let config = BenchmarkConfig::new("./data", "./queries", "./results")
//!         .with_scale_factor(1.0);
//!     let mut scheduler = StreamScheduler::new(
//!         config.clone(),
//!         QueryPermutations::default(),
//!         StreamCountTable::default(),
//!         Arc::new(MyFactory),
//!     );
//!     let run_id = scheduler.run().await?;
//!
//!     let store = ResultStore::new(config.results_dir.clone());
//!     let aggregator =
//!         MetricsAggregator::new(store, config.scale_factor, scheduler.num_streams());
//!     let metrics = aggregator.compute_and_save(&run_id)?;
//!     println!("QphH@Size = {}", metrics.qphh_size);
//!     Ok(())
//! }
//! ```

pub mod tpch;

// Re-export the main API at the crate root for easy access
pub use tpch::{
    BenchmarkConfig,
    // Errors
    BenchmarkError,
    BenchmarkResult,
    DeleteApplier,
    // Traits
    ExecutorFactory,
    MetricSet,
    MetricsAggregator,
    QueryExecutor,
    QueryPermutations,
    ResultStore,
    SchedulerState,
    StreamCountTable,
    // Core types
    StreamScheduler,
    TimingRecorder,
    TimingSample,
    UpdateMerger,
};

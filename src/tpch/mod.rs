//! TPC-H benchmark harness
//!
//! Drives a TPC-H style performance benchmark against a relational engine:
//! - **Refresh functions**: reconstruct a valid ORDERS+LINEITEM insert
//!   order from pre-sorted delta files and batch orderkey deletions
//! - **Stream scheduling**: the sequential power test and the
//!   bounded-concurrency throughput test, with per-stream query
//!   permutations and refresh assignment
//! - **Result artifacts**: append-only JSON timing artifacts per run,
//!   phase and result object
//! - **Composite metrics**: Power@Size, Throughput@Size and QphH@Size
//!   from the persisted timing samples
//!
//! The database itself is reached through the narrow
//! [`QueryExecutor`]/[`ExecutorFactory`] capability, implemented once per
//! target driver outside this crate.

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod refresh;
pub mod results;
pub mod scheduler;
pub mod streams;

pub use config::BenchmarkConfig;
pub use error::{BenchmarkError, BenchmarkResult};
pub use executor::{ExecutorFactory, QueryExecutor};
pub use metrics::{parse_duration, qphh_size, MetricSet, MetricsAggregator};
pub use refresh::{DeleteApplier, MergeReader, MergedRow, UpdateBatch, UpdateMerger};
pub use results::{ResultStore, TimingRecorder, TimingSample};
pub use scheduler::{SchedulerState, StreamScheduler};
pub use streams::{QueryPermutations, StreamCountTable, NUM_QUERIES};

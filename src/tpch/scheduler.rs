//! Benchmark phase scheduling
//!
//! Runs the power test (strictly sequential, one connection) followed by
//! the throughput test (N concurrent query workers plus one refresh
//! supervisor, each on its own connection) and persists one timing
//! artifact per logical result object. The scheduler intentionally defines
//! no ordering between a throughput stream's own query run and its own
//! refresh pair: queries and refreshes are independent concurrent
//! workloads.

use crate::tpch::config::BenchmarkConfig;
use crate::tpch::error::{BenchmarkError, BenchmarkResult};
use crate::tpch::executor::{ExecutorFactory, QueryExecutor};
use crate::tpch::refresh::{DeleteApplier, UpdateMerger};
use crate::tpch::results::{ResultStore, TimingRecorder, POWER_PHASE, THROUGHPUT_PHASE};
use crate::tpch::streams::{
    query_metric, refresh_metric, QueryPermutations, StreamCountTable, THROUGHPUT_TOTAL_METRIC,
};
use chrono::Utc;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Scheduler lifecycle
///
/// `Failed` is terminal and reachable from either running state; any phase
/// failure is fatal for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    PowerRunning,
    ThroughputRunning,
    Completed,
    Failed,
}

/// Drives one benchmark run through both query phases
pub struct StreamScheduler {
    config: BenchmarkConfig,
    permutations: QueryPermutations,
    factory: Arc<dyn ExecutorFactory>,
    store: ResultStore,
    num_streams: usize,
    state: SchedulerState,
}

impl StreamScheduler {
    /// The permutation and stream-count tables are injected here and never
    /// change for the scheduler's lifetime.
    pub fn new(
        config: BenchmarkConfig,
        permutations: QueryPermutations,
        stream_counts: StreamCountTable,
        factory: Arc<dyn ExecutorFactory>,
    ) -> Self {
        let num_streams = config
            .num_streams
            .unwrap_or_else(|| stream_counts.streams_for(config.scale_factor));
        let store = ResultStore::new(config.results_dir.clone());
        Self {
            config,
            permutations,
            factory,
            store,
            num_streams,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Throughput stream count in effect for this run
    pub fn num_streams(&self) -> usize {
        self.num_streams
    }

    /// Run the full benchmark under a fresh run id and return it
    pub async fn run(&mut self) -> BenchmarkResult<String> {
        let run_id = format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S"));
        self.run_with_id(&run_id).await?;
        Ok(run_id)
    }

    /// Run the full benchmark: power test, then throughput test
    pub async fn run_with_id(&mut self, run_id: &str) -> BenchmarkResult<()> {
        self.run_power_test(run_id).await?;
        self.run_throughput_test(run_id).await?;
        self.state = SchedulerState::Completed;
        Ok(())
    }

    /// Power test: stream 0, strictly sequential on one connection
    pub async fn run_power_test(&mut self, run_id: &str) -> BenchmarkResult<()> {
        self.state = SchedulerState::PowerRunning;
        match self.power_test(run_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = SchedulerState::Failed;
                error!("power test failed: {}", e);
                Err(e)
            }
        }
    }

    async fn power_test(&mut self, run_id: &str) -> BenchmarkResult<()> {
        info!("power test started");
        let mut conn = self.factory.connect().await?;
        let mut result = TimingRecorder::new("Power");
        let stream = 0;

        result.start_timer();
        if !self.config.read_only {
            UpdateMerger::new()
                .apply(
                    &self.config.orders_update_file(stream),
                    &self.config.lineitem_update_file(stream),
                    conn.as_mut(),
                )
                .await?;
        }
        let elapsed = result.stop_timer();
        result.record(&refresh_metric(stream, 1), elapsed);

        run_query_stream(
            conn.as_mut(),
            &self.config,
            &self.permutations,
            stream,
            &mut result,
        )
        .await?;

        result.start_timer();
        if !self.config.read_only {
            DeleteApplier::new()
                .apply(&self.config.delete_file(stream), conn.as_mut())
                .await?;
        }
        let elapsed = result.stop_timer();
        result.record(&refresh_metric(stream, 2), elapsed);

        conn.close().await?;
        info!("power test finished");
        self.store.write(run_id, POWER_PHASE, &result)?;
        Ok(())
    }

    /// Throughput test: N query workers and one refresh supervisor
    pub async fn run_throughput_test(&mut self, run_id: &str) -> BenchmarkResult<()> {
        self.state = SchedulerState::ThroughputRunning;
        match self.throughput_test(run_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = SchedulerState::Failed;
                error!("throughput test failed: {}", e);
                Err(e)
            }
        }
    }

    async fn throughput_test(&mut self, run_id: &str) -> BenchmarkResult<()> {
        info!("throughput test started with {} streams", self.num_streams);
        let mut total = TimingRecorder::new("ThroughputTotal");
        total.start_timer();

        let (tx, mut rx) = mpsc::unbounded_channel::<TimingRecorder>();

        let mut workers = Vec::with_capacity(self.num_streams);
        for i in 0..self.num_streams {
            let stream = i + 1;
            let factory = Arc::clone(&self.factory);
            let config = self.config.clone();
            let permutations = self.permutations.clone();
            let tx = tx.clone();
            info!("throughput query stream #{} started", stream);
            workers.push(tokio::spawn(async move {
                let mut conn = match factory.connect().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("unable to connect for query stream #{}: {}", stream, e);
                        return Err(e);
                    }
                };
                let mut result = TimingRecorder::new(format!("ThroughputQueryStream{}", stream));
                if let Err(e) =
                    run_query_stream(conn.as_mut(), &config, &permutations, stream, &mut result)
                        .await
                {
                    error!("unable to finish query stream #{}: {}", stream, e);
                    return Err(e);
                }
                conn.close().await?;
                let _ = tx.send(result);
                Ok::<(), BenchmarkError>(())
            }));
        }

        let supervisor = {
            let factory = Arc::clone(&self.factory);
            let config = self.config.clone();
            let num_streams = self.num_streams;
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut conn = factory.connect().await?;
                let mut result = TimingRecorder::new("ThroughputRefreshStream");
                for i in 0..num_streams {
                    let stream = i + 1;
                    result.start_timer();
                    if !config.read_only {
                        UpdateMerger::new()
                            .apply(
                                &config.orders_update_file(stream),
                                &config.lineitem_update_file(stream),
                                conn.as_mut(),
                            )
                            .await?;
                    }
                    let elapsed = result.stop_timer();
                    result.record(&refresh_metric(stream, 1), elapsed);

                    result.start_timer();
                    if !config.read_only {
                        DeleteApplier::new()
                            .apply(&config.delete_file(stream), conn.as_mut())
                            .await?;
                    }
                    let elapsed = result.stop_timer();
                    result.record(&refresh_metric(stream, 2), elapsed);
                }
                conn.close().await?;
                let _ = tx.send(result);
                Ok::<(), BenchmarkError>(())
            })
        };
        drop(tx);

        // Join barrier: every worker and the supervisor must finish before
        // the phase is complete. A failed stream aborts only its own
        // remaining work; siblings run to completion and are not rolled
        // back.
        let mut worker_failure: Option<BenchmarkError> = None;
        for handle in workers {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if worker_failure.is_none() {
                        worker_failure = Some(e);
                    }
                }
                Err(e) => {
                    if worker_failure.is_none() {
                        worker_failure = Some(task_failure("query stream", e));
                    }
                }
            }
        }
        match supervisor.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("refresh stream failed: {}", e);
                return Err(e);
            }
            Err(e) => return Err(task_failure("refresh stream", e)),
        }
        info!("throughput test finished");

        while let Some(result) = rx.recv().await {
            self.store.write(run_id, THROUGHPUT_PHASE, &result)?;
        }

        let elapsed = total.stop_timer();
        total.record(THROUGHPUT_TOTAL_METRIC, elapsed);
        self.store.write(run_id, THROUGHPUT_PHASE, &total)?;

        match worker_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Execute the full 22-query permutation for one stream, timing each query
async fn run_query_stream(
    conn: &mut dyn QueryExecutor,
    config: &BenchmarkConfig,
    permutations: &QueryPermutations,
    stream: usize,
    result: &mut TimingRecorder,
) -> BenchmarkResult<()> {
    for &query in permutations.for_stream(stream) {
        debug!("running query #{} in stream #{}", query, stream);
        let path = config.query_file(query);
        result.start_timer();
        if let Err(e) = conn.execute_file(&path).await {
            error!("unable to execute query {} in stream {}: {}", query, stream, e);
            return Err(e);
        }
        let elapsed = result.stop_timer();
        result.record(&query_metric(stream, query), elapsed);
    }
    Ok(())
}

fn task_failure(unit: &str, err: tokio::task::JoinError) -> BenchmarkError {
    BenchmarkError::QueryExecution {
        message: format!("{} task terminated abnormally: {}", unit, err),
        query: String::new(),
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;

    struct NullExecutor;

    #[async_trait]
    impl QueryExecutor for NullExecutor {
        async fn execute(&mut self, _sql: &str) -> BenchmarkResult<()> {
            Ok(())
        }

        async fn bulk_load(&mut self, _path: &Path, _table: &str) -> BenchmarkResult<()> {
            Ok(())
        }

        async fn commit(&mut self) -> BenchmarkResult<()> {
            Ok(())
        }

        async fn close(&mut self) -> BenchmarkResult<()> {
            Ok(())
        }
    }

    struct NullFactory;

    #[async_trait]
    impl ExecutorFactory for NullFactory {
        async fn connect(&self) -> BenchmarkResult<Box<dyn QueryExecutor>> {
            Ok(Box::new(NullExecutor))
        }
    }

    fn scheduler_for_scale(scale_factor: f64) -> StreamScheduler {
        let config =
            BenchmarkConfig::new("data", "queries", "results").with_scale_factor(scale_factor);
        StreamScheduler::new(
            config,
            QueryPermutations::default(),
            StreamCountTable::default(),
            Arc::new(NullFactory),
        )
    }

    #[test]
    fn test_scheduler_starts_idle() {
        let scheduler = scheduler_for_scale(1.0);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_stream_count_derived_from_scale() {
        assert_eq!(scheduler_for_scale(1.0).num_streams(), 2);
        assert_eq!(scheduler_for_scale(100.0).num_streams(), 5);
        assert_eq!(scheduler_for_scale(50000.0).num_streams(), 11);
    }

    #[test]
    fn test_explicit_stream_count_wins_over_scale() {
        let config = BenchmarkConfig::new("data", "queries", "results")
            .with_scale_factor(1.0)
            .with_num_streams(7);
        let scheduler = StreamScheduler::new(
            config,
            QueryPermutations::default(),
            StreamCountTable::default(),
            Arc::new(NullFactory),
        );
        assert_eq!(scheduler.num_streams(), 7);
    }
}

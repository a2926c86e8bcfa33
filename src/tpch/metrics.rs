//! Composite benchmark score computation
//!
//! Reduces the raw timing samples of a completed run into the three
//! composite scores. All samples sharing a metric name are averaged first:
//! repeated invocations against the same run are repeated measurements,
//! not overwrites.
//!
//! - `Power@Size    = 3600 * SF / geomean24(avg Q1..Q22, avg RF1, avg RF2)`
//! - `Throughput@Size = (N * 22 / total_seconds) * 3600 * SF`
//! - `QphH@Size     = sqrt(Power@Size * Throughput@Size)`

use crate::tpch::error::{BenchmarkError, BenchmarkResult};
use crate::tpch::results::{ResultStore, TimingRecorder, TimingSample, METRICS_PHASE};
use crate::tpch::streams::{query_metric, refresh_metric, NUM_QUERIES, THROUGHPUT_TOTAL_METRIC};
use log::info;
use serde::{Deserialize, Serialize};

/// Converts a `HH:MM:SS[.ffffff]` duration string into seconds
///
/// A value containing no colon is not a duration and reads as zero; a
/// missing fractional part reads as zero. Never fails: malformed segments
/// contribute their zero value. Fractions are interpreted as microseconds,
/// matching the six-digit serialization.
pub fn parse_duration(value: &str) -> f64 {
    if !value.contains(':') {
        return 0.0;
    }
    let segments: Vec<&str> = value.split(':').collect();
    if segments.len() != 3 {
        return 0.0;
    }
    let hours: u64 = segments[0].parse().unwrap_or(0);
    let minutes: u64 = segments[1].parse().unwrap_or(0);
    let (seconds, fraction) = match segments[2].split_once('.') {
        Some((secs, frac)) => (
            secs.parse::<u64>().unwrap_or(0),
            frac.parse::<u64>().unwrap_or(0),
        ),
        None => (segments[2].parse().unwrap_or(0), 0),
    };
    (hours * 3600 + minutes * 60 + seconds) as f64 + fraction as f64 / 1_000_000.0
}

/// The three composite scores of one run, computed once, never mutated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub power_size: f64,
    pub throughput_size: f64,
    pub qphh_size: f64,
}

/// `QphH@Size`: geometric mean of the power and throughput scores
pub fn qphh_size(power_size: f64, throughput_size: f64) -> f64 {
    (power_size * throughput_size).sqrt()
}

fn average(samples: &[TimingSample], metric_name: &str) -> BenchmarkResult<f64> {
    let values: Vec<f64> = samples
        .iter()
        .filter(|sample| sample.name == metric_name)
        .map(|sample| parse_duration(&sample.value))
        .collect();
    if values.is_empty() {
        return Err(BenchmarkError::Metrics {
            message: "no samples recorded".to_string(),
            metric: metric_name.to_string(),
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// `Power@Size` over the power test's per-query and per-refresh averages
fn power_size(samples: &[TimingSample], scale_factor: f64) -> BenchmarkResult<f64> {
    let mut product = 1.0;
    for query in 1..=NUM_QUERIES as u8 {
        product *= average(samples, &query_metric(0, query))?;
    }
    for func in 1..=2u8 {
        product *= average(samples, &refresh_metric(0, func))?;
    }
    let denominator = product.powf(1.0 / 24.0);
    Ok(3600.0 / denominator * scale_factor)
}

/// `Throughput@Size` over the throughput test's total wall-clock time
fn throughput_size(
    samples: &[TimingSample],
    scale_factor: f64,
    num_streams: usize,
) -> BenchmarkResult<f64> {
    let total_seconds = average(samples, THROUGHPUT_TOTAL_METRIC)?;
    Ok((num_streams * NUM_QUERIES) as f64 / total_seconds * 3600.0 * scale_factor)
}

/// Computes and persists the composite scores of one run
pub struct MetricsAggregator {
    store: ResultStore,
    scale_factor: f64,
    num_streams: usize,
}

impl MetricsAggregator {
    pub fn new(store: ResultStore, scale_factor: f64, num_streams: usize) -> Self {
        Self {
            store,
            scale_factor,
            num_streams,
        }
    }

    /// Bulk-read the run's samples and compute its metric set
    pub fn compute(&self, run_id: &str) -> BenchmarkResult<MetricSet> {
        let samples = self.store.read_all(run_id)?;
        let power_size = power_size(&samples, self.scale_factor)?;
        let throughput_size = throughput_size(&samples, self.scale_factor, self.num_streams)?;
        Ok(MetricSet {
            power_size,
            throughput_size,
            qphh_size: qphh_size(power_size, throughput_size),
        })
    }

    /// Compute the metric set and persist it as the run's `Metric` artifact
    pub fn compute_and_save(&self, run_id: &str) -> BenchmarkResult<MetricSet> {
        let metrics = self.compute(run_id)?;
        info!("Power@Size = {}", metrics.power_size);
        info!("Throughput@Size = {}", metrics.throughput_size);
        info!("QphH@Size = {}", metrics.qphh_size);

        let mut recorder = TimingRecorder::new("Metric");
        recorder.set_metric("power_size", metrics.power_size);
        recorder.set_metric("throughput_size", metrics.throughput_size);
        recorder.set_metric("qphh_size", metrics.qphh_size);
        self.store.write(run_id, METRICS_PHASE, &recorder)?;
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, value: &str) -> TimingSample {
        TimingSample {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_duration_with_fraction() {
        assert_eq!(parse_duration("00:00:00.123450"), 0.12345);
        assert_eq!(parse_duration("10:25:59.741852"), 37559.741852);
    }

    #[test]
    fn test_parse_duration_without_fraction() {
        assert_eq!(parse_duration("10:25:59"), 37559.0);
        assert_eq!(parse_duration("00:01:00"), 60.0);
    }

    #[test]
    fn test_parse_duration_tolerates_non_durations() {
        assert_eq!(parse_duration("no-colon-value"), 0.0);
        assert_eq!(parse_duration(""), 0.0);
        assert_eq!(parse_duration("1:2"), 0.0);
        assert_eq!(parse_duration("a:b:c"), 0.0);
    }

    #[test]
    fn test_qphh_size() {
        assert_eq!(qphh_size(1.0, 1.0), 1.0);
        assert_eq!(qphh_size(2.0, 2.0), 2.0);
        assert!((qphh_size(2.0, 3.0) - 2.449489742783178).abs() < 1e-12);
    }

    #[test]
    fn test_average_treats_repeated_names_as_measurements() {
        let samples = vec![
            sample("query_stream_0_query_1", "00:00:02.000000"),
            sample("query_stream_0_query_1", "00:00:04.000000"),
        ];
        assert_eq!(average(&samples, "query_stream_0_query_1").unwrap(), 3.0);
    }

    #[test]
    fn test_average_fails_without_samples() {
        let err = average(&[], "query_stream_0_query_1").unwrap_err();
        assert!(matches!(err, BenchmarkError::Metrics { .. }));
    }

    fn power_samples(duration: &str) -> Vec<TimingSample> {
        let mut samples = Vec::new();
        for query in 1..=NUM_QUERIES as u8 {
            samples.push(sample(&query_metric(0, query), duration));
        }
        for func in 1..=2u8 {
            samples.push(sample(&refresh_metric(0, func), duration));
        }
        samples
    }

    #[test]
    fn test_power_size_of_uniform_one_second_run() {
        // All 24 averages equal one second, so the geometric mean is one
        // and Power@Size collapses to 3600 * SF.
        let samples = power_samples("00:00:01.000000");
        assert!((power_size(&samples, 1.0).unwrap() - 3600.0).abs() < 1e-9);
        assert!((power_size(&samples, 2.0).unwrap() - 7200.0).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_size_formula() {
        let samples = vec![sample(THROUGHPUT_TOTAL_METRIC, "01:00:00.000000")];
        // 2 streams * 22 queries in 3600 seconds at SF 1.
        assert!((throughput_size(&samples, 1.0, 2).unwrap() - 44.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_size_fails_on_missing_query_metric() {
        let mut samples = power_samples("00:00:01.000000");
        samples.retain(|s| s.name != query_metric(0, 7));
        assert!(matches!(
            power_size(&samples, 1.0),
            Err(BenchmarkError::Metrics { .. })
        ));
    }
}

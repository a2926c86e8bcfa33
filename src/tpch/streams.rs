//! Immutable scheduling tables and metric naming
//!
//! The query order permutations (TPC-H specification, appendix A) and the
//! scale-to-stream-count step table are fixed configuration data, injected
//! at scheduler construction and never mutated at runtime. Metric names are
//! composed deterministically from phase, stream and query/refresh id, so
//! they are unique within a run.

/// Queries per stream
pub const NUM_QUERIES: usize = 22;

/// Metric name for the total wall-clock time of the throughput test
pub const THROUGHPUT_TOTAL_METRIC: &str = "throughput_test_total";

/// Metric name for one timed query within a stream
pub fn query_metric(stream: usize, query: u8) -> String {
    format!("query_stream_{}_query_{}", stream, query)
}

/// Metric name for one timed refresh function within a stream
pub fn refresh_metric(stream: usize, func: u8) -> String {
    format!("refresh_stream_{}_func_{}", stream, func)
}

// As given in appendix A of the TPCH specification
const APPENDIX_A_ORDER: [[u8; NUM_QUERIES]; 41] = [
    [14, 2, 9, 20, 6, 17, 18, 8, 21, 13, 3, 22, 16, 4, 11, 15, 1, 10, 19, 5, 7, 12],
    [21, 3, 18, 5, 11, 7, 6, 20, 17, 12, 16, 15, 13, 10, 2, 8, 14, 19, 9, 22, 1, 4],
    [6, 17, 14, 16, 19, 10, 9, 2, 15, 8, 5, 22, 12, 7, 13, 18, 1, 4, 20, 3, 11, 21],
    [8, 5, 4, 6, 17, 7, 1, 18, 22, 14, 9, 10, 15, 11, 20, 2, 21, 19, 13, 16, 12, 3],
    [5, 21, 14, 19, 15, 17, 12, 6, 4, 9, 8, 16, 11, 2, 10, 18, 1, 13, 7, 22, 3, 20],
    [21, 15, 4, 6, 7, 16, 19, 18, 14, 22, 11, 13, 3, 1, 2, 5, 8, 20, 12, 17, 10, 9],
    [10, 3, 15, 13, 6, 8, 9, 7, 4, 11, 22, 18, 12, 1, 5, 16, 2, 14, 19, 20, 17, 21],
    [18, 8, 20, 21, 2, 4, 22, 17, 1, 11, 9, 19, 3, 13, 5, 7, 10, 16, 6, 14, 15, 12],
    [19, 1, 15, 17, 5, 8, 9, 12, 14, 7, 4, 3, 20, 16, 6, 22, 10, 13, 2, 21, 18, 11],
    [8, 13, 2, 20, 17, 3, 6, 21, 18, 11, 19, 10, 15, 4, 22, 1, 7, 12, 9, 14, 5, 16],
    [6, 15, 18, 17, 12, 1, 7, 2, 22, 13, 21, 10, 14, 9, 3, 16, 20, 19, 11, 4, 8, 5],
    [15, 14, 18, 17, 10, 20, 16, 11, 1, 8, 4, 22, 5, 12, 3, 9, 21, 2, 13, 6, 19, 7],
    [1, 7, 16, 17, 18, 22, 12, 6, 8, 9, 11, 4, 2, 5, 20, 21, 13, 10, 19, 3, 14, 15],
    [21, 17, 7, 3, 1, 10, 12, 22, 9, 16, 6, 11, 2, 4, 5, 14, 8, 20, 13, 18, 15, 19],
    [2, 9, 5, 4, 18, 1, 20, 15, 16, 17, 7, 21, 13, 14, 19, 8, 22, 11, 10, 3, 12, 6],
    [16, 9, 17, 8, 14, 11, 10, 12, 6, 21, 7, 3, 15, 5, 22, 20, 1, 13, 19, 2, 4, 18],
    [1, 3, 6, 5, 2, 16, 14, 22, 17, 20, 4, 9, 10, 11, 15, 8, 12, 19, 18, 13, 7, 21],
    [3, 16, 5, 11, 21, 9, 2, 15, 10, 18, 17, 7, 8, 19, 14, 13, 1, 4, 22, 20, 6, 12],
    [14, 4, 13, 5, 21, 11, 8, 6, 3, 17, 2, 20, 1, 19, 10, 9, 12, 18, 15, 7, 22, 16],
    [4, 12, 22, 14, 5, 15, 16, 2, 8, 10, 17, 9, 21, 7, 3, 6, 13, 18, 11, 20, 19, 1],
    [16, 15, 14, 13, 4, 22, 18, 19, 7, 1, 12, 17, 5, 10, 20, 3, 9, 21, 11, 2, 6, 8],
    [20, 14, 21, 12, 15, 17, 4, 19, 13, 10, 11, 1, 16, 5, 18, 7, 8, 22, 9, 6, 3, 2],
    [16, 14, 13, 2, 21, 10, 11, 4, 1, 22, 18, 12, 19, 5, 7, 8, 6, 3, 15, 20, 9, 17],
    [18, 15, 9, 14, 12, 2, 8, 11, 22, 21, 16, 1, 6, 17, 5, 10, 19, 4, 20, 13, 3, 7],
    [7, 3, 10, 14, 13, 21, 18, 6, 20, 4, 9, 8, 22, 15, 2, 1, 5, 12, 19, 17, 11, 16],
    [18, 1, 13, 7, 16, 10, 14, 2, 19, 5, 21, 11, 22, 15, 8, 17, 20, 3, 4, 12, 6, 9],
    [13, 2, 22, 5, 11, 21, 20, 14, 7, 10, 4, 9, 19, 18, 6, 3, 1, 8, 15, 12, 17, 16],
    [14, 17, 21, 8, 2, 9, 6, 4, 5, 13, 22, 7, 15, 3, 1, 18, 16, 11, 10, 12, 20, 19],
    [10, 22, 1, 12, 13, 18, 21, 20, 2, 14, 16, 7, 15, 3, 4, 17, 5, 19, 6, 8, 9, 11],
    [10, 8, 9, 18, 12, 6, 1, 5, 20, 11, 17, 22, 16, 3, 13, 2, 15, 21, 14, 19, 7, 4],
    [7, 17, 22, 5, 3, 10, 13, 18, 9, 1, 14, 15, 21, 19, 16, 12, 8, 6, 11, 20, 4, 2],
    [2, 9, 21, 3, 4, 7, 1, 11, 16, 5, 20, 19, 18, 8, 17, 13, 10, 12, 15, 6, 14, 22],
    [15, 12, 8, 4, 22, 13, 16, 17, 18, 3, 7, 5, 6, 1, 9, 11, 21, 10, 14, 20, 19, 2],
    [15, 16, 2, 11, 17, 7, 5, 14, 20, 4, 21, 3, 10, 9, 12, 8, 13, 6, 18, 19, 22, 1],
    [1, 13, 11, 3, 4, 21, 6, 14, 15, 22, 18, 9, 7, 5, 10, 20, 12, 16, 17, 8, 19, 2],
    [14, 17, 22, 20, 8, 16, 5, 10, 1, 13, 2, 21, 12, 9, 4, 18, 3, 7, 6, 19, 15, 11],
    [9, 17, 7, 4, 5, 13, 21, 18, 11, 3, 22, 1, 6, 16, 20, 14, 15, 10, 8, 2, 12, 19],
    [13, 14, 5, 22, 19, 11, 9, 6, 18, 15, 8, 10, 7, 4, 17, 16, 3, 1, 12, 2, 21, 20],
    [20, 5, 4, 14, 11, 1, 6, 16, 8, 22, 7, 3, 2, 12, 21, 19, 17, 13, 10, 15, 18, 9],
    [3, 7, 14, 15, 6, 5, 21, 20, 18, 10, 4, 16, 19, 1, 13, 9, 8, 17, 11, 12, 22, 2],
    [13, 15, 17, 1, 22, 11, 3, 4, 7, 20, 14, 21, 9, 8, 2, 18, 16, 6, 10, 12, 5, 19],
];

/// The 41 fixed query order permutations
///
/// A stream executes all 22 queries in the order of row `stream mod 41`.
#[derive(Debug, Clone)]
pub struct QueryPermutations {
    rows: Vec<[u8; NUM_QUERIES]>,
}

impl Default for QueryPermutations {
    fn default() -> Self {
        Self {
            rows: APPENDIX_A_ORDER.to_vec(),
        }
    }
}

impl QueryPermutations {
    /// Query order for a stream: row `stream mod 41`
    pub fn for_stream(&self, stream: usize) -> &[u8; NUM_QUERIES] {
        &self.rows[stream % self.rows.len()]
    }

    /// Number of distinct permutations
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Scale-factor to throughput-stream-count step table
///
/// Mandated minimum stream counts: each `(scale, streams)` step applies to
/// every scale factor up to and including its bound; anything beyond the
/// last bound uses the fallback.
#[derive(Debug, Clone)]
pub struct StreamCountTable {
    steps: Vec<(f64, usize)>,
    fallback: usize,
}

impl Default for StreamCountTable {
    fn default() -> Self {
        Self {
            steps: vec![
                (1.0, 2),
                (10.0, 3),
                (30.0, 4),
                (100.0, 5),
                (300.0, 6),
                (1000.0, 7),
                (3000.0, 8),
                (10000.0, 9),
                (30000.0, 10),
            ],
            fallback: 11,
        }
    }
}

impl StreamCountTable {
    /// Throughput stream count for a scale factor
    pub fn streams_for(&self, scale_factor: f64) -> usize {
        for &(bound, streams) in &self.steps {
            if scale_factor <= bound {
                return streams;
            }
        }
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_row_is_a_permutation_of_all_queries() {
        let permutations = QueryPermutations::default();
        assert_eq!(permutations.len(), 41);
        for stream in 0..permutations.len() {
            let mut row = permutations.for_stream(stream).to_vec();
            row.sort_unstable();
            let expected: Vec<u8> = (1..=NUM_QUERIES as u8).collect();
            assert_eq!(row, expected, "row {} is not a permutation", stream);
        }
    }

    #[test]
    fn test_first_row_matches_appendix_a() {
        let permutations = QueryPermutations::default();
        assert_eq!(
            permutations.for_stream(0),
            &[14, 2, 9, 20, 6, 17, 18, 8, 21, 13, 3, 22, 16, 4, 11, 15, 1, 10, 19, 5, 7, 12]
        );
    }

    #[test]
    fn test_stream_selection_wraps_modulo_table_size() {
        let permutations = QueryPermutations::default();
        assert_eq!(permutations.for_stream(41), permutations.for_stream(0));
        assert_eq!(permutations.for_stream(43), permutations.for_stream(2));
        assert_eq!(permutations.for_stream(82), permutations.for_stream(0));
    }

    #[test]
    fn test_stream_count_steps() {
        let table = StreamCountTable::default();
        assert_eq!(table.streams_for(0.1), 2);
        assert_eq!(table.streams_for(1.0), 2);
        assert_eq!(table.streams_for(2.0), 3);
        assert_eq!(table.streams_for(10.0), 3);
        assert_eq!(table.streams_for(30.0), 4);
        assert_eq!(table.streams_for(100.0), 5);
        assert_eq!(table.streams_for(300.0), 6);
        assert_eq!(table.streams_for(1000.0), 7);
        assert_eq!(table.streams_for(3000.0), 8);
        assert_eq!(table.streams_for(10000.0), 9);
        assert_eq!(table.streams_for(30000.0), 10);
        assert_eq!(table.streams_for(30001.0), 11);
    }

    #[test]
    fn test_stream_count_is_monotone_non_decreasing() {
        let table = StreamCountTable::default();
        let scales = [0.01, 0.5, 1.0, 1.5, 5.0, 25.0, 75.0, 250.0, 900.0, 2500.0, 9000.0, 29000.0, 50000.0];
        let mut previous = 0;
        for scale in scales {
            let streams = table.streams_for(scale);
            assert!(streams >= previous, "stream count decreased at scale {}", scale);
            previous = streams;
        }
    }

    #[test]
    fn test_metric_name_composition() {
        assert_eq!(query_metric(0, 14), "query_stream_0_query_14");
        assert_eq!(query_metric(3, 1), "query_stream_3_query_1");
        assert_eq!(refresh_metric(2, 1), "refresh_stream_2_func_1");
        assert_eq!(THROUGHPUT_TOTAL_METRIC, "throughput_test_total");
    }
}

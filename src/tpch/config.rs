//! Benchmark run configuration
//!
//! Owned paths and flags for one benchmark run, plus the composition of
//! every file path the harness touches. Delta and delete files are numbered
//! 1,2,3,... while streams are indexed 0,1,2,..., so stream `s` always
//! reads file `s + 1`.

use std::path::PathBuf;

/// Subdirectory of the data directory holding the ORDERS/LINEITEM delta files
pub const UPDATE_DIR: &str = "update";

/// Subdirectory of the data directory holding the orderkey delete files
pub const DELETE_DIR: &str = "delete";

/// Configuration for a benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Directory containing the `update/` and `delete/` delta subdirectories
    pub data_dir: PathBuf,

    /// Directory containing the generated query files `1.sql` .. `22.sql`
    pub query_dir: PathBuf,

    /// Root directory for result artifacts
    pub results_dir: PathBuf,

    /// Scale factor of the generated data set (1.0 = reference size)
    pub scale_factor: f64,

    /// Explicit throughput stream count; derived from the scale factor
    /// when unset
    pub num_streams: Option<usize>,

    /// Skip refresh functions so the query phase can be repeated without
    /// mutating data
    pub read_only: bool,
}

impl BenchmarkConfig {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        query_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            query_dir: query_dir.into(),
            results_dir: results_dir.into(),
            scale_factor: 1.0,
            num_streams: None,
            read_only: false,
        }
    }

    /// Set the scale factor
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Fix the throughput stream count instead of deriving it from scale
    pub fn with_num_streams(mut self, num_streams: usize) -> Self {
        self.num_streams = Some(num_streams);
        self
    }

    /// Enable or disable read-only mode
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// ORDERS delta file for a stream
    pub fn orders_update_file(&self, stream: usize) -> PathBuf {
        self.data_dir
            .join(UPDATE_DIR)
            .join(format!("orders.tbl.u{}.csv", stream + 1))
    }

    /// LINEITEM delta file for a stream
    pub fn lineitem_update_file(&self, stream: usize) -> PathBuf {
        self.data_dir
            .join(UPDATE_DIR)
            .join(format!("lineitem.tbl.u{}.csv", stream + 1))
    }

    /// Orderkey delete file for a stream
    pub fn delete_file(&self, stream: usize) -> PathBuf {
        self.data_dir
            .join(DELETE_DIR)
            .join(format!("delete.{}.csv", stream + 1))
    }

    /// Generated SQL file for one TPC-H query id
    pub fn query_file(&self, query: u8) -> PathBuf {
        self.query_dir.join(format!("{}.sql", query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_stream_file_numbering_is_one_based() {
        let config = BenchmarkConfig::new("data", "queries", "results");
        assert_eq!(
            config.orders_update_file(0),
            Path::new("data/update/orders.tbl.u1.csv")
        );
        assert_eq!(
            config.lineitem_update_file(2),
            Path::new("data/update/lineitem.tbl.u3.csv")
        );
        assert_eq!(config.delete_file(1), Path::new("data/delete/delete.2.csv"));
    }

    #[test]
    fn test_query_file_path() {
        let config = BenchmarkConfig::new("data", "queries", "results");
        assert_eq!(config.query_file(14), Path::new("queries/14.sql"));
    }

    #[test]
    fn test_builder_defaults() {
        let config = BenchmarkConfig::new("d", "q", "r");
        assert_eq!(config.scale_factor, 1.0);
        assert_eq!(config.num_streams, None);
        assert!(!config.read_only);

        let config = config
            .with_scale_factor(10.0)
            .with_num_streams(4)
            .with_read_only(true);
        assert_eq!(config.scale_factor, 10.0);
        assert_eq!(config.num_streams, Some(4));
        assert!(config.read_only);
    }
}

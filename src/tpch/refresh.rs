//! Refresh functions
//!
//! Refresh function #1 reconstructs a valid insert order from the two
//! pre-sorted delta files: every ORDERS insert is immediately followed by
//! the 1-7 LINEITEM inserts sharing its orderkey. Refresh function #2
//! batches orderkey deletions. Both commit exactly once, after all of
//! their statements succeeded; any earlier failure leaves the refresh
//! invocation uncommitted.

use crate::tpch::error::{BenchmarkError, BenchmarkResult};
use crate::tpch::executor::QueryExecutor;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Records per statement batch, as mandated by the refresh function definition
pub const REFRESH_BATCH_SIZE: usize = 100;

/// ORDERS value layout: o_orderstatus, o_orderdate, o_orderpriority,
/// o_clerk and o_comment are character columns.
const ORDERS_QUOTED: [bool; 9] = [false, false, true, false, true, true, true, false, true];

/// LINEITEM value layout: the first eight columns are numeric, the rest are
/// character and date columns.
const LINEITEM_QUOTED: [bool; 16] = [
    false, false, false, false, false, false, false, false, true, true, true, true, true, true,
    true, true,
];

/// One row of the merged insert order, carrying the raw pipe-split columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergedRow {
    Order(Vec<String>),
    Lineitem(Vec<String>),
}

impl MergedRow {
    /// The row's orderkey (first column in both tables)
    pub fn orderkey(&self) -> &str {
        match self {
            MergedRow::Order(cols) | MergedRow::Lineitem(cols) => &cols[0],
        }
    }
}

/// Merged rows covering up to one orders batch and its paired lineitems
#[derive(Debug, Default)]
pub struct UpdateBatch {
    pub rows: Vec<MergedRow>,
}

/// Pairs the two pre-sorted delta files into bounded batches
///
/// Orders are read in fixed-size batches to bound memory; lineitems are
/// read one record at a time with a single-record lookahead buffer. Neither
/// file is ever reordered, only paired.
pub struct MergeReader<O: BufRead, L: BufRead> {
    orders: Lines<O>,
    lineitems: Lines<L>,
    pending: Option<Vec<String>>,
    batch_size: usize,
}

impl<O: BufRead, L: BufRead> MergeReader<O, L> {
    pub fn new(orders: O, lineitems: L) -> Self {
        Self::with_batch_size(orders, lineitems, REFRESH_BATCH_SIZE)
    }

    pub fn with_batch_size(orders: O, lineitems: L, batch_size: usize) -> Self {
        Self {
            orders: orders.lines(),
            lineitems: lineitems.lines(),
            pending: None,
            batch_size,
        }
    }

    /// Next merged batch, or `None` once both files are exhausted
    ///
    /// A buffered lineitem whose orderkey does not match the orders record
    /// it is paired against, an orders record pairing zero lineitem rows,
    /// and lineitem rows remaining after the final orders record are all
    /// fatal: the files do not describe a consistent delta.
    pub fn next_batch(&mut self) -> BenchmarkResult<Option<UpdateBatch>> {
        let mut batch = UpdateBatch::default();
        let mut orders_in_batch = 0;
        while orders_in_batch < self.batch_size {
            let order_cols = match next_record(&mut self.orders)? {
                Some(cols) => cols,
                None => break,
            };
            orders_in_batch += 1;
            let orderkey = order_cols[0].clone();
            batch.rows.push(MergedRow::Order(order_cols));

            let mut paired = 0;
            if let Some(buffered) = self.pending.take() {
                if buffered[0] != orderkey {
                    return Err(BenchmarkError::DataIntegrity {
                        message: format!(
                            "buffered lineitem orderkey {} does not match orders orderkey {}",
                            buffered[0], orderkey
                        ),
                        path: String::new(),
                    });
                }
                batch.rows.push(MergedRow::Lineitem(buffered));
                paired += 1;
            }
            while let Some(cols) = next_record(&mut self.lineitems)? {
                if cols[0] == orderkey {
                    batch.rows.push(MergedRow::Lineitem(cols));
                    paired += 1;
                } else {
                    self.pending = Some(cols);
                    break;
                }
            }
            if paired == 0 {
                return Err(BenchmarkError::DataIntegrity {
                    message: format!("no lineitem records paired with orders orderkey {}", orderkey),
                    path: String::new(),
                });
            }
        }

        if batch.rows.is_empty() {
            // Orders exhausted; the lineitem file must be exhausted too.
            if self.pending.is_some() || next_record(&mut self.lineitems)?.is_some() {
                return Err(BenchmarkError::DataIntegrity {
                    message: "lineitem records remain after the final orders record".to_string(),
                    path: String::new(),
                });
            }
            return Ok(None);
        }
        Ok(Some(batch))
    }
}

/// Next non-blank pipe-split record from a delta file
fn next_record<B: BufRead>(lines: &mut Lines<B>) -> BenchmarkResult<Option<Vec<String>>> {
    for line in lines {
        let line = line.map_err(|e| BenchmarkError::Io {
            message: e.to_string(),
            path: String::new(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return Ok(Some(trimmed.split('|').map(str::to_string).collect()));
    }
    Ok(None)
}

fn insert_statement(table: &str, cols: &[String], quoted: &[bool]) -> BenchmarkResult<String> {
    if cols.len() != quoted.len() {
        return Err(BenchmarkError::DataIntegrity {
            message: format!(
                "{} row has {} columns, expected {}",
                table,
                cols.len(),
                quoted.len()
            ),
            path: String::new(),
        });
    }
    let mut values = String::new();
    for (col, &quote) in cols.iter().zip(quoted) {
        if !values.is_empty() {
            values.push_str(", ");
        }
        if quote {
            values.push('\'');
            values.push_str(col);
            values.push('\'');
        } else {
            values.push_str(col);
        }
    }
    Ok(format!("INSERT INTO {} VALUES ({})", table, values))
}

/// INSERT statement for one ORDERS delta row
pub fn orders_insert(cols: &[String]) -> BenchmarkResult<String> {
    insert_statement("ORDERS", cols, &ORDERS_QUOTED)
}

/// INSERT statement for one LINEITEM delta row
pub fn lineitem_insert(cols: &[String]) -> BenchmarkResult<String> {
    insert_statement("LINEITEM", cols, &LINEITEM_QUOTED)
}

fn open_reader(path: &Path) -> BenchmarkResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| BenchmarkError::Io {
            message: e.to_string(),
            path: path.display().to_string(),
        })
}

/// Refresh function #1: merge the ORDERS and LINEITEM delta files into the
/// database in a valid insert order
pub struct UpdateMerger {
    batch_size: usize,
}

impl Default for UpdateMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateMerger {
    pub fn new() -> Self {
        Self {
            batch_size: REFRESH_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Apply one stream's update delta, committing once after all inserts
    pub async fn apply(
        &self,
        orders_path: &Path,
        lineitem_path: &Path,
        conn: &mut dyn QueryExecutor,
    ) -> BenchmarkResult<()> {
        debug!(
            "merging update files {} and {}",
            orders_path.display(),
            lineitem_path.display()
        );
        let orders = open_reader(orders_path)?;
        let lineitems = open_reader(lineitem_path)?;
        let mut reader = MergeReader::with_batch_size(orders, lineitems, self.batch_size);
        while let Some(batch) = reader.next_batch()? {
            for row in &batch.rows {
                let statement = match row {
                    MergedRow::Order(cols) => orders_insert(cols)?,
                    MergedRow::Lineitem(cols) => lineitem_insert(cols)?,
                };
                conn.execute(&statement).await?;
            }
        }
        conn.commit().await?;
        Ok(())
    }
}

/// Refresh function #2: delete orders by key, in bounded batches
pub struct DeleteApplier {
    batch_size: usize,
}

impl Default for DeleteApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl DeleteApplier {
    pub fn new() -> Self {
        Self {
            batch_size: REFRESH_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// Apply one stream's delete file, committing once after all batches
    pub async fn apply(&self, path: &Path, conn: &mut dyn QueryExecutor) -> BenchmarkResult<()> {
        debug!("applying delete file {}", path.display());
        let reader = open_reader(path)?;
        let mut keys: Vec<String> = Vec::with_capacity(self.batch_size);
        for line in reader.lines() {
            let line = line.map_err(|e| BenchmarkError::Io {
                message: e.to_string(),
                path: path.display().to_string(),
            })?;
            let key = line.trim();
            if key.is_empty() {
                continue;
            }
            keys.push(key.to_string());
            if keys.len() == self.batch_size {
                conn.execute(&delete_statement(&keys)).await?;
                keys.clear();
            }
        }
        if !keys.is_empty() {
            conn.execute(&delete_statement(&keys)).await?;
        }
        conn.commit().await?;
        Ok(())
    }
}

fn delete_statement(keys: &[String]) -> String {
    format!(
        "DELETE FROM orders WHERE O_ORDERKEY IN ({})",
        keys.join(", ")
    )
}

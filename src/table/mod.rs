//! Tabular data retrieval.
//!
//! Reconstructs multi-column, multi-row conceptual tables from the
//! paginated, possibly out-of-order responses an agent gives to
//! GETBULK/GETNEXT. Rows are reassembled cell by cell and yielded in
//! ascending row-index order as soon as they can no longer change.
//!
//! # Example
//!
//! ```no_run
//! use snmp_tables::table::TableRequest;
//! use snmp_tables::session::{MockSession, Target};
//! use snmp_tables::oid;
//!
//! # async fn example() -> snmp_tables::Result<()> {
//! let session = MockSession::new();
//! let target = Target::new("192.0.2.1:161".parse().unwrap());
//!
//! // ifDescr and ifSpeed from IF-MIB
//! let mut stream = TableRequest::new(
//!     session,
//!     target,
//!     vec![oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2), oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 5)],
//! )
//! .start()?;
//!
//! while let Some(row) = stream.next().await {
//!     let row = row?;
//!     println!("{}: {:?}", row.index, row.values);
//! }
//! println!("finished: {:?}", stream.status());
//! # Ok(())
//! # }
//! ```
//!
//! # Sparse and dense tables
//!
//! SNMP tables may be *sparse*: a row can legitimately lack values for
//! some columns. [`TableMode`] picks the policy:
//!
//! - [`Sparse`](TableMode::Sparse) (default) - rows are released with
//!   `None` holes.
//! - [`DenseDrop`](TableMode::DenseDrop) - incomplete rows are silently
//!   discarded; the table is expected to be fully populated.
//! - [`DenseVerify`](TableMode::DenseVerify) - before discarding, missing
//!   cells are double-checked with a targeted GET; a cell that exists
//!   after all (the walk raced a row creation, or a response was lost)
//!   completes the row instead.
//!
//! # Ordering violations
//!
//! Agents are required to return instances in ascending OID order.
//! Broken agents do not. Each regression is counted; rows carrying
//! affected data are flagged with
//! [`order_violation`](TableRow::order_violation), and when the count
//! exceeds the configured tolerance the retrieval stops with
//! [`TableStatus::WrongOrder`].

mod cursor;
mod fetch;
mod plan;
mod reconcile;
mod row;
mod rowops;

pub use fetch::{TableResult, TableStream};
pub use row::TableRow;
pub use rowops::{create_row, create_row_wait, destroy_row, RowStatus};

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::session::{Session, Target};

/// Policy for rows with empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableMode {
    /// Release rows as-is; holes stay `None`.
    #[default]
    Sparse,
    /// Discard rows with holes.
    DenseDrop,
    /// Double-check holes with a GET before discarding.
    DenseVerify,
}

/// How a retrieval ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableStatus {
    /// Every selected column was walked to exhaustion.
    Complete,
    /// The ordering-violation tolerance was exceeded, or the table
    /// completed with violations on record.
    WrongOrder,
    /// The configured row limit cut the retrieval short.
    RowLimitReached,
    /// A request timed out (after its retry budget).
    TimedOut,
    /// A fatal protocol or transport error ended the retrieval; the
    /// stream yielded it before finishing.
    Failed,
}

/// Builder for a table retrieval.
///
/// ```no_run
/// # use snmp_tables::table::{TableRequest, TableMode};
/// # use snmp_tables::session::{MockSession, Target};
/// # use snmp_tables::oid;
/// # fn example(session: MockSession, target: Target) -> snmp_tables::Result<()> {
/// let stream = TableRequest::new(session, target, vec![oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)])
///     .mode(TableMode::DenseVerify)
///     .row_limit(1000)
///     .rows_per_chunk(50)
///     .pipeline(4)
///     .start()?;
/// # Ok(())
/// # }
/// ```
pub struct TableRequest<S: Session> {
    session: S,
    target: Target,
    columns: Vec<Oid>,
    mode: TableMode,
    row_limit: Option<u64>,
    lower_bound: Option<Oid>,
    upper_bound: Option<Oid>,
    max_columns_per_chunk: usize,
    rows_per_chunk: i32,
    max_order_violations: u64,
    max_in_flight: usize,
}

impl<S: Session> TableRequest<S> {
    /// Start building a retrieval of `columns` from `target`.
    pub fn new(session: S, target: Target, columns: Vec<Oid>) -> Self {
        Self {
            session,
            target,
            columns,
            mode: TableMode::default(),
            row_limit: None,
            lower_bound: None,
            upper_bound: None,
            max_columns_per_chunk: 10,
            rows_per_chunk: 25,
            max_order_violations: 0,
            max_in_flight: 1,
        }
    }

    /// Policy for rows with empty cells. Default [`TableMode::Sparse`].
    pub fn mode(mut self, mode: TableMode) -> Self {
        self.mode = mode;
        self
    }

    /// Stop after releasing this many rows.
    pub fn row_limit(mut self, limit: u64) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Only retrieve rows with index strictly greater than `bound`.
    pub fn lower_bound(mut self, bound: Oid) -> Self {
        self.lower_bound = Some(bound);
        self
    }

    /// Only retrieve rows with index up to and including `bound`.
    pub fn upper_bound(mut self, bound: Oid) -> Self {
        self.upper_bound = Some(bound);
        self
    }

    /// Cap on columns per request. Default 10.
    pub fn max_columns_per_chunk(mut self, max: usize) -> Self {
        self.max_columns_per_chunk = max.max(1);
        self
    }

    /// GETBULK max-repetitions per chunk. Default 25. Ignored for SNMPv1.
    pub fn rows_per_chunk(mut self, reps: i32) -> Self {
        self.rows_per_chunk = reps.max(1);
        self
    }

    /// Ordering violations to tolerate before aborting. Default 0.
    pub fn max_order_violations(mut self, max: u64) -> Self {
        self.max_order_violations = max;
        self
    }

    /// Requests kept in flight concurrently. Default 1 (no pipelining).
    pub fn pipeline(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Validate the configuration and start the retrieval.
    ///
    /// The first request is issued on the first poll of the stream.
    pub fn start(self) -> Result<TableStream<S>> {
        if self.columns.is_empty() {
            return Err(Error::EmptyColumns);
        }
        for column in &self.columns {
            column.validate_all()?;
        }
        let config = fetch::StreamConfig {
            columns: self.columns,
            mode: self.mode,
            row_limit: self.row_limit,
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            max_columns_per_chunk: self.max_columns_per_chunk,
            rows_per_chunk: self.rows_per_chunk,
            max_order_violations: self.max_order_violations,
            max_in_flight: self.max_in_flight,
        };
        Ok(TableStream::new(self.session, self.target, config))
    }
}

//! Partial row storage.
//!
//! Rows under reassembly live in a cache ordered by row index. Agents walk
//! tables in index order, so a varbind almost always lands on the newest
//! row; insertion scans from the tail. Release is strictly head-ordered.

use crate::oid::Oid;
use crate::value::Value;
use std::collections::VecDeque;

/// One table row.
///
/// `values` is parallel to the column set the retrieval was started with;
/// `None` marks a cell the agent never produced (a hole in a sparse
/// table).
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Row index: the instance suffix shared by every cell of the row.
    pub index: Oid,
    /// One slot per selected column, in selection order.
    pub values: Vec<Option<Value>>,
    /// Some cell of this row was involved in, or fetched from a position
    /// tainted by, an ordering violation.
    pub order_violation: bool,
    /// Dense double-check already ran for this row.
    pub(crate) verified: bool,
}

impl TableRow {
    pub(crate) fn new(index: Oid, ncols: usize) -> Self {
        Self {
            index,
            values: vec![None; ncols],
            order_violation: false,
            verified: false,
        }
    }

    /// Whether every cell holds a value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Positions of empty cells.
    pub(crate) fn missing(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect()
    }
}

/// Rows under reassembly, ordered by row index, no duplicates.
#[derive(Debug, Default)]
pub(crate) struct RowCache {
    rows: VecDeque<TableRow>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn front(&self) -> Option<&TableRow> {
        self.rows.front()
    }

    pub fn pop_front(&mut self) -> Option<TableRow> {
        self.rows.pop_front()
    }

    /// Fetch the row for `index`, creating it in order if absent.
    ///
    /// Scans from the tail: in-order traffic hits the last row or appends
    /// in O(1); only out-of-order data walks further.
    pub fn row_mut(&mut self, index: &Oid, ncols: usize) -> &mut TableRow {
        let mut insert_at = self.rows.len();
        for i in (0..self.rows.len()).rev() {
            match self.rows[i].index.cmp(index) {
                std::cmp::Ordering::Equal => return &mut self.rows[i],
                std::cmp::Ordering::Less => break,
                std::cmp::Ordering::Greater => insert_at = i,
            }
        }
        self.rows.insert(insert_at, TableRow::new(index.clone(), ncols));
        &mut self.rows[insert_at]
    }

    /// Iterate rows in index order.
    pub fn iter(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter()
    }
}

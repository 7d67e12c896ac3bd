//! Per-column retrieval cursors.
//!
//! Each selected column carries a cursor: the last instance OID reconciled
//! for that column, the row index that produced it, and whether the
//! position is tainted by an ordering violation. Requests are planned from
//! cursor positions; snapshots taken at plan time let the reconciler
//! attribute ordering problems to the data that was actually asked for.

use crate::oid::Oid;

/// Retrieval state for one column.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    /// Column (object) OID. Instance OIDs under it are column OID + row index.
    pub column: Oid,
    /// Last reconciled instance OID; the next request for this column asks
    /// for the successor of this position. Starts at the column OID itself
    /// (or column + lower bound).
    pub position: Oid,
    /// Row index that produced `position`, if any varbind has been
    /// reconciled yet.
    pub row: Option<Oid>,
    /// Position was derived from an out-of-order varbind. Data fetched
    /// from a tainted position inherits the flag.
    pub tainted: bool,
    /// No further instances exist for this column.
    pub exhausted: bool,
}

/// Value-semantic snapshot of one cursor, captured at plan time.
///
/// The reconciler validates a response against the snapshot of the chunk
/// that requested it, not against cursors that may have moved since.
#[derive(Debug, Clone)]
pub(crate) struct CursorSnapshot {
    pub position: Oid,
    pub tainted: bool,
}

/// The cursors for every selected column, indexed by column position.
#[derive(Debug)]
pub(crate) struct CursorSet {
    cursors: Vec<Cursor>,
}

impl CursorSet {
    /// Seed cursors at each column OID, or at column + lower bound when a
    /// lower row-index bound is set. GETNEXT semantics make the bound
    /// exclusive at the seeded position.
    pub fn new(columns: &[Oid], lower_bound: Option<&Oid>) -> Self {
        let cursors = columns
            .iter()
            .map(|col| {
                let position = match lower_bound {
                    Some(bound) => col.concat(bound),
                    None => col.clone(),
                };
                Cursor {
                    column: col.clone(),
                    position,
                    row: None,
                    tainted: false,
                    exhausted: false,
                }
            })
            .collect();
        Self { cursors }
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn get(&self, pos: usize) -> &Cursor {
        &self.cursors[pos]
    }

    /// Advance a cursor to a newly reconciled instance.
    ///
    /// Positions only move forward; a violating varbind never drags a
    /// cursor backwards.
    pub fn advance(&mut self, pos: usize, instance: Oid, row: Oid, tainted: bool) {
        let cursor = &mut self.cursors[pos];
        if instance > cursor.position {
            cursor.position = instance;
            cursor.row = Some(row);
        }
        if tainted {
            cursor.tainted = true;
        }
    }

    pub fn mark_exhausted(&mut self, pos: usize) {
        self.cursors[pos].exhausted = true;
    }

    pub fn is_exhausted(&self, pos: usize) -> bool {
        self.cursors[pos].exhausted
    }

    pub fn all_exhausted(&self) -> bool {
        self.cursors.iter().all(|c| c.exhausted)
    }

    /// Whether column `pos` has moved strictly past row `index`, meaning
    /// no future response from the current position can fill the cell
    /// `(pos, index)`.
    pub fn past_row(&self, pos: usize, index: &Oid) -> bool {
        let cursor = &self.cursors[pos];
        cursor.exhausted || cursor.row.as_ref().is_some_and(|r| r > index)
    }

    /// Snapshot one cursor for a chunk about to be issued.
    pub fn snapshot(&self, pos: usize) -> CursorSnapshot {
        let cursor = &self.cursors[pos];
        CursorSnapshot {
            position: cursor.position.clone(),
            tainted: cursor.tainted,
        }
    }
}

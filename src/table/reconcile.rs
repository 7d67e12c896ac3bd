//! Response reconciliation.
//!
//! Takes one chunk's response and attributes every varbind to a
//! `(column, row)` cell: GETBULK responses are row-major (repetitions
//! outer, requested columns inner), so varbind `i` belongs to the chunk's
//! column `i % ncols`. Detects per-column exhaustion, upper-bound overrun
//! and ordering violations, advances cursors, and fills the row cache.
//!
//! Ordering is validated against the cursor snapshot the chunk was
//! planned from, not the live cursors, so a violation is attributed to
//! the request that actually asked for the offending position.

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::session::Target;
use crate::table::cursor::CursorSet;
use crate::table::plan::ChunkPlan;
use crate::table::row::{RowCache, TableRow};
use crate::table::TableMode;
use crate::value::Value;
use tracing::{debug, trace};

/// Outcome of reconciling one chunk.
#[derive(Debug)]
pub(crate) enum Reconciled {
    /// Chunk applied; retrieval continues.
    Progress,
    /// The ordering-violation budget was exceeded.
    ///
    /// `offending` names the row the final violation landed on, when the
    /// violating varbind still carried an extractable row index.
    OrderAborted { offending: Option<Oid> },
}

/// What to do with the head row of the cache.
#[derive(Debug)]
pub(crate) enum HeadAction {
    /// Head row is settled and passes the mode policy.
    Release(TableRow),
    /// Head row was settled but incomplete and the mode discards it.
    Dropped(Oid),
    /// Dense double-check: confirm the missing cells with a GET before
    /// deciding. The row stays cached.
    Verify { index: Oid, missing: Vec<usize> },
    /// Head row has unsettled cells; more responses are needed.
    Blocked,
    /// Cache is empty.
    Empty,
}

/// Cursor state, row cache and the policy knobs that interpret responses.
pub(crate) struct Reconciler {
    columns: Vec<Oid>,
    cursors: CursorSet,
    cache: RowCache,
    mode: TableMode,
    upper_bound: Option<Oid>,
    v1: bool,
    order_violations: u64,
    max_order_violations: u64,
}

impl Reconciler {
    pub fn new(
        columns: Vec<Oid>,
        lower_bound: Option<&Oid>,
        upper_bound: Option<Oid>,
        mode: TableMode,
        v1: bool,
        max_order_violations: u64,
    ) -> Self {
        let cursors = CursorSet::new(&columns, lower_bound);
        Self {
            columns,
            cursors,
            cache: RowCache::new(),
            mode,
            upper_bound,
            v1,
            order_violations: 0,
            max_order_violations,
        }
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub fn order_violations(&self) -> u64 {
        self.order_violations
    }

    pub fn all_exhausted(&self) -> bool {
        self.cursors.all_exhausted()
    }

    pub fn cache_is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Apply one chunk's response.
    pub fn reconcile(
        &mut self,
        plan: &ChunkPlan,
        pdu: &Pdu,
        target: &Target,
    ) -> Result<Reconciled> {
        if pdu.pdu_type == PduType::Report {
            return Err(Error::Report {
                target: Some(target.addr),
                oid: pdu.varbinds.first().map(|vb| vb.oid.clone()),
            });
        }

        if pdu.is_error() {
            return self.reconcile_error(plan, pdu, target);
        }

        if pdu.varbinds.is_empty() {
            return Err(Error::MalformedResponse {
                target: Some(target.addr),
            });
        }

        let ncols = plan.cols.len();
        // Per-slot monotonic chain within this response, seeded from the
        // positions the chunk asked for
        let mut last: Vec<Oid> = plan.snapshots.iter().map(|s| s.position.clone()).collect();

        for (i, vb) in pdu.varbinds.iter().enumerate() {
            let slot = i % ncols;
            let pos = plan.cols[slot];

            if self.cursors.is_exhausted(pos) {
                continue;
            }

            if vb.value.is_exception() {
                trace!(
                    target: "snmp_tables::table",
                    column = %self.columns[pos],
                    oid = %vb.oid,
                    value = %vb.value,
                    "column exhausted by exception value"
                );
                self.cursors.mark_exhausted(pos);
                continue;
            }

            let violation = vb.oid <= last[slot];
            if violation {
                self.order_violations += 1;
                debug!(
                    target: "snmp_tables::table",
                    column = %self.columns[pos],
                    got = %vb.oid,
                    expected_after = %last[slot],
                    count = self.order_violations,
                    "ordering violation"
                );
            } else {
                last[slot] = vb.oid.clone();
            }

            let index = vb.oid.strip_prefix(&self.columns[pos]);

            if violation {
                if let Some(index) = &index
                    && !index.is_empty()
                {
                    let row = self.cache.row_mut(index, self.columns.len());
                    if row.values[pos].is_none() {
                        row.values[pos] = Some(vb.value.clone());
                    }
                    row.order_violation = true;
                    self.cursors.advance(pos, vb.oid.clone(), index.clone(), true);
                }
                if self.order_violations > self.max_order_violations {
                    return Ok(Reconciled::OrderAborted {
                        offending: index.filter(|i| !i.is_empty()),
                    });
                }
                continue;
            }

            // Walked off the end of the column subtree
            let Some(index) = index else {
                trace!(
                    target: "snmp_tables::table",
                    column = %self.columns[pos],
                    oid = %vb.oid,
                    "column exhausted by prefix departure"
                );
                self.cursors.mark_exhausted(pos);
                continue;
            };
            if index.is_empty() {
                // The column OID itself came back; GETNEXT must return a
                // strict successor, so this never names a row
                self.cursors.mark_exhausted(pos);
                continue;
            }

            if let Some(upper) = &self.upper_bound
                && index > *upper
            {
                trace!(
                    target: "snmp_tables::table",
                    column = %self.columns[pos],
                    index = %index,
                    upper = %upper,
                    "column exhausted by upper bound"
                );
                self.cursors.mark_exhausted(pos);
                continue;
            }

            let tainted = plan.snapshots[slot].tainted;
            let row = self.cache.row_mut(&index, self.columns.len());
            if row.values[pos].is_none() {
                row.values[pos] = Some(vb.value.clone());
            }
            if tainted {
                row.order_violation = true;
            }
            self.cursors.advance(pos, vb.oid.clone(), index, tainted);
        }

        Ok(Reconciled::Progress)
    }

    /// Error-status responses. SNMPv1 signals end-of-table with
    /// `noSuchName`; everything else is fatal to the retrieval.
    fn reconcile_error(&mut self, plan: &ChunkPlan, pdu: &Pdu, target: &Target) -> Result<Reconciled> {
        let status = pdu.error_status_enum();
        if self.v1 && status == ErrorStatus::NoSuchName {
            // The error index names the varbind that walked off the end.
            // Only that column is done; the rest retry next sweep. Agents
            // that report index 0 leave no attribution, so the whole
            // chunk is treated as exhausted.
            let slot = (pdu.error_index.max(0) as usize).checked_sub(1);
            match slot.and_then(|s| plan.cols.get(s)) {
                Some(&pos) => {
                    debug!(
                        target: "snmp_tables::table",
                        serial = plan.serial,
                        column = %self.columns[pos],
                        "noSuchName on SNMPv1, column exhausted"
                    );
                    self.cursors.mark_exhausted(pos);
                }
                None => {
                    debug!(
                        target: "snmp_tables::table",
                        serial = plan.serial,
                        "noSuchName on SNMPv1 without attribution, chunk exhausted"
                    );
                    for &pos in &plan.cols {
                        self.cursors.mark_exhausted(pos);
                    }
                }
            }
            return Ok(Reconciled::Progress);
        }

        let error_index = pdu.error_index.max(0) as u32;
        let oid = error_index
            .checked_sub(1)
            .and_then(|i| plan.snapshots.get(i as usize))
            .map(|s| s.position.clone());
        Err(Error::Snmp {
            target: Some(target.addr),
            status,
            index: error_index,
            oid,
        })
    }

    /// Decide the fate of the head row.
    ///
    /// A cell is settled when it holds a value, or when its column can no
    /// longer produce one for this row (exhausted, or the cursor already
    /// moved past the row). Only fully settled rows are eligible, and
    /// only in head order.
    pub fn head_action(&mut self) -> HeadAction {
        let Some(row) = self.cache.front() else {
            return HeadAction::Empty;
        };

        let settled = (0..self.columns.len())
            .all(|pos| row.values[pos].is_some() || self.cursors.past_row(pos, &row.index));
        if !settled {
            return HeadAction::Blocked;
        }

        if row.is_complete() {
            return HeadAction::Release(self.cache.pop_front().expect("head row present"));
        }

        match self.mode {
            TableMode::Sparse => {
                HeadAction::Release(self.cache.pop_front().expect("head row present"))
            }
            TableMode::DenseDrop => {
                let row = self.cache.pop_front().expect("head row present");
                HeadAction::Dropped(row.index)
            }
            TableMode::DenseVerify => {
                if row.verified {
                    let row = self.cache.pop_front().expect("head row present");
                    HeadAction::Dropped(row.index)
                } else {
                    HeadAction::Verify {
                        index: row.index.clone(),
                        missing: row.missing(),
                    }
                }
            }
        }
    }

    /// Instance OIDs for the given column positions of one row.
    pub fn instance_oids(&self, index: &Oid, positions: &[usize]) -> Vec<Oid> {
        positions
            .iter()
            .map(|&pos| self.columns[pos].concat(index))
            .collect()
    }

    /// Apply a dense double-check GET response to the head row.
    ///
    /// `missing` are the column positions that were queried, in request
    /// order. Exception values leave the cell empty; the row is marked
    /// verified either way so the next head scan decides its fate.
    pub fn apply_verification(&mut self, index: &Oid, missing: &[usize], pdu: &Pdu) {
        let ncols = self.columns.len();
        let row = self.cache.row_mut(index, ncols);
        for (slot, &pos) in missing.iter().enumerate() {
            if let Some(vb) = pdu.varbinds.get(slot)
                && !vb.value.is_exception()
                && vb.value != Value::Null
            {
                row.values[pos] = Some(vb.value.clone());
            }
        }
        row.verified = true;
    }

    /// Drain the cache on an ordering abort.
    ///
    /// Rows strictly before the offending index are released or dropped
    /// per the mode policy as if they were settled. The offending row is
    /// included only when the violation budget was zero. Everything later
    /// is discarded.
    pub fn drain_for_abort(&mut self, offending: Option<&Oid>, include_offending: bool) -> Vec<TableRow> {
        let mut released = Vec::new();
        while let Some(row) = self.cache.pop_front() {
            let keep = match offending {
                Some(off) => match row.index.cmp(off) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Equal => include_offending,
                    std::cmp::Ordering::Greater => false,
                },
                None => true,
            };
            if !keep {
                continue;
            }
            match self.mode {
                TableMode::Sparse => released.push(row),
                TableMode::DenseDrop | TableMode::DenseVerify => {
                    if row.is_complete() {
                        released.push(row);
                    }
                }
            }
        }
        released
    }
}

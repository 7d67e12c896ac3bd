//! Chunk planning.
//!
//! A chunk is one request covering a run of consecutive open columns,
//! fetched from their cursor positions. Chunks are planned in sweeps: a
//! sweep walks the column set left to right, carving it into chunks of at
//! most `max_columns_per_chunk` columns, each budgeted against the
//! target's maximum message size. A new sweep begins only after every
//! chunk of the previous one has been reconciled, so cursor positions are
//! stable while a sweep is being carved.

use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::session::Target;
use crate::table::cursor::{CursorSet, CursorSnapshot};
use crate::varbind::VarBind;

/// Bytes reserved for everything around the PDU: message SEQUENCE,
/// version INTEGER, community string (or v3 header, which the session
/// accounts for separately when larger).
const MESSAGE_OVERHEAD: usize = 40;

/// One planned request.
#[derive(Debug)]
pub(crate) struct ChunkPlan {
    /// Reconciliation order. Responses are applied strictly by serial.
    pub serial: u64,
    /// Request id the chunk was sent with.
    pub request_id: i32,
    /// Column positions covered, in selection order.
    pub cols: Vec<usize>,
    /// Cursor snapshots parallel to `cols`, captured at plan time.
    pub snapshots: Vec<CursorSnapshot>,
    /// GETBULK when true, GETNEXT otherwise.
    pub bulk: bool,
    /// GETBULK max-repetitions.
    pub repetitions: i32,
}

impl ChunkPlan {
    /// Build the request PDU for this chunk.
    pub fn request(&self) -> Pdu {
        let varbinds: Vec<VarBind> = self
            .snapshots
            .iter()
            .map(|snap| VarBind::null(snap.position.clone()))
            .collect();
        if self.bulk {
            Pdu::get_bulk(self.request_id, 0, self.repetitions, varbinds)
        } else {
            let oids: Vec<Oid> = self.snapshots.iter().map(|s| s.position.clone()).collect();
            Pdu::get_next_request(self.request_id, &oids)
        }
    }
}

/// Carves sweeps into chunks.
#[derive(Debug)]
pub(crate) struct ChunkPlanner {
    /// Next column position the active sweep will consider; `None` when
    /// no sweep is active.
    offset: Option<usize>,
    next_serial: u64,
    max_columns_per_chunk: usize,
    repetitions: i32,
    bulk: bool,
}

impl ChunkPlanner {
    pub fn new(bulk: bool, max_columns_per_chunk: usize, repetitions: i32) -> Self {
        Self {
            offset: None,
            next_serial: 0,
            max_columns_per_chunk,
            repetitions,
            bulk,
        }
    }

    /// Whether a sweep is currently being carved.
    pub fn sweep_active(&self) -> bool {
        self.offset.is_some()
    }

    /// Start a new sweep from the leftmost column.
    ///
    /// Callers only do this once the previous sweep has fully reconciled
    /// and some column remains open.
    pub fn begin_sweep(&mut self) {
        self.offset = Some(0);
    }

    /// Carve the next chunk of the active sweep, or `None` when the sweep
    /// is finished (which also deactivates it).
    ///
    /// Columns are taken consecutively from the sweep offset, skipping
    /// exhausted ones, until the column cap or the size budget is hit.
    /// A column once accepted is never dropped; the budget can only stop
    /// further columns from joining, so a chunk always carries at least
    /// one column even if that single varbind overflows the budget on its
    /// own.
    pub fn next_chunk(
        &mut self,
        cursors: &CursorSet,
        target: &Target,
        request_id: i32,
    ) -> Option<ChunkPlan> {
        let mut pos = self.offset?;

        // Message framing plus the header of the request this chunk will
        // become; varbind sizes accumulate on top
        let header = if self.bulk {
            Pdu::get_bulk(request_id, 0, self.repetitions, Vec::new())
        } else {
            Pdu::get_next_request(request_id, &[])
        };
        let mut size = MESSAGE_OVERHEAD + header.encoded_size();
        let mut cols = Vec::new();
        let mut snapshots = Vec::new();

        while pos < cursors.len() && cols.len() < self.max_columns_per_chunk {
            if cursors.is_exhausted(pos) {
                pos += 1;
                continue;
            }
            let snap = cursors.snapshot(pos);
            let vb_size = VarBind::null(snap.position.clone()).encoded_size();
            if !cols.is_empty() && size + vb_size > target.max_message_size {
                break;
            }
            size += vb_size;
            cols.push(pos);
            snapshots.push(snap);
            pos += 1;
        }

        if cols.is_empty() {
            // Sweep ran off the end of the column set
            self.offset = None;
            return None;
        }

        self.offset = Some(pos);
        let serial = self.next_serial;
        self.next_serial += 1;

        Some(ChunkPlan {
            serial,
            request_id,
            cols,
            snapshots,
            bulk: self.bulk,
            repetitions: self.repetitions,
        })
    }
}

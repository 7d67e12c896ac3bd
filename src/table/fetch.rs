//! The retrieval stream.
//!
//! `TableStream` drives the whole retrieval: it carves sweeps into chunks,
//! keeps up to `max_in_flight` requests outstanding, reconciles responses
//! strictly in chunk-serial order (parking whatever completes early), runs
//! the head-ordered release scan, and yields released rows as a
//! [`futures_core::Stream`].
//!
//! Termination is idempotent: the terminal status is set exactly once, all
//! pending request futures are dropped on every path into it, and late
//! polls keep returning `None`.

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::session::{Session, Target};
use crate::table::plan::{ChunkPlan, ChunkPlanner};
use crate::table::reconcile::{HeadAction, Reconciled, Reconciler};
use crate::table::row::TableRow;
use crate::table::{TableMode, TableStatus};
use futures_core::Stream;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

type PduFuture = Pin<Box<dyn Future<Output = Result<Pdu>> + Send>>;

struct InFlight {
    plan: ChunkPlan,
    fut: PduFuture,
}

struct Verify {
    index: Oid,
    missing: Vec<usize>,
    fut: PduFuture,
}

/// Everything the stream needs to know at start, assembled by
/// [`TableRequest`](crate::table::TableRequest).
pub(crate) struct StreamConfig {
    pub columns: Vec<Oid>,
    pub mode: TableMode,
    pub row_limit: Option<u64>,
    pub lower_bound: Option<Oid>,
    pub upper_bound: Option<Oid>,
    pub max_columns_per_chunk: usize,
    pub rows_per_chunk: i32,
    pub max_order_violations: u64,
    pub max_in_flight: usize,
}

/// Streaming table retrieval.
///
/// Yields [`TableRow`]s in ascending row-index order. After the stream
/// ends, [`status`](Self::status) reports how it ended. Dropping the
/// stream cancels the retrieval and every outstanding request.
pub struct TableStream<S: Session> {
    session: S,
    target: Target,
    reconciler: Reconciler,
    planner: ChunkPlanner,
    max_in_flight: usize,
    max_order_violations: u64,
    row_limit: Option<u64>,

    in_flight: Vec<InFlight>,
    parked: BTreeMap<u64, (ChunkPlan, Pdu)>,
    next_reconcile: u64,
    verify: Option<Verify>,

    ready: VecDeque<TableRow>,
    pending_error: Option<Error>,
    status: Option<TableStatus>,
    done: bool,
    rows_released: u64,
    rows_dropped: u64,
}

// No field is structurally pinned; the request futures are already boxed.
impl<S: Session> Unpin for TableStream<S> {}

impl<S: Session> fmt::Debug for TableStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableStream")
            .field("status", &self.status)
            .field("rows_released", &self.rows_released)
            .field("rows_dropped", &self.rows_dropped)
            .field("in_flight", &self.in_flight.len())
            .field("parked", &self.parked.len())
            .field("ready", &self.ready.len())
            .finish_non_exhaustive()
    }
}

impl<S: Session> TableStream<S> {
    pub(crate) fn new(session: S, target: Target, config: StreamConfig) -> Self {
        let bulk = target.version.supports_bulk();
        let reconciler = Reconciler::new(
            config.columns,
            config.lower_bound.as_ref(),
            config.upper_bound,
            config.mode,
            !bulk,
            config.max_order_violations,
        );
        let planner = ChunkPlanner::new(bulk, config.max_columns_per_chunk, config.rows_per_chunk);
        Self {
            session,
            target,
            reconciler,
            planner,
            max_in_flight: config.max_in_flight.max(1),
            max_order_violations: config.max_order_violations,
            row_limit: config.row_limit,
            in_flight: Vec::new(),
            parked: BTreeMap::new(),
            next_reconcile: 0,
            verify: None,
            ready: VecDeque::new(),
            pending_error: None,
            status: None,
            done: false,
            rows_released: 0,
            rows_dropped: 0,
        }
    }

    /// How the retrieval ended. `None` while it is still running.
    pub fn status(&self) -> Option<TableStatus> {
        self.status
    }

    /// Rows yielded so far.
    pub fn rows_released(&self) -> u64 {
        self.rows_released
    }

    /// Rows discarded by a dense mode policy so far.
    pub fn rows_dropped(&self) -> u64 {
        self.rows_dropped
    }

    /// Ordering violations observed so far.
    pub fn order_violations(&self) -> u64 {
        self.reconciler.order_violations()
    }

    /// Next row, or `None` when the stream has ended.
    pub async fn next(&mut self) -> Option<Result<TableRow>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Drain the stream into a [`TableResult`].
    ///
    /// Stops at the first error and returns it; rows yielded before the
    /// error are lost, so prefer iterating when partial data matters.
    pub async fn collect(mut self) -> Result<TableResult> {
        let mut rows = Vec::new();
        while let Some(item) = self.next().await {
            rows.push(item?);
        }
        Ok(TableResult {
            rows,
            status: self.status.unwrap_or(TableStatus::Complete),
            order_violations: self.reconciler.order_violations(),
            rows_dropped: self.rows_dropped,
        })
    }

    /// Enter the terminal state. Sets the status once and drops every
    /// outstanding request future; already-released rows still drain.
    fn finish(&mut self, status: TableStatus) {
        if self.status.is_none() {
            debug!(
                target: "snmp_tables::table",
                ?status,
                rows = self.rows_released,
                violations = self.reconciler.order_violations(),
                "retrieval finished"
            );
            self.status = Some(status);
        }
        self.done = true;
        self.in_flight.clear();
        self.parked.clear();
        self.verify = None;
    }

    fn fail(&mut self, err: Error) {
        let status = match &err {
            Error::Timeout { .. } => TableStatus::TimedOut,
            _ => TableStatus::Failed,
        };
        self.finish(status);
        self.pending_error = Some(err);
    }

    fn send_pdu(&self, pdu: Pdu) -> PduFuture {
        let session = self.session.clone();
        let target = self.target;
        Box::pin(async move { session.send(pdu, target).await })
    }

    /// Apply one chunk response. Returns false when the stream entered a
    /// terminal state.
    fn reconcile_chunk(&mut self, plan: ChunkPlan, pdu: Pdu) -> bool {
        match self.reconciler.reconcile(&plan, &pdu, &self.target) {
            Ok(Reconciled::Progress) => {
                trace!(
                    target: "snmp_tables::table",
                    serial = plan.serial,
                    "chunk reconciled"
                );
                self.next_reconcile = plan.serial + 1;
                true
            }
            Ok(Reconciled::OrderAborted { offending }) => {
                let include_offending = self.max_order_violations == 0;
                let rows = self
                    .reconciler
                    .drain_for_abort(offending.as_ref(), include_offending);
                self.ready.extend(rows);
                self.finish(TableStatus::WrongOrder);
                false
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    /// Reconcile parked responses that have become next in serial order.
    fn drain_parked(&mut self) -> bool {
        while let Some((plan, pdu)) = self.parked.remove(&self.next_reconcile) {
            if !self.reconcile_chunk(plan, pdu) {
                return false;
            }
        }
        true
    }

    /// Run the head-ordered release scan until it blocks, needs a
    /// verification round-trip, or empties the cache.
    fn release_scan(&mut self) -> bool {
        let mut progress = false;
        loop {
            match self.reconciler.head_action() {
                HeadAction::Release(row) => {
                    self.ready.push_back(row);
                    progress = true;
                }
                HeadAction::Dropped(index) => {
                    debug!(
                        target: "snmp_tables::table",
                        index = %index,
                        "dense mode dropped incomplete row"
                    );
                    self.rows_dropped += 1;
                    progress = true;
                }
                HeadAction::Verify { index, missing } => {
                    let oids = self.reconciler.instance_oids(&index, &missing);
                    let request_id = self.session.next_request_id();
                    debug!(
                        target: "snmp_tables::table",
                        index = %index,
                        cells = missing.len(),
                        request_id,
                        "double-checking incomplete row"
                    );
                    let fut = self.send_pdu(Pdu::get_request(request_id, &oids));
                    self.verify = Some(Verify {
                        index,
                        missing,
                        fut,
                    });
                    progress = true;
                    break;
                }
                HeadAction::Blocked | HeadAction::Empty => break,
            }
        }
        progress
    }

    /// Carve and send chunks while capacity allows.
    fn fill_pipeline(&mut self) -> bool {
        let mut progress = false;
        while self.in_flight.len() < self.max_in_flight && !self.done {
            if !self.planner.sweep_active() {
                let may_start = self.in_flight.is_empty()
                    && self.parked.is_empty()
                    && !self.reconciler.all_exhausted();
                if !may_start {
                    break;
                }
                self.planner.begin_sweep();
            }
            let request_id = self.session.next_request_id();
            let Some(plan) = self
                .planner
                .next_chunk(self.reconciler.cursors(), &self.target, request_id)
            else {
                continue;
            };
            debug!(
                target: "snmp_tables::table",
                serial = plan.serial,
                request_id,
                columns = plan.cols.len(),
                bulk = plan.bulk,
                "issuing chunk"
            );
            let fut = self.send_pdu(plan.request());
            self.in_flight.push(InFlight { plan, fut });
            progress = true;
        }
        progress
    }
}

impl<S: Session> Stream for TableStream<S> {
    type Item = Result<TableRow>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(row) = this.ready.pop_front() {
                this.rows_released += 1;
                if let Some(limit) = this.row_limit
                    && this.rows_released >= limit
                    && this.status.is_none()
                {
                    this.finish(TableStatus::RowLimitReached);
                    this.ready.clear();
                }
                return Poll::Ready(Some(Ok(row)));
            }

            if let Some(err) = this.pending_error.take() {
                return Poll::Ready(Some(Err(err)));
            }

            if this.done {
                return Poll::Ready(None);
            }

            let mut progress = false;

            // Dense double-check in flight: it blocks only the release
            // scan, so chunk polling below still runs.
            if let Some(verify) = &mut this.verify {
                match verify.fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(pdu)) => {
                        let Verify { index, missing, .. } =
                            this.verify.take().expect("verify present");
                        this.reconciler.apply_verification(&index, &missing, &pdu);
                        progress = true;
                    }
                    Poll::Ready(Err(err)) => {
                        this.fail(err);
                        continue;
                    }
                    Poll::Pending => {}
                }
            }

            // Poll outstanding chunks; completed ones reconcile in serial
            // order, early ones park.
            let mut i = 0;
            while i < this.in_flight.len() {
                match this.in_flight[i].fut.as_mut().poll(cx) {
                    Poll::Ready(outcome) => {
                        let InFlight { plan, .. } = this.in_flight.remove(i);
                        progress = true;
                        match outcome {
                            Ok(pdu) => {
                                if plan.serial == this.next_reconcile {
                                    if !this.reconcile_chunk(plan, pdu) || !this.drain_parked() {
                                        break;
                                    }
                                } else {
                                    trace!(
                                        target: "snmp_tables::table",
                                        serial = plan.serial,
                                        awaiting = this.next_reconcile,
                                        "parking out-of-order chunk"
                                    );
                                    this.parked.insert(plan.serial, (plan, pdu));
                                }
                            }
                            Err(err) => {
                                this.fail(err);
                                break;
                            }
                        }
                    }
                    Poll::Pending => i += 1,
                }
            }
            if this.done {
                continue;
            }

            if this.verify.is_none() && this.release_scan() {
                progress = true;
            }
            if !this.ready.is_empty() {
                continue;
            }

            if this.fill_pipeline() {
                progress = true;
            }

            if this.in_flight.is_empty()
                && this.parked.is_empty()
                && this.verify.is_none()
                && this.reconciler.all_exhausted()
                && this.reconciler.cache_is_empty()
            {
                let status = if this.reconciler.order_violations() > 0 {
                    TableStatus::WrongOrder
                } else {
                    TableStatus::Complete
                };
                this.finish(status);
                continue;
            }

            if !progress {
                return Poll::Pending;
            }
        }
    }
}

/// Rows plus how the retrieval ended, from [`TableStream::collect`].
#[derive(Debug)]
pub struct TableResult {
    /// Released rows in ascending row-index order.
    pub rows: Vec<TableRow>,
    /// Terminal status.
    pub status: TableStatus,
    /// Total ordering violations observed.
    pub order_violations: u64,
    /// Rows discarded by a dense mode policy.
    pub rows_dropped: u64,
}

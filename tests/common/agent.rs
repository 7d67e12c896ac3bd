//! In-process agent implementing the `Session` trait over a sorted OID map.
//!
//! Answers GET/GETNEXT/GETBULK/SET the way a well-behaved agent would:
//! GETBULK responses are row-major (repetitions outer, requested varbinds
//! inner) and exhausted positions report endOfMibView. An SNMPv1 flavor
//! reports noSuchName instead.

use snmp_tables::error::{ErrorStatus, Result};
use snmp_tables::pdu::{Pdu, PduType};
use snmp_tables::session::{Session, Target};
use snmp_tables::{Oid, Value, VarBind};
use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Bound;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

struct Inner {
    data: BTreeMap<Oid, Value>,
    requests: Vec<Pdu>,
}

/// Simulated agent.
#[derive(Clone)]
pub struct SimAgent {
    inner: Arc<Mutex<Inner>>,
    next_id: Arc<AtomicI32>,
    v1: bool,
}

impl SimAgent {
    pub fn new(data: BTreeMap<Oid, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                requests: Vec::new(),
            })),
            next_id: Arc::new(AtomicI32::new(0)),
            v1: false,
        }
    }

    /// SNMPv1 flavor: no GETBULK, noSuchName at end of MIB.
    pub fn v1(data: BTreeMap<Oid, Value>) -> Self {
        Self {
            v1: true,
            ..Self::new(data)
        }
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<Pdu> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn get(&self, oid: &Oid) -> Option<Value> {
        self.inner.lock().unwrap().data.get(oid).cloned()
    }

    fn next_after(data: &BTreeMap<Oid, Value>, oid: &Oid) -> Option<(Oid, Value)> {
        data.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    fn respond(&self, request: &Pdu) -> Pdu {
        let mut inner = self.inner.lock().unwrap();
        match request.pdu_type {
            PduType::GetRequest => {
                let varbinds = request
                    .varbinds
                    .iter()
                    .map(|vb| {
                        let value = inner
                            .data
                            .get(&vb.oid)
                            .cloned()
                            .unwrap_or(Value::NoSuchInstance);
                        VarBind::new(vb.oid.clone(), value)
                    })
                    .collect();
                Pdu::response(request.request_id, varbinds)
            }
            PduType::GetNextRequest => {
                if self.v1 {
                    // v1 semantics: any position past the end fails the
                    // whole request with noSuchName
                    for (i, vb) in request.varbinds.iter().enumerate() {
                        if Self::next_after(&inner.data, &vb.oid).is_none() {
                            return Pdu::error_response(
                                request.request_id,
                                ErrorStatus::NoSuchName,
                                (i + 1) as i32,
                            );
                        }
                    }
                }
                let varbinds = request
                    .varbinds
                    .iter()
                    .map(|vb| match Self::next_after(&inner.data, &vb.oid) {
                        Some((oid, value)) => VarBind::new(oid, value),
                        None => VarBind::new(vb.oid.clone(), Value::EndOfMibView),
                    })
                    .collect();
                Pdu::response(request.request_id, varbinds)
            }
            PduType::GetBulkRequest => {
                let reps = request.max_repetitions().max(0);
                let mut positions: Vec<Oid> =
                    request.varbinds.iter().map(|vb| vb.oid.clone()).collect();
                let mut varbinds = Vec::new();
                for _ in 0..reps {
                    for pos in positions.iter_mut() {
                        match Self::next_after(&inner.data, pos) {
                            Some((oid, value)) => {
                                varbinds.push(VarBind::new(oid.clone(), value));
                                *pos = oid;
                            }
                            None => {
                                varbinds.push(VarBind::new(pos.clone(), Value::EndOfMibView));
                            }
                        }
                    }
                }
                Pdu::response(request.request_id, varbinds)
            }
            PduType::SetRequest => {
                for vb in &request.varbinds {
                    inner.data.insert(vb.oid.clone(), vb.value.clone());
                }
                Pdu::response(request.request_id, request.varbinds.clone())
            }
            _ => Pdu::error_response(request.request_id, ErrorStatus::GenErr, 0),
        }
    }
}

impl Session for SimAgent {
    fn send(&self, pdu: Pdu, _target: Target) -> impl Future<Output = Result<Pdu>> + Send {
        let response = self.respond(&pdu);
        self.inner.lock().unwrap().requests.push(pdu);
        std::future::ready(Ok(response))
    }

    fn next_request_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

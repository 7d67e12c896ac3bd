//! Programmable in-memory session for tests.
//!
//! `MockSession` replies to requests from a queue of scripted replies and
//! records every request it sees, so tests can assert on what the engine
//! actually sent. Replies are patched to carry the request id of the
//! request they answer, matching what a real agent does.

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::value::Value;
use crate::varbind::VarBind;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use super::{Session, Target};

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with this PDU (request id is patched to match the request).
    Response(Pdu),
    /// Respond with this PDU after the future has been polled `polls`
    /// extra times. Lets tests hold one pipelined request back while a
    /// later one completes.
    Delayed { pdu: Pdu, polls: u32 },
    /// Fail the request with a timeout error.
    Timeout,
    /// Fail the request with an I/O error.
    Io(std::io::ErrorKind),
}

#[derive(Default)]
struct Inner {
    replies: VecDeque<MockReply>,
    requests: Vec<Pdu>,
}

/// In-memory [`Session`] replying from a scripted queue.
#[derive(Clone, Default)]
pub struct MockSession {
    inner: Arc<Mutex<Inner>>,
    next_id: Arc<AtomicI32>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn push_reply(&self, reply: MockReply) {
        self.inner.lock().unwrap().replies.push_back(reply);
    }

    /// Queue a plain response PDU.
    pub fn push_response(&self, pdu: Pdu) {
        self.push_reply(MockReply::Response(pdu));
    }

    /// Requests recorded so far, in send order.
    pub fn requests(&self) -> Vec<Pdu> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining_replies(&self) -> usize {
        self.inner.lock().unwrap().replies.len()
    }
}

impl Session for MockSession {
    fn send(&self, pdu: Pdu, target: Target) -> impl Future<Output = Result<Pdu>> + Send {
        let mut inner = self.inner.lock().unwrap();
        let request_id = pdu.request_id;
        let timeout = target.timeout;
        let retries = target.retries;
        inner.requests.push(pdu);

        let (outcome, polls) = match inner.replies.pop_front() {
            Some(MockReply::Response(mut reply)) => {
                reply.request_id = request_id;
                (Ok(reply), 0)
            }
            Some(MockReply::Delayed { mut pdu, polls }) => {
                pdu.request_id = request_id;
                (Ok(pdu), polls)
            }
            Some(MockReply::Timeout) => (
                Err(Error::Timeout {
                    target: Some(target.addr),
                    elapsed: timeout,
                    request_id,
                    retries,
                }),
                0,
            ),
            Some(MockReply::Io(kind)) => (
                Err(Error::Io {
                    target: Some(target.addr),
                    source: std::io::Error::new(kind, "mock I/O failure"),
                }),
                0,
            ),
            None => (
                Err(Error::Io {
                    target: Some(target.addr),
                    source: std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "no scripted reply for request",
                    ),
                }),
                0,
            ),
        };
        drop(inner);

        MockFuture {
            outcome: Some(outcome),
            polls_left: polls,
        }
    }

    fn next_request_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Resolves after `polls_left` wakeup round-trips.
struct MockFuture {
    outcome: Option<Result<Pdu>>,
    polls_left: u32,
}

impl Future for MockFuture {
    type Output = Result<Pdu>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.polls_left > 0 {
            this.polls_left -= 1;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        Poll::Ready(this.outcome.take().expect("MockFuture polled after completion"))
    }
}

/// Builds Response PDUs for scripting mock replies.
///
/// Varbinds are appended in the order given; GETBULK responses are
/// row-major, so script them row by row.
///
/// # Example
///
/// ```
/// use snmp_tables::session::ResponseBuilder;
/// use snmp_tables::{oid, Value};
///
/// let pdu = ResponseBuilder::new()
///     .vb(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1), Value::from("eth0"))
///     .end_of_mib(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1))
///     .build();
/// assert_eq!(pdu.varbinds.len(), 2);
/// ```
#[derive(Default)]
pub struct ResponseBuilder {
    varbinds: Vec<VarBind>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a varbind.
    pub fn vb(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    /// Append an endOfMibView varbind at `oid`.
    pub fn end_of_mib(mut self, oid: Oid) -> Self {
        self.varbinds.push(VarBind::new(oid, Value::EndOfMibView));
        self
    }

    /// Build a Response PDU. The request id is a placeholder; the mock
    /// patches it when the reply is served.
    pub fn build(self) -> Pdu {
        Pdu::response(0, self.varbinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::version::Version;

    fn target() -> Target {
        Target::new("127.0.0.1:161".parse().unwrap()).version(Version::V2c)
    }

    #[tokio::test]
    async fn test_reply_patches_request_id() {
        let session = MockSession::new();
        session.push_response(ResponseBuilder::new().vb(oid!(1, 3, 6, 1), Value::Integer(5)).build());

        let id = session.next_request_id();
        let pdu = Pdu::get_request(id, &[oid!(1, 3, 6, 1)]);
        let reply = session.send(pdu, target()).await.unwrap();
        assert_eq!(reply.request_id, id);
        assert_eq!(session.requests().len(), 1);
        assert_eq!(session.remaining_replies(), 0);
    }

    #[tokio::test]
    async fn test_timeout_reply() {
        let session = MockSession::new();
        session.push_reply(MockReply::Timeout);

        let pdu = Pdu::get_request(1, &[oid!(1, 3, 6, 1)]);
        let err = session.send(pdu, target()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_empty_queue_is_io_error() {
        let session = MockSession::new();
        let pdu = Pdu::get_request(1, &[oid!(1, 3, 6, 1)]);
        let err = session.send(pdu, target()).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn test_delayed_reply_resolves_after_polls() {
        let session = MockSession::new();
        session.push_reply(MockReply::Delayed {
            pdu: ResponseBuilder::new().vb(oid!(1, 3, 6, 1), Value::Integer(1)).build(),
            polls: 3,
        });

        let pdu = Pdu::get_request(1, &[oid!(1, 3, 6, 1)]);
        let reply = session.send(pdu, target()).await.unwrap();
        assert_eq!(reply.varbinds.len(), 1);
    }
}

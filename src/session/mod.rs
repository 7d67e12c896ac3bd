//! The request/response seam between the table engine and the wire.
//!
//! The engine never touches sockets or message encoding. It hands a
//! [`Pdu`] and a [`Target`] to a [`Session`] and awaits the response PDU.
//! Everything below that line (encoding, community strings or USM,
//! socket lifecycle, retransmission) belongs to the `Session`
//! implementation.
//!
//! The returned future resolves at most once; dropping it before
//! completion cancels the request as far as the engine is concerned.
//! The engine drops every pending future on each path into a terminal
//! state, so implementations can rely on `Drop` for cleanup.

use crate::error::Result;
use crate::pdu::Pdu;
use crate::version::Version;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

pub mod mock;

pub use mock::{MockReply, MockSession, ResponseBuilder};

/// Default maximum outbound message size in bytes.
///
/// Conservative Ethernet MTU minus IP/UDP headers; requests are planned
/// so they never exceed this unless a single varbind alone does.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1472;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// An SNMP agent to talk to, plus the per-request policy for doing so.
///
/// `Target` is deliberately small and `Copy`: the engine clones it into
/// every request it issues.
///
/// # Example
///
/// ```
/// use snmp_tables::session::Target;
/// use snmp_tables::version::Version;
/// use std::time::Duration;
///
/// let target = Target::new("192.0.2.1:161".parse().unwrap())
///     .version(Version::V2c)
///     .timeout(Duration::from_secs(2))
///     .retries(1);
/// assert!(target.version.supports_bulk());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Agent address.
    pub addr: SocketAddr,
    /// Protocol version. Governs GETBULK availability and end-of-table
    /// signaling.
    pub version: Version,
    /// Maximum outbound message size in bytes.
    pub max_message_size: usize,
    /// Per-request timeout. Honored by the `Session`, opaque to the engine.
    pub timeout: Duration,
    /// Retransmissions before a request is reported as timed out.
    pub retries: u32,
}

impl Target {
    /// Create a target with default policy (v2c, 1472-byte messages,
    /// 5 second timeout, no retries).
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            version: Version::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
        }
    }

    /// Set the protocol version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the maximum outbound message size in bytes.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retransmissions before timing out.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Request/response transport used by the table engine.
///
/// Implementations own encoding, transport, timeout and retry. The engine
/// issues multiple requests concurrently when pipelining is enabled, so
/// `send` takes `&self` and sessions are `Clone` (typically a cheap
/// `Arc` clone around shared socket state).
pub trait Session: Send + Sync + Clone + 'static {
    /// Send a request PDU and await the matching response PDU.
    ///
    /// Resolves at most once. Must match responses to requests by
    /// request-id; the engine allocates ids via
    /// [`next_request_id`](Self::next_request_id).
    fn send(&self, pdu: Pdu, target: Target) -> impl Future<Output = Result<Pdu>> + Send;

    /// Allocate a fresh request id, unique among this session's
    /// outstanding requests.
    fn next_request_id(&self) -> i32;
}

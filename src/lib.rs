// Allow large error types - the Error enum includes OIDs inline for debugging convenience.
// Boxing them would add complexity and allocations for a marginal size reduction.
#![allow(clippy::result_large_err)]

//! # snmp-tables
//!
//! Async SNMP table retrieval engine: reconstructs multi-column,
//! multi-row conceptual tables from pipelined GETBULK/GETNEXT
//! exchanges, with sparse/dense row policies and tolerance for
//! misbehaving agents.
//!
//! ## Features
//!
//! - Streaming row delivery in ascending index order
//! - Row reassembly across chunked, out-of-order responses
//! - Sparse tables, dense-drop, and dense-verify (GET double-check) modes
//! - Ordering-violation detection with configurable tolerance
//! - Opt-in request pipelining
//! - SNMPv1 GETNEXT fallback, row create/destroy via RowStatus
//! - Transport-agnostic: bring your own [`Session`](session::Session)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_tables::{oid, TableRequest, Target};
//! # use snmp_tables::session::MockSession;
//!
//! # async fn example(session: MockSession) -> Result<(), snmp_tables::Error> {
//! let target = Target::new("192.168.1.1:161".parse().unwrap());
//!
//! // ifIndex, ifDescr, ifSpeed from IF-MIB
//! let mut stream = TableRequest::new(session, target, vec![
//!     oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1),
//!     oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2),
//!     oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 5),
//! ])
//! .rows_per_chunk(50)
//! .pipeline(4)
//! .start()?;
//!
//! while let Some(row) = stream.next().await {
//!     let row = row?;
//!     println!("row {}: {:?}", row.index, row.values);
//! }
//! println!("status: {:?}", stream.status());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod oid;
pub mod pdu;
pub mod session;
pub mod table;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod wire;

// Re-exports for convenience
pub use error::{Error, ErrorStatus, OidErrorKind, Result};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use session::{Session, Target};
pub use table::{
    RowStatus, TableMode, TableRequest, TableResult, TableRow, TableStatus, TableStream,
};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;

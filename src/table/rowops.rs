//! Row creation and destruction via the RowStatus convention.
//!
//! Writable tables (RFC 2579) expose a RowStatus column; setting it to
//! `createAndGo`, `createAndWait` or `destroy` manages conceptual rows.
//! These are single-shot SET exchanges, independent of any retrieval
//! stream.

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::session::{Session, Target};
use crate::value::Value;
use crate::varbind::VarBind;
use tracing::debug;

/// RFC 2579 RowStatus values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RowStatus {
    /// Row exists and is in service.
    Active = 1,
    /// Row exists but is administratively down.
    NotInService = 2,
    /// Row exists but lacks required columns.
    NotReady = 3,
    /// Create the row and activate it in one step.
    CreateAndGo = 4,
    /// Create the row in notReady/notInService for later activation.
    CreateAndWait = 5,
    /// Delete the row.
    Destroy = 6,
}

impl RowStatus {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Active),
            2 => Some(Self::NotInService),
            3 => Some(Self::NotReady),
            4 => Some(Self::CreateAndGo),
            5 => Some(Self::CreateAndWait),
            6 => Some(Self::Destroy),
            _ => None,
        }
    }
}

impl From<RowStatus> for Value {
    fn from(status: RowStatus) -> Self {
        Value::Integer(status.as_i32())
    }
}

async fn set_row_status<S: Session>(
    session: &S,
    target: Target,
    status_column: &Oid,
    index: &Oid,
    status: RowStatus,
    extra: Vec<VarBind>,
) -> Result<()> {
    let mut varbinds = vec![VarBind::new(status_column.concat(index), status.into())];
    varbinds.extend(extra);

    let request_id = session.next_request_id();
    debug!(
        target: "snmp_tables::table",
        index = %index,
        ?status,
        request_id,
        "setting row status"
    );
    let response = session
        .send(Pdu::set_request(request_id, varbinds), target)
        .await?;

    if response.is_error() {
        let error_index = response.error_index.max(0) as u32;
        return Err(Error::Snmp {
            target: Some(target.addr),
            status: response.error_status_enum(),
            index: error_index,
            oid: error_index
                .checked_sub(1)
                .and_then(|i| response.varbinds.get(i as usize))
                .map(|vb| vb.oid.clone()),
        });
    }
    Ok(())
}

/// Create a row with `createAndGo`: the agent activates it immediately.
///
/// `extra` carries the other columns the row needs to be valid, as
/// instance OID / value pairs.
pub async fn create_row<S: Session>(
    session: &S,
    target: Target,
    status_column: &Oid,
    index: &Oid,
    extra: Vec<VarBind>,
) -> Result<()> {
    set_row_status(session, target, status_column, index, RowStatus::CreateAndGo, extra).await
}

/// Create a row with `createAndWait`: the row sits in notReady or
/// notInService until a later SET activates it.
pub async fn create_row_wait<S: Session>(
    session: &S,
    target: Target,
    status_column: &Oid,
    index: &Oid,
    extra: Vec<VarBind>,
) -> Result<()> {
    set_row_status(session, target, status_column, index, RowStatus::CreateAndWait, extra).await
}

/// Destroy a row.
pub async fn destroy_row<S: Session>(
    session: &S,
    target: Target,
    status_column: &Oid,
    index: &Oid,
) -> Result<()> {
    set_row_status(session, target, status_column, index, RowStatus::Destroy, Vec::new()).await
}

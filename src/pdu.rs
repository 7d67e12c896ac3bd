//! SNMP Protocol Data Units (PDUs).
//!
//! PDUs represent the different SNMP operations. This crate builds requests
//! and inspects responses; encoding to and from the wire belongs to the
//! [`Session`](crate::session::Session) implementation.

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::varbind::VarBind;
use crate::wire::{integer_content_len, length_encoded_len, tlv_len};

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    GetNextRequest = 0xA1,
    Response = 0xA2,
    SetRequest = 0xA3,
    GetBulkRequest = 0xA5,
    Report = 0xA8,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xA0 => Some(Self::GetRequest),
            0xA1 => Some(Self::GetNextRequest),
            0xA2 => Some(Self::Response),
            0xA3 => Some(Self::SetRequest),
            0xA5 => Some(Self::GetBulkRequest),
            0xA8 => Some(Self::Report),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// Generic PDU structure for request/response operations.
#[derive(Debug, Clone)]
pub struct Pdu {
    /// PDU type
    pub pdu_type: PduType,
    /// Request ID for correlating requests and responses
    pub request_id: i32,
    /// Error status (0 for requests, error code for responses)
    pub error_status: i32,
    /// Error index (1-based index of problematic varbind)
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Create a new GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type: PduType::GetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Create a new GETNEXT request PDU.
    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type: PduType::GetNextRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().map(|oid| VarBind::null(oid.clone())).collect(),
        }
    }

    /// Create a new SET request PDU.
    pub fn set_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::SetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create a GETBULK request PDU.
    ///
    /// Note: For GETBULK, error_status holds non_repeaters and error_index
    /// holds max_repetitions.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            request_id,
            error_status: non_repeaters,
            error_index: max_repetitions,
            varbinds,
        }
    }

    /// Create a Response PDU with the given varbinds.
    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create an error Response PDU.
    pub fn error_response(request_id: i32, status: ErrorStatus, error_index: i32) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: status.as_i32(),
            error_index,
            varbinds: Vec::new(),
        }
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Get the error status as an enum.
    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// GETBULK non-repeaters field (aliased onto error_status).
    pub fn non_repeaters(&self) -> i32 {
        self.error_status
    }

    /// GETBULK max-repetitions field (aliased onto error_index).
    pub fn max_repetitions(&self) -> i32 {
        self.error_index
    }

    /// Returns the exact BER-encoded size of this PDU in bytes.
    ///
    /// PDU is constructed-tag { request_id, error_status, error_index,
    /// SEQUENCE OF VarBind }. Computed arithmetically; used to budget chunks
    /// against the target's maximum message size before any bytes exist.
    pub fn encoded_size(&self) -> usize {
        let vb_content: usize = self.varbinds.iter().map(VarBind::encoded_size).sum();
        let vb_list = 1 + length_encoded_len(vb_content) + vb_content;

        let content = tlv_len(integer_content_len(self.request_id))
            + tlv_len(integer_content_len(self.error_status))
            + tlv_len(integer_content_len(self.error_index))
            + vb_list;

        1 + length_encoded_len(content) + content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    #[test]
    fn test_get_bulk_field_aliasing() {
        let pdu = Pdu::get_bulk(7, 0, 25, vec![VarBind::null(oid!(1, 3, 6, 1))]);
        assert_eq!(pdu.non_repeaters(), 0);
        assert_eq!(pdu.max_repetitions(), 25);
        assert_eq!(pdu.pdu_type, PduType::GetBulkRequest);
    }

    #[test]
    fn test_request_constructors_null_varbinds() {
        let oids = [oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2), oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 5)];
        let pdu = Pdu::get_next_request(1, &oids);
        assert_eq!(pdu.varbinds.len(), 2);
        assert!(pdu.varbinds.iter().all(|vb| vb.value == Value::Null));
    }

    #[test]
    fn test_error_response() {
        let pdu = Pdu::error_response(3, ErrorStatus::NoSuchName, 1);
        assert!(pdu.is_error());
        assert_eq!(pdu.error_status_enum(), ErrorStatus::NoSuchName);
    }

    #[test]
    fn test_encoded_size() {
        // Single null varbind on 1.3.6.1: varbind = 9 bytes (see varbind tests)
        // list = 1 + 1 + 9 = 11
        // request_id=1 -> 3, error_status=0 -> 3, error_index=0 -> 3
        // content = 3 + 3 + 3 + 11 = 20; pdu = 1 + 1 + 20 = 22
        let pdu = Pdu::get_next_request(1, &[oid!(1, 3, 6, 1)]);
        assert_eq!(pdu.encoded_size(), 22);
    }

    #[test]
    fn test_encoded_size_grows_with_varbinds() {
        let one = Pdu::get_next_request(1, &[oid!(1, 3, 6, 1)]);
        let two = Pdu::get_next_request(1, &[oid!(1, 3, 6, 1), oid!(1, 3, 6, 2)]);
        assert!(two.encoded_size() > one.encoded_size());
    }
}

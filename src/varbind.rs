//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value.

use crate::oid::Oid;
use crate::value::Value;
use crate::wire::{length_encoded_len, tlv_len};

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (for GET/GETNEXT/GETBULK requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Returns the exact encoded size of this VarBind in bytes.
    ///
    /// Computes the size arithmetically without allocating. Used to budget
    /// request chunks against the target's maximum message size.
    pub fn encoded_size(&self) -> usize {
        // VarBind is SEQUENCE { oid, value }
        let oid_len = tlv_len(self.oid.content_len());
        let value_len = self.value.ber_encoded_len();
        let content_len = oid_len + value_len;

        // SEQUENCE tag (1) + length encoding + content
        1 + length_encoded_len(content_len) + content_len
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

//! SNMP value types.
//!
//! The `Value` enum represents all SNMP data types including exceptions.

use crate::oid::Oid;
use crate::wire::{integer_content_len, tlv_len, unsigned32_content_len, unsigned64_content_len};
use bytes::Bytes;

/// SNMP value.
///
/// Represents all SNMP data types including SMIv2 types and exception values.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (ASN.1 primitive, signed 32-bit)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes).
    OctetString(Bytes),

    /// NULL
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, big-endian)
    IpAddress([u8; 4]),

    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),

    /// Gauge32 / Unsigned32 (unsigned 32-bit, non-wrapping)
    Gauge32(u32),

    /// TimeTicks (hundredths of seconds since epoch)
    TimeTicks(u32),

    /// Opaque (legacy, arbitrary bytes)
    Opaque(Bytes),

    /// Counter64 (unsigned 64-bit, wrapping). SNMPv2c/v3 only.
    Counter64(u64),

    /// noSuchObject exception - the OID exists in the MIB but has no value.
    ///
    /// Commonly returned when requesting a table column OID without an index.
    NoSuchObject,

    /// noSuchInstance exception - the specific instance does not exist.
    ///
    /// While the MIB object exists, the specific instance (index) requested
    /// does not. This is what a sparse table cell looks like in a GET
    /// response.
    NoSuchInstance,

    /// endOfMibView exception - end of the MIB has been reached.
    ///
    /// Returned during GETNEXT/GETBULK when there are no more OIDs
    /// lexicographically greater than the requested OID. The normal
    /// termination condition for column retrieval.
    EndOfMibView,

    /// Unknown/unrecognized value type (for forward compatibility)
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// Try to get as i32.
    ///
    /// Returns `Some(i32)` for [`Value::Integer`], `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32.
    ///
    /// Returns `Some(u32)` for [`Value::Counter32`], [`Value::Gauge32`],
    /// [`Value::TimeTicks`], or non-negative [`Value::Integer`].
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) if *v >= 0 => Some(*v as u32),
            _ => None,
        }
    }

    /// Try to get as u64.
    ///
    /// Returns `Some(u64)` for [`Value::Counter64`], any 32-bit unsigned
    /// type, or non-negative [`Value::Integer`].
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as u64),
            Value::Integer(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// Try to get as bytes.
    ///
    /// Returns `Some(&[u8])` for [`Value::OctetString`] or [`Value::Opaque`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) | Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as string (UTF-8).
    ///
    /// Returns `Some(&str)` if the value is an [`Value::OctetString`] or
    /// [`Value::Opaque`] containing valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Try to get as OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Try to get as IP address.
    pub fn as_ip(&self) -> Option<std::net::Ipv4Addr> {
        match self {
            Value::IpAddress(bytes) => Some(std::net::Ipv4Addr::from(*bytes)),
            _ => None,
        }
    }

    /// Check if this is an exception value.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Returns the total BER-encoded length (tag + length + content).
    ///
    /// Computed arithmetically; this crate carries no codec, but the
    /// planner budgets requests against the target's maximum message size.
    pub(crate) fn ber_encoded_len(&self) -> usize {
        match self {
            Value::Integer(v) => tlv_len(integer_content_len(*v)),
            Value::OctetString(data) => tlv_len(data.len()),
            Value::Null => 2, // tag + length(0)
            Value::ObjectIdentifier(oid) => tlv_len(oid.content_len()),
            Value::IpAddress(_) => 6, // tag + length(4) + 4 bytes
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
                tlv_len(unsigned32_content_len(*v))
            }
            Value::Opaque(data) => tlv_len(data.len()),
            Value::Counter64(v) => tlv_len(unsigned64_content_len(*v)),
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => 2,
            Value::Unknown { data, .. } => tlv_len(data.len()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => {
                // Display as string if it's valid UTF-8, hex otherwise
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "0x")?;
                    for b in data.iter() {
                        write!(f, "{:02x}", b)?;
                    }
                    Ok(())
                }
            }
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => {
                write!(f, "{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
            }
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                let days = secs / 86400;
                let hours = (secs % 86400) / 3600;
                let mins = (secs % 3600) / 60;
                let s = secs % 60;
                write!(f, "{} ({}d {:02}:{:02}:{:02})", v, days, hours, mins, s)
            }
            Value::Opaque(data) => {
                write!(f, "opaque(")?;
                for b in data.iter() {
                    write!(f, "{:02x}", b)?;
                }
                write!(f, ")")
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unknown { tag, data } => {
                write!(f, "unknown(tag=0x{:02x}, {} bytes)", tag, data.len())
            }
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::OctetString(b)
    }
}

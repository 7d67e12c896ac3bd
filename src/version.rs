//! SNMP protocol version.

/// SNMP protocol version.
///
/// Governs which operations are available: GETBULK and the v2 exception
/// values require [`Version::V2c`] or later. SNMPv1 targets are walked
/// with GETNEXT and signal end-of-table with a `noSuchName` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    /// SNMPv1 (RFC 1157). No GETBULK, no exception values.
    V1,
    /// SNMPv2c (RFC 3416). Community-based, GETBULK available.
    #[default]
    V2c,
    /// SNMPv3 (RFC 3412). GETBULK available; security handled by the session.
    V3,
}

impl Version {
    /// Whether GETBULK is available on this version.
    pub fn supports_bulk(&self) -> bool {
        !matches!(self, Version::V1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
            Version::V3 => write!(f, "SNMPv3"),
        }
    }
}

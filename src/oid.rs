//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for
//! common OIDs. Ordering is lexicographic over arcs, which matches the
//! MIB ordering agents walk tables in.

use crate::error::{Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Stored as a sequence of arc values (u32). Uses SmallVec to avoid
/// heap allocation for OIDs with 16 or fewer arcs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// Accepts any iterator of `u32` values.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_tables::oid::Oid;
    ///
    /// let oid = Oid::new(vec![1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1]);
    ///
    /// let oid = Oid::new(0..5);
    /// assert_eq!(oid.arcs(), &[0, 1, 2, 3, 4]);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.2.2.1.2").
    ///
    /// This method parses the string format but does **not** validate arc
    /// constraints per X.690 Section 8.19.4; call [`validate()`](Self::validate)
    /// afterwards if that matters.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        for part in s.split('.') {
            if part.is_empty() {
                continue;
            }

            let arc: u32 = part.parse().map_err(|_| {
                Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s.to_string())
            })?;

            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    ///
    /// Returns `true` if `self` begins with the same arcs as `other`.
    /// An OID always starts with itself, and any OID starts with an empty OID.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_tables::oid::Oid;
    ///
    /// let if_descr_1 = Oid::parse("1.3.6.1.2.1.2.2.1.2.1").unwrap();
    /// let if_descr = Oid::parse("1.3.6.1.2.1.2.2.1.2").unwrap();
    /// let if_speed = Oid::parse("1.3.6.1.2.1.2.2.1.5").unwrap();
    ///
    /// assert!(if_descr_1.starts_with(&if_descr));
    /// assert!(!if_descr_1.starts_with(&if_speed));
    /// assert!(if_descr_1.starts_with(&if_descr_1));
    /// assert!(if_descr_1.starts_with(&Oid::empty()));
    /// ```
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// Strip a prefix, returning the remaining suffix as a new OID.
    ///
    /// In table terms: stripping the column OID from an instance OID
    /// yields the row index. Returns `None` if `self` does not start
    /// with `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_tables::oid::Oid;
    ///
    /// let instance = Oid::parse("1.3.6.1.2.1.2.2.1.2.42").unwrap();
    /// let column = Oid::parse("1.3.6.1.2.1.2.2.1.2").unwrap();
    ///
    /// let index = instance.strip_prefix(&column).unwrap();
    /// assert_eq!(index.arcs(), &[42]);
    ///
    /// let other = Oid::parse("1.3.6.1.2.1.2.2.1.5").unwrap();
    /// assert!(instance.strip_prefix(&other).is_none());
    /// ```
    pub fn strip_prefix(&self, prefix: &Oid) -> Option<Oid> {
        if self.starts_with(prefix) {
            Some(Oid::from_slice(&self.arcs[prefix.arcs.len()..]))
        } else {
            None
        }
    }

    /// Concatenate two OIDs (e.g., column OID + row index).
    pub fn concat(&self, suffix: &Oid) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(&suffix.arcs);
        Oid { arcs }
    }

    /// Get the parent OID (all arcs except the last).
    ///
    /// Returns `None` if the OID is empty.
    pub fn parent(&self) -> Option<Oid> {
        if self.arcs.is_empty() {
            None
        } else {
            Some(Oid {
                arcs: SmallVec::from_slice(&self.arcs[..self.arcs.len() - 1]),
            })
        }
    }

    /// Create a child OID by appending an arc.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_tables::oid::Oid;
    ///
    /// let if_entry = Oid::parse("1.3.6.1.2.1.2.2.1").unwrap();
    /// let if_descr = if_entry.child(2);
    /// assert_eq!(if_descr.to_string(), "1.3.6.1.2.1.2.2.1.2");
    /// ```
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Validate OID arcs per X.690 Section 8.19.4.
    ///
    /// - arc1 must be 0, 1, or 2
    /// - arc2 must be <= 39 when arc1 is 0 or 1
    /// - arc2 can be any value when arc1 is 2
    pub fn validate(&self) -> Result<()> {
        if self.arcs.is_empty() {
            return Ok(());
        }

        let arc1 = self.arcs[0];

        if arc1 > 2 {
            return Err(Error::invalid_oid(OidErrorKind::InvalidFirstArc(arc1)));
        }

        if self.arcs.len() >= 2 {
            let arc2 = self.arcs[1];
            if arc1 < 2 && arc2 >= 40 {
                return Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                    first: arc1,
                    second: arc2,
                }));
            }
        }

        Ok(())
    }

    /// Validate that the OID doesn't exceed the maximum arc count.
    pub fn validate_length(&self) -> Result<()> {
        if self.arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                count: self.arcs.len(),
                max: MAX_OID_LEN,
            }));
        }
        Ok(())
    }

    /// Validate both arc constraints and length.
    pub fn validate_all(&self) -> Result<()> {
        self.validate()?;
        self.validate_length()
    }

    /// Size of this OID's BER content octets, computed arithmetically.
    ///
    /// OID encoding (X.690 Section 8.19): first two arcs combine into one
    /// subidentifier (arc1 * 40 + arc2), every subidentifier is base-128
    /// variable length. Used for request size budgeting; no encoder here.
    pub fn content_len(&self) -> usize {
        if self.arcs.is_empty() {
            return 0;
        }

        // X.690 allows arc2 up to u32::MAX when arc1 is 2, so the combined
        // subidentifier can exceed u32
        let first_subid = if self.arcs.len() >= 2 {
            u64::from(self.arcs[0]) * 40 + u64::from(self.arcs[1])
        } else {
            u64::from(self.arcs[0]) * 40
        };

        let mut len = subidentifier_len(first_subid);
        if self.arcs.len() > 2 {
            for &arc in &self.arcs[2..] {
                len += subidentifier_len(u64::from(arc));
            }
        }
        len
    }
}

/// Number of base-128 bytes a subidentifier occupies.
#[inline]
fn subidentifier_len(value: u64) -> usize {
    let bits = (64 - value.leading_zeros() as usize).max(1);
    bits.div_ceil(7)
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID at compile time.
///
/// This is the preferred way to create OID constants since it's concise
/// and avoids parsing overhead.
///
/// # Examples
///
/// ```
/// use snmp_tables::oid;
///
/// let if_descr = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
/// assert_eq!(if_descr.to_string(), "1.3.6.1.2.1.2.2.1.2");
///
/// // Trailing commas are allowed
/// let if_index = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1,);
/// assert!(if_descr.starts_with(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)));
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    }

    #[test]
    fn test_display() {
        let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    }

    #[test]
    fn test_starts_with() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        let prefix = Oid::parse("1.3.6.1").unwrap();
        assert!(oid.starts_with(&prefix));
        assert!(!prefix.starts_with(&oid));
    }

    #[test]
    fn test_strip_prefix() {
        let column = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
        let instance = column.concat(&oid!(10, 0, 0, 1));
        assert_eq!(instance.strip_prefix(&column).unwrap(), oid!(10, 0, 0, 1));
        assert!(instance.strip_prefix(&oid!(1, 3, 6, 9)).is_none());
        // An OID stripped of itself is the empty index
        assert!(column.strip_prefix(&column).unwrap().is_empty());
    }

    #[test]
    fn test_concat() {
        let a = oid!(1, 3, 6);
        let b = oid!(1, 2, 1);
        assert_eq!(a.concat(&b), oid!(1, 3, 6, 1, 2, 1));
        assert_eq!(a.concat(&Oid::empty()), a);
    }

    #[test]
    fn test_macro() {
        let oid = oid!(1, 3, 6, 1);
        assert_eq!(oid.arcs(), &[1, 3, 6, 1]);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        // Prefix sorts before extension; arc-wise comparison otherwise
        assert!(oid!(1, 3, 6) < oid!(1, 3, 6, 1));
        assert!(oid!(1, 3, 6, 1) < oid!(1, 3, 6, 2));
        assert!(oid!(1, 3, 6, 2) < oid!(1, 3, 7));
        assert!(Oid::empty() < oid!(0));
    }

    #[test]
    fn test_validate_arc1_must_be_0_1_or_2() {
        let oid = Oid::from_slice(&[3, 0]);
        assert!(oid.validate().is_err(), "arc1=3 should be invalid");
    }

    #[test]
    fn test_validate_arc2_limits() {
        assert!(Oid::from_slice(&[0, 40]).validate().is_err());
        assert!(Oid::from_slice(&[0, 39]).validate().is_ok());
        assert!(Oid::from_slice(&[1, 40]).validate().is_err());
        assert!(Oid::from_slice(&[2, 999]).validate().is_ok());
    }

    #[test]
    fn test_validate_length() {
        let arcs: Vec<u32> = (0..MAX_OID_LEN as u32).collect();
        assert!(Oid::new(arcs).validate_length().is_ok());

        let arcs: Vec<u32> = (0..(MAX_OID_LEN + 1) as u32).collect();
        assert!(Oid::new(arcs).validate_length().is_err());
    }

    #[test]
    fn test_content_len() {
        // 1.3.6.1 encodes as (1*40+3)=43, 6, 1 = 3 bytes
        assert_eq!(oid!(1, 3, 6, 1).content_len(), 3);
        // 2.999.3: first subid = 1079, two bytes, plus one for arc 3
        assert_eq!(oid!(2, 999, 3).content_len(), 3);
        // Subidentifier boundaries
        assert_eq!(oid!(1, 3, 127).content_len(), 2);
        assert_eq!(oid!(1, 3, 128).content_len(), 3);
        assert_eq!(oid!(1, 3, 0x3FFF).content_len(), 3);
        assert_eq!(oid!(1, 3, 0x4000).content_len(), 4);
        assert_eq!(oid!(1, 3, u32::MAX).content_len(), 6);
        assert_eq!(Oid::empty().content_len(), 0);
    }

    #[test]
    fn test_content_len_large_second_arc() {
        // arc1=2 permits arbitrarily large arc2; the combined first
        // subidentifier (2*40 + arc2) then exceeds u32
        let oid = Oid::from_slice(&[2, u32::MAX, 1]);
        assert!(oid.validate_all().is_ok());
        // 4294967375 needs 33 bits -> 5 base-128 bytes, plus 1 for the
        // trailing arc
        assert_eq!(oid.content_len(), 6);
    }

    #[test]
    fn test_oid_fromstr() {
        let oid: Oid = "1.3.6.1.2.1.1.1.0".parse().unwrap();
        assert_eq!(oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));

        let empty: Oid = "".parse().unwrap();
        assert!(empty.is_empty());

        let original = oid!(1, 3, 6, 1, 4, 1, 9, 9, 42);
        let parsed: Oid = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_oid_fromstr_invalid() {
        assert!("1.3.abc.1".parse::<Oid>().is_err());
        assert!("1.3.-6.1".parse::<Oid>().is_err());
    }
}

//! Table fixtures shaped like IF-MIB's ifTable.

use bytes::Bytes;
use snmp_tables::{oid, Oid, Value};
use std::collections::BTreeMap;

pub fn if_index() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1)
}

pub fn if_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

pub fn if_speed() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 5)
}

/// Dense interface table with `n` rows indexed 1..=n.
pub fn interface_table(n: u32) -> BTreeMap<Oid, Value> {
    let mut data = BTreeMap::new();
    for i in 1..=n {
        data.insert(if_index().child(i), Value::Integer(i as i32));
        data.insert(
            if_descr().child(i),
            Value::OctetString(Bytes::from(format!("eth{}", i - 1))),
        );
        data.insert(if_speed().child(i), Value::Gauge32(1_000_000_000));
    }
    data
}

/// Like [`interface_table`] but rows whose index is in `holes` lack the
/// ifSpeed cell.
pub fn sparse_interface_table(n: u32, holes: &[u32]) -> BTreeMap<Oid, Value> {
    let mut data = interface_table(n);
    for &i in holes {
        data.remove(&if_speed().child(i));
    }
    data
}

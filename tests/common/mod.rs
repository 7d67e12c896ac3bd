//! Shared test infrastructure for snmp-tables.
//!
//! Provides SimAgent (an in-process agent behind the Session trait) and
//! MIB-shaped table fixtures.

// Allow dead code since not all test files use all utilities
#![allow(dead_code)]

pub mod agent;
pub mod fixtures;

pub use agent::SimAgent;
pub use fixtures::{if_descr, if_index, if_speed, interface_table, sparse_interface_table};

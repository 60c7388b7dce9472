//! Tool implementations, one file per group

pub mod clause;
pub mod compliance;
pub mod contract;
pub mod document;
pub mod log;
pub mod risk;

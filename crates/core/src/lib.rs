//! Domain core for the duty roster service: entity models, the conflict
//! validator, the rotation planner, the BS/AD calendar converter, and the
//! pure import-reconciliation pipeline. This crate performs no I/O; the
//! `rosterd-db` crate feeds it snapshots and persists its decisions.

pub mod calendar;
pub mod conflict;
pub mod errors;
pub mod import;
pub mod models;
pub mod permissions;
pub mod rotation;

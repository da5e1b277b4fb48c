//! Kurier clinical-record exchange server.
//!
//! Kurier stores clinical records and moves them between healthcare
//! organizations. Outbound, a record is assembled into a self-contained
//! transaction document and dispatched to an external registry; inbound,
//! submitted documents are validated, tracked through a communication
//! status state machine and, on explicit clinician action, ingested as new
//! local records.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use error::{Error, Result};

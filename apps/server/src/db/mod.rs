//! Persistence layer.
//!
//! Services depend on the store traits only. `memory` backs tests and
//! single-process development; `postgres` is the production backend.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::{InMemoryCommunicationStore, InMemoryPractitionerDirectory, InMemoryRecordStore};
pub use postgres::{PostgresCommunicationStore, PostgresPractitionerDirectory, PostgresRecordStore};
pub use traits::{CommunicationStore, PractitionerDirectory, RecordStore};

//! Domain models.

pub mod communication;
pub mod practitioner;
pub mod record;

pub use communication::{
    Communication, CommunicationDirection, CommunicationStatus, NewCommunication,
};
pub use practitioner::Practitioner;
pub use record::{ClinicalRecord, NewClinicalRecord};

//! Business logic layer
//!
//! Services orchestrate operations by coordinating the stores, the bundle
//! library and the registry client, and own every rule the HTTP layer
//! must not.

pub mod communication;
pub mod dispatch;
pub mod exchange;
pub mod records;

pub use communication::{
    CommunicationPage, CommunicationService, PageInfo, ReceiveOutcome, Submission,
};
pub use dispatch::{DispatchClient, RegistryResponse};
pub use exchange::{ExchangeService, SendOutcome};
pub use records::RecordService;

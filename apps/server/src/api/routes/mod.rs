pub mod communications;
pub mod records;

pub use communications::communication_routes;
pub use records::record_routes;

pub mod communications;
pub mod records;

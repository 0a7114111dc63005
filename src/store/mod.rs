//! Persistence layer: JSON-file storage for user records.

pub mod records;

pub use records::{UserRecord, UserRecordStore};

pub mod memory;
pub mod models;
pub mod source;

pub use memory::InMemoryRecordSource;
pub use models::{AssignmentRecord, RecordSet, RecordValidationError, ReferenceRecord};
pub use source::{MySqlRecordSource, QueryText, RecordSource, SourceError};

// Domain Layer - Pure maintenance policy types

pub mod error;
pub mod mode;
pub mod queue;
pub mod settings;
pub mod table;
pub mod ttl;

// Re-exports
pub use error::DomainError;
pub use mode::{Mode, TableOverrides};
pub use queue::TableQueue;
pub use settings::Settings;
pub use table::{TableRef, TableTask, DEFAULT_ATTEMPT_BUDGET};
pub use ttl::TtlTable;

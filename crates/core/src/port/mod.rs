// Port Layer - Interfaces for external collaborators

pub mod catalog;
pub mod expiry_store;
pub mod lock;
pub mod maintainer;
pub mod settings_store;
pub mod time_provider;

// Re-exports
pub use catalog::{AgedTable, Catalog};
pub use expiry_store::ExpiryStore;
pub use lock::{HeldLock, LockCoordinator};
pub use maintainer::TableMaintainer;
pub use settings_store::SettingsStore;
pub use time_provider::TimeProvider;

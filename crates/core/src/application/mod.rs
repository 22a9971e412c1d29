// Application Layer - Maintenance use cases

pub mod mode_selector;
pub mod queue_builder;
pub mod scheduler;
pub mod settings_loader;
pub mod sweeper;
pub mod worker;
pub mod wraparound;

// Re-exports
pub use mode_selector::{aggressive_window_active, select_modes};
pub use queue_builder::QueueBuilder;
pub use scheduler::{CyclePlan, CycleReport, ModeOutcome, VacuumScheduler};
pub use settings_loader::SettingsLoader;
pub use sweeper::{ExpirySweeper, SweepReport};
pub use worker::{shutdown_channel, DrainReport, ShutdownSender, ShutdownToken, WorkerPool};
pub use wraparound::{WraparoundGuard, WraparoundStatus};

// pgkeeper Core - Vacuum policy, ports and worker pool
// NO database driver dependencies (hexagonal: adapters live in infra-postgres)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

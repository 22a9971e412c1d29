// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid value for setting {key}: {value:?} ({reason})")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Hour out of range: {0}")]
    InvalidHour(u32),
}

pub type Result<T> = std::result::Result<T, DomainError>;

//! Logging setup
//!
//! `PGKEEPER_LOG_FORMAT=json` for production, pretty output otherwise.
//! Levels come from `RUST_LOG`, defaulting to `pgkeeper=info`.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "pgkeeper=info,pgkeeper_core=info,pgkeeper_infra_postgres=info";

pub fn init() -> Result<()> {
    let log_format = std::env::var("PGKEEPER_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

//! pgkeeper - Main Entry Point
//! Vacuum scheduler and row-expiry sweeper for one PostgreSQL cluster

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use pgkeeper_core::application::worker::constants::DEFAULT_CYCLE_INTERVAL;
use pgkeeper_core::application::{
    shutdown_channel, ExpirySweeper, SettingsLoader, ShutdownToken, VacuumScheduler,
};
use pgkeeper_core::domain::Settings;
use pgkeeper_core::port::time_provider::SystemTimeProvider;
use pgkeeper_infra_postgres::{
    run_migrations, PgAdvisoryLock, PgCatalog, PgConnector, PgExpiryStore, PgSettingsStore,
    PgTableMaintainer, DEFAULT_EXCLUDED_DATABASES,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "pgkeeper", version, about = "PostgreSQL vacuum scheduler")]
struct Cli {
    /// Connection URL; its database holds the settings and TTL tables
    #[arg(long, env = "PGKEEPER_DATABASE_URL")]
    database_url: String,

    /// Databases never scheduled for maintenance
    #[arg(
        long,
        env = "PGKEEPER_EXCLUDED_DATABASES",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXCLUDED_DATABASES.iter().map(|d| d.to_string())
    )]
    excluded_databases: Vec<String>,

    /// Seconds between two vacuum cycles (and two sweeps) in `run`
    #[arg(
        long,
        env = "PGKEEPER_INTERVAL_SECS",
        default_value_t = DEFAULT_CYCLE_INTERVAL.as_secs()
    )]
    interval_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run vacuum cycles and sweeps until Ctrl+C
    Run,
    /// Run one vacuum cycle
    Vacuum,
    /// Run one row-expiry sweep
    Sweep,
    /// Print the modes a cycle would run, without touching any table
    Plan {
        /// UTC hour to plan for (defaults to now)
        #[arg(long)]
        hour: Option<u32>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Everything a command needs, wired once
struct Services {
    connector: PgConnector,
    loader: SettingsLoader,
    scheduler: VacuumScheduler,
    sweeper: ExpirySweeper,
}

impl Services {
    fn wire(cli: &Cli) -> Result<Self> {
        let connector =
            PgConnector::from_url(&cli.database_url).context("Invalid connection settings")?;

        let catalog = Arc::new(PgCatalog::new(
            connector.clone(),
            cli.excluded_databases.clone(),
        ));
        let scheduler = VacuumScheduler::new(
            catalog,
            Arc::new(PgAdvisoryLock::new(connector.clone())),
            Arc::new(PgTableMaintainer::new(connector.clone())),
            Arc::new(SystemTimeProvider),
        );

        Ok(Self {
            loader: SettingsLoader::new(Arc::new(PgSettingsStore::new(connector.clone()))),
            sweeper: ExpirySweeper::new(Arc::new(PgExpiryStore::new(connector.clone()))),
            scheduler,
            connector,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let cli = Cli::parse();
    info!("pgkeeper v{} starting...", VERSION);

    let services = Arc::new(Services::wire(&cli)?);
    info!(
        maintenance_database = %services.connector.maintenance_database(),
        excluded = ?cli.excluded_databases,
        "Connector ready"
    );

    match cli.command {
        Command::Run => run(services, Duration::from_secs(cli.interval_secs.max(1))).await,
        Command::Vacuum => {
            let settings = services.loader.refresh(&Settings::default()).await;
            let report = services
                .scheduler
                .run_cycle(&settings)
                .await
                .context("Vacuum cycle failed")?;
            info!(modes = report.modes.len(), skipped = report.skipped(), "Done");
            Ok(())
        }
        Command::Sweep => {
            let settings = services.loader.refresh(&Settings::default()).await;
            let report = services
                .sweeper
                .run(&settings)
                .await
                .context("Expiry sweep failed")?;
            info!(rows_deleted = report.rows_deleted, failed = report.failed, "Done");
            Ok(())
        }
        Command::Plan { hour, json } => {
            let settings = services.loader.refresh(&Settings::default()).await;
            let plan = services
                .scheduler
                .plan(&settings, hour)
                .await
                .context("Planning failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("hour:              {}", plan.hour);
                println!("aggressive window: {}", plan.aggressive_window);
                println!("max database age:  {}", plan.max_database_age);
                for mode in &plan.modes {
                    println!("  {}", mode);
                }
            }
            Ok(())
        }
    }
}

/// Long-running mode: bootstrap, then one loop per trigger until Ctrl+C
async fn run(services: Arc<Services>, interval: Duration) -> Result<()> {
    run_migrations(&services.connector)
        .await
        .context("Schema bootstrap failed")?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let vacuum_handle = tokio::spawn(vacuum_loop(
        Arc::clone(&services),
        interval,
        shutdown_rx.clone(),
    ));
    let sweep_handle = tokio::spawn(sweep_loop(Arc::clone(&services), interval, shutdown_rx));

    info!(interval_secs = interval.as_secs(), "Scheduler ready");
    info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Waiting for running cycles to finish...");

    shutdown_tx.shutdown();
    let (vacuum, sweep) = tokio::join!(vacuum_handle, sweep_handle);
    vacuum.context("Vacuum loop panicked")?;
    sweep.context("Sweep loop panicked")?;

    info!("Shutdown complete.");
    Ok(())
}

async fn vacuum_loop(services: Arc<Services>, interval: Duration, mut shutdown: ShutdownToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut settings = Settings::default();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.wait() => break,
        }
        if shutdown.is_shutdown() {
            break;
        }

        settings = services.loader.refresh(&settings).await;
        if let Err(e) = services.scheduler.run_cycle(&settings).await {
            error!(error = %e, "Vacuum cycle aborted");
        }
    }
    info!("Vacuum loop stopped");
}

async fn sweep_loop(services: Arc<Services>, interval: Duration, mut shutdown: ShutdownToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut settings = Settings::default();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.wait() => break,
        }
        if shutdown.is_shutdown() {
            break;
        }

        settings = services.loader.refresh(&settings).await;
        match services.sweeper.run(&settings).await {
            Ok(report) => info!(
                tables = report.tables,
                failed = report.failed,
                rows_deleted = report.rows_deleted,
                "Sweep finished"
            ),
            Err(e) => error!(error = %e, "Sweep aborted"),
        }
    }
    info!("Sweep loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from([
            "pgkeeper",
            "--database-url",
            "postgres://localhost/postgres",
            "vacuum",
        ])
        .unwrap();
        assert_eq!(cli.interval_secs, 300);
        assert_eq!(cli.excluded_databases, DEFAULT_EXCLUDED_DATABASES);
        assert!(matches!(cli.command, Command::Vacuum));
    }

    #[test]
    fn test_cli_excluded_list_and_plan_hour() {
        let cli = Cli::try_parse_from([
            "pgkeeper",
            "--database-url",
            "postgres://localhost/postgres",
            "--excluded-databases",
            "azure_maintenance,scratch",
            "plan",
            "--hour",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.excluded_databases, vec!["azure_maintenance", "scratch"]);
        match cli.command {
            Command::Plan { hour, json } => {
                assert_eq!(hour, Some(3));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

mod cli;

use crate::cli::CLI;
use anyhow::Context;
use clap::Parser;
use ephemera_reaper::{wait_for_signal, Reaper, Shutdown};
use ephemera_storage::{ConnectionPool, SqliteRepository};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    ephemera_telemetry::init(&config.telemetry())?;

    let pool = ConnectionPool::connect(&config.pool())
        .await
        .context("failed to open connection pool")?;
    let reaper = Reaper::new(SqliteRepository::new(pool.clone()), config.reaper());

    if config.once {
        let outcome = reaper.run_once().await;
        pool.close().await;
        let deleted = outcome.context("reaper pass failed")?;
        info!(deleted, "single reaper pass complete");
        return Ok(());
    }

    let (shutdown, receiver) = Shutdown::new();
    let task = tokio::spawn(async move { reaper.run(receiver).await });

    wait_for_signal().await;
    shutdown.trigger();

    let report = task.await.context("reaper task panicked")?;
    pool.close().await;
    info!(
        cycles = report.cycles,
        deleted = report.deleted,
        failures = report.failures,
        "reaper exited"
    );
    Ok(())
}

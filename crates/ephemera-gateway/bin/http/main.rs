mod cli;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ephemera_core::Repository;
use ephemera_gateway::sweeper::sweep_rate_limits;
use ephemera_gateway::{App, AppState};
use ephemera_generator::RandomGenerator;
use ephemera_ratelimit::RateLimiters;
use ephemera_reaper::{wait_for_signal, Reaper, Shutdown};
use ephemera_service::PasteService;
use ephemera_storage::{ConnectionPool, InMemoryRepository, SqliteRepository};
use tracing::info;

use crate::cli::{StorageBackendArg, CLI};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    ephemera_telemetry::init(&config.telemetry())?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting ephemera gateway"
    );

    match config.storage {
        StorageBackendArg::InMemory => run_server(&config, InMemoryRepository::new()).await,
        StorageBackendArg::Sqlite => {
            let pool = ConnectionPool::connect(&config.pool())
                .await
                .context("failed to open connection pool")?;
            let result = run_server(&config, SqliteRepository::new(pool.clone())).await;
            pool.close().await;
            info!("connection pool closed");
            result
        }
    }
}

async fn run_server<R: Repository>(config: &CLI, repository: R) -> anyhow::Result<()> {
    let repository = Arc::new(repository);
    let generator = RandomGenerator::new(config.id_length)?;
    let service = PasteService::with_config(repository.clone(), generator, config.service()?);
    let limiters = Arc::new(RateLimiters::new(config.create_limit(), config.view_limit()));

    let state = AppState::builder()
        .pastebin(Arc::new(service))
        .limiters(limiters.clone())
        .base_url(config.base_url.clone())
        .body_limit(config.body_limit())
        .trust_forwarded_for(config.trust_forwarded_for)
        .build();

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    // background work starts only once the listener is up
    let (shutdown, receiver) = Shutdown::new();

    let reaper = config.reaper.then(|| {
        let reaper = Reaper::new(repository.clone(), config.reaper());
        let receiver = receiver.clone();
        tokio::spawn(async move { reaper.run(receiver).await })
    });
    let sweeper = tokio::spawn(sweep_rate_limits(
        limiters,
        config.sweep_interval(),
        receiver,
    ));

    let signal = {
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                _ = wait_for_signal() => {}
                _ = shutdown.triggered() => {}
            }
        }
    };
    let served = axum::serve(
        listener,
        App::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal)
    .await;

    // requests have drained; stop background work before the pool closes
    shutdown.trigger();
    if let Some(reaper) = reaper {
        let report = reaper.await.context("reaper task panicked")?;
        info!(
            cycles = report.cycles,
            deleted = report.deleted,
            failures = report.failures,
            "reaper finished"
        );
    }
    sweeper.await.context("rate limiter sweep panicked")?;

    served.context("http server failed")
}

use ephemera_core::{Repository, StorageError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ReaperConfig {
    /// Pause between cycles.
    #[builder(default = Duration::from_secs(60))]
    pub interval: Duration,
    /// Log store statistics every this many cycles; zero disables it.
    #[builder(default = 10)]
    pub stats_every: u64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    Idle,
    Running,
    Sleeping,
    Stopping,
    Stopped,
}

/// Totals for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaperReport {
    pub cycles: u64,
    pub deleted: u64,
    pub failures: u64,
}

/// Periodically deletes expired pastes.
///
/// A failed cycle is logged and counted; the loop keeps going. Shutdown is
/// only observed between cycles, so a delete that has started always runs to
/// commit or rollback.
#[derive(Debug)]
pub struct Reaper<R> {
    repository: Arc<R>,
    config: ReaperConfig,
    state: watch::Sender<ReaperState>,
}

impl<R: Repository> Reaper<R> {
    pub fn new(repository: R, config: ReaperConfig) -> Self {
        let (state, _) = watch::channel(ReaperState::Idle);
        Self {
            repository: Arc::new(repository),
            config,
            state,
        }
    }

    pub fn state(&self) -> ReaperState {
        *self.state.borrow()
    }

    /// Follows state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ReaperState> {
        self.state.subscribe()
    }

    /// Runs one deletion pass and returns the number of pastes removed.
    pub async fn run_once(&self) -> Result<u64, StorageError> {
        let deleted = self.repository.delete_expired().await?;
        if deleted > 0 {
            info!(deleted, "removed expired pastes");
        } else {
            debug!("no expired pastes");
        }
        Ok(deleted)
    }

    /// Loops until `shutdown` turns `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> ReaperReport {
        let mut report = ReaperReport::default();
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            stats_every = self.config.stats_every,
            "reaper started"
        );
        self.log_stats().await;

        loop {
            let stop = *shutdown.borrow();
            if stop {
                break;
            }

            self.state.send_replace(ReaperState::Running);
            report.cycles += 1;
            match self.run_once().await {
                Ok(deleted) => report.deleted += deleted,
                Err(e) => {
                    report.failures += 1;
                    error!(error = %e, cycle = report.cycles, "reaper cycle failed");
                }
            }

            if self.config.stats_every > 0 && report.cycles % self.config.stats_every == 0 {
                self.log_stats().await;
            }

            self.state.send_replace(ReaperState::Sleeping);
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = stop_requested(&mut shutdown) => break,
            }
        }

        self.state.send_replace(ReaperState::Stopping);
        info!(
            cycles = report.cycles,
            deleted = report.deleted,
            failures = report.failures,
            "reaper stopped"
        );
        self.state.send_replace(ReaperState::Stopped);
        report
    }

    async fn log_stats(&self) {
        match self.repository.stats().await {
            Ok(stats) => info!(
                total = stats.total,
                active = stats.active,
                expired = stats.expired,
                "paste statistics"
            ),
            Err(e) => warn!(error = %e, "failed to read paste statistics"),
        }
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // a dropped sender can never signal again, so treat it as a stop
    let _ = shutdown.wait_for(|stop| *stop).await;
}

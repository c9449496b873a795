use crate::config::Config;
use crate::error::{IndexerError, IndexerResult};
use crate::services::poller::Poller;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

#[derive(Debug, PartialEq, Eq)]
pub enum Tick {
    Completed,
    /// The previous sync was still running.
    Skipped,
}

/// Runs one sync unless another is in flight, bounded by `timeout`.
pub async fn run_tick(
    poller: &Poller,
    in_flight: &Mutex<()>,
    timeout: Duration,
) -> IndexerResult<Tick> {
    let Ok(_guard) = in_flight.try_lock() else {
        return Ok(Tick::Skipped);
    };

    match tokio::time::timeout(timeout, poller.sync()).await {
        Ok(result) => result.map(|_| Tick::Completed),
        Err(_) => Err(IndexerError::Timeout(timeout)),
    }
}

pub struct SyncScheduler {
    scheduler: JobScheduler,
}

impl SyncScheduler {
    pub async fn new(poller: Arc<Poller>, config: &Config) -> IndexerResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| IndexerError::Scheduler(e.to_string()))?;

        let in_flight = Arc::new(Mutex::new(()));
        let timeout = config.sync_timeout;

        let job = Job::new_async(config.sync_cron.as_str(), move |_uuid, _lock| {
            let poller = poller.clone();
            let in_flight = in_flight.clone();
            Box::pin(async move {
                info!("Starting scheduled delegation sync");
                match run_tick(&poller, &in_flight, timeout).await {
                    Ok(Tick::Completed) => info!("Scheduled sync completed"),
                    Ok(Tick::Skipped) => warn!("Previous sync still running, skipping this tick"),
                    Err(e) => error!("Scheduled sync failed: {}", e),
                }
            })
        })
        .map_err(|e| IndexerError::Scheduler(e.to_string()))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| IndexerError::Scheduler(e.to_string()))?;

        Ok(Self { scheduler })
    }

    pub async fn start(&self) -> IndexerResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| IndexerError::Scheduler(e.to_string()))?;
        info!("Delegation sync scheduler started");
        Ok(())
    }

    pub async fn stop(&mut self) -> IndexerResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| IndexerError::Scheduler(e.to_string()))?;
        info!("Delegation sync scheduler stopped");
        Ok(())
    }
}

use crate::error::IndexerResult;
use crate::repositories::DelegationStore;
use crate::services::tzkt::DelegationFetcher;
use crate::utils::helpers::start_of_day;
use chrono::{DateTime, Duration, Utc};
use log::info;
use std::sync::Arc;

/// Resume window overlap. TzKT timestamps have whole-second resolution and the
/// fetch bound is exclusive, so without it records sharing the watermark's second
/// that were not stored would never be fetched again.
const WATERMARK_OVERLAP_SECS: i64 = 1;

/// Pulls delegations newer than the stored watermark and writes them back.
pub struct Poller {
    store: Arc<dyn DelegationStore>,
    fetcher: Arc<dyn DelegationFetcher>,
}

impl Poller {
    pub fn new(store: Arc<dyn DelegationStore>, fetcher: Arc<dyn DelegationFetcher>) -> Self {
        Self { store, fetcher }
    }

    pub async fn sync(&self) -> IndexerResult<()> {
        self.sync_at(Utc::now()).await
    }

    /// One ingestion attempt. Errors are returned as-is; the next scheduled
    /// run is the retry.
    pub async fn sync_at(&self, now: DateTime<Utc>) -> IndexerResult<()> {
        let since = match self.store.watermark().await? {
            Some(watermark) => watermark - Duration::seconds(WATERMARK_OVERLAP_SECS),
            None => {
                let since = start_of_day(now);
                info!("No stored delegations, starting from {}", since);
                since
            }
        };

        info!("Fetching delegations after {}", since);
        let mut delegations = self.fetcher.fetch(since).await?;

        if delegations.is_empty() {
            info!("No new delegations to save");
            return Ok(());
        }

        // Oldest first: a store that fails partway keeps only records older than
        // the ones it missed, so the watermark cannot pass an unstored record.
        delegations.sort_by_key(|d| (d.timestamp, d.id));

        self.store.insert_batch(&delegations).await?;
        info!("Saved {} delegations", delegations.len());
        Ok(())
    }
}

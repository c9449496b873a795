use super::{DelegationReader, DelegationStore};
use crate::error::{IndexerError, IndexerResult};
use crate::models::{Delegation, DelegationQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-process store with the same read and dedup contract as the MongoDB
/// repository. Writes are record by record, so an injected failure leaves the
/// earlier records of the batch stored.
#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<BTreeMap<i64, Delegation>>,
    fail_at: Mutex<Option<usize>>,
    pub insert_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
}

impl MemoryRepository {
    pub fn with(delegations: Vec<Delegation>) -> Self {
        let repository = Self::default();
        {
            let mut rows = repository.rows.lock().unwrap();
            for delegation in delegations {
                rows.insert(delegation.id, delegation);
            }
        }
        repository
    }

    /// Fails the next batch when it reaches record `index`; later batches succeed.
    pub fn fail_once_at(&self, index: usize) {
        *self.fail_at.lock().unwrap() = Some(index);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<i64> {
        self.rows.lock().unwrap().keys().copied().collect()
    }
}

#[async_trait]
impl DelegationStore for MemoryRepository {
    async fn insert_batch(&self, delegations: &[Delegation]) -> IndexerResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let fail_at = self.fail_at.lock().unwrap().take();
        let mut rows = self.rows.lock().unwrap();
        for (index, delegation) in delegations.iter().enumerate() {
            if fail_at == Some(index) {
                let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "write rejected");
                return Err(IndexerError::Database(io.into()));
            }
            rows.entry(delegation.id).or_insert_with(|| delegation.clone());
        }
        Ok(())
    }

    async fn watermark(&self) -> IndexerResult<Option<DateTime<Utc>>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().map(|d| d.timestamp).max())
    }
}

#[async_trait]
impl DelegationReader for MemoryRepository {
    async fn query(&self, query: &DelegationQuery) -> IndexerResult<Vec<Delegation>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let range = query.time_range();
        let mut matching: Vec<Delegation> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|d| match range {
                Some((start, end)) => d.timestamp >= start && d.timestamp < end,
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn delegation(id: i64) -> Delegation {
        Delegation {
            id,
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, id as u32).unwrap(),
            amount: 1,
            delegator: "tz1".to_string(),
            block: "B".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_twice_keeps_one_row_per_id() {
        let repository = MemoryRepository::default();
        let batch: Vec<Delegation> = (1..=4).map(delegation).collect();

        repository.insert_batch(&batch).await.unwrap();
        repository.insert_batch(&batch).await.unwrap();

        assert_eq!(repository.len(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_does_not_block_siblings() {
        let repository = MemoryRepository::with(vec![delegation(1)]);

        repository
            .insert_batch(&[delegation(1), delegation(2)])
            .await
            .unwrap();

        assert_eq!(repository.len(), 2);
        assert_eq!(
            repository.watermark().await.unwrap(),
            Some(delegation(2).timestamp)
        );
    }

    #[tokio::test]
    async fn test_empty_store_has_no_watermark() {
        let repository = MemoryRepository::default();
        assert!(repository.is_empty());
        assert_eq!(repository.watermark().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_failure_keeps_earlier_records() {
        let repository = MemoryRepository::default();
        repository.fail_once_at(2);
        let batch: Vec<Delegation> = (1..=4).map(delegation).collect();

        assert!(repository.insert_batch(&batch).await.is_err());
        assert_eq!(repository.ids(), vec![1, 2]);

        repository.insert_batch(&batch).await.unwrap();
        assert_eq!(repository.ids(), vec![1, 2, 3, 4]);
    }
}

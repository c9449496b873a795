use crate::error::IndexerResult;
use crate::models::{Delegation, DelegationQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod delegation_repository;
#[cfg(test)]
pub mod memory_repository;

pub use delegation_repository::DelegationRepository;

/// Write side used by ingestion.
#[async_trait]
pub trait DelegationStore: Send + Sync {
    /// Stores every delegation keyed by id. Ids already present are left untouched.
    async fn insert_batch(&self, delegations: &[Delegation]) -> IndexerResult<()>;

    /// Most recent stored timestamp, `None` when nothing is stored yet.
    async fn watermark(&self) -> IndexerResult<Option<DateTime<Utc>>>;
}

/// Read side used by the HTTP API.
#[async_trait]
pub trait DelegationReader: Send + Sync {
    /// Most recent first.
    async fn query(&self, query: &DelegationQuery) -> IndexerResult<Vec<Delegation>>;
}

use super::{DelegationReader, DelegationStore};
use crate::error::IndexerResult;
use crate::models::datetime_utils::{deserialize_datetime, serialize_datetime, to_bson_datetime};
use crate::models::{Delegation, DelegationQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, Document};
use mongodb::{Client, ClientSession, Collection, IndexModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DelegationDocument {
    #[serde(rename = "_id")]
    id: i64,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime"
    )]
    ts: DateTime<Utc>,
    amount: i64,
    delegator: String,
    block: String,
}

impl From<DelegationDocument> for Delegation {
    fn from(document: DelegationDocument) -> Self {
        Delegation {
            id: document.id,
            timestamp: document.ts,
            amount: document.amount,
            delegator: document.delegator,
            block: document.block,
        }
    }
}

/// MongoDB-backed delegation storage. Documents are keyed by the TzKT operation id.
///
/// Batches are written in a multi-document transaction, so the deployment must be a
/// replica set or sharded cluster.
#[derive(Clone)]
pub struct DelegationRepository {
    client: Client,
    collection: Collection<DelegationDocument>,
}

impl DelegationRepository {
    pub fn new(client: &Client, db_name: &str, collection: &str) -> Self {
        Self {
            client: client.clone(),
            collection: client.database(db_name).collection(collection),
        }
    }

    pub async fn ensure_indexes(&self) -> IndexerResult<()> {
        let index = IndexModel::builder().keys(doc! { "ts": -1 }).build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

fn upsert_document(delegation: &Delegation) -> (Document, Document) {
    let filter = doc! { "_id": delegation.id };
    let update = doc! {
        "$setOnInsert": {
            "ts": to_bson_datetime(&delegation.timestamp),
            "amount": delegation.amount,
            "delegator": &delegation.delegator,
            "block": &delegation.block,
        }
    };
    (filter, update)
}

fn time_filter(query: &DelegationQuery) -> Document {
    match query.time_range() {
        Some((start, end)) => doc! {
            "ts": { "$gte": to_bson_datetime(&start), "$lt": to_bson_datetime(&end) }
        },
        None => doc! {},
    }
}

impl DelegationRepository {
    async fn upsert_all(
        &self,
        session: &mut ClientSession,
        delegations: &[Delegation],
    ) -> IndexerResult<usize> {
        let mut inserted = 0;
        for delegation in delegations {
            let (filter, update) = upsert_document(delegation);
            let result = self
                .collection
                .update_one(filter, update)
                .upsert(true)
                .session(&mut *session)
                .await?;
            if result.upserted_id.is_some() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl DelegationStore for DelegationRepository {
    /// All records are committed together or none are.
    async fn insert_batch(&self, delegations: &[Delegation]) -> IndexerResult<()> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let inserted = match self.upsert_all(&mut session, delegations).await {
            Ok(inserted) => inserted,
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    warn!("Failed to abort delegation batch transaction: {}", abort);
                }
                return Err(e);
            }
        };
        session.commit_transaction().await?;

        info!(
            "Stored {} new delegations ({} already present)",
            inserted,
            delegations.len() - inserted
        );
        Ok(())
    }

    async fn watermark(&self) -> IndexerResult<Option<DateTime<Utc>>> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "ts": -1 })
            .limit(1)
            .await?;
        Ok(cursor.try_next().await?.map(|document| document.ts))
    }
}

#[async_trait]
impl DelegationReader for DelegationRepository {
    async fn query(&self, query: &DelegationQuery) -> IndexerResult<Vec<Delegation>> {
        // Mongo treats a zero limit as "no limit".
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let documents: Vec<DelegationDocument> = self
            .collection
            .find(time_filter(query))
            .sort(doc! { "ts": -1 })
            .skip(query.offset as u64)
            .limit(query.limit)
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(Delegation::from).collect())
    }
}

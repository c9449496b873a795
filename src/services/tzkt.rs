use crate::config::Config;
use crate::error::{IndexerError, IndexerResult};
use crate::models::Delegation;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use serde::Deserialize;

/// Source of delegation records newer than a lower time bound.
#[async_trait]
pub trait DelegationFetcher: Send + Sync {
    async fn fetch(&self, since: DateTime<Utc>) -> IndexerResult<Vec<Delegation>>;
}

#[derive(Debug, Deserialize)]
struct TzktSender {
    address: String,
}

#[derive(Debug, Deserialize)]
struct TzktDelegation {
    id: i64,
    amount: i64,
    block: String,
    sender: TzktSender,
    timestamp: String,
}

impl TryFrom<TzktDelegation> for Delegation {
    type Error = IndexerError;

    fn try_from(raw: TzktDelegation) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
            .map_err(|source| IndexerError::InvalidTimestamp {
                id: raw.id,
                value: raw.timestamp.clone(),
                source,
            })?
            .with_timezone(&Utc);

        if raw.amount < 0 {
            return Err(IndexerError::InvalidRecord {
                id: raw.id,
                reason: format!("negative amount {}", raw.amount),
            });
        }

        Ok(Delegation {
            id: raw.id,
            timestamp,
            amount: raw.amount,
            delegator: raw.sender.address,
            block: raw.block,
        })
    }
}

/// Client for the TzKT delegations endpoint.
pub struct TzktClient {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
    max_pages: usize,
}

impl TzktClient {
    pub fn new(config: &Config) -> IndexerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.tzkt_url.clone(),
            page_size: config.page_size,
            max_pages: config.max_pages,
        })
    }

    async fn fetch_page(
        &self,
        since: &DateTime<Utc>,
        offset: usize,
    ) -> IndexerResult<Vec<Delegation>> {
        let mut query = vec![
            (
                "timestamp.gt",
                since.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("offset", offset.to_string()),
        ];
        if self.page_size > 0 {
            query.push(("limit", self.page_size.to_string()));
        }

        debug!("GET {} offset={} limit={}", self.base_url, offset, self.page_size);
        let response = self.http.get(&self.base_url).query(&query).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(IndexerError::UnexpectedStatus {
                status: response.status().as_u16(),
                offset,
            });
        }

        let body = response.text().await?;
        let raw: Vec<TzktDelegation> = serde_json::from_str(&body)?;

        raw.into_iter().map(Delegation::try_from).collect()
    }

    fn is_last_page(&self, received: usize) -> bool {
        if self.page_size == 0 {
            received == 0
        } else {
            received < self.page_size
        }
    }
}

#[async_trait]
impl DelegationFetcher for TzktClient {
    /// Pages through every delegation after `since`. Any failing page fails the
    /// whole fetch; records from earlier pages are discarded.
    async fn fetch(&self, since: DateTime<Utc>) -> IndexerResult<Vec<Delegation>> {
        let mut delegations = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            if self.max_pages > 0 && pages == self.max_pages {
                return Err(IndexerError::PageLimitExceeded { pages });
            }

            let page = self.fetch_page(&since, offset).await?;
            pages += 1;
            let received = page.len();
            info!(
                "Fetched {} delegations on page {} (offset {})",
                received, pages, offset
            );
            delegations.extend(page);

            if self.is_last_page(received) {
                break;
            }

            offset += if self.page_size > 0 {
                self.page_size
            } else {
                received
            };
        }

        info!(
            "Total delegations fetched since {}: {}",
            since,
            delegations.len()
        );
        Ok(delegations)
    }
}

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::models::{Delegation, DelegationQuery};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw query string values; empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct DelegationParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DelegationView {
    pub timestamp: DateTime<Utc>,
    pub amount: i64,
    pub delegator: String,
    pub block: String,
}

impl From<Delegation> for DelegationView {
    fn from(delegation: Delegation) -> Self {
        Self {
            timestamp: delegation.timestamp,
            amount: delegation.amount,
            delegator: delegation.delegator,
            block: delegation.block,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DelegationsResponse {
    pub data: Vec<DelegationView>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl DelegationParams {
    pub fn validate(&self, default_limit: i64, max_limit: i64) -> ApiResult<DelegationQuery> {
        let limit = match present(&self.limit) {
            Some(raw) => {
                let limit: i64 = raw
                    .parse()
                    .map_err(|_| ApiError::BadRequest("limit must be numeric".to_string()))?;
                if limit < 0 || limit > max_limit {
                    return Err(ApiError::BadRequest(format!(
                        "limit must be [0; {}]",
                        max_limit
                    )));
                }
                limit
            }
            None => default_limit,
        };

        let offset = match present(&self.offset) {
            Some(raw) => {
                let offset: i64 = raw
                    .parse()
                    .map_err(|_| ApiError::BadRequest("offset must be numeric".to_string()))?;
                if offset < 0 {
                    return Err(ApiError::BadRequest("offset must be positive".to_string()));
                }
                offset
            }
            None => 0,
        };

        let year = match present(&self.year) {
            Some(raw) => Some(parse_year(raw)?),
            None => None,
        };

        Ok(DelegationQuery {
            limit,
            offset,
            year,
        })
    }
}

fn parse_year(raw: &str) -> ApiResult<i32> {
    if raw.len() != 4 {
        return Err(ApiError::BadRequest(
            "year must respect YYYY format".to_string(),
        ));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest("year is not a valid number".to_string()));
    }
    let year: i32 = raw
        .parse()
        .map_err(|_| ApiError::BadRequest("year is not a valid number".to_string()))?;
    if year == 0 {
        return Err(ApiError::BadRequest(format!("{} is not a valid year", raw)));
    }
    Ok(year)
}

pub async fn get_delegations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DelegationParams>,
) -> ApiResult<Json<DelegationsResponse>> {
    let query = params.validate(state.default_limit, state.max_limit)?;
    let delegations = state.reader.query(&query).await?;

    Ok(Json(DelegationsResponse {
        data: delegations.into_iter().map(DelegationView::from).collect(),
    }))
}

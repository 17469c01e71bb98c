//! Usage statistics listing
//!
//! Paginated, sortable listing of stored records with aggregate counts.
//! Aggregates are computed over the returned page against "now" at
//! response time; active/expired status is never stored.

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::collector::{CollectorClient, LogLevel};
use crate::services::{error_json, request_id};
use crate::storage::{ListQuery, ShortUrlRecord, SortField, SortOrder, UrlStore};

const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlDto {
    pub short_code: String,
    pub long_url: String,
    pub created_at: String,
    pub expires_at: String,
    pub clicks: Vec<ClickDto>,
    pub click_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClickDto {
    pub timestamp: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsMeta {
    pub total: usize,
    pub limit: u64,
    pub offset: u64,
    pub total_urls: usize,
    pub total_clicks: usize,
    pub active_urls: usize,
    pub expired_urls: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub data: Vec<ShortUrlDto>,
    pub meta: StatsMeta,
}

pub struct StatsService;

impl StatsService {
    pub async fn get_stats(
        query: web::Query<StatsQuery>,
        store: web::Data<Arc<dyn UrlStore>>,
        collector: web::Data<Arc<CollectorClient>>,
    ) -> impl Responder {
        let rid = request_id();
        info!("[{}] Request received for URL statistics", rid);
        collector.spawn_log(
            LogLevel::Info,
            "handler",
            format!("[{}] Request received for URL statistics.", rid),
        );

        let requested_limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if requested_limit > MAX_LIMIT {
            // Clamped silently, not rejected
            warn!(
                "[{}] Limit too high: {}, using {}",
                rid, requested_limit, MAX_LIMIT
            );
        }

        let list_query = ListQuery {
            limit: requested_limit.min(MAX_LIMIT),
            offset: query.offset.unwrap_or(0),
            sort_by: SortField::from_param(query.sort_by.as_deref().unwrap_or("createdAt")),
            order: SortOrder::from_param(query.order.as_deref().unwrap_or("desc")),
        };

        debug!(
            "[{}] Parsed parameters - limit: {}, offset: {}, sort: {:?} {:?}",
            rid, list_query.limit, list_query.offset, list_query.sort_by, list_query.order
        );

        let records = match store.list(&list_query).await {
            Ok(records) => records,
            Err(e) => {
                error!("[{}] Failed to fetch URL stats: {}", rid, e);
                collector.spawn_log(
                    LogLevel::Error,
                    "db",
                    format!("[{}] Failed to fetch URL stats: {}", rid, e),
                );
                return error_json(&e);
            }
        };

        let response = Self::build_response(records, &list_query);

        info!(
            "[{}] Returning {} records (active: {}, expired: {})",
            rid, response.meta.total, response.meta.active_urls, response.meta.expired_urls
        );
        collector.spawn_log(
            LogLevel::Info,
            "handler",
            format!(
                "[{}] Returning {} records (active: {}, expired: {})",
                rid, response.meta.total, response.meta.active_urls, response.meta.expired_urls
            ),
        );

        HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(response)
    }

    fn build_response(records: Vec<ShortUrlRecord>, query: &ListQuery) -> StatsResponse {
        let now = Utc::now();

        let total = records.len();
        let total_clicks = records.iter().map(|r| r.click_count()).sum();
        let active_urls = records.iter().filter(|r| r.is_active(now)).count();
        let expired_urls = total - active_urls;

        let data = records
            .into_iter()
            .map(|record| ShortUrlDto {
                click_count: record.click_count(),
                clicks: record
                    .clicks
                    .iter()
                    .map(|c| ClickDto {
                        timestamp: c.clicked_at.to_rfc3339(),
                        source: c.source.clone(),
                    })
                    .collect(),
                short_code: record.short_code,
                long_url: record.long_url,
                created_at: record.created_at.to_rfc3339(),
                expires_at: record.expires_at.to_rfc3339(),
            })
            .collect();

        StatsResponse {
            data,
            meta: StatsMeta {
                total,
                limit: query.limit,
                offset: query.offset,
                total_urls: total,
                total_clicks,
                active_urls,
                expired_urls,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(code: &str, expired: bool, clicks: usize) -> ShortUrlRecord {
        let now = Utc::now();
        let expires_at = if expired {
            now - Duration::minutes(1)
        } else {
            now + Duration::minutes(30)
        };
        ShortUrlRecord {
            short_code: code.to_string(),
            long_url: "https://example.com".to_string(),
            created_at: now - Duration::minutes(10),
            expires_at,
            clicks: (0..clicks)
                .map(|_| crate::storage::ClickEvent {
                    clicked_at: now,
                    source: "test".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_meta_counts_partition() {
        let records = vec![
            record("aaa1111", false, 2),
            record("bbb2222", true, 1),
            record("ccc3333", false, 0),
        ];
        let response = StatsService::build_response(records, &ListQuery::default());

        assert_eq!(response.meta.total, 3);
        assert_eq!(response.meta.total_clicks, 3);
        assert_eq!(response.meta.active_urls, 2);
        assert_eq!(response.meta.expired_urls, 1);
        assert_eq!(
            response.meta.active_urls + response.meta.expired_urls,
            response.meta.total_urls
        );
    }

    #[test]
    fn test_empty_page() {
        let response = StatsService::build_response(Vec::new(), &ListQuery::default());
        assert_eq!(response.meta.total, 0);
        assert_eq!(response.meta.total_clicks, 0);
        assert!(response.data.is_empty());
    }
}

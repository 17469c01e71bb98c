use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, trace};

use crate::storage::{ListQuery, UrlStore};

#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

pub struct HealthService;

impl HealthService {
    /// Liveness endpoint. Always answers 200; a failing storage probe only
    /// degrades the reported status.
    pub async fn health_check(
        store: web::Data<Arc<dyn UrlStore>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let probe = ListQuery {
            limit: 1,
            ..ListQuery::default()
        };

        let storage_status =
            match tokio::time::timeout(Duration::from_secs(5), store.list(&probe)).await {
                Ok(Ok(_)) => {
                    trace!("Storage health probe passed");
                    json!({
                        "status": "healthy",
                        "backend": store.backend_name().await,
                    })
                }
                Ok(Err(e)) => {
                    error!("Storage health probe failed: {}", e);
                    json!({
                        "status": "unhealthy",
                        "error": "query failed",
                        "backend": store.backend_name().await,
                    })
                }
                Err(_) => {
                    error!("Storage health probe timeout");
                    json!({
                        "status": "unhealthy",
                        "error": "timeout",
                        "backend": store.backend_name().await,
                    })
                }
            };

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = storage_status["status"] == "healthy";

        HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(json!({
                "status": if is_healthy { "OK" } else { "degraded" },
                "timestamp": now.to_rfc3339(),
                "uptime": uptime_seconds,
                "storage": storage_status,
            }))
    }
}

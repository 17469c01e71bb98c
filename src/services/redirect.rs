//! Shortcode resolution
//!
//! The hot path: format-check the code, look it up, check expiry, record a
//! click and answer 302. Expired links answer 410, distinct from 404, so
//! observability can tell the two apart. Click recording is best-effort: a
//! failed write is logged and the redirect still succeeds.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::collector::{CollectorClient, LogLevel};
use crate::services::request_id;
use crate::storage::{ClickEvent, UrlStore};
use crate::utils::{compose_click_source, is_valid_short_code};

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        store: web::Data<Arc<dyn UrlStore>>,
        collector: web::Data<Arc<CollectorClient>>,
    ) -> impl Responder {
        let code = path.into_inner();
        let rid = request_id();

        // Malformed codes are rejected before any store access
        if !is_valid_short_code(&code) {
            debug!("[{}] Invalid shortcode format: {}", rid, code);
            collector.spawn_log(
                LogLevel::Warn,
                "handler",
                format!("[{}] Invalid shortcode format: {}", rid, code),
            );
            return Self::text_response(StatusCode::BAD_REQUEST, "Invalid shortcode format.");
        }

        info!("[{}] Redirect request for shortcode: {}", rid, code);

        let record = match store.get(&code).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("[{}] Shortcode not found: {}", rid, code);
                collector.spawn_log(
                    LogLevel::Warn,
                    "service",
                    format!("[{}] Shortcode not found: {}", rid, code),
                );
                return Self::text_response(StatusCode::NOT_FOUND, "URL not found.");
            }
            Err(e) => {
                error!("[{}] Lookup failed for {}: {}", rid, code, e);
                collector.spawn_log(
                    LogLevel::Error,
                    "db",
                    format!("[{}] Lookup failed for {}: {}", rid, code, e),
                );
                return Self::text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                );
            }
        };

        let now = Utc::now();
        if !record.is_active(now) {
            warn!(
                "[{}] Shortcode expired: {}, expired at: {}",
                rid,
                code,
                record.expires_at.to_rfc3339()
            );
            collector.spawn_log(
                LogLevel::Warn,
                "service",
                format!(
                    "[{}] Shortcode expired: {}, expired at: {}",
                    rid,
                    code,
                    record.expires_at.to_rfc3339()
                ),
            );
            return Self::text_response(StatusCode::GONE, "URL has expired.");
        }

        // Click append happens only after expiry is confirmed valid
        let click = ClickEvent {
            clicked_at: now,
            source: Self::click_source(&req),
        };

        if let Err(e) = store.append_click(&code, &click).await {
            // Best-effort: the redirect must not fail because of this
            error!("[{}] Failed to record click for {}: {}", rid, code, e);
            collector.spawn_log(
                LogLevel::Error,
                "db",
                format!("[{}] Failed to record click for {}: {}", rid, code, e),
            );
        } else {
            debug!("[{}] Click recorded for shortcode: {}", rid, code);
        }

        info!("[{}] Redirecting {} to: {}", rid, code, record.long_url);
        collector.spawn_log(
            LogLevel::Info,
            "handler",
            format!("[{}] Redirecting {} to: {}", rid, code, record.long_url),
        );

        HttpResponse::Found()
            .append_header(("Location", record.long_url))
            .finish()
    }

    fn click_source(req: &HttpRequest) -> String {
        let user_agent = req
            .headers()
            .get(actix_web::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown");
        let referer = req
            .headers()
            .get(actix_web::http::header::REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Direct");
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        compose_click_source(user_agent, &ip, referer)
    }

    fn text_response(status: StatusCode, body: &'static str) -> HttpResponse {
        HttpResponse::build(status)
            .append_header(("Content-Type", "text/plain; charset=utf-8"))
            .body(body)
    }
}

//! Short URL creation
//!
//! Validates the request, generates or accepts a shortcode, computes the
//! expiry and persists the record. Validation order is deterministic and
//! documented: url presence, url format, validity, shortcode format.
//! Uniqueness is enforced by the store's primary key, so creation is a
//! single atomic insert with no separate existence check.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::collector::{CollectorClient, LogLevel};
use crate::config::get_config;
use crate::errors::{LinkpressError, Result};
use crate::services::{error_json, request_id};
use crate::storage::{ShortUrlRecord, UrlStore};
use crate::utils::url_validator::{validate_url, validation_error_message};
use crate::utils::{generate_random_code, is_valid_short_code};

const DEFAULT_VALIDITY_MINUTES: i64 = 30;
const MAX_VALIDITY_MINUTES: i64 = 43200; // 30 days
const MAX_GENERATION_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUrlRequest {
    pub url: Option<String>,
    /// Accepted as a JSON number or a digit string
    pub validity: Option<serde_json::Value>,
    pub shortcode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUrlResponse {
    pub shortlink: String,
    pub expiry: String,
}

pub struct ShortcodeService;

impl ShortcodeService {
    pub async fn create_short_url(
        req: HttpRequest,
        body: web::Json<CreateUrlRequest>,
        store: web::Data<Arc<dyn UrlStore>>,
        collector: web::Data<Arc<CollectorClient>>,
    ) -> impl Responder {
        let rid = request_id();
        let peer = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        info!("[{}] Received request to shorten URL. Peer: {}", rid, peer);
        collector.spawn_log(
            LogLevel::Info,
            "handler",
            format!("[{}] Received request to shorten URL. Peer: {}", rid, peer),
        );

        // 1. URL presence and format
        let long_url = match &body.url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => {
                warn!("[{}] Validation failed: URL is required", rid);
                collector.spawn_log(
                    LogLevel::Error,
                    "handler",
                    format!("[{}] Validation failed: URL is required.", rid),
                );
                return error_json(&LinkpressError::invalid_input("URL is required."));
            }
        };

        if let Err(e) = validate_url(&long_url) {
            warn!("[{}] Invalid URL format: {}", rid, e);
            collector.spawn_log(
                LogLevel::Error,
                "handler",
                format!("[{}] Invalid URL format: {}", rid, e),
            );
            return error_json(&LinkpressError::invalid_input(validation_error_message(&e)));
        }

        // 2. Validity window
        let validity_minutes = match parse_validity(body.validity.as_ref()) {
            Ok(minutes) => minutes,
            Err(msg) => {
                warn!("[{}] Invalid validity value: {:?}", rid, body.validity);
                collector.spawn_log(
                    LogLevel::Error,
                    "handler",
                    format!("[{}] Invalid validity value: {:?}", rid, body.validity),
                );
                return error_json(&LinkpressError::invalid_input(msg));
            }
        };

        // 3. Custom shortcode format
        if let Some(code) = &body.shortcode {
            if !is_valid_short_code(code) {
                warn!("[{}] Invalid shortcode format: {}", rid, code);
                collector.spawn_log(
                    LogLevel::Error,
                    "handler",
                    format!("[{}] Invalid shortcode format: {}", rid, code),
                );
                return error_json(&LinkpressError::invalid_input(
                    "Shortcode must be 3-20 characters, alphanumeric with dashes and underscores only.",
                ));
            }
        }

        debug!("[{}] Validation passed, starting shortening process", rid);

        match Self::create_record(
            &rid,
            long_url,
            validity_minutes,
            body.shortcode.clone(),
            store.get_ref(),
            collector.get_ref(),
        )
        .await
        {
            Ok(record) => {
                let config = get_config();
                let response = CreateUrlResponse {
                    shortlink: format!("{}/{}", config.app.public_base_url, record.short_code),
                    expiry: record.expires_at.to_rfc3339(),
                };

                info!(
                    "[{}] Short url created - code: {}, expires: {}",
                    rid, record.short_code, response.expiry
                );
                collector.spawn_log(
                    LogLevel::Info,
                    "service",
                    format!(
                        "[{}] Short url created - code: {}, expires: {}",
                        rid, record.short_code, response.expiry
                    ),
                );

                HttpResponse::Created()
                    .append_header(("Content-Type", "application/json; charset=utf-8"))
                    .json(response)
            }
            Err(e) => {
                error!("[{}] {} {}: {}", rid, e.code(), e.error_type(), e.message());
                collector.spawn_log(
                    LogLevel::Error,
                    "service",
                    format!("[{}] {} {}: {}", rid, e.code(), e.error_type(), e.message()),
                );
                error_json(&e)
            }
        }
    }

    /// Persist a record, generating a code when none was supplied.
    /// Collisions on generated codes surface as insert conflicts and are
    /// retried with a fresh code; the retry cap exists as defensive coding,
    /// not because exhaustion is reachable at this alphabet size.
    async fn create_record(
        rid: &str,
        long_url: String,
        validity_minutes: i64,
        custom_code: Option<String>,
        store: &Arc<dyn UrlStore>,
        collector: &Arc<CollectorClient>,
    ) -> Result<ShortUrlRecord> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(validity_minutes);

        if let Some(code) = custom_code {
            debug!("[{}] Using custom shortcode: {}", rid, code);
            let record = ShortUrlRecord {
                short_code: code,
                long_url,
                created_at: now,
                expires_at,
                clicks: Vec::new(),
            };
            store.insert(&record).await?;
            return Ok(record);
        }

        let code_length = get_config().app.random_code_length;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = generate_random_code(code_length);
            debug!("[{}] Generated shortcode attempt {}: {}", rid, attempt, code);

            let record = ShortUrlRecord {
                short_code: code,
                long_url: long_url.clone(),
                created_at: now,
                expires_at,
                clicks: Vec::new(),
            };

            match store.insert(&record).await {
                Ok(()) => return Ok(record),
                Err(LinkpressError::Conflict(_)) => {
                    warn!(
                        "[{}] Generated shortcode collided on attempt {}: {}",
                        rid, attempt, record.short_code
                    );
                    collector.spawn_log(
                        LogLevel::Warn,
                        "service",
                        format!(
                            "[{}] Generated shortcode collided on attempt {}: {}",
                            rid, attempt, record.short_code
                        ),
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(LinkpressError::resource_exhausted(format!(
            "Unable to generate unique shortcode after {} attempts",
            MAX_GENERATION_ATTEMPTS
        )))
    }
}

/// Validity must be a positive integer number of minutes, at most 43200.
/// None falls back to the 30 minute default.
fn parse_validity(value: Option<&serde_json::Value>) -> std::result::Result<i64, &'static str> {
    const ERR: &str = "Validity must be a positive integer (max 43200 minutes).";

    let Some(value) = value else {
        return Ok(DEFAULT_VALIDITY_MINUTES);
    };

    let minutes = match value {
        serde_json::Value::Null => return Ok(DEFAULT_VALIDITY_MINUTES),
        serde_json::Value::Number(n) => n.as_i64().ok_or(ERR)?,
        serde_json::Value::String(s) => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ERR);
            }
            s.parse().map_err(|_| ERR)?
        }
        _ => return Err(ERR),
    };

    if minutes <= 0 || minutes > MAX_VALIDITY_MINUTES {
        return Err(ERR);
    }

    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_validity_default() {
        assert_eq!(parse_validity(None), Ok(30));
        assert_eq!(parse_validity(Some(&json!(null))), Ok(30));
    }

    #[test]
    fn test_parse_validity_number_and_string() {
        assert_eq!(parse_validity(Some(&json!(1))), Ok(1));
        assert_eq!(parse_validity(Some(&json!(43200))), Ok(43200));
        assert_eq!(parse_validity(Some(&json!("1"))), Ok(1));
        assert_eq!(parse_validity(Some(&json!("120"))), Ok(120));
    }

    #[test]
    fn test_parse_validity_rejects_bad_values() {
        assert!(parse_validity(Some(&json!(0))).is_err());
        assert!(parse_validity(Some(&json!(-5))).is_err());
        assert!(parse_validity(Some(&json!(43201))).is_err());
        assert!(parse_validity(Some(&json!(1.5))).is_err());
        assert!(parse_validity(Some(&json!("abc"))).is_err());
        assert!(parse_validity(Some(&json!("-1"))).is_err());
        assert!(parse_validity(Some(&json!(""))).is_err());
        assert!(parse_validity(Some(&json!(true))).is_err());
    }
}

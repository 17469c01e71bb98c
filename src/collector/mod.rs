//! Remote log collector client
//!
//! Mirrors application log lines to an external collector over HTTP. The
//! client caches a bearer token obtained from the collector's auth endpoint
//! and backs off after repeated failures: five consecutive failures put it
//! into a five-minute cooldown during which no network calls are attempted
//! and lines fall back to local tracing output.
//!
//! The client never returns an error to its caller. Logging is best-effort
//! and must never block or fail the request path, so every failure mode
//! degrades to local output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CollectorConfig;

const MAX_CONSECUTIVE_FAILURES: u32 = 5;
const FAILURE_COOLDOWN: Duration = Duration::from_secs(5 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_MESSAGE_LENGTH: usize = 1000;

/// Token refreshes this many seconds before the server-reported expiry
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

#[derive(Serialize)]
struct LogPayload<'a> {
    stack: &'static str,
    level: &'static str,
    package: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// The collector reports this as a number or a digit string
    expires_in: serde_json::Value,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Default)]
struct CollectorState {
    token: Option<CachedToken>,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl CollectorState {
    fn in_cooldown(&self, now: Instant) -> bool {
        if self.consecutive_failures < MAX_CONSECUTIVE_FAILURES {
            return false;
        }
        match self.last_failure {
            Some(at) => now.duration_since(at) < FAILURE_COOLDOWN,
            None => false,
        }
    }

    fn record_failure(&mut self, now: Instant) {
        self.consecutive_failures += 1;
        self.last_failure = Some(now);
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_failure = None;
    }

    fn cached_token(&self, now: Instant) -> Option<String> {
        self.token
            .as_ref()
            .filter(|t| now < t.expires_at)
            .map(|t| t.token.clone())
    }
}

pub struct CollectorClient {
    config: CollectorConfig,
    http: Option<reqwest::Client>,
    state: Mutex<CollectorState>,
}

impl CollectorClient {
    pub fn new(config: CollectorConfig) -> Arc<Self> {
        let http = if config.is_enabled() {
            match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("Failed to build collector HTTP client, remote logging disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Arc::new(Self {
            config,
            http,
            state: Mutex::new(CollectorState::default()),
        })
    }

    /// Client that only logs locally, for tests and collector-less deployments
    pub fn disabled() -> Arc<Self> {
        Self::new(CollectorConfig::default())
    }

    /// Fire-and-forget: mirror a log line without blocking the caller
    pub fn spawn_log(self: &Arc<Self>, level: LogLevel, package: &'static str, message: String) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            client.log(level, package, &message).await;
        });
    }

    /// Send one log line to the collector. Infallible by contract: any
    /// failure degrades to local tracing output.
    pub async fn log(&self, level: LogLevel, package: &str, message: &str) {
        let Some(http) = &self.http else {
            Self::local_fallback(level, package, message);
            return;
        };

        if self.state.lock().in_cooldown(Instant::now()) {
            Self::local_fallback(level, package, message);
            return;
        }

        let Some(token) = self.acquire_token(http).await else {
            Self::local_fallback(level, package, message);
            return;
        };

        let truncated = crate::utils::truncate_chars(message, MAX_MESSAGE_LENGTH);
        let payload = LogPayload {
            stack: "backend",
            level: level.as_str(),
            package,
            message: &truncated,
        };

        let result = http
            .post(format!("{}/logs", self.config.endpoint))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                self.state.lock().record_success();
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                {
                    let mut state = self.state.lock();
                    state.record_failure(Instant::now());
                    // An invalid/expired token forces a re-fetch on the next call
                    if (status == reqwest::StatusCode::BAD_REQUEST
                        || status == reqwest::StatusCode::UNAUTHORIZED)
                        && is_token_rejection(&body)
                    {
                        state.token = None;
                    }
                }
                debug!("Collector rejected log line ({}): {}", status, body);
                Self::local_fallback(level, package, message);
            }
            Err(e) => {
                self.state.lock().record_failure(Instant::now());
                debug!("Collector request failed: {}", e);
                Self::local_fallback(level, package, message);
            }
        }
    }

    /// Return a valid bearer token, fetching a fresh one if the cache is
    /// empty or stale. None means the caller should fall back locally.
    async fn acquire_token(&self, http: &reqwest::Client) -> Option<String> {
        {
            let mut state = self.state.lock();
            let now = Instant::now();

            if state.in_cooldown(now) {
                return None;
            }
            // Cooldown elapsed: allow a fresh attempt
            if state.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                state.record_success();
            }

            if let Some(token) = state.cached_token(now) {
                return Some(token);
            }
        }

        let credentials = serde_json::json!({
            "clientID": self.config.client_id,
            "clientSecret": self.config.client_secret,
        });

        let response = http
            .post(format!("{}/auth", self.config.endpoint))
            .json(&credentials)
            .send()
            .await;

        let token_response: TokenResponse = match response {
            Ok(r) if r.status().is_success() => match r.json().await {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("Collector auth response unparseable: {}", e);
                    self.state.lock().record_failure(Instant::now());
                    return None;
                }
            },
            Ok(r) => {
                debug!("Collector auth failed with status {}", r.status());
                self.state.lock().record_failure(Instant::now());
                return None;
            }
            Err(e) => {
                debug!("Collector auth request failed: {}", e);
                self.state.lock().record_failure(Instant::now());
                return None;
            }
        };

        let expires_in = parse_expires_in(&token_response.expires_in);
        let lifetime = expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS).max(1);

        let mut state = self.state.lock();
        state.token = Some(CachedToken {
            token: token_response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        state.record_success();
        Some(token_response.access_token)
    }

    fn local_fallback(level: LogLevel, package: &str, message: &str) {
        match level {
            LogLevel::Debug => debug!(package, "{}", message),
            LogLevel::Info => tracing::info!(package, "{}", message),
            LogLevel::Warn => tracing::warn!(package, "{}", message),
            LogLevel::Error | LogLevel::Fatal => tracing::error!(package, "{}", message),
        }
    }
}

fn parse_expires_in(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn is_token_rejection(body: &str) -> bool {
    let lower = body.to_lowercase();
    ["invalid token", "token expired", "unauthorized"]
        .iter()
        .any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_after_max_failures() {
        let mut state = CollectorState::default();
        let now = Instant::now();

        for _ in 0..MAX_CONSECUTIVE_FAILURES - 1 {
            state.record_failure(now);
        }
        assert!(!state.in_cooldown(now));

        state.record_failure(now);
        assert!(state.in_cooldown(now));
    }

    #[test]
    fn test_cooldown_expires() {
        let mut state = CollectorState::default();
        let start = Instant::now();

        for _ in 0..MAX_CONSECUTIVE_FAILURES {
            state.record_failure(start);
        }
        assert!(state.in_cooldown(start + Duration::from_secs(60)));
        assert!(!state.in_cooldown(start + FAILURE_COOLDOWN));
    }

    #[test]
    fn test_success_resets_failures() {
        let mut state = CollectorState::default();
        let now = Instant::now();

        for _ in 0..MAX_CONSECUTIVE_FAILURES {
            state.record_failure(now);
        }
        state.record_success();
        assert!(!state.in_cooldown(now));
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn test_cached_token_expiry() {
        let mut state = CollectorState::default();
        let now = Instant::now();
        state.token = Some(CachedToken {
            token: "tok".to_string(),
            expires_at: now + Duration::from_secs(10),
        });

        assert_eq!(state.cached_token(now), Some("tok".to_string()));
        assert_eq!(state.cached_token(now + Duration::from_secs(11)), None);
    }

    #[test]
    fn test_parse_expires_in_forms() {
        assert_eq!(parse_expires_in(&serde_json::json!(3600)), 3600);
        assert_eq!(parse_expires_in(&serde_json::json!("1800")), 1800);
        assert_eq!(parse_expires_in(&serde_json::json!(null)), 0);
        assert_eq!(parse_expires_in(&serde_json::json!("abc")), 0);
    }

    #[test]
    fn test_token_rejection_detection() {
        assert!(is_token_rejection(r#"{"message": "Invalid token"}"#));
        assert!(is_token_rejection("token expired"));
        assert!(is_token_rejection("Unauthorized"));
        assert!(!is_token_rejection("rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_disabled_client_is_noop() {
        let client = CollectorClient::disabled();
        // Must not panic or attempt network calls
        client.log(LogLevel::Info, "handler", "hello").await;
        assert!(client.http.is_none());
    }
}

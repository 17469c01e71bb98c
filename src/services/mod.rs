use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::errors::LinkpressError;

pub mod health;
pub mod redirect;
pub mod shortcode;
pub mod stats;

pub use health::{AppStartTime, HealthService};
pub use redirect::RedirectService;
pub use shortcode::ShortcodeService;
pub use stats::StatsService;

/// JSON error body for the API endpoints. 5xx detail never leaves the
/// process; `public_message` collapses it to a generic message.
pub(crate) fn error_json(err: &LinkpressError) -> HttpResponse {
    HttpResponse::build(err.status_code())
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(json!({ "error": err.public_message() }))
}

/// Short per-request id used to correlate log lines
pub(crate) fn request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Full route table. Shared between the server binary and the tests so
/// both exercise the same app.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/shorturls",
        web::post().to(ShortcodeService::create_short_url),
    )
    .route("/api/stats", web::get().to(StatsService::get_stats))
    .route("/api/health", web::get().to(HealthService::health_check))
    .route(
        "/{shortcode}",
        web::get().to(RedirectService::handle_redirect),
    );
}

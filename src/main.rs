use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use tracing::{debug, info};

use linkpress::collector::CollectorClient;
use linkpress::config::{CorsConfig, get_config, init_config};
use linkpress::logging::init_logging;
use linkpress::services::{AppStartTime, configure_routes};
use linkpress::storage::StoreFactory;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    dotenv().ok();
    init_config();
    let config = get_config();

    // Guard must stay alive so buffered log writes are flushed
    let _log_guard = init_logging(config);

    let store = StoreFactory::create().await.map_err(|e| {
        std::io::Error::other(format!("Failed to create storage backend: {}", e))
    })?;
    info!("Using storage backend: {}", store.backend_name().await);

    let collector = CollectorClient::new(config.collector.clone());
    if config.collector.is_enabled() {
        info!("Remote log collector enabled: {}", config.collector.endpoint);
    } else {
        info!("Remote log collector disabled (no endpoint configured)");
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);
    debug!("Public base URL: {}", config.app.public_base_url);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(Arc::clone(&collector)))
            .app_data(web::Data::new(app_start_time.clone()))
            .wrap(build_cors_middleware(&get_config().cors))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    // Disabled means the browser's default same-origin policy applies
    if !cors_config.enabled {
        return Cors::default();
    }

    let mut cors = Cors::default();

    let is_any_origin = cors_config.allowed_origins.iter().any(|o| o == "*");
    if is_any_origin {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors = cors
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec!["Content-Type", "Authorization", "X-Requested-With"])
        .max_age(cors_config.max_age as usize);

    if cors_config.allow_credentials && !is_any_origin {
        // any_origin + credentials would let any site make authenticated
        // cross-origin requests, so credentials only apply to origin lists
        cors = cors.supports_credentials();
    }

    cors
}

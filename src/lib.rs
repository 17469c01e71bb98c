//! Linkpress - a small URL shortener service
//!
//! This library provides the core functionality for the Linkpress service:
//! shortcode creation, redirect resolution with click tracking, usage
//! statistics and a best-effort remote log collector client.
//!
//! # Architecture
//! - `config`: TOML + environment configuration
//! - `errors`: error taxonomy and HTTP status mapping
//! - `logging`: tracing subscriber setup
//! - `collector`: remote log collector client (token cache, failure cooldown)
//! - `storage`: `UrlStore` trait and sea-orm backend
//! - `services`: HTTP handlers (create, redirect, stats, health)
//! - `utils`: shortcode and URL validation helpers

pub mod collector;
pub mod config;
pub mod errors;
pub mod logging;
pub mod services;
pub mod storage;
pub mod utils;

//! HTTP service, CLI helpers and logging around the IRRF calculator.

pub mod api;
pub mod config;
pub mod csv_batch;
pub mod logging;

pub use api::{AppState, router, serve};
pub use config::{ConfigOverrides, ServerConfig};

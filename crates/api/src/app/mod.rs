//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage selection and service construction
//! - `routes/`: HTTP routes + handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use crate::config::AppConfig;
use crate::pipeline::PipelineError;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, StartupError};

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StartupError> {
    let services = AppServices::from_config(config).await?;
    Ok(build_app_with(services)?)
}

/// Build the router over already-wired services.
pub fn build_app_with(services: AppServices) -> Result<Router, PipelineError> {
    let gates = services.gates();
    let router = routes::router(&gates)?;
    Ok(router.layer(Extension(Arc::new(services))))
}

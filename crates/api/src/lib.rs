//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod cookies;
pub mod middleware;
pub mod pipeline;

pub use config::{AppConfig, ConfigError};
pub use pipeline::{Pipeline, PipelineError, Stage};

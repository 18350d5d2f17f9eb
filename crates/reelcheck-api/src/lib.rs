//! Axum HTTP API server for reel virality analysis.
//!
//! This crate provides:
//! - `POST /upload-reel/`: store a reel, probe its duration, ask the LLM for an analysis
//! - The injectable [`AnalysisService`] LLM seam and its OpenAI implementation
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, OpenAiConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{AnalysisRequester, AnalysisService, OpenAiClient};
pub use state::AppState;

//! Switchboard API - HTTP Server
//!
//! Axum HTTP layer over the Switchboard agent framework: conversational
//! chat turns, session inspection, agent and workflow discovery, and
//! one-shot orchestration runs.

pub mod config;
pub mod error;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;

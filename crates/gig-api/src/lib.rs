//! Axum HTTP API server for the Gigboard marketplace.
//!
//! This crate provides:
//! - The job workflow engine and its HTTP surface
//! - Bearer credential issuance and resolution
//! - Freelancer onboarding through the text-generation oracle
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use auth::{Caller, CredentialSource, Identity, IdentityResolver};
pub use config::{ApiConfig, AuthConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{JobWorkflow, TextOracle, WorkflowError};
pub use state::AppState;

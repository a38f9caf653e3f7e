//! Orchestration service client for execpilot.
//!
//! [`OrchestrationClient`] is the boundary the execution driver talks to;
//! [`HttpOrchestrationClient`] implements it over the service's REST API.

pub mod client;
pub mod error;
pub mod http;

pub use client::{OrchestrationClient, UpsertOutcome};
pub use error::ClientError;
pub use http::HttpOrchestrationClient;

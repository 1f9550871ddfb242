//! HTTP plumbing for provider API communication
//!
//! - A transport trait with a reqwest-backed implementation
//! - Authentication handlers for each provider scheme
//! - Normalization of provider error bodies

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{create_auth_handler, AnthropicAuth, AuthHandler, BearerAuth};
pub use client::{HttpClientConfig, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use error::{ErrorClassification, HttpError};

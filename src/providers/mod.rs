//! Carrier integrations.
//!
//! A provider is built from its stored configuration by a factory looked up
//! in the [`ProviderRegistry`]. The registry is created once at startup and
//! handed to whatever needs it; nothing registers itself implicitly.

pub mod omniva;
pub mod registry;
pub mod static_list;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::shipping::{ProviderMode, Quote, QuoteRequest, Terminal};

pub use registry::{default_registry, LiveProviders, ProviderFactory, ProviderRegistry};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("shipping provider '{0}' is not registered")]
    NotRegistered(String),
    #[error("shipping provider '{0}' not found or not enabled")]
    NotEnabled(String),
    #[error("invalid configuration for provider '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },
    #[error("carrier request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected carrier response: {0}")]
    Decode(String),
    #[error("{0}")]
    Unsupported(String),
}

impl From<ProviderError> for DomainError {
    fn from(e: ProviderError) -> Self {
        DomainError::ProviderUnavailable(e.to_string())
    }
}

/// Everything a factory gets to build a live client.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub key: String,
    pub mode: ProviderMode,
    pub config: Value,
    pub http_timeout: Duration,
}

/// A live carrier client.
pub trait Provider: Send + Sync {
    fn key(&self) -> &str;
    fn list_terminals(&self, country: &str) -> Result<Vec<Terminal>, ProviderError>;
    fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError>;
}

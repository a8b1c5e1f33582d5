//! SiteGauge: an SEO site auditor with AI-assisted competitor research
//!
//! This crate fetches web pages, scores them against a fixed rubric of SEO
//! heuristics, optionally augments the results with AI-discovered competitor
//! sites and AI-generated outreach text, and produces a consolidated report.

pub mod ai;
pub mod analyzer;
pub mod config;
pub mod insights;
pub mod pipeline;
pub mod report;
pub mod screenshot;
pub mod url;

use thiserror::Error;

/// Main error type for SiteGauge operations
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Could not reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("All credentials exhausted under rate limiting")]
    CapabilityExhausted,

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Screenshot error: {0}")]
    Screenshot(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for SiteGauge operations
pub type Result<T> = std::result::Result<T, GaugeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analyzer::{AnalysisResult, SiteAnalyzer};
pub use config::Config;
pub use pipeline::{Coordinator, RunReport};

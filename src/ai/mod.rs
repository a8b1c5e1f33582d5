//! AI capabilities: text generation, credential rotation, competitor
//! discovery, and outreach composition

pub mod competitors;
mod gemini;
mod keystore;
mod outreach;
mod rotation;

pub use competitors::{CompetitorFinder, WebSearch};
pub use gemini::GeminiClient;
pub use keystore::KeyStore;
pub use outreach::OutreachComposer;
pub use rotation::RotatingGenerator;

use async_trait::async_trait;

/// Error from a text-generation call
///
/// Rate limiting is split out because it drives credential rotation; every
/// other failure is retried against the same credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("rate limited")]
    RateLimited,

    #[error("generation failed: {0}")]
    Other(String),
}

/// A "prompt in, text out" capability bound to one credential
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

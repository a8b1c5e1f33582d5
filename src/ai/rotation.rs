//! Credential rotation for AI-backed calls
//!
//! One credential is active at a time. A rate-limit error advances to the
//! next credential and retries the same request; rotation is a single pass,
//! never wrapping back to the start. Any other error is retried against the
//! same credential with exponential backoff. The control flow is an explicit
//! state machine rather than nested retry conditionals.

use crate::ai::{GenerateError, TextGenerator};
use crate::{GaugeError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Retries per credential for non-rate-limit errors
const MAX_RETRIES: u32 = 3;

/// Rotation state for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// Trying credential `index`, having already retried it `retries` times
    Active { index: usize, retries: u32 },
    /// Every remaining credential was rate limited
    Exhausted,
    /// The active credential kept failing with transient errors
    Failed,
}

impl RotationState {
    /// Rate limit: advance to the next credential, or exhaust at the end of
    /// the list (no wrap)
    pub fn on_rate_limit(self, credential_count: usize) -> Self {
        match self {
            RotationState::Active { index, .. } => {
                if index + 1 >= credential_count {
                    RotationState::Exhausted
                } else {
                    RotationState::Active {
                        index: index + 1,
                        retries: 0,
                    }
                }
            }
            other => other,
        }
    }

    /// Transient error: retry the same credential until retries run out
    pub fn on_transient_error(self, max_retries: u32) -> Self {
        match self {
            RotationState::Active { index, retries } => {
                if retries + 1 >= max_retries {
                    RotationState::Failed
                } else {
                    RotationState::Active {
                        index,
                        retries: retries + 1,
                    }
                }
            }
            other => other,
        }
    }
}

/// Text generator that drives a credential rotation over per-key sessions
pub struct RotatingGenerator {
    sessions: Vec<Arc<dyn TextGenerator>>,
    current: AtomicUsize,
    base_delay: Duration,
}

impl RotatingGenerator {
    pub fn new(sessions: Vec<Arc<dyn TextGenerator>>) -> Self {
        Self {
            sessions,
            current: AtomicUsize::new(0),
            base_delay: Duration::from_secs(1),
        }
    }

    /// Overrides the backoff base delay (tests)
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Probes every session and keeps only the ones that answer
    ///
    /// Returns the generator plus the indexes of the sessions that passed,
    /// so the caller can drop the failed credentials from its store.
    /// Credentials dropped here are never silently retried later.
    pub async fn with_validation(
        sessions: Vec<Arc<dyn TextGenerator>>,
    ) -> (Self, Vec<usize>) {
        let mut valid = Vec::new();
        let mut valid_indexes = Vec::new();

        for (index, session) in sessions.into_iter().enumerate() {
            match session.generate("Say 'Hello'").await {
                Ok(_) => {
                    valid.push(session);
                    valid_indexes.push(index);
                }
                Err(e) => {
                    tracing::warn!("Dropping credential {}: validation probe failed ({})", index, e);
                }
            }
        }

        (Self::new(valid), valid_indexes)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Generates text, rotating credentials on rate limits
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        if self.sessions.is_empty() {
            return Err(GaugeError::CapabilityUnavailable(
                "no AI credentials configured".to_string(),
            ));
        }

        let start_index = self.current.load(Ordering::Relaxed).min(self.sessions.len() - 1);
        let mut state = RotationState::Active {
            index: start_index,
            retries: 0,
        };
        let mut last_error = String::new();

        loop {
            let index = match state {
                RotationState::Active { index, .. } => index,
                RotationState::Exhausted => return Err(GaugeError::CapabilityExhausted),
                RotationState::Failed => {
                    return Err(GaugeError::CapabilityUnavailable(last_error))
                }
            };

            match self.sessions[index].generate(prompt).await {
                Ok(text) => {
                    self.current.store(index, Ordering::Relaxed);
                    return Ok(text);
                }
                Err(GenerateError::RateLimited) => {
                    tracing::info!("Credential {} rate limited, rotating", index);
                    state = state.on_rate_limit(self.sessions.len());
                    if let RotationState::Active { index, .. } = state {
                        self.current.store(index, Ordering::Relaxed);
                    }
                }
                Err(GenerateError::Other(message)) => {
                    tracing::debug!("Generation error on credential {}: {}", index, message);
                    last_error = message;
                    state = state.on_transient_error(MAX_RETRIES);
                    if let RotationState::Active { retries, .. } = state {
                        // Doubling backoff: base, 2x, 4x, ...
                        let delay = self.base_delay * 2u32.saturating_pow(retries - 1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// Scripted generator: plays back a fixed sequence of outcomes
    struct Scripted {
        outcomes: Vec<std::result::Result<String, GenerateError>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(outcomes: Vec<std::result::Result<String, GenerateError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, _prompt: &str) -> std::result::Result<String, GenerateError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.outcomes
                .get(call.min(self.outcomes.len() - 1))
                .cloned()
                .unwrap_or(Err(GenerateError::Other("script ended".to_string())))
        }
    }

    fn ok(text: &str) -> std::result::Result<String, GenerateError> {
        Ok(text.to_string())
    }

    fn sessions(scripted: &[&Arc<Scripted>]) -> Vec<Arc<dyn TextGenerator>> {
        scripted
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn TextGenerator>)
            .collect()
    }

    #[test]
    fn test_rate_limit_advances() {
        let state = RotationState::Active { index: 0, retries: 2 };
        assert_eq!(
            state.on_rate_limit(3),
            RotationState::Active { index: 1, retries: 0 }
        );
    }

    #[test]
    fn test_rate_limit_never_wraps() {
        let state = RotationState::Active { index: 2, retries: 0 };
        assert_eq!(state.on_rate_limit(3), RotationState::Exhausted);
    }

    #[test]
    fn test_transient_error_increments_retries() {
        let state = RotationState::Active { index: 1, retries: 0 };
        assert_eq!(
            state.on_transient_error(3),
            RotationState::Active { index: 1, retries: 1 }
        );
    }

    #[test]
    fn test_transient_errors_exhaust_to_failed() {
        let mut state = RotationState::Active { index: 0, retries: 0 };
        state = state.on_transient_error(3);
        state = state.on_transient_error(3);
        state = state.on_transient_error(3);
        assert_eq!(state, RotationState::Failed);
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        assert_eq!(RotationState::Exhausted.on_rate_limit(5), RotationState::Exhausted);
        assert_eq!(RotationState::Failed.on_transient_error(5), RotationState::Failed);
    }

    #[tokio::test]
    async fn test_generate_success_first_try() {
        let session = Scripted::new(vec![ok("hello")]);
        let generator = RotatingGenerator::new(sessions(&[&session]));
        assert_eq!(generator.generate("hi").await.unwrap(), "hello");
        assert_eq!(session.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_rotates_on_rate_limit() {
        let first = Scripted::new(vec![Err(GenerateError::RateLimited)]);
        let second = Scripted::new(vec![ok("from second key")]);
        let generator = RotatingGenerator::new(sessions(&[&first, &second]));

        assert_eq!(generator.generate("hi").await.unwrap(), "from second key");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_all_rate_limited_is_exhausted() {
        let first = Scripted::new(vec![Err(GenerateError::RateLimited)]);
        let second = Scripted::new(vec![Err(GenerateError::RateLimited)]);
        let generator = RotatingGenerator::new(sessions(&[&first, &second]));

        match generator.generate("hi").await {
            Err(GaugeError::CapabilityExhausted) => {}
            other => panic!("expected CapabilityExhausted, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_generate_retries_transient_then_succeeds() {
        let session = Scripted::new(vec![
            Err(GenerateError::Other("flaky".to_string())),
            ok("recovered"),
        ]);
        let generator = RotatingGenerator::new(sessions(&[&session]))
            .with_base_delay(Duration::from_millis(1));

        assert_eq!(generator.generate("hi").await.unwrap(), "recovered");
        assert_eq!(session.calls(), 2);
    }

    #[tokio::test]
    async fn test_generate_transient_failures_give_up() {
        let session = Scripted::new(vec![Err(GenerateError::Other("down".to_string()))]);
        let generator = RotatingGenerator::new(sessions(&[&session]))
            .with_base_delay(Duration::from_millis(1));

        match generator.generate("hi").await {
            Err(GaugeError::CapabilityUnavailable(msg)) => assert_eq!(msg, "down"),
            other => panic!("expected CapabilityUnavailable, got {:?}", other.map(|_| ())),
        }
        assert_eq!(session.calls(), MAX_RETRIES);
    }

    #[tokio::test]
    async fn test_generate_without_sessions() {
        let generator = RotatingGenerator::new(vec![]);
        assert!(matches!(
            generator.generate("hi").await,
            Err(GaugeError::CapabilityUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_next_call_starts_at_rotated_credential() {
        let first = Scripted::new(vec![Err(GenerateError::RateLimited)]);
        let second = Scripted::new(vec![ok("a"), ok("b")]);
        let generator = RotatingGenerator::new(sessions(&[&first, &second]));

        generator.generate("one").await.unwrap();
        generator.generate("two").await.unwrap();

        // The rate-limited credential is only hit once
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 2);
    }

    #[tokio::test]
    async fn test_validation_drops_bad_credentials() {
        let good = Scripted::new(vec![ok("Hello")]);
        let bad = Scripted::new(vec![Err(GenerateError::Other("invalid key".to_string()))]);
        let (generator, valid) =
            RotatingGenerator::with_validation(sessions(&[&bad, &good])).await;

        assert_eq!(generator.session_count(), 1);
        assert_eq!(valid, vec![1]);
    }
}

//! Provider trait: the abstraction over language-model backends.
//!
//! A Provider takes the user's message plus an optional seed answer and
//! produces either generated text or a safety-block signal. The two outcomes
//! are distinct variants of [`Generation`], so callers never compare model
//! output against a magic string.
//!
//! Implementations: Gemini, plus a timeout/fallback wrapper.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Input for a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The raw user message
    pub user_input: String,

    /// Canned answer used as prior model turn (may be empty)
    #[serde(default)]
    pub seed_context: String,
}

impl GenerationRequest {
    pub fn new(user_input: impl Into<String>, seed_context: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            seed_context: seed_context.into(),
        }
    }

    /// Whether there is a seed answer to prime the conversation with.
    pub fn has_seed(&self) -> bool {
        !self.seed_context.trim().is_empty()
    }
}

/// The outcome of a successful provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Generation {
    /// Ordinary generated text
    Text(String),

    /// The provider refused to answer on safety grounds
    SafetyBlocked,
}

impl Generation {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Generation::SafetyBlocked)
    }
}

/// The core Provider trait.
///
/// The resolver calls `generate()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Generate a reply for the user input, seeded with the canned answer.
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

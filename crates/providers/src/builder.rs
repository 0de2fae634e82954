//! Provider construction from configuration.

use crate::fallback::FallbackProvider;
use crate::gemini::GeminiProvider;
use aminochat_config::ProviderConfig;
use aminochat_core::error::ProviderError;
use aminochat_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Provider names this crate can build.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini"];

/// Build the configured provider, wrapped in the adapter-boundary timeout.
///
/// A missing API key is not an error here; the provider reports
/// [`ProviderError::NotConfigured`] on first use so the gateway can still
/// serve canned answers.
pub fn build_from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    Ok(Arc::new(build_chain(config)?))
}

/// The primary model followed by each distinct fallback model, every entry
/// bounded by `timeout_secs`.
pub fn build_chain(config: &ProviderConfig) -> Result<FallbackProvider, ProviderError> {
    if !KNOWN_PROVIDERS.contains(&config.name.as_str()) {
        return Err(ProviderError::NotConfigured(format!(
            "Unknown provider '{}' (known: {})",
            config.name,
            KNOWN_PROVIDERS.join(", ")
        )));
    }

    if config.api_key.as_deref().is_none_or(str::is_empty) {
        warn!(provider = %config.name, "No API key configured; open-ended questions will fail");
    }

    let timeout = Duration::from_secs(config.timeout_secs);
    let mut models: Vec<&str> = vec![config.model.as_str()];
    for model in &config.fallback_models {
        let model = model.trim();
        if !model.is_empty() && !models.contains(&model) {
            models.push(model);
        }
    }

    let mut chain = FallbackProvider::new(config.name.clone());
    for model in &models {
        let model_config = ProviderConfig {
            model: (*model).to_string(),
            ..config.clone()
        };
        chain = chain.add(Arc::new(GeminiProvider::from_config(&model_config)), timeout);
    }

    debug!(
        provider = %config.name,
        models = ?models,
        timeout_secs = config.timeout_secs,
        "Provider built"
    );
    Ok(chain)
}

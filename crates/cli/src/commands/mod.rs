pub mod ask;
pub mod classify;
pub mod doctor;
pub mod onboard;
pub mod serve;

use aminochat_chat::ChatService;
use aminochat_config::AppConfig;
use std::path::Path;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Open the store and provider from config and wire them into the pipeline.
pub async fn build_chat_service(config: &AppConfig) -> Result<ChatService, Box<dyn std::error::Error>> {
    let store = aminochat_store::open_from_config(&config.database).await?;
    let provider = aminochat_providers::build_from_config(&config.provider)?;
    tracing::debug!(store = store.name(), provider = provider.name(), "Chat pipeline ready");
    Ok(ChatService::new(store, provider, &config.chat))
}

//! `aminochat serve`: Start the HTTP gateway.

use super::{CmdResult, build_chat_service, load_config};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> CmdResult {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let chat = build_chat_service(&config).await?;

    println!("Amino Chat gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Store:     {}", chat.store_name());
    println!("   Model:     {} ({})", config.provider.model, config.provider.name);
    if !config.has_api_key() {
        println!("   Warning:   no API key set, open-ended questions will fail");
    }

    aminochat_gateway::serve(chat, &config.gateway).await
}

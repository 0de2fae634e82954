//! `aminochat ask`: Single-message or line-by-line chat on the terminal.

use super::{CmdResult, build_chat_service, load_config};
use aminochat_chat::ChatService;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: Option<&Path>, message: Option<String>) -> CmdResult {
    let config = load_config(config_path)?;
    let chat = build_chat_service(&config).await?;

    if let Some(message) = message {
        let reply = chat.handle_chat(&message).await?;
        println!("{}", reply.response);
        return Ok(());
    }

    eprintln!("Amino Chat: type a question, Ctrl+D to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        answer(&chat, &line).await;
    }

    Ok(())
}

async fn answer(chat: &ChatService, line: &str) {
    match chat.handle_chat(line).await {
        Ok(reply) => println!("[{}] {}", reply.category, reply.response),
        Err(e) => eprintln!("  [Error] {e}"),
    }
}

//! `aminochat classify`: Show the category for a message, offline.

use super::{CmdResult, load_config};
use aminochat_chat::{ResolutionPolicy, explain};
use aminochat_core::Category;
use std::path::Path;

pub fn run(config_path: Option<&Path>, message: &str) -> CmdResult {
    let config = load_config(config_path)?;
    let policy = ResolutionPolicy::from(&config.chat);
    let result = explain(message);

    println!("category: {} ({})", result.category.id(), result.category.label());
    match result.matched_phrase {
        Some(phrase) => println!("matched:  \"{phrase}\""),
        None => println!("matched:  nothing (fallback)"),
    }

    let route = match result.category {
        Category::Unrecognized | Category::PleaseRepeat => "fixed message",
        _ if policy.is_open_ended(result.category) => "language model",
        _ => "canned answer",
    };
    println!("answer:   {route}");

    Ok(())
}

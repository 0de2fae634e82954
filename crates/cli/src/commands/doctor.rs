//! `aminochat doctor`: Diagnose configuration, store, and provider.

use aminochat_config::AppConfig;
use aminochat_core::AnswerStore;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Amino Chat Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let path = config_path.map(Path::to_path_buf).unwrap_or_else(AppConfig::config_path);
    if path.exists() {
        println!("  [ok]   Config file found: {}", path.display());
    } else {
        println!("  [warn] No config file at {}, using defaults", path.display());
    }

    let config = match AppConfig::load(config_path) {
        Ok(config) => {
            println!("  [ok]   Config valid");
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            println!("\n  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  [ok]   API key configured");
    } else {
        println!("  [warn] No API key, set AMINOCHAT_API_KEY or provider.api_key");
        issues += 1;
    }

    match aminochat_store::open_from_config(&config.database).await {
        Ok(store) => {
            check_store(store.as_ref(), &mut issues).await;
        }
        Err(e) => {
            println!("  [fail] Store unreachable: {e}");
            issues += 1;
        }
    }

    match aminochat_providers::build_from_config(&config.provider) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  [ok]   Provider {} ready ({})", provider.name(), config.provider.model),
            Ok(false) => {
                println!("  [warn] Provider {} not ready", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Provider check failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Provider not configured: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

async fn check_store(store: &dyn AnswerStore, issues: &mut usize) {
    match store.health_check().await {
        Ok(true) => println!("  [ok]   Store {} reachable", store.name()),
        Ok(false) | Err(_) => {
            println!("  [fail] Store {} failed its health check", store.name());
            *issues += 1;
            return;
        }
    }

    match store.fetch_answers().await {
        Ok(answers) if answers.is_empty() => {
            println!("  [warn] No canned answers stored, every reply will be empty");
            *issues += 1;
        }
        Ok(answers) => println!("  [ok]   {} canned answers loaded", answers.len()),
        Err(e) => {
            println!("  [fail] Could not read answers: {e}");
            *issues += 1;
        }
    }
}

//! `aminochat onboard`: First-time setup.

use aminochat_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path.map(Path::to_path_buf).unwrap_or_else(AppConfig::config_path);

    println!("Amino Chat — First-Time Setup");
    println!("=============================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("  Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config.toml at: {}", config_path.display());
    }

    // Opening the store creates the SQLite file and its tables.
    let config = AppConfig::load(Some(&config_path))?;
    let store = aminochat_store::open_from_config(&config.database).await?;
    println!("  Store ready: {}", store.name());

    println!("\n  Next steps:");
    println!("   1. Set provider.api_key in {} or export AMINOCHAT_API_KEY", config_path.display());
    println!("   2. Fill the model_resp table with canned answers");
    println!("   3. Run: aminochat serve\n");

    Ok(())
}

//! Answer store backends for Amino Chat.
//!
//! Every backend implements `aminochat_core::AnswerStore` over the same two
//! tables:
//! - `model_resp(id, text)`: one canned answer per category id
//! - `user_ask(id, text, id_resp)`: suggested questions pointing at an answer

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "mysql")]
pub use mysql::MySqlStore;

use aminochat_config::{DatabaseConfig, StoreBackend};
use aminochat_core::{AnswerRecord, AnswerStore, Category, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// Open the configured backend.
pub async fn open_from_config(config: &DatabaseConfig) -> Result<Arc<dyn AnswerStore>, StoreError> {
    let store: Arc<dyn AnswerStore> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),

        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            let url = config
                .url
                .clone()
                .unwrap_or_else(DatabaseConfig::default_sqlite_url);
            Arc::new(SqliteStore::connect(&url, config.max_connections).await?)
        }

        #[cfg(feature = "mysql")]
        StoreBackend::Mysql => Arc::new(MySqlStore::connect(config).await?),

        #[allow(unreachable_patterns)]
        other => {
            return Err(StoreError::NotConfigured(format!(
                "{other:?} backend is not compiled in"
            )));
        }
    };

    info!(store = store.name(), "Answer store ready");
    Ok(store)
}

/// Turn raw `(id, text)` rows into answer records. Rows whose id is not a
/// known category are skipped.
pub(crate) fn records_from_rows(rows: impl IntoIterator<Item = (i64, String)>) -> Vec<AnswerRecord> {
    rows.into_iter()
        .filter_map(|(id, text)| match Category::try_from(id) {
            Ok(category) => Some(AnswerRecord::new(category, text)),
            Err(e) => {
                warn!(id, "Skipping answer row: {e}");
                None
            }
        })
        .collect()
}

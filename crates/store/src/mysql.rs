//! MySQL answer store.
//!
//! Reads the hospital's existing `model_resp` and `user_ask` tables. The
//! schema is owned elsewhere; this backend never creates or alters tables.

use crate::records_from_rows;
use aminochat_config::DatabaseConfig;
use aminochat_core::{AnswerRecord, AnswerStore, FaqEntry, StoreError};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const DEFAULT_PORT: u16 = 3306;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect using the URL when set, else the discrete host/user/password
    /// fields.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = connect_options(config)?;
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("MySQL connection failed: {e}")))?;

        info!("Connected to MySQL answer store");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, StoreError> {
    if let Some(url) = &config.url {
        return MySqlConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(format!("Invalid MySQL URL: {e}")));
    }

    let host = config
        .host
        .as_deref()
        .ok_or_else(|| StoreError::NotConfigured("MySQL needs a url or a host".into()))?;

    let mut options = MySqlConnectOptions::new()
        .host(host)
        .port(config.port.unwrap_or(DEFAULT_PORT));
    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(name) = &config.name {
        options = options.database(name);
    }
    Ok(options)
}

#[async_trait]
impl AnswerStore for MySqlStore {
    fn name(&self) -> &str {
        "mysql"
    }

    async fn fetch_answers(&self) -> Result<Vec<AnswerRecord>, StoreError> {
        let rows = sqlx::query("SELECT CAST(id AS SIGNED) AS id, text FROM model_resp ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("SELECT model_resp: {e}")))?;

        let pairs = rows
            .iter()
            .map(|row| {
                let id: i64 = row
                    .try_get("id")
                    .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
                let text: String = row
                    .try_get("text")
                    .map_err(|e| StoreError::QueryFailed(format!("text column: {e}")))?;
                Ok((id, text))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(records_from_rows(pairs))
    }

    async fn fetch_faq(&self) -> Result<Vec<FaqEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT CAST(user_ask.id AS SIGNED) AS id, user_ask.text AS question,
                   CAST(user_ask.id_resp AS SIGNED) AS answer_id, model_resp.text AS answer
            FROM user_ask
            JOIN model_resp ON user_ask.id_resp = model_resp.id
            ORDER BY user_ask.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("SELECT faq: {e}")))?;

        rows.iter()
            .map(|row| {
                let get_err = |col: &str, e: sqlx::Error| StoreError::QueryFailed(format!("{col} column: {e}"));
                Ok(FaqEntry {
                    id: row.try_get("id").map_err(|e| get_err("id", e))?,
                    question: row.try_get("question").map_err(|e| get_err("question", e))?,
                    answer_id: row.try_get("answer_id").map_err(|e| get_err("answer_id", e))?,
                    answer: row.try_get("answer").map_err(|e| get_err("answer", e))?,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(true)
    }
}

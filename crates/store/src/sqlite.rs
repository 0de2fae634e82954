//! SQLite answer store.
//!
//! Creates the `model_resp` and `user_ask` tables when missing, so a fresh
//! file is a valid (empty) knowledge base. Use [`SqliteStore::seed`] and
//! [`SqliteStore::add_question`] to fill it.

use crate::records_from_rows;
use aminochat_core::{AnswerRecord, AnswerStore, FaqEntry, StoreError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a database from a `sqlite:` URL.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // An in-memory database lives in a single connection.
        let max_connections = if in_memory { 1 } else { max_connections.max(1) };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(in_memory, "SQLite answer store initialized");
        Ok(store)
    }

    /// Wrap an existing pool, creating the tables if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS model_resp (
                id    INTEGER PRIMARY KEY,
                text  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("model_resp table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_ask (
                id       INTEGER PRIMARY KEY,
                text     TEXT NOT NULL,
                id_resp  INTEGER NOT NULL REFERENCES model_resp(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("user_ask table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Insert or update canned answers.
    pub async fn seed(&self, records: &[AnswerRecord]) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::QueryFailed(format!("BEGIN: {e}")))?;

        for record in records {
            sqlx::query(
                "INSERT INTO model_resp (id, text) VALUES (?1, ?2) \
                 ON CONFLICT(id) DO UPDATE SET text = excluded.text",
            )
            .bind(i64::from(record.id.id()))
            .bind(&record.text)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("INSERT model_resp: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COMMIT: {e}")))?;
        debug!(count = records.len(), "Answers seeded");
        Ok(())
    }

    /// Insert or replace a suggested question.
    pub async fn add_question(&self, id: i64, text: &str, answer_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO user_ask (id, text, id_resp) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(text)
            .bind(answer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("INSERT user_ask: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl AnswerStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch_answers(&self) -> Result<Vec<AnswerRecord>, StoreError> {
        let rows = sqlx::query("SELECT id, text FROM model_resp ORDER BY id")
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
            SELECT user_ask.id AS id, user_ask.text AS question,
                   user_ask.id_resp AS answer_id, model_resp.text AS answer
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
                Ok(FaqEntry {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?,
                    question: row
                        .try_get("question")
                        .map_err(|e| StoreError::QueryFailed(format!("question column: {e}")))?,
                    answer_id: row
                        .try_get("answer_id")
                        .map_err(|e| StoreError::QueryFailed(format!("answer_id column: {e}")))?,
                    answer: row
                        .try_get("answer")
                        .map_err(|e| StoreError::QueryFailed(format!("answer column: {e}")))?,
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

//! Canned answers and the store that serves them.
//!
//! The knowledge table holds at most one answer per [`Category`]. The core
//! only reads it; how it is persisted is up to the [`AnswerStore`]
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::category::Category;
use crate::error::StoreError;

/// A single canned answer from the knowledge table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Which category this answer belongs to
    pub id: Category,

    /// The answer text (plain text with light markdown)
    pub text: String,
}

impl AnswerRecord {
    pub fn new(id: Category, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A suggested question joined with the answer it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Row id of the question
    pub id: i64,

    /// The question as a user would type it
    pub question: String,

    /// Id of the answer row the question resolves to
    pub answer_id: i64,

    /// The joined answer text
    pub answer: String,
}

/// Canned answers keyed by category, built fresh for each request.
#[derive(Debug, Clone, Default)]
pub struct AnswerSet {
    answers: HashMap<Category, AnswerRecord>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from store rows. When a category appears more than once
    /// the first row wins.
    pub fn from_records(records: impl IntoIterator<Item = AnswerRecord>) -> Self {
        let mut answers = HashMap::new();
        for record in records {
            answers.entry(record.id).or_insert(record);
        }
        Self { answers }
    }

    pub fn get(&self, category: Category) -> Option<&AnswerRecord> {
        self.answers.get(&category)
    }

    /// The canned text for a category, if one exists.
    pub fn text(&self, category: Category) -> Option<&str> {
        self.get(category).map(|r| r.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<AnswerRecord> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = AnswerRecord>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}

/// Read-only access to the knowledge table.
///
/// Implementations: in-memory, SQLite, MySQL.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// A short name for logs (e.g., "sqlite", "mysql").
    fn name(&self) -> &str;

    /// Fetch every canned answer.
    async fn fetch_answers(&self) -> Result<Vec<AnswerRecord>, StoreError>;

    /// Fetch suggested questions joined with their answers.
    ///
    /// Default implementation returns no entries.
    async fn fetch_faq(&self) -> Result<Vec<FaqEntry>, StoreError> {
        Ok(Vec::new())
    }

    /// Health check: can we reach the store?
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

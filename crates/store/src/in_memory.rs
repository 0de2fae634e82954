//! In-memory store: useful for tests and demos without a database.

use aminochat_core::{AnswerRecord, AnswerStore, FaqEntry, StoreError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Question {
    id: i64,
    text: String,
    answer_id: i64,
}

/// Answers and questions held in process memory.
pub struct InMemoryStore {
    answers: Arc<RwLock<Vec<AnswerRecord>>>,
    questions: Arc<RwLock<Vec<Question>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_answers(Vec::new())
    }

    pub fn with_answers(answers: Vec<AnswerRecord>) -> Self {
        Self {
            answers: Arc::new(RwLock::new(answers)),
            questions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Insert or replace the answer for a category.
    pub async fn upsert(&self, record: AnswerRecord) {
        let mut answers = self.answers.write().await;
        match answers.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => answers.push(record),
        }
    }

    pub async fn add_question(&self, id: i64, text: impl Into<String>, answer_id: i64) {
        self.questions.write().await.push(Question {
            id,
            text: text.into(),
            answer_id,
        });
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn fetch_answers(&self) -> Result<Vec<AnswerRecord>, StoreError> {
        Ok(self.answers.read().await.clone())
    }

    async fn fetch_faq(&self) -> Result<Vec<FaqEntry>, StoreError> {
        let answers = self.answers.read().await;
        let questions = self.questions.read().await;

        // Inner join: questions pointing at a missing answer are dropped.
        Ok(questions
            .iter()
            .filter_map(|q| {
                answers
                    .iter()
                    .find(|a| i64::from(a.id.id()) == q.answer_id)
                    .map(|a| FaqEntry {
                        id: q.id,
                        question: q.text.clone(),
                        answer_id: q.answer_id,
                        answer: a.text.clone(),
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aminochat_core::Category;

    #[tokio::test]
    async fn returns_seeded_answers() {
        let store = InMemoryStore::with_answers(vec![AnswerRecord::new(Category::Greeting, "Halo!")]);
        let answers = store.fetch_answers().await.unwrap();
        assert_eq!(answers, vec![AnswerRecord::new(Category::Greeting, "Halo!")]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_category() {
        let store = InMemoryStore::new();
        store.upsert(AnswerRecord::new(Category::Contact, "lama")).await;
        store.upsert(AnswerRecord::new(Category::Contact, "baru")).await;
        store.upsert(AnswerRecord::new(Category::Greeting, "Halo")).await;

        let answers = store.fetch_answers().await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].text, "baru");
    }

    #[tokio::test]
    async fn faq_joins_questions_with_answers() {
        let store = InMemoryStore::with_answers(vec![
            AnswerRecord::new(Category::Contact, "Telepon (024) 6722565"),
            AnswerRecord::new(Category::VisitingHours, "Jam besuk 16.00-18.00"),
        ]);
        store.add_question(1, "Bagaimana menghubungi rumah sakit?", 4).await;
        store.add_question(2, "Kapan jam besuk?", 29).await;
        store.add_question(3, "Pertanyaan tanpa jawaban", 8).await;

        let faq = store.fetch_faq().await.unwrap();
        assert_eq!(faq.len(), 2);
        assert_eq!(faq[0].question, "Bagaimana menghubungi rumah sakit?");
        assert_eq!(faq[0].answer, "Telepon (024) 6722565");
        assert_eq!(faq[1].answer_id, 29);
    }

    #[tokio::test]
    async fn name_and_health() {
        let store = InMemoryStore::default();
        assert_eq!(store.name(), "in_memory");
        assert!(store.health_check().await.unwrap());
    }
}

//! The chat pipeline: classify → fetch answers → resolve → format.
//!
//! Stateless per request. Every call re-reads the answer table, so edits to
//! the stored answers are visible without a restart.

use std::sync::Arc;

use aminochat_config::ChatConfig;
use aminochat_core::{AnswerSet, AnswerStore, Category, Error, FaqEntry, Provider, Result};
use tracing::{debug, info};

use crate::classifier;
use crate::formatter;
use crate::resolver::{Resolution, ResolutionPolicy, Resolver};

/// The reply to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub category: Category,
    /// HTML fragment, or the plain safety notice when generation was blocked
    pub response: String,
    pub safety_blocked: bool,
}

pub struct ChatService {
    store: Arc<dyn AnswerStore>,
    resolver: Resolver,
    safety_notice: String,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn AnswerStore>,
        provider: Arc<dyn Provider>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            resolver: Resolver::new(provider, ResolutionPolicy::from(config)),
            safety_notice: config.safety_notice.clone(),
        }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Answer one user message.
    ///
    /// Fails with [`Error::InvalidRequest`] for empty or whitespace-only
    /// input, [`Error::AnswerStoreUnavailable`] when the answer table can't
    /// be read, and [`Error::GenerationFailed`] when the model call fails.
    pub async fn handle_chat(&self, user_input: &str) -> Result<ChatReply> {
        if user_input.trim().is_empty() {
            return Err(Error::InvalidRequest("userInput must be a non-empty string".into()));
        }

        let category = classifier::classify(user_input);
        let answers = self.load_answers().await?;

        let reply = match self.resolver.resolve(category, &answers, user_input).await? {
            Resolution::Text(raw) => ChatReply {
                category,
                response: formatter::format(&raw),
                safety_blocked: false,
            },
            Resolution::SafetyBlocked => {
                info!(category = category.id(), "Generation blocked by safety filter");
                ChatReply {
                    category,
                    response: self.safety_notice.clone(),
                    safety_blocked: true,
                }
            }
        };

        debug!(
            category = reply.category.id(),
            response_len = reply.response.len(),
            "Chat reply ready"
        );
        Ok(reply)
    }

    /// Every stored question with its answer.
    pub async fn faq(&self) -> Result<Vec<FaqEntry>> {
        Ok(self.store.fetch_faq().await?)
    }

    async fn load_answers(&self) -> Result<AnswerSet> {
        let records = self.store.fetch_answers().await?;
        debug!(store = self.store.name(), count = records.len(), "Answers loaded");
        Ok(AnswerSet::from_records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aminochat_core::{AnswerRecord, Generation, GenerationRequest, ProviderError, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStore {
        records: Vec<AnswerRecord>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedStore {
        fn new(records: Vec<AnswerRecord>) -> Arc<Self> {
            Arc::new(Self {
                records,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                records: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AnswerStore for FixedStore {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_answers(&self) -> std::result::Result<Vec<AnswerRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Connection("connection refused".into()));
            }
            Ok(self.records.clone())
        }
    }

    struct ScriptedProvider {
        outcome: std::result::Result<Generation, ProviderError>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn new(outcome: std::result::Result<Generation, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> std::result::Result<Generation, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }

    fn records() -> Vec<AnswerRecord> {
        vec![
            AnswerRecord::new(Category::Greeting, "Halo! Ada yang bisa kami bantu?"),
            AnswerRecord::new(Category::Contact, "Hubungi **(024) 6722565**"),
            AnswerRecord::new(Category::GeneralInquiry, "Kesehatan mental adalah kondisi..."),
        ]
    }

    fn service(
        store: Arc<FixedStore>,
        provider: Arc<ScriptedProvider>,
    ) -> ChatService {
        ChatService::new(store, provider, &ChatConfig::default())
    }

    #[tokio::test]
    async fn greeting_returns_formatted_canned_answer() {
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(FixedStore::new(records()), provider.clone());

        let reply = svc.handle_chat("halo").await.unwrap();
        assert_eq!(reply.category, Category::Greeting);
        assert_eq!(reply.response, "<p>Halo! Ada yang bisa kami bantu?</p>");
        assert!(!reply.safety_blocked);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn canned_markdown_is_rendered() {
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(FixedStore::new(records()), provider);

        let reply = svc.handle_chat("alamat rumah sakit").await.unwrap();
        assert_eq!(reply.response, "<p>Hubungi <strong>(024) 6722565</strong></p>");
    }

    #[tokio::test]
    async fn open_ended_question_goes_to_model() {
        let provider = ScriptedProvider::new(Ok(Generation::Text(
            "Depresi adalah **gangguan suasana hati**.".into(),
        )));
        let svc = service(FixedStore::new(records()), provider.clone());

        let reply = svc.handle_chat("apa itu depresi").await.unwrap();
        assert_eq!(reply.category, Category::GeneralInquiry);
        assert_eq!(
            reply.response,
            "<p>Depresi adalah <strong>gangguan suasana hati</strong>.</p>"
        );

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user_input, "apa itu depresi");
        assert_eq!(seen[0].seed_context, "Kesehatan mental adalah kondisi...");
    }

    #[tokio::test]
    async fn unrecognized_input_gets_apology() {
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(FixedStore::new(records()), provider);

        let reply = svc.handle_chat("xyzzy").await.unwrap();
        assert_eq!(reply.category, Category::Unrecognized);
        let expected = formatter::format(&ChatConfig::default().unrecognized_message);
        assert_eq!(reply.response, expected);
    }

    #[tokio::test]
    async fn safety_block_returns_notice_unformatted() {
        let provider = ScriptedProvider::new(Ok(Generation::SafetyBlocked));
        let svc = service(FixedStore::new(records()), provider);

        let reply = svc.handle_chat("bagaimana cara menyakiti").await.unwrap();
        assert!(reply.safety_blocked);
        assert_eq!(
            reply.response,
            "Your request cannot be processed due to safety restrictions."
        );
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_any_io() {
        let store = FixedStore::new(records());
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(store.clone(), provider);

        for input in ["", "   ", "\n\t"] {
            let err = svc.handle_chat(input).await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)), "input: {input:?}");
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(FixedStore::failing(), provider);

        let err = svc.handle_chat("halo").await.unwrap_err();
        assert!(matches!(err, Error::AnswerStoreUnavailable(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let provider = ScriptedProvider::new(Err(ProviderError::RateLimited {
            retry_after_secs: 30,
        }));
        let svc = service(FixedStore::new(records()), provider);

        let err = svc.handle_chat("gejala depresi").await.unwrap_err();
        assert!(matches!(err, Error::GenerationFailed(ProviderError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn answers_are_reloaded_per_request() {
        let store = FixedStore::new(records());
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(store.clone(), provider);

        svc.handle_chat("halo").await.unwrap();
        svc.handle_chat("kontak").await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn faq_defaults_to_empty() {
        let provider = ScriptedProvider::new(Ok(Generation::Text("unused".into())));
        let svc = service(FixedStore::new(records()), provider);
        assert!(svc.faq().await.unwrap().is_empty());
    }
}

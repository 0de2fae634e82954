//! Category → response text.
//!
//! Decision order:
//! 1. [`Category::Unrecognized`] → fixed apology, stored answer ignored.
//! 2. [`Category::PleaseRepeat`] → fixed clarification prompt.
//! 3. id ≥ open-ended threshold → the language model, seeded with the
//!    canned answer (empty when none).
//! 4. otherwise → the canned answer verbatim, or `""` when there is none.
//!
//! The resolver never retries a failed generation.

use std::sync::Arc;

use aminochat_config::ChatConfig;
use aminochat_core::{AnswerSet, Category, Generation, GenerationRequest, Provider, Result};
use tracing::{debug, warn};

/// Policy knobs for the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPolicy {
    pub open_ended_threshold: u16,
    pub unrecognized_message: String,
    pub clarification_message: String,
}

impl From<&ChatConfig> for ResolutionPolicy {
    fn from(config: &ChatConfig) -> Self {
        Self {
            open_ended_threshold: config.open_ended_threshold,
            unrecognized_message: config.unrecognized_message.clone(),
            clarification_message: config.clarification_message.clone(),
        }
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl ResolutionPolicy {
    /// Whether a category is answered by the language model.
    pub fn is_open_ended(&self, category: Category) -> bool {
        category.id() >= self.open_ended_threshold
    }
}

/// What the resolver will do for a category, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    /// A fixed system message
    Fixed(&'a str),
    /// The canned answer as-is (empty when the table has no row)
    Canned(&'a str),
    /// Ask the model, seeded with the canned answer
    Generate { seed: &'a str },
}

/// The raw outcome of resolution, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Text(String),
    SafetyBlocked,
}

pub struct Resolver {
    provider: Arc<dyn Provider>,
    policy: ResolutionPolicy,
}

impl Resolver {
    pub fn new(provider: Arc<dyn Provider>, policy: ResolutionPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Pick the branch for `category` without calling anything.
    pub fn decide<'a>(&'a self, category: Category, answers: &'a AnswerSet) -> Decision<'a> {
        match category {
            Category::Unrecognized => Decision::Fixed(&self.policy.unrecognized_message),
            Category::PleaseRepeat => Decision::Fixed(&self.policy.clarification_message),
            c if self.policy.is_open_ended(c) => Decision::Generate {
                seed: answers.text(c).unwrap_or_default(),
            },
            c => {
                let text = answers.text(c);
                if text.is_none() {
                    warn!(category = c.id(), "No canned answer stored for category");
                }
                Decision::Canned(text.unwrap_or_default())
            }
        }
    }

    /// Produce the raw response for a classified message.
    pub async fn resolve(
        &self,
        category: Category,
        answers: &AnswerSet,
        user_input: &str,
    ) -> Result<Resolution> {
        match self.decide(category, answers) {
            Decision::Fixed(text) | Decision::Canned(text) => Ok(Resolution::Text(text.to_string())),
            Decision::Generate { seed } => {
                debug!(
                    category = category.id(),
                    provider = self.provider.name(),
                    seeded = !seed.is_empty(),
                    "Generating open-ended answer"
                );
                let request = GenerationRequest::new(user_input, seed);
                match self.provider.generate(request).await? {
                    Generation::Text(text) => Ok(Resolution::Text(text)),
                    Generation::SafetyBlocked => Ok(Resolution::SafetyBlocked),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aminochat_core::{AnswerRecord, Error, ProviderError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requests and replies with a fixed outcome.
    struct StubProvider {
        outcome: std::result::Result<Generation, ProviderError>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl StubProvider {
        fn new(outcome: std::result::Result<Generation, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> std::result::Result<Generation, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }

    fn answers() -> AnswerSet {
        AnswerSet::from_records(vec![
            AnswerRecord::new(Category::Greeting, "Halo! Ada yang bisa kami bantu?"),
            AnswerRecord::new(Category::Unrecognized, "stored text that must be ignored"),
            AnswerRecord::new(Category::GeneralInquiry, "Kesehatan mental adalah..."),
        ])
    }

    fn resolver(provider: Arc<StubProvider>) -> Resolver {
        Resolver::new(provider, ResolutionPolicy::default())
    }

    #[tokio::test]
    async fn unrecognized_ignores_stored_answer() {
        let provider = StubProvider::new(Ok(Generation::Text("model".into())));
        let r = resolver(provider.clone());
        let out = r.resolve(Category::Unrecognized, &answers(), "xyzzy").await.unwrap();
        assert_eq!(out, Resolution::Text(ResolutionPolicy::default().unrecognized_message));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn please_repeat_returns_clarification() {
        let provider = StubProvider::new(Ok(Generation::Text("model".into())));
        let r = resolver(provider.clone());
        let out = r.resolve(Category::PleaseRepeat, &answers(), "??").await.unwrap();
        assert_eq!(
            out,
            Resolution::Text("Maaf, apakah anda bisa mengulangi pertanyaan anda?".into())
        );
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn simple_category_returns_canned_answer() {
        let provider = StubProvider::new(Ok(Generation::Text("model".into())));
        let r = resolver(provider.clone());
        let out = r.resolve(Category::Greeting, &answers(), "halo").await.unwrap();
        assert_eq!(out, Resolution::Text("Halo! Ada yang bisa kami bantu?".into()));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn simple_category_without_answer_is_empty() {
        let provider = StubProvider::new(Ok(Generation::Text("model".into())));
        let r = resolver(provider);
        let out = r.resolve(Category::DoctorSchedule, &answers(), "jadwal dokter").await.unwrap();
        assert_eq!(out, Resolution::Text(String::new()));
    }

    #[tokio::test]
    async fn open_ended_uses_generated_text_with_seed() {
        let provider = StubProvider::new(Ok(Generation::Text("Jawaban dari model".into())));
        let r = resolver(provider.clone());
        let out = r
            .resolve(Category::GeneralInquiry, &answers(), "apa itu kesehatan mental")
            .await
            .unwrap();
        assert_eq!(out, Resolution::Text("Jawaban dari model".into()));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_input, "apa itu kesehatan mental");
        assert_eq!(requests[0].seed_context, "Kesehatan mental adalah...");
    }

    #[tokio::test]
    async fn open_ended_without_answer_sends_empty_seed() {
        let provider = StubProvider::new(Ok(Generation::Text("ok".into())));
        let r = resolver(provider.clone());
        r.resolve(Category::Farewell, &answers(), "terima kasih").await.unwrap();
        assert_eq!(provider.requests()[0].seed_context, "");
    }

    #[tokio::test]
    async fn safety_block_is_propagated_as_variant() {
        let provider = StubProvider::new(Ok(Generation::SafetyBlocked));
        let r = resolver(provider);
        let out = r.resolve(Category::Treatment, &answers(), "obat").await.unwrap();
        assert_eq!(out, Resolution::SafetyBlocked);
    }

    #[tokio::test]
    async fn provider_failure_is_generation_failed() {
        let provider = StubProvider::new(Err(ProviderError::Network("connection reset".into())));
        let r = resolver(provider.clone());
        let err = r.resolve(Category::Caregiving, &answers(), "keluarga").await.unwrap_err();
        assert!(matches!(err, Error::GenerationFailed(ProviderError::Network(_))));
        assert_eq!(provider.requests().len(), 1, "no retry");
    }

    #[test]
    fn threshold_is_configurable() {
        let provider = StubProvider::new(Ok(Generation::Text("x".into())));
        let policy = ResolutionPolicy {
            open_ended_threshold: 13,
            ..ResolutionPolicy::default()
        };
        let r = Resolver::new(provider, policy);
        let set = answers();
        assert_eq!(
            r.decide(Category::GeneralInquiry, &set),
            Decision::Canned("Kesehatan mental adalah...")
        );
        assert_eq!(r.decide(Category::Registration, &set), Decision::Generate { seed: "" });
    }

    #[test]
    fn reserved_categories_win_over_threshold() {
        let provider = StubProvider::new(Ok(Generation::Text("x".into())));
        let r = resolver(provider);
        let set = answers();
        assert!(matches!(r.decide(Category::Unrecognized, &set), Decision::Fixed(_)));
        assert!(matches!(r.decide(Category::PleaseRepeat, &set), Decision::Fixed(_)));
    }
}

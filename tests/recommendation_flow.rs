//! Integration test: end-to-end recommendation flow
//!
//! Runs the orchestrator against a deterministic stub embedder and a mock
//! generation client, verifying the assembled prompt, the audit record, and
//! the unknown-customer path.

use compass::config::Config;
use compass::embedding::{EmbeddingError, EmbeddingProvider};
use compass::error::CompassError;
use compass::knowledge::KnowledgeBase;
use compass::llm::{GenerationClient, GenerationError, GenerationRequest};
use compass::profile::{CustomerProfile, ProfileStore};
use compass::recommend::{Recommender, Resources};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const DELIMITER: &str = "---";
const MOCK_REPLY: &str = "The Savings Account is the best fit for this customer.";

struct StubEmbedder {
    dimension: usize,
}

impl EmbeddingProvider for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }
        let mut vector = vec![0.0f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[(i + byte as usize) % self.dimension] += (byte % 17) as f32 / 16.0;
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

/// Generation client that records every request instead of calling out
#[derive(Default)]
struct MockGenerationClient {
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

#[async_trait::async_trait]
impl GenerationClient for MockGenerationClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(MOCK_REPLY.to_string())
    }
}

fn sample_profile() -> CustomerProfile {
    CustomerProfile {
        customer_id: 1,
        age: 30,
        income: 60000.0,
        credit_score: 700,
        debt_to_income_ratio: 0.3,
        existing_products: "Checking Account".to_string(),
        product_count: 1,
        engagement_score: 20,
        employment_status: "Employed".to_string(),
    }
}

fn setup(
    temp: &TempDir,
    documents: &[&str],
) -> (Recommender, Arc<MockGenerationClient>) {
    let mut config = Config::default();
    config.storage.data_dir = temp.path().join("data");
    config.knowledge_base.path = temp.path().join("products.txt");
    config.knowledge_base.delimiter = DELIMITER.to_string();

    std::fs::write(
        &config.knowledge_base.path,
        documents.join(&format!("\n{}\n", DELIMITER)),
    )
    .unwrap();

    let knowledge =
        KnowledgeBase::load(&config.knowledge_base.path, &config.knowledge_base.delimiter)
            .unwrap();
    let provider = Arc::new(StubEmbedder { dimension: 8 });
    let resources =
        Arc::new(Resources::assemble(&config, knowledge, provider, false).unwrap());

    let profiles = Arc::new(ProfileStore::from_profiles(vec![sample_profile()]));
    let client = Arc::new(MockGenerationClient::default());

    let recommender = Recommender::new(
        resources,
        profiles,
        client.clone(),
        config.llm.model.clone(),
        config.llm.temperature,
        config.retrieval.top_k,
    );

    (recommender, client)
}

#[tokio::test]
async fn end_to_end_recommendation() {
    let temp = TempDir::new().unwrap();
    let (recommender, client) = setup(
        &temp,
        &[
            "Savings Account: earns interest on deposits.",
            "Credit Card: revolving credit line with rewards.",
            "Mortgage: long-term home financing.",
        ],
    );

    let recommendation = recommender.recommend(1).await.unwrap();

    // The rendered query embeds every profile field value
    for needle in [
        "Age 30",
        "$60000",
        "Credit score is 700",
        "Debt-to-income ratio is 0.30",
        "Holds 1 products",
        "Checking Account",
        "Digital engagement score is 20",
        "Employment status: Employed",
    ] {
        assert!(
            recommendation.query.contains(needle),
            "query missing {:?}: {}",
            needle,
            recommendation.query
        );
    }

    // Exactly 3 documents, ascending distance
    assert_eq!(recommendation.documents.len(), 3);
    for pair in recommendation.documents.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }

    // The dispatched prompt contains the query followed by the retrieved
    // texts in retrieval order
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    let request = client.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.model, "llama3-8b-8192");
    assert_eq!(request.temperature, 0.5);

    let query_at = request.prompt.find(&recommendation.query).unwrap();
    let mut previous = query_at;
    for doc in &recommendation.documents {
        let at = request.prompt.find(&doc.text).unwrap();
        assert!(at > previous, "documents out of order in prompt");
        previous = at;
    }

    assert_eq!(recommendation.text, MOCK_REPLY);
    assert_eq!(recommendation.customer_id, 1);
}

#[tokio::test]
async fn unknown_customer_dispatches_nothing() {
    let temp = TempDir::new().unwrap();
    let (recommender, client) = setup(&temp, &["Savings Account", "Credit Card", "Mortgage"]);

    let result = recommender.recommend(999).await;

    match result {
        Err(CompassError::CustomerNotFound { id }) => assert_eq!(id, 999),
        other => panic!("expected CustomerNotFound, got {:?}", other.map(|r| r.text)),
    }

    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn small_corpus_degrades_gracefully() {
    let temp = TempDir::new().unwrap();
    // Fewer documents than the configured retrieval depth
    let (recommender, client) = setup(&temp, &["Savings Account", "Credit Card"]);

    let recommendation = recommender.recommend(1).await.unwrap();

    assert_eq!(recommendation.documents.len(), 2);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retrieval_only_search_never_calls_generation() {
    let temp = TempDir::new().unwrap();
    let (recommender, client) = setup(&temp, &["Savings Account", "Credit Card", "Mortgage"]);

    let results = recommender.search("interest on deposits", 2).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

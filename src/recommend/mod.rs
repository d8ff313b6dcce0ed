//! Recommendation orchestration
//!
//! Coordinates the full pipeline for one request: profile lookup, query
//! rendering, embedding, nearest-neighbor retrieval, prompt assembly, and
//! dispatch to the generation service. The retrieved documents ride along on
//! the result for auditability.

mod resources;

pub use resources::{ResourceCell, Resources};

use crate::error::{CompassError, Result};
use crate::llm::{GenerationClient, GenerationRequest};
use crate::profile::ProfileStore;
use crate::query::render_profile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// A retrieved document in retrieval order (closest first)
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDocument {
    /// Position in the corpus (== document id)
    pub position: usize,
    /// Squared Euclidean distance from the query embedding
    pub distance: f32,
    pub text: String,
}

/// The outcome of one recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Request id, for audit trails
    pub id: Uuid,
    pub customer_id: u64,
    /// The rendered profile text used as the retrieval query
    pub query: String,
    /// Retrieved documents, closest first, exactly as given to the model
    pub documents: Vec<RetrievedDocument>,
    /// Generated recommendation text
    pub text: String,
    /// Generation model that produced the text
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// Orchestrates recommendation requests over shared, read-only resources
pub struct Recommender {
    resources: Arc<Resources>,
    profiles: Arc<ProfileStore>,
    client: Arc<dyn GenerationClient>,
    model: String,
    temperature: f32,
    top_k: usize,
}

impl Recommender {
    pub fn new(
        resources: Arc<Resources>,
        profiles: Arc<ProfileStore>,
        client: Arc<dyn GenerationClient>,
        model: impl Into<String>,
        temperature: f32,
        top_k: usize,
    ) -> Self {
        Self {
            resources,
            profiles,
            client,
            model: model.into(),
            temperature,
            top_k,
        }
    }

    /// Produce a recommendation for the given customer
    pub async fn recommend(&self, customer_id: u64) -> Result<Recommendation> {
        let profile = self
            .profiles
            .get(customer_id)
            .ok_or(CompassError::CustomerNotFound { id: customer_id })?;

        let query = render_profile(profile);
        tracing::debug!(customer_id, %query, "Rendered retrieval query");

        let documents = self.resources.search(&query, self.top_k)?;

        let prompt = assemble_prompt(&query, &documents);
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt,
            temperature: self.temperature,
        };

        let text = self.client.complete(&request).await?;

        tracing::info!(
            customer_id,
            retrieved = documents.len(),
            "Generated recommendation"
        );

        Ok(Recommendation {
            id: Uuid::new_v4(),
            customer_id,
            query,
            documents,
            text,
            model: self.model.clone(),
            generated_at: Utc::now(),
        })
    }

    /// Retrieval-only search over the knowledge base (no generation call)
    pub fn search(&self, text: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        self.resources.search(text, k)
    }
}

/// Assemble the generation prompt: role instruction, rendered profile, then
/// the retrieved documents in retrieval order
///
/// Document order is preserved verbatim; it signals relative relevance to
/// the generation model.
pub fn assemble_prompt(query: &str, documents: &[RetrievedDocument]) -> String {
    let mut product_list = String::new();
    for (i, document) in documents.iter().enumerate() {
        product_list.push_str(&format!("{}. {}\n", i + 1, document.text));
    }

    format!(
        "You are an expert banking relationship manager. Your task is to recommend \
         the single best product for a customer based on their profile and a list of \
         relevant products.\n\n\
         **Customer Profile:**\n\
         {}\n\n\
         **Relevant Products (from our knowledge base):**\n\
         {}\n\
         **Your Task:**\n\
         Based on all of this information, what is the single best product to recommend \
         to this customer?\n\
         Provide a concise, one-paragraph justification explaining *why* it's the best \
         fit, referencing the customer's profile.\n\n\
         **Recommendation:**",
        query, product_list
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents() -> Vec<RetrievedDocument> {
        vec![
            RetrievedDocument {
                position: 2,
                distance: 0.1,
                text: "Savings Account: earns interest on deposits.".to_string(),
            },
            RetrievedDocument {
                position: 0,
                distance: 0.4,
                text: "Credit Card: revolving credit line.".to_string(),
            },
            RetrievedDocument {
                position: 1,
                distance: 0.9,
                text: "Mortgage: long-term home financing.".to_string(),
            },
        ]
    }

    #[test]
    fn test_prompt_contains_query_then_documents_in_order() {
        let query = "Customer profile: Age 30.";
        let prompt = assemble_prompt(query, &documents());

        let query_at = prompt.find(query).unwrap();
        let first = prompt.find("1. Savings Account").unwrap();
        let second = prompt.find("2. Credit Card").unwrap();
        let third = prompt.find("3. Mortgage").unwrap();

        assert!(query_at < first);
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn test_prompt_keeps_role_instruction_first() {
        let prompt = assemble_prompt("query", &documents());
        assert!(prompt.starts_with("You are an expert banking relationship manager."));
        assert!(prompt.ends_with("**Recommendation:**"));
    }

    #[test]
    fn test_prompt_enumerates_fewer_documents_gracefully() {
        let docs = documents()[..1].to_vec();
        let prompt = assemble_prompt("query", &docs);
        assert!(prompt.contains("1. Savings Account"));
        assert!(!prompt.contains("2. "));
    }
}

//! Process-wide recommendation resources
//!
//! The embedding model and vector index are expensive to create and strictly
//! read-only after initialization. `Resources::open` applies the
//! build-or-load policy once; `ResourceCell` guards that initialization so
//! concurrent first callers share a single handle instead of racing.

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, FastEmbedProvider, IndexError, VectorIndex};
use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::recommend::RetrievedDocument;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Shared, read-only handle over the embedding model, vector index, and
/// parsed corpus
pub struct Resources {
    pub provider: Arc<dyn EmbeddingProvider>,
    pub index: Arc<VectorIndex>,
    pub knowledge: Arc<KnowledgeBase>,
}

impl Resources {
    /// Open resources with the build-or-load policy
    ///
    /// If a persisted index artifact exists and matches the corpus (digest
    /// and vector count both agree), it is loaded; otherwise the corpus is
    /// embedded from scratch, the index persisted, and the fresh pair
    /// returned. The artifact and corpus are only ever used together.
    pub fn open(config: &Config) -> Result<Self> {
        let knowledge = KnowledgeBase::load(&config.knowledge_base.path, &config.knowledge_base.delimiter)?;
        let provider = FastEmbedProvider::new(&config.embedding.model)?;
        Self::assemble(config, knowledge, Arc::new(provider), false)
    }

    /// Open resources, discarding any persisted artifact
    pub fn rebuild(config: &Config) -> Result<Self> {
        let knowledge = KnowledgeBase::load(&config.knowledge_base.path, &config.knowledge_base.delimiter)?;
        let provider = FastEmbedProvider::new(&config.embedding.model)?;
        Self::assemble(config, knowledge, Arc::new(provider), true)
    }

    /// Build-or-load with an injected provider (tests use a deterministic
    /// stub here)
    pub fn assemble(
        config: &Config,
        knowledge: KnowledgeBase,
        provider: Arc<dyn EmbeddingProvider>,
        force_rebuild: bool,
    ) -> Result<Self> {
        let index_path = config.index_path();

        if !force_rebuild && index_path.exists() {
            match VectorIndex::load(&index_path) {
                Ok((index, digest)) => {
                    if &digest == knowledge.digest() && index.len() == knowledge.len() {
                        return Ok(Self {
                            provider,
                            index: Arc::new(index),
                            knowledge: Arc::new(knowledge),
                        });
                    }
                    tracing::warn!(
                        "Index artifact at {} does not match the corpus, rebuilding",
                        index_path.display()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load index artifact at {}: {}, rebuilding",
                        index_path.display(),
                        e
                    );
                }
            }
        }

        tracing::info!("Building vector index for {} documents", knowledge.len());

        let texts = knowledge.texts();
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(config.embedding.batch_size) {
            vectors.extend(provider.embed_batch(chunk)?);
        }

        let index = VectorIndex::build(&vectors)?;
        index.persist(&index_path, knowledge.digest())?;

        Ok(Self {
            provider,
            index: Arc::new(index),
            knowledge: Arc::new(knowledge),
        })
    }

    /// Embed `text` and retrieve the `k` nearest documents, closest first
    pub fn search(&self, text: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        let embedding = self.provider.embed(text)?;
        let neighbors = self.index.search(&embedding, k)?;

        neighbors
            .into_iter()
            .map(|neighbor| {
                let document = self.knowledge.get(neighbor.position).ok_or_else(|| {
                    IndexError::CorpusMismatch(format!(
                        "Vector position {} has no corpus document",
                        neighbor.position
                    ))
                })?;
                Ok(RetrievedDocument {
                    position: neighbor.position,
                    distance: neighbor.distance,
                    text: document.text.clone(),
                })
            })
            .collect()
    }

}

/// One-time initialization guard for `Resources`
///
/// Hosts that serve concurrent requests create one cell at startup and pass
/// it into every request path; the first caller pays the initialization
/// cost, later and concurrent callers await it and then share the same
/// `Arc<Resources>`.
#[derive(Default)]
pub struct ResourceCell {
    cell: OnceCell<Arc<Resources>>,
}

impl ResourceCell {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Get the shared resources, initializing them on first call
    pub async fn get_or_open(&self, config: &Config) -> Result<Arc<Resources>> {
        let resources = self
            .cell
            .get_or_try_init(|| async { Resources::open(config).map(Arc::new) })
            .await?;
        Ok(Arc::clone(resources))
    }
}

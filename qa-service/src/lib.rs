//! Question answering over the post corpus.
//!
//! A [`QueryEngine`] is built once per process: every post is flattened into a
//! [`Document`], embedded and stored in the vector index. Each query then
//! embeds the question, retrieves the nearest documents and hands them to the
//! generator. Retrieved documents are passed through untouched and their URLs
//! are returned as sources.

use embedding_engine::{BertEmbedder, Embedder, InMemoryIndex, VectorIndex};
use llm_interface::{Generator, OpenAiCompatibleGenerator};
use solefacts_core::{
    AppConfig, CoreError, Document, DocumentRef, ErrorRecovery, Post, QueryResponse, SourceRef,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const PROGRESS_EVERY: usize = 100;

pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    index: Box<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl QueryEngine {
    /// Embeds every post into `index`. Fails on the first embedding or index error.
    pub fn build(
        posts: &[Post],
        embedder: Arc<dyn Embedder>,
        mut index: Box<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Result<Self, CoreError> {
        if top_k == 0 {
            return Err(CoreError::invalid_input("top_k must be at least 1"));
        }

        let started = Instant::now();
        info!(
            "Indexing {} posts with {}",
            posts.len(),
            embedder.model_name()
        );

        for (id, post) in posts.iter().enumerate() {
            let document = Document::from_post(id, post);
            let vector = embedder.embed(&document.text)?;
            index.insert(document, vector)?;

            if (id + 1) % PROGRESS_EVERY == 0 {
                debug!("Indexed {}/{} posts", id + 1, posts.len());
            }
        }

        info!(
            "Indexed {} documents in {:.1?}",
            index.len(),
            started.elapsed()
        );

        Ok(Self {
            embedder,
            index,
            generator,
            top_k,
        })
    }

    /// Loads the configured embedding model and generator, then indexes `posts`.
    pub fn from_config(config: &AppConfig, posts: &[Post]) -> Result<Self, CoreError> {
        let embedder = BertEmbedder::load(&config.embedding_model)?;
        let index = InMemoryIndex::with_dimension(embedder.dimension());
        let generator = OpenAiCompatibleGenerator::from_config(config)?;

        Self::build(
            posts,
            Arc::new(embedder),
            Box::new(index),
            Arc::new(generator),
            config.top_k,
        )
    }

    /// Runs [`QueryEngine::from_config`] on the blocking thread pool.
    pub async fn build_in_background(
        config: AppConfig,
        posts: Arc<Vec<Post>>,
    ) -> Result<Self, CoreError> {
        tokio::task::spawn_blocking(move || Self::from_config(&config, &posts))
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("index build task failed: {}", e),
            })?
    }

    /// The `top_k` documents nearest to `question`. Embedding runs on the blocking pool.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<DocumentRef>, CoreError> {
        let embedder = Arc::clone(&self.embedder);
        let text = question.to_string();
        let vector = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("query embedding task failed: {}", e),
            })??;

        self.index.top_k(&vector, self.top_k)
    }

    pub async fn query(&self, question: &str) -> Result<QueryResponse, CoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CoreError::invalid_input("question is empty"));
        }

        info!("Answering question: {}", question);
        let documents = self.retrieve(question).await?;
        debug!("Retrieved {} documents", documents.len());

        let generator = &self.generator;
        let docs = &documents;
        let answer = ErrorRecovery::run(|| generator.answer(question, docs))
            .await
            .into_result()?;

        let sources = documents
            .iter()
            .map(|r| SourceRef {
                url: r.document.url.clone(),
                score: r.score,
            })
            .collect();

        Ok(QueryResponse { answer, sources })
    }

    pub fn document_count(&self) -> usize {
        self.index.len()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("embedder", &self.embedder.model_name())
            .field("generator", &self.generator.name())
            .field("model", &self.generator.model())
            .field("documents", &self.index.len())
            .field("top_k", &self.top_k)
            .finish()
    }
}

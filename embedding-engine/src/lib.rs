pub mod bert;
pub mod index;

pub use bert::BertEmbedder;
pub use index::{cosine_similarity, InMemoryIndex};

use solefacts_core::{CoreError, Document, DocumentRef};

/// Turns text into a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError>;

    /// Length of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Nearest-neighbour lookup over embedded documents.
pub trait VectorIndex: Send + Sync {
    fn insert(&mut self, document: Document, vector: Vec<f32>) -> Result<(), CoreError>;

    /// The `k` most similar documents, most similar first.
    fn top_k(&self, vector: &[f32], k: usize) -> Result<Vec<DocumentRef>, CoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

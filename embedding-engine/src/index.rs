use crate::VectorIndex;
use solefacts_core::{CoreError, Document, DocumentRef, IndexError};

/// Brute-force cosine index held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    dimension: Option<usize>,
    entries: Vec<(Document, Vec<f32>)>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An index that only accepts vectors of length `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            entries: Vec::new(),
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, actual: usize) -> Result<(), IndexError> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(IndexError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

impl VectorIndex for InMemoryIndex {
    fn insert(&mut self, document: Document, vector: Vec<f32>) -> Result<(), CoreError> {
        if vector.is_empty() {
            return Err(IndexError::EmptyVector.into());
        }
        self.check_dimension(vector.len())?;
        self.dimension = Some(vector.len());
        self.entries.push((document, vector));
        Ok(())
    }

    fn top_k(&self, vector: &[f32], k: usize) -> Result<Vec<DocumentRef>, CoreError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(vector.len())?;

        let mut scored: Vec<(f32, &Document)> = self
            .entries
            .iter()
            .map(|(document, stored)| (cosine_similarity(vector, stored), document))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, document)| DocumentRef {
                document: document.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cosine similarity (normalized dot product)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solefacts_core::Tags;

    fn doc(id: usize, url: &str) -> Document {
        Document {
            id,
            text: format!("document {id}"),
            url: url.to_string(),
            tags: Tags::default(),
        }
    }

    fn urls(refs: &[DocumentRef]) -> Vec<&str> {
        refs.iter().map(|r| r.document.url.as_str()).collect()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < f32::EPSILON);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_top_k_orders_by_similarity() {
        let mut index = InMemoryIndex::new();
        index.insert(doc(0, "far"), vec![0.0, 1.0]).unwrap();
        index.insert(doc(1, "near"), vec![1.0, 0.1]).unwrap();
        index.insert(doc(2, "middle"), vec![1.0, 1.0]).unwrap();

        let hits = index.top_k(&[1.0, 0.0], 2).unwrap();
        assert_eq!(urls(&hits), vec!["near", "middle"]);
        assert!(hits[0].score > hits[1].score);

        let all = index.top_k(&[1.0, 0.0], 10).unwrap();
        assert_eq!(urls(&all), vec!["near", "middle", "far"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = InMemoryIndex::new();
        for (i, url) in ["first", "second", "third"].iter().enumerate() {
            index.insert(doc(i, url), vec![0.5, 0.5]).unwrap();
        }
        let hits = index.top_k(&[1.0, 1.0], 3).unwrap();
        assert_eq!(urls(&hits), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_index_and_zero_k() {
        let mut index = InMemoryIndex::new();
        assert!(index.top_k(&[1.0], 5).unwrap().is_empty());

        index.insert(doc(0, "only"), vec![1.0]).unwrap();
        assert!(index.top_k(&[1.0], 0).unwrap().is_empty());
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_dimension_is_enforced() {
        let mut index = InMemoryIndex::with_dimension(3);
        let err = index.insert(doc(0, "x"), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Index(IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));

        index.insert(doc(0, "x"), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(index.top_k(&[1.0], 1).is_err());
        assert!(matches!(
            index.insert(doc(1, "y"), Vec::new()).unwrap_err(),
            CoreError::Index(IndexError::EmptyVector)
        ));
    }
}

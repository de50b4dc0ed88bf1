use serde::{Deserialize, Serialize};

/// Precomputed attributes extracted from a post by the offline tagger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    pub model_mentions: Vec<String>,
    pub feature_mentions: Vec<String>,
    pub user_type: Vec<String>,
    /// Raw sentiment in `[-1, 1]`; `None` when the tagger produced no score.
    pub sentiment: Option<f64>,
}

impl Tags {
    /// Sentiment used for threshold comparisons. A missing score counts as neutral.
    pub fn sentiment_score(&self) -> f64 {
        self.sentiment.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub selftext: String,
    pub comments: Vec<String>,
    pub url: String,
    pub tags: Tags,
}

/// One row of a filter search. `score` is the post's raw sentiment, not a relevance rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub tags: Tags,
    pub score: Option<f64>,
}

impl From<&Post> for SearchResult {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            url: post.url.clone(),
            tags: post.tags.clone(),
            score: post.tags.sentiment,
        }
    }
}

/// A post flattened into embeddable text plus the metadata needed for citation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: usize,
    pub text: String,
    pub url: String,
    pub tags: Tags,
}

impl Document {
    /// Joins title, body and comments with blank lines between them.
    pub fn from_post(id: usize, post: &Post) -> Self {
        let mut chunks: Vec<&str> = Vec::with_capacity(post.comments.len() + 2);
        chunks.push(&post.title);
        chunks.push(&post.selftext);
        chunks.extend(post.comments.iter().map(String::as_str));

        Self {
            id,
            text: chunks.join("\n\n"),
            url: post.url.clone(),
            tags: post.tags.clone(),
        }
    }
}

/// A retrieved document and its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    pub document: Document,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub url: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

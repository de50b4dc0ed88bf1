use solefacts_core::{CoreError, Post, SearchResult, Tags};
use std::str::FromStr;
use tracing::{debug, info};

pub const POSITIVE_THRESHOLD: f64 = 0.5;
pub const NEGATIVE_THRESHOLD: f64 = -0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentFilter {
    Positive,
    Negative,
}

impl SentimentFilter {
    pub fn matches(self, tags: &Tags) -> bool {
        let score = tags.sentiment_score();
        match self {
            SentimentFilter::Positive => score >= POSITIVE_THRESHOLD,
            SentimentFilter::Negative => score <= NEGATIVE_THRESHOLD,
        }
    }
}

impl FromStr for SentimentFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "+" => Ok(SentimentFilter::Positive),
            "negative" | "-" => Ok(SentimentFilter::Negative),
            other => Err(CoreError::invalid_input(format!(
                "sentiment must be 'positive' or 'negative', got '{}'",
                other
            ))),
        }
    }
}

/// Optional tag filters. Text filters are stored case-folded; unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    model: Option<String>,
    feature: Option<String>,
    user_type: Option<String>,
    sentiment: Option<SentimentFilter>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl AsRef<str>) -> Self {
        self.model = fold(model.as_ref());
        self
    }

    pub fn with_feature(mut self, feature: impl AsRef<str>) -> Self {
        self.feature = fold(feature.as_ref());
        self
    }

    pub fn with_user_type(mut self, user_type: impl AsRef<str>) -> Self {
        self.user_type = fold(user_type.as_ref());
        self
    }

    pub fn with_sentiment(mut self, sentiment: SentimentFilter) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    pub fn user_type(&self) -> Option<&str> {
        self.user_type.as_deref()
    }

    pub fn sentiment(&self) -> Option<SentimentFilter> {
        self.sentiment
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.feature.is_none()
            && self.user_type.is_none()
            && self.sentiment.is_none()
    }

    /// True when the post satisfies every filter that is set.
    pub fn matches(&self, post: &Post) -> bool {
        let tags = &post.tags;
        contains_folded(&tags.model_mentions, self.model.as_deref())
            && contains_folded(&tags.feature_mentions, self.feature.as_deref())
            && contains_folded(&tags.user_type, self.user_type.as_deref())
            && self.sentiment.map_or(true, |s| s.matches(tags))
    }
}

/// Filter values come from a free-text box, so surrounding whitespace is
/// dropped and a blank value leaves the filter unset.
fn fold(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn contains_folded(values: &[String], needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => values.iter().any(|v| v.to_lowercase() == needle),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    /// Number of posts that matched, before truncation.
    pub found: usize,
    /// At most `limit` matches, in corpus order.
    pub results: Vec<SearchResult>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.found > self.results.len()
    }
}

/// Every matching post, in corpus order.
pub fn matching_posts<'a>(
    posts: &'a [Post],
    filters: &'a SearchFilters,
) -> impl Iterator<Item = &'a Post> + 'a {
    posts.iter().filter(move |post| filters.matches(post))
}

pub fn search_posts(posts: &[Post], filters: &SearchFilters, limit: usize) -> SearchResults {
    let mut found = 0;
    let mut results = Vec::with_capacity(limit.min(posts.len()));

    for post in matching_posts(posts, filters) {
        if found < limit {
            results.push(SearchResult::from(post));
        }
        found += 1;
    }

    info!("Found {} matching posts", found);
    for (i, result) in results.iter().enumerate() {
        debug!(
            "{}. {} | tags: {:?} | url: {}",
            i + 1,
            result.title,
            result.tags,
            result.url
        );
    }

    SearchResults { found, results }
}

pub mod loader;
pub mod query;
pub mod search;

#[cfg(test)]
mod tests;

pub use loader::{load_posts, parse_posts, Corpus};
pub use query::parse_filter_query;
pub use search::{matching_posts, search_posts, SearchFilters, SearchResults, SentimentFilter};

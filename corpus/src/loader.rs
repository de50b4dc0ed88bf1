//! Loading the tagged post file.
//!
//! Every record is normalised to the full [`Post`] schema here: missing,
//! `null` or wrongly typed fields become empty strings, empty collections or an
//! absent sentiment, so the search code never has to look anything up
//! defensively. Wrongly typed values are logged with the record index. Only a
//! top level that is not an array, or `tags` that are not an object, fail the
//! load.

use serde_json::{Map, Value};
use solefacts_core::{CoreError, DataLoadError, Post, Tags};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The read-only post collection, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Corpus {
    source: PathBuf,
    posts: Vec<Post>,
}

impl Corpus {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let posts = load_posts(path)?;
        Ok(Self {
            source: path.to_path_buf(),
            posts,
        })
    }

    pub fn from_posts(posts: Vec<Post>) -> Self {
        Self {
            source: PathBuf::new(),
            posts,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

pub fn load_posts(path: &Path) -> Result<Vec<Post>, CoreError> {
    let path_str = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DataLoadError::FileNotFound {
                path: path_str.clone(),
            }
        } else {
            DataLoadError::Unreadable {
                path: path_str.clone(),
                reason: e.to_string(),
            }
        }
    })?;

    let value: Value = serde_json::from_str(&raw).map_err(|e| DataLoadError::InvalidJson {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;

    let posts = parse_posts(value)?;
    info!("Loaded {} posts from {}", posts.len(), path_str);
    Ok(posts)
}

/// Normalises an already-parsed JSON document into posts.
pub fn parse_posts(value: Value) -> Result<Vec<Post>, CoreError> {
    let records = match value {
        Value::Array(records) => records,
        other => {
            return Err(DataLoadError::NotASequence {
                found: json_kind(&other).to_string(),
            }
            .into())
        }
    };

    let mut posts = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if let Some(post) = normalize_record(index, record)? {
            posts.push(post);
        }
    }
    Ok(posts)
}

/// `None` for a record that is not an object; it carries nothing to show.
fn normalize_record(index: usize, record: Value) -> Result<Option<Post>, CoreError> {
    let mut fields = match record {
        Value::Object(fields) => fields,
        other => {
            warn!(
                "Skipping post #{}: expected an object, found {}",
                index,
                json_kind(&other)
            );
            return Ok(None);
        }
    };

    let tags = match fields.remove("tags") {
        None | Some(Value::Null) => {
            debug!("Post #{} has no tags", index);
            Tags::default()
        }
        Some(Value::Object(tags)) => normalize_tags(index, tags),
        Some(other) => {
            return Err(DataLoadError::InvalidTags {
                index,
                found: json_kind(&other).to_string(),
            }
            .into())
        }
    };

    Ok(Some(Post {
        title: string_field(index, "title", fields.remove("title")),
        selftext: string_field(index, "selftext", fields.remove("selftext")),
        comments: string_list(index, "comments", fields.remove("comments")),
        url: string_field(index, "url", fields.remove("url")),
        tags,
    }))
}

fn normalize_tags(index: usize, mut tags: Map<String, Value>) -> Tags {
    Tags {
        model_mentions: string_list(index, "tags.model_mentions", tags.remove("model_mentions")),
        feature_mentions: string_list(
            index,
            "tags.feature_mentions",
            tags.remove("feature_mentions"),
        ),
        user_type: string_list(index, "tags.user_type", tags.remove("user_type")),
        sentiment: sentiment_field(index, tags.remove("sentiment")),
    }
}

fn string_field(index: usize, field: &str, value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => {
            warn!(
                "Post #{}: {} should be a string, found {}; using an empty string",
                index,
                field,
                json_kind(&other)
            );
            String::new()
        }
    }
}

/// Keeps the string entries of an array. `null` entries are dropped silently.
fn string_list(index: usize, field: &str, value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                Value::Null => None,
                other => {
                    warn!(
                        "Post #{}: dropping {} entry from {}",
                        index,
                        json_kind(&other),
                        field
                    );
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!(
                "Post #{}: {} should be an array, found {}; using an empty list",
                index,
                field,
                json_kind(&other)
            );
            Vec::new()
        }
    }
}

fn sentiment_field(index: usize, value: Option<Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64(),
        Some(other) => {
            warn!(
                "Post #{}: tags.sentiment should be a number, found {}; treating it as absent",
                index,
                json_kind(&other)
            );
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

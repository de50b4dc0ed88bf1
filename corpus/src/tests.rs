use crate::{load_posts, parse_posts, Corpus};
use serde_json::json;
use solefacts_core::{CoreError, DataLoadError};
use std::io::Write;

fn write_data_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn test_load_full_records() {
    let file = write_data_file(
        r#"[
            {
                "title": "Pegasus 40 after 300 miles",
                "selftext": "Still bouncy.",
                "url": "https://reddit.com/r/RunningShoeGeeks/a",
                "comments": ["Agreed", "Mine died at 250"],
                "tags": {
                    "model_mentions": ["Pegasus"],
                    "feature_mentions": ["cushioning"],
                    "user_type": ["neutral runner"],
                    "sentiment": 0.62
                }
            }
        ]"#,
    );

    let corpus = Corpus::load(file.path()).expect("Failed to load corpus");
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.source(), file.path());

    let post = &corpus.posts()[0];
    assert_eq!(post.title, "Pegasus 40 after 300 miles");
    assert_eq!(post.comments, vec!["Agreed", "Mine died at 250"]);
    assert_eq!(post.tags.model_mentions, vec!["Pegasus"]);
    assert_eq!(post.tags.sentiment, Some(0.62));
}

#[test]
fn test_missing_and_null_fields_default() {
    let posts = parse_posts(json!([
        { "title": "No tags at all" },
        { "title": null, "selftext": null, "comments": null, "url": null, "tags": null },
        { "title": "Partial tags", "comments": ["ok", null], "tags": { "model_mentions": ["Clifton"] } },
        { "title": "Extra fields", "score": 42, "tags": { "sentiment": -1, "other": true } }
    ]))
    .expect("Failed to normalise posts");

    assert_eq!(posts.len(), 4);
    assert!(posts[0].tags.model_mentions.is_empty());
    assert_eq!(posts[0].tags.sentiment, None);
    assert_eq!(posts[0].url, "");

    assert_eq!(posts[1].title, "");
    assert!(posts[1].comments.is_empty());

    assert_eq!(posts[2].comments, vec!["ok"]);
    assert!(posts[2].tags.feature_mentions.is_empty());
    assert_eq!(posts[2].tags.model_mentions, vec!["Clifton"]);

    assert_eq!(posts[3].tags.sentiment, Some(-1.0));
}

#[test]
fn test_top_level_must_be_an_array() {
    let err = parse_posts(json!({ "posts": [] })).unwrap_err();
    assert!(matches!(
        err,
        CoreError::DataLoad(DataLoadError::NotASequence { ref found }) if found == "object"
    ));
}

#[test]
fn test_tags_must_be_an_object() {
    let err = parse_posts(json!([
        { "title": "fine" },
        { "title": "broken", "tags": ["Pegasus"] }
    ]))
    .unwrap_err();
    assert!(matches!(
        err,
        CoreError::DataLoad(DataLoadError::InvalidTags { index: 1, ref found }) if found == "array"
    ));
}

#[test]
fn test_wrongly_typed_fields_fall_back_to_defaults() {
    let posts = parse_posts(json!([
        { "title": "Strong opinions", "url": "u0", "tags": { "sentiment": "high", "model_mentions": ["Bondi"] } },
        { "title": 123, "selftext": ["not", "text"], "url": "u1" },
        { "title": "One comment", "comments": "single comment", "url": "u2" },
        { "title": "Odd tags", "tags": { "model_mentions": "Pegasus", "user_type": ["beginner", 7, null] } }
    ]))
    .expect("Wrongly typed fields should not fail the load");

    assert_eq!(posts.len(), 4);

    assert_eq!(posts[0].tags.sentiment, None);
    assert_eq!(posts[0].tags.model_mentions, vec!["Bondi"]);

    assert_eq!(posts[1].title, "");
    assert_eq!(posts[1].selftext, "");
    assert_eq!(posts[1].url, "u1");

    assert!(posts[2].comments.is_empty());
    assert_eq!(posts[2].title, "One comment");

    assert!(posts[3].tags.model_mentions.is_empty());
    assert_eq!(posts[3].tags.user_type, vec!["beginner"]);
}

#[test]
fn test_non_object_records_are_skipped() {
    let posts = parse_posts(json!(["just a string", { "title": "kept" }, 42]))
        .expect("Non-object records should be skipped");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "kept");
}

#[test]
fn test_missing_file_and_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_posts(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(
        err,
        CoreError::DataLoad(DataLoadError::FileNotFound { .. })
    ));

    let file = write_data_file("[{ \"title\": ");
    let err = load_posts(file.path()).unwrap_err();
    assert!(matches!(
        err,
        CoreError::DataLoad(DataLoadError::InvalidJson { .. })
    ));
}

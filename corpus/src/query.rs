//! Parses the single free-text box of the filter form into [`SearchFilters`].
//!
//! Syntax: `key:value` terms separated by whitespace, values optionally
//! double-quoted (`feature:"heel support"`). Keys are `model`, `feature`,
//! `user` (or `user_type`) and `sentiment`. Words without a key are joined
//! and used as the model name.

use crate::search::{SearchFilters, SentimentFilter};
use solefacts_core::CoreError;

#[derive(Debug, PartialEq)]
struct Term {
    key: Option<String>,
    value: String,
}

pub fn parse_filter_query(input: &str) -> Result<SearchFilters, CoreError> {
    let mut model: Option<String> = None;
    let mut feature: Option<String> = None;
    let mut user_type: Option<String> = None;
    let mut sentiment: Option<SentimentFilter> = None;
    let mut bare_words: Vec<String> = Vec::new();

    for term in tokenize(input)? {
        let Some(key) = term.key else {
            if !term.value.trim().is_empty() {
                bare_words.push(term.value);
            }
            continue;
        };

        let key = key.to_lowercase();
        if term.value.trim().is_empty() {
            return Err(CoreError::invalid_input(format!("'{}:' needs a value", key)));
        }

        let slot_taken = match key.as_str() {
            "model" => set_once(&mut model, term.value),
            "feature" => set_once(&mut feature, term.value),
            "user" | "user_type" => set_once(&mut user_type, term.value),
            "sentiment" => set_once(&mut sentiment, term.value.parse()?),
            _ => {
                return Err(CoreError::invalid_input(format!(
                    "unknown filter '{}'; use model, feature, user or sentiment",
                    key
                )))
            }
        };
        if slot_taken {
            return Err(CoreError::invalid_input(format!(
                "filter '{}' given more than once",
                key
            )));
        }
    }

    if !bare_words.is_empty() {
        if model.is_some() {
            return Err(CoreError::invalid_input(format!(
                "unexpected text '{}' alongside model:",
                bare_words.join(" ")
            )));
        }
        model = Some(bare_words.join(" "));
    }

    let mut filters = SearchFilters::new();
    if let Some(model) = model {
        filters = filters.with_model(model);
    }
    if let Some(feature) = feature {
        filters = filters.with_feature(feature);
    }
    if let Some(user_type) = user_type {
        filters = filters.with_user_type(user_type);
    }
    if let Some(sentiment) = sentiment {
        filters = filters.with_sentiment(sentiment);
    }
    Ok(filters)
}

/// Returns true if the slot already held a value.
fn set_once<T>(slot: &mut Option<T>, value: T) -> bool {
    slot.replace(value).is_some()
}

fn tokenize(input: &str) -> Result<Vec<Term>, CoreError> {
    let mut terms = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = None;
        let mut current = String::new();
        let mut quoted = false;

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '"' => {
                    quoted = true;
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some(inner) => current.push(inner),
                            None => {
                                return Err(CoreError::invalid_input("unterminated quote"));
                            }
                        }
                    }
                }
                ':' if key.is_none() && !quoted => {
                    key = Some(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }

        terms.push(Term {
            key,
            value: current,
        });
    }

    Ok(terms)
}

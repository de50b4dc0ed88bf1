use solefacts_core::{DocumentRef, Tags};

pub const QA_SYSTEM_PROMPT: &str = "You are an expert Q&A system that is trusted around the world.\n\
Always answer the query using the provided context information, and not prior knowledge.\n\
Some rules to follow:\n\
1. Never directly reference the given context in your answer.\n\
2. Avoid statements like 'Based on the context, ...' or 'The context information ...' or anything along those lines.";

/// Renders the retrieved documents and the question into the user turn.
pub fn build_qa_prompt(question: &str, documents: &[DocumentRef]) -> String {
    let context = documents
        .iter()
        .map(|r| format_document(&r.document.url, &r.document.tags, &r.document.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: "
    )
}

fn format_document(url: &str, tags: &Tags, text: &str) -> String {
    let mut header = vec![format!("url: {}", url)];
    if !tags.model_mentions.is_empty() {
        header.push(format!("model_mentions: {}", tags.model_mentions.join(", ")));
    }
    if !tags.feature_mentions.is_empty() {
        header.push(format!("feature_mentions: {}", tags.feature_mentions.join(", ")));
    }
    if !tags.user_type.is_empty() {
        header.push(format!("user_type: {}", tags.user_type.join(", ")));
    }
    if let Some(sentiment) = tags.sentiment {
        header.push(format!("sentiment: {}", sentiment));
    }
    format!("{}\n\n{}", header.join("\n"), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solefacts_core::Document;

    fn retrieved(url: &str, text: &str, tags: Tags) -> DocumentRef {
        DocumentRef {
            document: Document {
                id: 0,
                text: text.to_string(),
                url: url.to_string(),
                tags,
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_prompt_layout() {
        let docs = vec![
            retrieved(
                "u1",
                "Bondi saved my heels",
                Tags {
                    model_mentions: vec!["Bondi".to_string()],
                    sentiment: Some(0.8),
                    ..Default::default()
                },
            ),
            retrieved("u2", "Try a rocker sole", Tags::default()),
        ];

        let prompt = build_qa_prompt("Which shoes are best for heel pain?", &docs);
        assert!(prompt.starts_with("Context information is below.\n---------------------\n"));
        assert!(prompt.contains("url: u1\nmodel_mentions: Bondi\nsentiment: 0.8\n\nBondi saved my heels"));
        assert!(prompt.contains("Bondi saved my heels\n\nurl: u2\n\nTry a rocker sole\n---------------------\n"));
        assert!(prompt.ends_with("Query: Which shoes are best for heel pain?\nAnswer: "));
    }

    #[test]
    fn test_prompt_with_no_documents() {
        let prompt = build_qa_prompt("anything?", &[]);
        assert!(prompt.contains("---------------------\n\n---------------------"));
    }
}

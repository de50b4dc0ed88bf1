pub mod openai;
pub mod prompt;

pub use openai::OpenAiCompatibleGenerator;
pub use prompt::{build_qa_prompt, QA_SYSTEM_PROMPT};

use async_trait::async_trait;
use solefacts_core::{CoreError, DocumentRef};

/// Produces a natural-language answer to `question` grounded in `documents`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn answer(&self, question: &str, documents: &[DocumentRef])
        -> Result<String, CoreError>;

    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

//! Streamed answer generation.

use std::sync::Arc;

use omnibus_gateway::CompletionService;

use crate::error::ChatError;

pub struct AnswerGenerator {
    llm: Arc<dyn CompletionService>,
    model: String,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Stream a completion for `prompt` and return the concatenated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.generate_with(prompt, &mut |_: &str| {}).await
    }

    /// Like `generate`, also handing each fragment to `on_fragment` as it
    /// arrives. Fragments are joined with no separator; zero fragments give
    /// an empty answer. The session stays open afterwards.
    pub async fn generate_with(
        &self,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, ChatError> {
        let mut answer = String::new();
        let mut fragments = 0usize;
        let mut collect = |fragment: &str| {
            fragments += 1;
            answer.push_str(fragment);
            on_fragment(fragment);
        };
        self.llm
            .complete_stream(&self.model, prompt, &mut collect)
            .await
            .map_err(ChatError::Generation)?;

        tracing::debug!(fragments, chars = answer.len(), "Answer generated");
        Ok(answer)
    }
}

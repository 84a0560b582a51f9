//! Rewrites a follow-up question into a standalone search query.

use std::sync::Arc;

use omnibus_core::types::Turn;
use omnibus_gateway::CompletionService;

use crate::error::ChatError;
use crate::history::render_history;

pub struct Reformulator {
    llm: Arc<dyn CompletionService>,
    model: String,
}

impl Reformulator {
    pub fn new(llm: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Produce a search query that folds `history` into `question`.
    ///
    /// With no history the question is returned as is and the model is not
    /// called. Surrounding whitespace is trimmed, and a blank rewrite falls
    /// back to the raw question.
    pub async fn reformulate(&self, history: &[Turn], question: &str) -> Result<String, ChatError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = build_reformulation_prompt(history, question);
        let rewritten = self
            .llm
            .complete(&self.model, &prompt)
            .await
            .map_err(ChatError::Reformulation)?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            tracing::warn!("Reformulation came back empty; searching with the raw question");
            return Ok(question.to_string());
        }
        Ok(rewritten.to_string())
    }
}

pub fn build_reformulation_prompt(history: &[Turn], question: &str) -> String {
    format!(
        r#"[INST]
Based on the chat history below and the question, generate a query that extends the question
with the chat history provided. The query should be in natural language.
Answer with only the query. Do not add any explanation.

<chat_history>
{history}
</chat_history>
<question>
{question}
</question>
[/INST]
"#,
        history = render_history(history),
        question = question,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnibus_gateway::MockCompletionService;

    fn history() -> Vec<Turn> {
        vec![
            Turn::user("What is Rule 12?"),
            Turn::assistant("Rule 12 covers amendments."),
        ]
    }

    #[tokio::test]
    async fn test_empty_history_skips_model() {
        let llm = Arc::new(MockCompletionService::new().with_reply("should not be used"));
        let reformulator = Reformulator::new(llm.clone(), "mistral-7b");

        let query = reformulator.reformulate(&[], "What is Rule 12?").await.unwrap();
        assert_eq!(query, "What is Rule 12?");
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reformulation_calls_model_once() {
        let llm = Arc::new(
            MockCompletionService::new().with_reply("  What quorum applies to Rule 12 amendments?\n"),
        );
        let reformulator = Reformulator::new(llm.clone(), "mistral-7b");

        let query = reformulator
            .reformulate(&history(), "What about quorum?")
            .await
            .unwrap();
        assert_eq!(query, "What quorum applies to Rule 12 amendments?");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].streaming);
        assert_eq!(calls[0].model, "mistral-7b");
        assert!(calls[0].prompt.contains("What about quorum?"));
        assert!(calls[0].prompt.contains("Rule 12 covers amendments."));
    }

    #[tokio::test]
    async fn test_blank_reformulation_falls_back() {
        let llm = Arc::new(MockCompletionService::new().with_reply("   "));
        let reformulator = Reformulator::new(llm, "mistral-7b");
        let query = reformulator
            .reformulate(&history(), "What about quorum?")
            .await
            .unwrap();
        assert_eq!(query, "What about quorum?");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let llm = Arc::new(MockCompletionService::new().failing_complete("model overloaded"));
        let reformulator = Reformulator::new(llm, "mistral-7b");
        let err = reformulator
            .reformulate(&history(), "What about quorum?")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Reformulation(_)));
    }

    #[test]
    fn test_reformulation_prompt_layout() {
        let prompt = build_reformulation_prompt(&history(), "What about quorum?");
        assert!(prompt.starts_with("[INST]\n"));
        assert!(prompt.contains("Answer with only the query."));
        assert!(prompt.contains("<question>\nWhat about quorum?\n</question>"));
        assert!(prompt.trim_end().ends_with("[/INST]"));
        assert!(!prompt.contains("Answer:"));
    }
}

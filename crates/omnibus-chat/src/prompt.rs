//! Answer prompt templating.

use omnibus_core::types::{Passage, Turn};

use crate::history::render_history;

/// Exact reply the model is told to give when the context has no answer.
pub const FALLBACK_ANSWER: &str = "I don't know the answer to that question.";

/// Render passages as one JSON object per line, in ranking order.
pub fn render_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| serde_json::to_string(p).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the final answer prompt from history, retrieved passages and the
/// raw question. The raw question is used even when retrieval ran on a
/// reformulated query.
pub fn build_answer_prompt(history: &[Turn], passages: &[Passage], question: &str) -> String {
    format!(
        r#"[INST]
You are a helpful AI chat assistant with RAG capabilities. When a user asks you a question,
you will also be given context provided between <context> and </context> tags. Use that context
with the user's chat history provided between <chat_history> and </chat_history> tags
to provide a summary that addresses the user's question. Ensure the answer is coherent, concise,
and directly relevant to the user's question.

If the user asks a generic question which cannot be answered with the given context or chat_history,
just say "{fallback}"

Don't say things like "according to the provided context".

<chat_history>
{history}
</chat_history>
<context>
{context}
</context>
<question>
{question}
</question>
[/INST]
Answer:
"#,
        fallback = FALLBACK_ANSWER,
        history = render_history(history),
        context = render_passages(passages),
        question = question,
    )
}

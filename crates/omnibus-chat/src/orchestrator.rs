//! Chat loop: central coordinator for one question/answer turn.
//!
//! Wires the history window, reformulator, retriever, prompt assembler and
//! answer generator together, owns the conversation log and tracks the
//! loop state.

use std::sync::Arc;

use serde::Serialize;

use omnibus_core::config::ChatConfig;
use omnibus_core::types::{Passage, Role, Turn};
use omnibus_gateway::{CompletionService, SearchService};

use crate::answer::AnswerGenerator;
use crate::conversation::ConversationStore;
use crate::error::ChatError;
use crate::history::HistoryWindow;
use crate::prompt::build_answer_prompt;
use crate::reformulator::Reformulator;
use crate::retriever::Retriever;
use crate::state::{ChatState, StateMachine};

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub answer: String,
    /// Passages the answer was grounded on, in ranking order.
    pub passages: Vec<Passage>,
}

/// Single-conversation chat engine.
pub struct ChatLoop {
    pipeline: Pipeline,
    conversation: ConversationStore,
    state: StateMachine,
    max_question_chars: usize,
}

/// The stages one turn runs through, in order.
struct Pipeline {
    window: HistoryWindow,
    reformulator: Reformulator,
    retriever: Retriever,
    generator: AnswerGenerator,
}

/// Returns the loop to `Idle` when a turn is dropped mid-flight, e.g. by a
/// disconnected client or a caller's timeout.
struct TurnGuard<'a> {
    state: &'a mut StateMachine,
    settled: bool,
}

impl<'a> TurnGuard<'a> {
    fn begin(state: &'a mut StateMachine) -> Result<Self, ChatError> {
        if state.current() == ChatState::Idle {
            state.transition(ChatState::AwaitingInput)?;
        }
        state.transition(ChatState::Processing)?;
        Ok(Self {
            state,
            settled: false,
        })
    }

    fn finish(mut self) -> Result<(), ChatError> {
        self.settled = true;
        self.state.transition(ChatState::Idle)
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.state.current() == ChatState::Processing {
            tracing::warn!("Turn abandoned before completion");
            let _ = self.state.transition(ChatState::Idle);
        }
    }
}

impl ChatLoop {
    /// Create a chat loop over the given services.
    pub fn new(
        search: Arc<dyn SearchService>,
        llm: Arc<dyn CompletionService>,
        model: &str,
        config: &ChatConfig,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                window: HistoryWindow::new(config.history_turns),
                reformulator: Reformulator::new(llm.clone(), model),
                retriever: Retriever::new(search),
                generator: AnswerGenerator::new(llm, model),
            },
            conversation: ConversationStore::new(),
            state: StateMachine::new(),
            max_question_chars: config.max_question_chars,
        }
    }

    pub fn state(&self) -> ChatState {
        self.state.current()
    }

    /// Every turn so far, oldest first.
    pub fn transcript(&self) -> &[Turn] {
        self.conversation.turns()
    }

    /// Drop the conversation and wait for a new question.
    pub fn reset(&mut self) {
        let dropped = self.conversation.len();
        self.conversation.clear();
        self.state.reset();
        tracing::info!(dropped_turns = dropped, "Conversation cleared");
    }

    /// Answer `question` and record both turns.
    pub async fn ask(&mut self, question: &str) -> Result<ChatReply, ChatError> {
        self.ask_streaming(question, &mut |_: &str| {}).await
    }

    /// Answer `question`, handing answer fragments to `on_fragment` as they
    /// arrive.
    ///
    /// Invalid input is rejected before anything is recorded. Once accepted,
    /// the user turn is kept even if a later stage fails; the assistant turn
    /// is appended only on success. Dropping the returned future leaves the
    /// loop `Idle` with the user turn recorded.
    pub async fn ask_streaming(
        &mut self,
        question: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ChatReply, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let chars = question.chars().count();
        if chars > self.max_question_chars {
            return Err(ChatError::MessageTooLong(self.max_question_chars));
        }

        let Self {
            pipeline,
            conversation,
            state,
            ..
        } = self;

        let turn = TurnGuard::begin(state)?;
        conversation.push(Role::User, question);
        tracing::info!(question_chars = chars, turns = conversation.len(), "Question received");

        let result = pipeline.run(conversation.turns(), question, on_fragment).await;

        match result {
            Ok(reply) => {
                conversation.push(Role::Assistant, reply.answer.as_str());
                turn.finish()?;
                Ok(reply)
            }
            Err(err) => {
                tracing::error!(error = %err, "Turn failed");
                turn.finish()?;
                Err(err)
            }
        }
    }
}

impl Pipeline {
    async fn run(
        &self,
        turns: &[Turn],
        question: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<ChatReply, ChatError> {
        let history = self.window.select(turns);

        let query = if history.is_empty() {
            question.to_string()
        } else {
            self.reformulator.reformulate(history, question).await?
        };
        tracing::debug!(
            history_turns = history.len(),
            reformulated = !history.is_empty(),
            query_chars = query.chars().count(),
            "Search query selected"
        );

        let passages = self.retriever.retrieve(&query).await?;
        tracing::debug!(passages = passages.len(), "Passages retrieved");

        let prompt = build_answer_prompt(history, &passages, question);
        let answer = self.generator.generate_with(&prompt, on_fragment).await?;
        tracing::info!(
            answer_chars = answer.chars().count(),
            passages = passages.len(),
            "Answer ready"
        );

        Ok(ChatReply { answer, passages })
    }
}

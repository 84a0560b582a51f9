//! Conversational retrieval pipeline for the Omnibus Rules chatbot.
//!
//! Keeps the conversation log, picks the history window, rewrites follow-up
//! questions into standalone search queries, retrieves passages, assembles
//! the answer prompt and streams the answer back.

pub mod answer;
pub mod conversation;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod prompt;
pub mod reformulator;
pub mod retriever;
pub mod state;

pub use answer::AnswerGenerator;
pub use conversation::ConversationStore;
pub use error::ChatError;
pub use history::{render_history, HistoryWindow};
pub use orchestrator::{ChatLoop, ChatReply};
pub use prompt::{build_answer_prompt, FALLBACK_ANSWER};
pub use reformulator::Reformulator;
pub use retriever::{Retriever, PASSAGE_COLUMNS, RESULT_LIMIT};
pub use state::{ChatState, StateMachine};

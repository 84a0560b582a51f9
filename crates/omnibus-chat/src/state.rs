//! Chat loop state machine.
//!
//! Valid transitions:
//! - Idle -> AwaitingInput (page shown, ready for a question)
//! - AwaitingInput -> Processing (question submitted)
//! - Processing -> Idle (answer rendered, or the turn failed)
//! - any -> AwaitingInput (reset)

use std::fmt;

use serde::Serialize;

use crate::error::ChatError;

/// Where the chat loop is in its question/answer cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingInput,
    Processing,
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatState::Idle => write!(f, "Idle"),
            ChatState::AwaitingInput => write!(f, "AwaitingInput"),
            ChatState::Processing => write!(f, "Processing"),
        }
    }
}

impl ChatState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ChatState) -> bool {
        matches!(
            (self, target),
            (ChatState::Idle, ChatState::AwaitingInput)
                | (ChatState::AwaitingInput, ChatState::Processing)
                | (ChatState::Processing, ChatState::Idle)
        )
    }
}

/// Owned state holder with validated transitions.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: ChatState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ChatState {
        self.state
    }

    /// Move to `target`, or fail without changing state.
    pub fn transition(&mut self, target: ChatState) -> Result<(), ChatError> {
        if !self.state.can_transition_to(&target) {
            return Err(ChatError::InvalidState {
                from: self.state,
                to: target,
            });
        }
        tracing::debug!("Chat state: {} -> {}", self.state, target);
        self.state = target;
        Ok(())
    }

    /// Reset is allowed from every state.
    pub fn reset(&mut self) {
        tracing::debug!("Chat state reset to AwaitingInput from {}", self.state);
        self.state = ChatState::AwaitingInput;
    }
}

//! In-memory stand-ins for the search and completion services.
//!
//! Both mocks record every call so tests can assert on exactly what the
//! chat pipeline sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use omnibus_core::types::Passage;

use crate::error::GatewayError;
use crate::{CompletionService, SearchService};

/// One recorded search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub query: String,
    pub columns: Vec<String>,
    pub limit: usize,
}

/// Search service returning a fixed passage list.
#[derive(Debug, Default)]
pub struct MockSearchService {
    passages: Vec<Passage>,
    failure: Option<String>,
    stall_next: Mutex<bool>,
    calls: Mutex<Vec<SearchCall>>,
}

impl MockSearchService {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            ..Self::default()
        }
    }

    /// A service whose every search fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// A service whose first search never completes. Later searches
    /// return `passages`.
    pub fn stalling_once(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            stall_next: Mutex::new(true),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl SearchService for MockSearchService {
    async fn search(
        &self,
        query: &str,
        columns: &[&str],
        limit: usize,
    ) -> Result<Vec<Passage>, GatewayError> {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(SearchCall {
                query: query.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
                limit,
            });
        let stall = {
            let mut stall_next = self.stall_next.lock().expect("mock lock poisoned");
            std::mem::take(&mut *stall_next)
        };
        if stall {
            std::future::pending::<()>().await;
        }
        if let Some(ref message) = self.failure {
            return Err(GatewayError::Http(message.clone()));
        }
        Ok(self.passages.iter().take(limit).cloned().collect())
    }
}

/// One recorded completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCall {
    pub model: String,
    pub prompt: String,
    pub streaming: bool,
}

/// Completion service with scripted replies.
///
/// `complete` pops replies from a queue (empty string once exhausted);
/// `complete_stream` replays the same fragment script on every call.
#[derive(Debug, Default)]
pub struct MockCompletionService {
    replies: Mutex<VecDeque<String>>,
    fragments: Vec<String>,
    complete_failure: Option<String>,
    stream_failure: Option<String>,
    calls: Mutex<Vec<CompletionCall>>,
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next single-value completion.
    pub fn with_reply(self, reply: &str) -> Self {
        self.replies
            .lock()
            .expect("mock lock poisoned")
            .push_back(reply.to_string());
        self
    }

    /// Fragments emitted, in order, by every streamed completion.
    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn failing_complete(mut self, message: &str) -> Self {
        self.complete_failure = Some(message.to_string());
        self
    }

    /// Streamed completions emit their fragments, then fail.
    pub fn failing_stream(mut self, message: &str) -> Self {
        self.stream_failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }

    pub fn complete_calls(&self) -> Vec<CompletionCall> {
        self.calls().into_iter().filter(|c| !c.streaming).collect()
    }

    pub fn stream_calls(&self) -> Vec<CompletionCall> {
        self.calls().into_iter().filter(|c| c.streaming).collect()
    }

    fn record(&self, model: &str, prompt: &str, streaming: bool) {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(CompletionCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
                streaming,
            });
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, GatewayError> {
        self.record(model, prompt, false);
        if let Some(ref message) = self.complete_failure {
            return Err(GatewayError::Http(message.clone()));
        }
        Ok(self
            .replies
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_default())
    }

    async fn complete_stream(
        &self,
        model: &str,
        prompt: &str,
        on_fragment: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<(), GatewayError> {
        self.record(model, prompt, true);
        for fragment in &self.fragments {
            on_fragment(fragment);
        }
        if let Some(ref message) = self.stream_failure {
            return Err(GatewayError::Http(message.clone()));
        }
        Ok(())
    }
}

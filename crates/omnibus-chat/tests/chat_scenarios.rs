use std::sync::Arc;

use omnibus_chat::{ChatLoop, ChatState, FALLBACK_ANSWER};
use omnibus_core::config::ChatConfig;
use omnibus_core::types::{Passage, Role};
use omnibus_gateway::{MockCompletionService, MockSearchService};

fn rule_passages() -> Vec<Passage> {
    vec![
        Passage {
            chunk: "Rule 12: amendments require a two-thirds vote of members present.".to_string(),
            language: "English".to_string(),
            relative_path: "omnibus_rules.pdf".to_string(),
            file_url: "https://files.example.com/omnibus_rules.pdf".to_string(),
        },
        Passage {
            chunk: "Rule 13: a quorum is a simple majority.".to_string(),
            language: "English".to_string(),
            relative_path: "omnibus_rules.pdf".to_string(),
            file_url: "https://files.example.com/omnibus_rules.pdf".to_string(),
        },
    ]
}

/// Body of the history block. The instruction text also names the tag, so
/// match the block's own line breaks.
fn history_section(prompt: &str) -> &str {
    let open = "<chat_history>\n";
    let start = prompt.find(open).expect("history block") + open.len();
    let end = prompt[start..].find("\n</chat_history>").expect("history end") + start;
    &prompt[start..end]
}

#[tokio::test]
async fn first_question_searches_raw_text_and_answers() {
    let search = Arc::new(MockSearchService::new(rule_passages()));
    let llm = Arc::new(
        MockCompletionService::new().with_fragments(&["Rule 12 ", "requires a ", "two-thirds vote."]),
    );
    let mut chat = ChatLoop::new(search.clone(), llm.clone(), "mistral-7b", &ChatConfig::default());

    let reply = chat.ask("What does Rule 12 say?").await.expect("turn succeeds");

    assert_eq!(reply.answer, "Rule 12 requires a two-thirds vote.");
    assert_eq!(reply.passages, rule_passages());
    assert_eq!(search.calls().len(), 1);
    assert_eq!(search.calls()[0].query, "What does Rule 12 say?");
    assert!(llm.complete_calls().is_empty());

    let prompt = &llm.stream_calls()[0].prompt;
    assert!(prompt.contains("<chat_history>\n\n</chat_history>"));
    assert!(prompt.contains("two-thirds vote of members present"));
    assert!(prompt.contains(FALLBACK_ANSWER));
}

#[tokio::test]
async fn follow_up_question_is_reformulated_before_search() {
    let search = Arc::new(MockSearchService::new(rule_passages()));
    let llm = Arc::new(
        MockCompletionService::new()
            .with_reply("What quorum is needed to amend under Rule 12?")
            .with_fragments(&["A simple majority."]),
    );
    let mut chat = ChatLoop::new(search.clone(), llm.clone(), "mistral-7b", &ChatConfig::default());

    chat.ask("What does Rule 12 say?").await.expect("first turn");
    let reply = chat.ask("And the quorum?").await.expect("second turn");

    assert_eq!(reply.answer, "A simple majority.");
    let searches = search.calls();
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[1].query, "What quorum is needed to amend under Rule 12?");

    let roles: Vec<Role> = chat.transcript().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn clear_chat_starts_over() {
    let search = Arc::new(MockSearchService::new(rule_passages()));
    let llm = Arc::new(MockCompletionService::new().with_fragments(&["ok"]));
    let mut chat = ChatLoop::new(search.clone(), llm.clone(), "mistral-7b", &ChatConfig::default());

    chat.ask("What does Rule 12 say?").await.expect("first turn");
    chat.ask("And Rule 13?").await.expect("second turn");
    assert_eq!(llm.complete_calls().len(), 1);

    chat.reset();
    assert_eq!(chat.state(), ChatState::AwaitingInput);
    assert!(chat.transcript().is_empty());

    chat.ask("What is a quorum?").await.expect("turn after reset");
    assert_eq!(llm.complete_calls().len(), 1);
    assert_eq!(search.calls()[2].query, "What is a quorum?");
}

#[tokio::test]
async fn long_conversation_keeps_history_bounded() {
    let search = Arc::new(MockSearchService::new(vec![]));
    let mut llm = MockCompletionService::new().with_fragments(&["answer"]);
    for i in 0..10 {
        llm = llm.with_reply(&format!("rewrite {}", i));
    }
    let llm = Arc::new(llm);
    let mut chat = ChatLoop::new(search, llm.clone(), "mistral-7b", &ChatConfig::default());

    for i in 0..6 {
        chat.ask(&format!("question {}", i)).await.expect("turn succeeds");
    }

    // Sixth question: 11 turns logged, window holds indices 5..=9.
    let prompt = &llm.stream_calls()[5].prompt;
    let history = history_section(prompt);
    assert_eq!(history.lines().filter(|l| l.starts_with('{')).count(), 5);
    assert!(!history.contains("question 2"));
    assert!(history.contains("question 3"));
    assert!(history.contains("question 4"));
    assert!(!history.contains("question 5"));
}

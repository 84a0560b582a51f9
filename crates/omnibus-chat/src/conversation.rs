//! Process-local conversation log.

use omnibus_core::types::{Role, Turn};

/// Ordered, append-only list of turns for the current session.
///
/// Turns are never edited once pushed; the whole log is dropped on reset.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &Turn {
        self.turns.push(Turn::new(role, content));
        &self.turns[self.turns.len() - 1]
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = ConversationStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.last().is_none());
    }

    #[test]
    fn test_push_preserves_order() {
        let mut store = ConversationStore::new();
        store.push(Role::User, "What is Rule 12?");
        store.push(Role::Assistant, "Rule 12 covers amendments.");
        store.push(Role::User, "And Rule 13?");

        let roles: Vec<Role> = store.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(store.last().unwrap().content, "And Rule 13?");
    }

    #[test]
    fn test_push_returns_new_turn() {
        let mut store = ConversationStore::new();
        let id = store.push(Role::User, "hello").id;
        assert_eq!(store.turns()[0].id, id);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut store = ConversationStore::new();
        store.push(Role::User, "a");
        store.push(Role::Assistant, "b");
        store.clear();
        assert!(store.is_empty());
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The generated answer.
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Entity Structs
// =============================================================================

/// One message exchanged in the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A single passage returned by the search service.
///
/// The service reports columns in upper case (`CHUNK`, `FILE_URL`, ...);
/// aliases accept those names while serialization uses snake_case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Passage {
    #[serde(alias = "CHUNK")]
    pub chunk: String,
    #[serde(alias = "LANGUAGE")]
    pub language: String,
    #[serde(alias = "RELATIVE_PATH")]
    pub relative_path: String,
    #[serde(alias = "FILE_URL")]
    pub file_url: String,
}

/// Ordered passages for one query, ranked by the external service.
pub type SearchResult = Vec<Passage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_turn_constructors() {
        let q = Turn::user("What is rule 12?");
        assert_eq!(q.role, Role::User);
        assert_eq!(q.content, "What is rule 12?");

        let a = Turn::assistant("Rule 12 covers amendments.");
        assert_eq!(a.role, Role::Assistant);
        assert_ne!(q.id, a.id);
    }

    #[test]
    fn test_passage_accepts_upper_case_columns() {
        let json = r#"{
            "CHUNK": "Rule 12. Amendments must be filed...",
            "LANGUAGE": "English",
            "RELATIVE_PATH": "rules/omnibus.pdf",
            "FILE_URL": "https://files.example/omnibus.pdf"
        }"#;
        let passage: Passage = serde_json::from_str(json).unwrap();
        assert_eq!(passage.chunk, "Rule 12. Amendments must be filed...");
        assert_eq!(passage.language, "English");
        assert_eq!(passage.relative_path, "rules/omnibus.pdf");
        assert_eq!(passage.file_url, "https://files.example/omnibus.pdf");
    }

    #[test]
    fn test_passage_missing_columns_default_to_empty() {
        let passage: Passage = serde_json::from_str(r#"{"CHUNK": "only text"}"#).unwrap();
        assert_eq!(passage.chunk, "only text");
        assert!(passage.language.is_empty());
        assert!(passage.file_url.is_empty());
    }

    #[test]
    fn test_passage_serializes_snake_case() {
        let passage = Passage {
            chunk: "c".to_string(),
            language: "l".to_string(),
            relative_path: "p".to_string(),
            file_url: "u".to_string(),
        };
        let value = serde_json::to_value(&passage).unwrap();
        assert_eq!(value["relative_path"], "p");
        assert_eq!(value["file_url"], "u");
    }
}

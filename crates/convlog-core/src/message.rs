use serde::{Deserialize, Serialize};

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Fixed speaker label used in rendered transcripts.
    pub fn speaker_label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single chat turn. Immutable once created; duplicates are allowed
/// (consecutive identical turns are meaningful).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Everything one `log conversation` run of the external CLI needs.
///
/// The annotation fields beyond `context` and `messages` are optional and
/// map to CLI flags when present.
#[derive(Debug, Clone, Default)]
pub struct LogRequest {
    pub context: String,
    pub messages: Vec<ChatMessage>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    pub files_modified: Vec<String>,
    pub next_steps: Option<String>,
}

impl LogRequest {
    pub fn new(context: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            context: context.into(),
            messages,
            ..Default::default()
        }
    }
}

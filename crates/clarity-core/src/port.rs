use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CompletionError
// ---------------------------------------------------------------------------

/// Failure of a completion call. Never escapes the engine: every caller
/// degrades to a static fallback and logs the error instead.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty completion response")]
    Empty,
}

// ---------------------------------------------------------------------------
// CompletionPort
// ---------------------------------------------------------------------------

/// Abstraction over a hosted text-generation call.
///
/// Callers issue one blocking request per turn; there is no retry or
/// cancellation. Implementations live outside this crate (see the
/// `openrouter-client` crate); the doubles below cover tests and offline
/// operation.
pub trait CompletionPort {
    fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> std::result::Result<String, CompletionError>;
}

/// Port that always answers with the same canned text.
#[derive(Debug, Clone)]
pub struct StaticPort {
    pub reply: String,
}

impl StaticPort {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl CompletionPort for StaticPort {
    fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> std::result::Result<String, CompletionError> {
        Ok(self.reply.clone())
    }
}

/// Port that always fails, standing in for zero connectivity.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPort;

impl CompletionPort for FailingPort {
    fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> std::result::Result<String, CompletionError> {
        Err(CompletionError::Transport("port disabled".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn doubles_behave() {
        let canned = StaticPort::new("0.9");
        assert_eq!(canned.complete(&[], 0.0).unwrap(), "0.9");
        assert!(FailingPort.complete(&[], 0.0).is_err());
    }
}

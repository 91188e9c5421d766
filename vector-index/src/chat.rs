//! Chat backend trait and message types used for answer generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and context supplied by the application.
    System,
    /// The end user's question.
    User,
}

/// A single message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a `system` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Create a `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A completion returned by a [`ChatBackend`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// The generated text.
    pub text: String,
    /// Identifier of the model that produced the text, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatResponse {
    /// Create a response carrying only generated text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), model: None }
    }
}

/// A backend that produces a completion for an ordered list of messages.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a chat completion over `messages`.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roles_serialize_lowercase() {
        let value = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "be brief"}));
        let value = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(value["role"], "user");
    }

    #[test]
    fn only_system_and_user_roles_exist() {
        assert_eq!(serde_json::from_value::<Role>(json!("system")).unwrap(), Role::System);
        assert!(serde_json::from_value::<Role>(json!("assistant")).is_err());
    }

    #[test]
    fn response_omits_missing_model() {
        let value = serde_json::to_value(ChatResponse::new("hello")).unwrap();
        assert_eq!(value, json!({"text": "hello"}));
    }
}

//! Message types for conversation history.
//!
//! History stores plain role/content turns. The wire format is produced only
//! when a request is built (`to_request()`), so the same history can be sent
//! to any OpenAI-compatible endpoint.

use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

    /// Convert to the chat-completions wire format
    pub fn to_request(&self) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        let content = self.content.clone();
        Ok(match self.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()?
                .into(),
        })
    }
}

/// Convert a working message list for a request
pub fn to_request_messages(
    messages: &[ChatMessage],
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    messages.iter().map(ChatMessage::to_request).collect()
}

/// Persisted conversation of one agent: completed user/assistant pairs, plus
/// at most one trailing user turn while a task is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            updated_at: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
        self.updated_at = Some(chrono::Utc::now());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
        self.updated_at = Some(chrono::Utc::now());
    }

    /// Remove the trailing user turn, if the last turn is one
    pub fn pop_last_user(&mut self) -> Option<ChatMessage> {
        match self.messages.last() {
            Some(msg) if msg.role == Role::User => self.messages.pop(),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.updated_at = Some(chrono::Utc::now());
    }

    /// Working message list for one task: system prompt followed by history
    pub fn working_messages(&self, system_prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_conversation() {
        let mut history = ConversationHistory::new();
        history.push_user("Hello");
        history.push_assistant("Hi there!");

        let messages = history.working_messages("You are a helpful assistant.");
        assert_eq!(messages.len(), 3); // system, user, assistant
        assert_eq!(messages[0].role, Role::System);

        let wire = to_request_messages(&messages).unwrap();
        assert_eq!(wire.len(), 3);
        assert!(matches!(wire[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(wire[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_pop_last_user_only_pops_user() {
        let mut history = ConversationHistory::new();
        history.push_user("q1");
        history.push_assistant("a1");
        assert!(history.pop_last_user().is_none());
        assert_eq!(history.len(), 2);

        history.push_user("q2");
        let popped = history.pop_last_user().unwrap();
        assert_eq!(popped.content, "q2");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut history = ConversationHistory::new();
        history.push_user("q");
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&ChatMessage::assistant("x")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"x"}"#);
    }
}

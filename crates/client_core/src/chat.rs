use chrono::{DateTime, Utc};
use shared::domain::{ChatMessageId, ChatRole};

pub const THINKING_PLACEHOLDER: &str = "Thinking...";
pub const ASSISTANT_UNREACHABLE: &str = "Error: Could not reach the assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub role: ChatRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Append-only chat log for the current session. Entries are addressed by
/// id so late replies land on their own placeholder.
#[derive(Debug, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn append(&mut self, role: ChatRole, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage {
            id: ChatMessageId::new(),
            role,
            text: text.into(),
            sent_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    pub fn replace_text(&mut self, id: ChatMessageId, text: impl Into<String>) -> Option<ChatMessage> {
        let message = self.messages.iter_mut().find(|m| m.id == id)?;
        message.text = text.into();
        Some(message.clone())
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
}

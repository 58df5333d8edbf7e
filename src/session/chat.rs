//! Chat reducer
//!
//! Append-only transcript. User messages are appended optimistically when the
//! dispatcher issues SEND_CHAT_MESSAGE; the protocol carries no per-message
//! delivery acknowledgement, only eventual agent replies. AGENT_TYPING flips
//! a transient flag that never enters the transcript.

use crate::session::protocol::{ChatMessage, Sender};
use crate::session::store::Advisory;

#[derive(Debug, Clone, Default)]
pub struct ChatSlice {
    messages: Vec<ChatMessage>,
    agent_typing: bool,
}

/// Client-generated ids carry a distinct prefix so they can never collide
/// with server-assigned ids.
pub fn local_message_id() -> String {
    format!("local-{}", uuid::Uuid::new_v4())
}

impl ChatSlice {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn agent_typing(&self) -> bool {
        self.agent_typing
    }

    /// Optimistically append a user-authored message and return it.
    pub fn push_local(&mut self, text: &str) -> ChatMessage {
        let message = ChatMessage {
            id: local_message_id(),
            sender: Sender::User,
            text: text.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.messages.push(message.clone());
        message
    }

    /// Append a received message verbatim, preserving arrival order.
    pub fn on_message(&mut self, message: ChatMessage) -> Option<Advisory> {
        self.messages.push(message);
        None
    }

    pub fn on_typing(&mut self, is_typing: bool) {
        self.agent_typing = is_typing;
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.agent_typing = false;
    }
}

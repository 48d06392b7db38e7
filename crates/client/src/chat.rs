// Local chat state: the message list plus the outbound draft buffer.

use coderoom_common::types::ChatMessage;

#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    draft: String,
}

impl ChatLog {
    /// Replace the draft buffer (mirrors the input field).
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Take the trimmed draft for sending and clear the buffer.
    ///
    /// Empty or whitespace-only drafts yield `None` and leave the
    /// buffer untouched; nothing reaches the outbound stream.
    pub fn take_draft(&mut self) -> Option<String> {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() {
            return None;
        }
        let content = trimmed.to_string();
        self.draft.clear();
        Some(content)
    }

    /// Replace the whole message list with the coordinator's backlog.
    /// Redelivery of an identical backlog is a safe no-op.
    pub fn apply_history(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Append exactly one message in arrival order. No dedup: a
    /// redelivered message appears twice (known gap, documented by
    /// test).
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.draft.clear();
    }
}

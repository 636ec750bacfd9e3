//! Message types and per-message state.

use crate::crypto::EncryptedPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a message, monotonically increasing within a
/// session. Assigned by the store; never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Sent by the local user. Delivered in the clear, never encrypted.
    User,
    /// The enhanced reply. Carries a sealed payload unless seeded.
    Assistant,
}

/// Derived content state of a message.
///
/// Computed from which bodies are present, so no dangling combination is
/// representable: a payload with no decrypted text is `Encrypted`, payload
/// plus decrypted text is `Decrypted`, no payload is `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Content was never encrypted (user messages, seeded notices).
    Plain,
    /// Sealed payload present, not yet decrypted.
    Encrypted,
    /// Sealed payload present and successfully decrypted.
    Decrypted,
}

/// One conversation entry in the append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message sender.
    pub sender: Sender,
    /// Plaintext body, present once composed.
    pub text: String,
    /// Sealed body, present only on encrypted assistant replies.
    pub payload: Option<EncryptedPayload>,
    /// Body recovered by a successful decrypt of this message's payload.
    pub decrypted_text: Option<String>,
    /// Read flag. Transitions false to true only, never reverts.
    pub is_read: bool,
}

impl Message {
    /// Create a user message. Terminal and immutable once appended.
    pub(crate) fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            payload: None,
            decrypted_text: None,
            is_read: false,
        }
    }

    /// Create an assistant reply holding its sealed body. Unread.
    pub(crate) fn assistant_sealed(
        id: MessageId,
        text: impl Into<String>,
        payload: EncryptedPayload,
    ) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: text.into(),
            payload: Some(payload),
            decrypted_text: None,
            is_read: false,
        }
    }

    /// Create an unencrypted assistant notice (e.g. the seeded welcome
    /// message). Already read.
    pub(crate) fn notice(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: text.into(),
            payload: None,
            decrypted_text: None,
            is_read: true,
        }
    }

    /// Derived content state.
    pub fn state(&self) -> MessageState {
        match (&self.payload, &self.decrypted_text) {
            (None, _) => MessageState::Plain,
            (Some(_), None) => MessageState::Encrypted,
            (Some(_), Some(_)) => MessageState::Decrypted,
        }
    }

    /// Whether the message content is legitimately visible: user messages
    /// always, assistant messages only once decrypted or never encrypted.
    pub fn is_visible(&self) -> bool {
        match self.sender {
            Sender::User => true,
            Sender::Assistant => self.state() != MessageState::Encrypted,
        }
    }

    /// Mark the message as read if its content is visible.
    ///
    /// Returns whether a transition happened; a second call is a no-op.
    pub(crate) fn mark_read(&mut self) -> bool {
        if !self.is_read && self.is_visible() {
            self.is_read = true;
            true
        } else {
            false
        }
    }

    /// Record the body recovered by decrypting this message's payload.
    pub(crate) fn set_decrypted(&mut self, text: String) {
        self.decrypted_text = Some(text);
    }
}

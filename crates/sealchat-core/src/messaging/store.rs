//! The message log and its legal state transitions.
//!
//! A [`MessageStore`] owns the ordered, append-only log, the session key,
//! and the enhancement collaborator. Every mutation takes `&mut self`, so
//! the single-logical-actor model is enforced by the borrow checker: a
//! second `send` cannot start while one is suspended, because `send`
//! borrows the store mutably for its whole duration.

use crate::crypto::{self, SecretKey};
use crate::error::Result;
use crate::messaging::enhance::TextEnhancer;
use crate::messaging::message::{Message, MessageId, Sender};
use std::sync::Arc;

/// Owner of the ordered message log; mediates every state transition.
pub struct MessageStore {
    key: SecretKey,
    enhancer: Arc<dyn TextEnhancer>,
    messages: Vec<Message>,
    next_id: u64,
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material is deliberately omitted to preserve key hygiene.
        f.debug_struct("MessageStore")
            .field("messages", &self.messages)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl MessageStore {
    /// Create an empty store over an established key.
    pub fn new(key: SecretKey, enhancer: Arc<dyn TextEnhancer>) -> Self {
        Self {
            key,
            enhancer,
            messages: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    /// Send a message: append the user entry, enhance, seal, append the
    /// assistant reply.
    ///
    /// Whitespace-only input is an `Ok` no-op. The enhancement call and the
    /// seal are a two-stage pipeline with one compensating action: if
    /// either stage fails, the just-appended user message is removed and
    /// the error is returned - no partial assistant entry can ever exist.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let user_id = self.next_id();
        self.messages.push(Message::user(user_id, text));

        let enhancer = Arc::clone(&self.enhancer);
        let enhanced = match enhancer.enhance(text).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                self.roll_back(user_id);
                return Err(e);
            }
        };

        let payload = match crypto::encrypt(&enhanced, &self.key) {
            Ok(payload) => payload,
            Err(e) => {
                self.roll_back(user_id);
                return Err(e);
            }
        };

        let reply_id = self.next_id();
        self.messages
            .push(Message::assistant_sealed(reply_id, enhanced, payload));

        tracing::debug!(user = %user_id, reply = %reply_id, "appended sealed reply");
        Ok(())
    }

    /// Remove the pending user message after a failed send.
    fn roll_back(&mut self, id: MessageId) {
        // Sends are serialized, so the pending entry is the last one.
        if self.messages.last().map(|m| m.id) == Some(id) {
            self.messages.pop();
            tracing::warn!(message = %id, "send failed, rolled back user message");
        }
    }

    /// Decrypt a sealed assistant message in place.
    ///
    /// No-op for unknown ids, user messages, never-encrypted messages, and
    /// already-decrypted messages (the duplicate call performs zero cipher
    /// work). On a cipher failure the message keeps its payload and prior
    /// state; the caller may retry.
    pub fn request_decrypt(&mut self, id: MessageId) -> Result<()> {
        let Some(index) = self.messages.iter().position(|m| m.id == id) else {
            return Ok(());
        };

        let message = &self.messages[index];
        if message.sender == Sender::User || message.decrypted_text.is_some() {
            return Ok(());
        }
        let Some(payload) = message.payload.clone() else {
            return Ok(());
        };

        let plaintext = crypto::decrypt(&payload, &self.key)?;
        self.messages[index].set_decrypted(plaintext);
        Ok(())
    }

    /// Mark a message as read.
    ///
    /// Idempotent; only flips the flag when the content is legitimately
    /// visible (user message, decrypted reply, or never-encrypted notice).
    /// Marking a still-sealed reply is a no-op.
    pub fn mark_read(&mut self, id: MessageId) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.mark_read();
        }
    }

    /// Append an unencrypted, already-read assistant notice.
    pub(crate) fn push_notice(&mut self, text: &str) {
        let id = self.next_id();
        self.messages.push(Message::notice(id, text));
    }

    /// All messages in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by id.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_SIZE;
    use crate::error::Error;
    use crate::messaging::enhance::PassthroughEnhancer;
    use crate::messaging::message::MessageState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Enhancer returning a fixed reply, counting its invocations.
    struct FixedEnhancer {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl FixedEnhancer {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextEnhancer for FixedEnhancer {
        async fn enhance(&self, _text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    /// Enhancer that always fails.
    struct FailingEnhancer;

    #[async_trait]
    impl TextEnhancer for FailingEnhancer {
        async fn enhance(&self, _text: &str) -> Result<String> {
            Err(Error::Enhancement("quota exhausted".into()))
        }
    }

    fn store_with(enhancer: Arc<dyn TextEnhancer>) -> MessageStore {
        MessageStore::new(SecretKey::from_bytes([7u8; KEY_SIZE]), enhancer)
    }

    #[tokio::test]
    async fn test_send_appends_user_and_sealed_reply() {
        let enhancer = Arc::new(FixedEnhancer::new("Greetings."));
        let mut store = store_with(enhancer.clone());

        store.send("hi").await.expect("send");

        assert_eq!(store.len(), 2);
        let user = &store.messages()[0];
        assert_eq!(user.sender, Sender::User);
        assert_eq!(user.text, "hi");
        assert!(user.payload.is_none());

        let reply = &store.messages()[1];
        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.text, "Greetings.");
        assert_eq!(reply.state(), MessageState::Encrypted);
        assert!(!reply.is_read);
        assert_eq!(enhancer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_empty_text_is_noop() {
        let enhancer = Arc::new(FixedEnhancer::new("unused"));
        let mut store = store_with(enhancer.clone());

        store.send("").await.expect("send");
        store.send("   \n\t ").await.expect("send");

        assert!(store.is_empty());
        assert_eq!(enhancer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_enhancement_rolls_back_user_message() {
        let mut store = store_with(Arc::new(FailingEnhancer));

        let err = store.send("hi").await.expect_err("must fail");
        assert!(matches!(err, Error::Enhancement(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_decrypt_transitions_reply() {
        let mut store = store_with(Arc::new(FixedEnhancer::new("Greetings.")));
        store.send("hi").await.expect("send");
        let reply_id = store.messages()[1].id;

        store.request_decrypt(reply_id).expect("decrypt");

        let reply = store.get(reply_id).expect("reply");
        assert_eq!(reply.state(), MessageState::Decrypted);
        assert_eq!(reply.decrypted_text.as_deref(), Some("Greetings."));
    }

    #[tokio::test]
    async fn test_decrypt_is_idempotent() {
        let mut store = store_with(Arc::new(FixedEnhancer::new("Greetings.")));
        store.send("hi").await.expect("send");
        let reply_id = store.messages()[1].id;

        store.request_decrypt(reply_id).expect("first");
        store.request_decrypt(reply_id).expect("second");

        let reply = store.get(reply_id).expect("reply");
        assert_eq!(reply.decrypted_text.as_deref(), Some("Greetings."));
    }

    #[tokio::test]
    async fn test_decrypt_noop_for_user_and_unknown_ids() {
        let mut store = store_with(Arc::new(FixedEnhancer::new("Greetings.")));
        store.send("hi").await.expect("send");
        let user_id = store.messages()[0].id;

        store.request_decrypt(user_id).expect("user noop");
        store.request_decrypt(MessageId(999)).expect("unknown noop");

        assert!(store.messages()[0].decrypted_text.is_none());
    }

    #[tokio::test]
    async fn test_decrypt_with_foreign_key_payload_fails_and_preserves_state() {
        // Seal a reply under one key, then try to open it in a store holding
        // a different key.
        let mut sender_store = store_with(Arc::new(FixedEnhancer::new("Greetings.")));
        sender_store.send("hi").await.expect("send");
        let payload = sender_store.messages()[1]
            .payload
            .clone()
            .expect("payload");

        let mut receiver_store = MessageStore::new(
            SecretKey::from_bytes([8u8; KEY_SIZE]),
            Arc::new(PassthroughEnhancer),
        );
        let id = receiver_store.next_id();
        receiver_store
            .messages
            .push(Message::assistant_sealed(id, "Greetings.", payload));

        let err = receiver_store.request_decrypt(id).expect_err("must fail");
        assert!(matches!(err, Error::AuthenticationFailure));

        let message = receiver_store.get(id).expect("message");
        assert_eq!(message.state(), MessageState::Encrypted);
        assert!(message.payload.is_some());
    }

    #[tokio::test]
    async fn test_read_gating_and_idempotence() {
        let mut store = store_with(Arc::new(FixedEnhancer::new("Greetings.")));
        store.send("hi").await.expect("send");
        let user_id = store.messages()[0].id;
        let reply_id = store.messages()[1].id;

        // User message is immediately read-eligible.
        store.mark_read(user_id);
        assert!(store.get(user_id).expect("user").is_read);

        // Sealed reply is not, until decrypted.
        store.mark_read(reply_id);
        assert!(!store.get(reply_id).expect("reply").is_read);

        store.request_decrypt(reply_id).expect("decrypt");
        store.mark_read(reply_id);
        assert!(store.get(reply_id).expect("reply").is_read);

        // Second mark is a no-op, flag stays set.
        store.mark_read(reply_id);
        assert!(store.get(reply_id).expect("reply").is_read);
    }

    #[tokio::test]
    async fn test_ids_are_monotonic_across_rollback() {
        let mut store = store_with(Arc::new(FixedEnhancer::new("Greetings.")));
        store.send("one").await.expect("send");

        // A failed send consumes an id but leaves the log consistent.
        store.enhancer = Arc::new(FailingEnhancer);
        store.send("two").await.expect_err("fails");

        store.enhancer = Arc::new(FixedEnhancer::new("Again."));
        store.send("three").await.expect("send");

        let ids: Vec<u64> = store.messages().iter().map(|m| m.id.0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted, "ids must be strictly increasing");
    }
}

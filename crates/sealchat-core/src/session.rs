//! Session bootstrap.
//!
//! Establishes the session key on startup and seeds the message log. On
//! first run a key is generated and persisted *before* the store is built,
//! so no message can ever reference a key that was not first written to
//! storage. A stored key that fails to import is fatal: regenerating would
//! silently orphan every previously sealed message, a one-way decision the
//! bootstrap must not make implicitly.

use crate::crypto::{self, SecretKey};
use crate::error::Result;
use crate::messaging::{MessageStore, TextEnhancer};
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Storage id of the serialized session key.
pub const KEY_STORAGE_ID: &str = "secure-messenger-crypto-key";

/// Seeded assistant greeting for an empty log.
pub const WELCOME_TEXT: &str = "Hello! I'm your secure messaging assistant. \
     I'll rephrase your messages to be more professional and then encrypt them. \
     Let's start!";

/// Obtain or create the session key and build the seeded message store.
///
/// Reads the stored key string; imports it if present (import failure
/// propagates, never regenerates), otherwise generates a fresh key and
/// persists its export before any message exists. Seeds the log with the
/// welcome notice.
pub fn bootstrap(
    kv: &dyn KeyValueStore,
    enhancer: Arc<dyn TextEnhancer>,
) -> Result<MessageStore> {
    let key = match kv.get_string(KEY_STORAGE_ID)? {
        Some(serialized) => {
            let key = crypto::import_key(&serialized)?;
            tracing::info!("loaded existing session key");
            key
        }
        None => {
            let key = SecretKey::generate()?;
            // Persist before use: a crash after this line can always
            // re-derive the session from storage.
            kv.set_string(KEY_STORAGE_ID, &crypto::export_key(&key))?;
            tracing::info!("generated and persisted new session key");
            key
        }
    };

    let mut store = MessageStore::new(key, enhancer);
    if store.is_empty() {
        store.push_notice(WELCOME_TEXT);
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::messaging::{MessageState, PassthroughEnhancer, Sender};
    use crate::storage::MemoryStore;

    fn enhancer() -> Arc<dyn TextEnhancer> {
        Arc::new(PassthroughEnhancer)
    }

    #[test]
    fn test_first_run_generates_and_persists_key_before_seeding() {
        let kv = MemoryStore::new();
        assert_eq!(kv.get_string(KEY_STORAGE_ID).unwrap(), None);

        let store = bootstrap(&kv, enhancer()).expect("bootstrap");

        // Key persisted...
        let stored = kv.get_string(KEY_STORAGE_ID).unwrap().expect("stored key");
        crypto::import_key(&stored).expect("stored key imports");

        // ...and exactly one seeded welcome notice.
        assert_eq!(store.len(), 1);
        let welcome = &store.messages()[0];
        assert_eq!(welcome.sender, Sender::Assistant);
        assert_eq!(welcome.state(), MessageState::Plain);
        assert!(welcome.is_read);
        assert_eq!(welcome.text, WELCOME_TEXT);
    }

    #[test]
    fn test_second_run_reuses_stored_key() {
        let kv = MemoryStore::new();

        bootstrap(&kv, enhancer()).expect("first run");
        let first = kv.get_string(KEY_STORAGE_ID).unwrap().expect("key");

        bootstrap(&kv, enhancer()).expect("second run");
        let second = kv.get_string(KEY_STORAGE_ID).unwrap().expect("key");

        assert_eq!(first, second, "key must not be regenerated");
    }

    #[test]
    fn test_corrupt_stored_key_is_fatal_and_not_replaced() {
        let kv = MemoryStore::new();
        kv.set_string(KEY_STORAGE_ID, "corrupted nonsense").unwrap();

        let err = bootstrap(&kv, enhancer()).expect_err("must fail");
        assert!(matches!(err, Error::MalformedKey(_)));
        assert!(err.is_fatal());

        // The corrupt value is left in place for the operator to inspect.
        assert_eq!(
            kv.get_string(KEY_STORAGE_ID).unwrap().as_deref(),
            Some("corrupted nonsense")
        );
    }

    #[test]
    fn test_wrong_algorithm_key_is_fatal() {
        let kv = MemoryStore::new();
        kv.set_string(
            KEY_STORAGE_ID,
            r#"{"kty":"oct","alg":"A128GCM","k":"AAECAwQFBgcICQoLDA0ODw"}"#,
        )
        .unwrap();

        let err = bootstrap(&kv, enhancer()).expect_err("must fail");
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[tokio::test]
    async fn test_sessions_share_the_persisted_key() {
        // A payload sealed in one session decrypts in the next.
        let kv = MemoryStore::new();

        let mut first = bootstrap(&kv, enhancer()).expect("first session");
        first.send("hello across sessions").await.expect("send");
        let payload = first.messages()[2].payload.clone().expect("payload");

        let stored = kv.get_string(KEY_STORAGE_ID).unwrap().expect("key");
        let key = crypto::import_key(&stored).expect("import");
        assert_eq!(
            crypto::decrypt(&payload, &key).expect("decrypt"),
            "hello across sessions"
        );
    }
}

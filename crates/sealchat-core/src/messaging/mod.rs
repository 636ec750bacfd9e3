//! Messaging for Sealchat.
//!
//! The conversation log and its lifecycle: composed user text is enhanced
//! by an out-of-process collaborator, sealed with the session key, and
//! appended as an assistant reply that moves Encrypted -> Decrypted ->
//! Read under explicit method calls. The rendering layer decides *when* to
//! call; this module owns *how* state changes.

mod enhance;
mod message;
mod store;

pub use enhance::{GeminiEnhancer, PassthroughEnhancer, TextEnhancer};
pub use message::{Message, MessageId, MessageState, Sender};
pub use store::MessageStore;

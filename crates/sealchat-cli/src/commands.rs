//! Interactive REPL over the message store.
//!
//! The terminal is the rendering layer: it decides when to ask for a
//! decrypt and when content counts as read, while the core owns every
//! state change.

use anyhow::{bail, Context, Result};
use sealchat_core::messaging::{
    GeminiEnhancer, Message, MessageId, MessageState, PassthroughEnhancer, Sender, TextEnhancer,
};
use sealchat_core::session::bootstrap;
use sealchat_core::storage::FileStore;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Expand a leading `~/` against `$HOME`.
fn expand_data_dir(raw: &str) -> Result<String> {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = std::env::var("HOME").context("HOME not set; pass --data-dir explicitly")?;
        Ok(format!("{}/{}", home, rest))
    } else {
        Ok(raw.to_string())
    }
}

fn build_enhancer(offline: bool) -> Result<Arc<dyn TextEnhancer>> {
    if offline {
        return Ok(Arc::new(PassthroughEnhancer));
    }
    match std::env::var("GEMINI_API_KEY") {
        Ok(api_key) if !api_key.is_empty() => {
            Ok(Arc::new(GeminiEnhancer::new(api_key)?))
        }
        _ => bail!("GEMINI_API_KEY is not set (or pass --offline to seal messages as typed)"),
    }
}

fn render(message: &Message) {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    let read_marker = if message.is_read { "✓" } else { " " };

    match message.state() {
        MessageState::Plain => {
            println!("[{:>3}] {} {:>9}: {}", message.id, read_marker, who, message.text);
        }
        MessageState::Encrypted => {
            let payload = message.payload.as_ref().map(|p| p.as_str()).unwrap_or("");
            println!(
                "[{:>3}] {} {:>9}: <encrypted> {}",
                message.id, read_marker, who, payload
            );
        }
        MessageState::Decrypted => {
            let text = message.decrypted_text.as_deref().unwrap_or("");
            println!("[{:>3}] {} {:>9}: {}", message.id, read_marker, who, text);
        }
    }
}

fn parse_id(arg: Option<&str>, usage: &str) -> Option<MessageId> {
    match arg.and_then(|s| s.parse::<u64>().ok()) {
        Some(n) => Some(MessageId(n)),
        None => {
            println!("usage: {}", usage);
            None
        }
    }
}

/// Run the interactive session.
pub async fn run(data_dir: &str, offline: bool) -> Result<()> {
    let data_dir = expand_data_dir(data_dir)?;
    let kv = FileStore::new(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir))?;
    let enhancer = build_enhancer(offline)?;

    let mut store = bootstrap(&kv, enhancer).context("failed to initialize session")?;
    tracing::debug!(data_dir = %data_dir, offline, "session ready");

    println!("sealchat {} - type 'help' for commands", sealchat_core::VERSION);
    for message in store.messages() {
        render(message);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    print_prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, Some(r.trim())),
            None => (line, None),
        };

        match command {
            "" => {}
            "help" => {
                println!("  send <text>    rephrase, seal, and append a message");
                println!("  list           show the conversation");
                println!("  decrypt <id>   unseal an assistant reply");
                println!("  read <id>      mark a visible message as read");
                println!("  quit           exit");
            }
            "send" => match rest {
                Some(text) if !text.is_empty() => {
                    if let Err(e) = store.send(text).await {
                        println!("error: {}", e);
                    } else if let Some(reply) = store.messages().last() {
                        render(reply);
                    }
                }
                _ => println!("usage: send <text>"),
            },
            "list" => {
                for message in store.messages() {
                    render(message);
                }
            }
            "decrypt" => {
                if let Some(id) = parse_id(rest, "decrypt <id>") {
                    match store.request_decrypt(id) {
                        Ok(()) => match store.get(id) {
                            Some(message) => render(message),
                            None => println!("no message {}", id),
                        },
                        Err(e) => println!("error: {}", e),
                    }
                }
            }
            "read" => {
                if let Some(id) = parse_id(rest, "read <id>") {
                    store.mark_read(id);
                    match store.get(id) {
                        Some(message) => render(message),
                        None => println!("no message {}", id),
                    }
                }
            }
            "quit" | "exit" => break,
            other => println!("unknown command '{}' - type 'help'", other),
        }
        print_prompt();
    }

    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_data_dir_passthrough() {
        assert_eq!(expand_data_dir("/var/lib/sealchat").unwrap(), "/var/lib/sealchat");
    }

    #[test]
    fn test_expand_data_dir_tilde() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(expand_data_dir("~/.sealchat").unwrap(), "/home/tester/.sealchat");
    }

    #[test]
    fn test_build_enhancer_offline() {
        assert!(build_enhancer(true).is_ok());
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{read_json_array, write_json};
use crate::feeds::ai::{ChatBackend, chat_prompts};
use crate::models::{AiPriceSnapshot, ChatMessage, ChatRole};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_SAVED_MESSAGES: usize = 20;

#[derive(Debug)]
pub struct ChatHistory {
    path: PathBuf,
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let messages = read_json_array(&path);
        Self { path, messages }
    }

    /// Keeps only the most recent messages, in memory and on disk.
    pub fn save(&mut self) -> Result<()> {
        let excess = self.messages.len().saturating_sub(MAX_SAVED_MESSAGES);
        self.messages.drain(..excess);
        write_json(&self.path, &self.messages)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn push(&mut self, role: ChatRole, prefix: &str, content: &str, now: DateTime<Utc>) -> &ChatMessage {
        self.messages.push(ChatMessage {
            id: format!("{}-{}", prefix, now.timestamp_millis()),
            role,
            content: content.to_string(),
            timestamp: now,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, content: &str, now: DateTime<Utc>) -> &ChatMessage {
        self.push(ChatRole::User, "user", content, now)
    }

    pub fn push_assistant(&mut self, content: &str, now: DateTime<Utc>) -> &ChatMessage {
        self.push(ChatRole::Assistant, "ai", content, now)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.messages.clear();
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Remove {}", self.path.display()))
            }
            _ => Ok(()),
        }
    }
}

/// Records the question, asks the backend with prior turns as context and
/// records the answer. Blank input is ignored and returns `None`.
pub fn send_message(
    history: &mut ChatHistory,
    backend: &dyn ChatBackend,
    snapshot: &AiPriceSnapshot,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let prompts = chat_prompts(snapshot, history.messages(), text);
    history.push_user(text, now);
    history.save()?;

    let reply = backend.complete(&prompts)?;
    history.push_assistant(&reply, Utc::now());
    history.save()?;
    Ok(Some(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::ai::{PromptMessage, PromptRole};
    use chrono::TimeZone;
    use std::cell::Cell;

    struct Echo {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ChatBackend for Echo {
        fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                anyhow::bail!("backend down");
            }
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            assert_eq!(messages.last().map(|m| m.role), Some(PromptRole::User));
            Ok(format!("echo: {}", last))
        }
    }

    fn snapshot() -> AiPriceSnapshot {
        AiPriceSnapshot {
            world_price: 2650.0,
            world_change: 0.0,
            world_change_percent: 0.0,
            world_high_24h: 2650.0,
            world_low_24h: 2650.0,
            vn_price: 86_000_000.0,
            exchange_rate: 25_400.0,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap()
    }

    #[test]
    fn round_trip_saves_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");
        let mut history = ChatHistory::load(&path);
        let backend = Echo {
            calls: Cell::new(0),
            fail: false,
        };
        let reply = send_message(&mut history, &backend, &snapshot(), "  Giá hôm nay?  ", t0()).unwrap();
        assert_eq!(reply.as_deref(), Some("echo: Giá hôm nay?"));

        let reloaded = ChatHistory::load(&path);
        assert_eq!(reloaded.messages().len(), 2);
        assert_eq!(reloaded.messages()[0].role, ChatRole::User);
        assert_eq!(reloaded.messages()[0].content, "Giá hôm nay?");
        assert!(reloaded.messages()[0].id.starts_with("user-"));
        assert!(reloaded.messages()[1].id.starts_with("ai-"));
    }

    #[test]
    fn blank_messages_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = ChatHistory::load(dir.path().join("c.json"));
        let backend = Echo {
            calls: Cell::new(0),
            fail: false,
        };
        assert_eq!(send_message(&mut history, &backend, &snapshot(), "   ", t0()).unwrap(), None);
        assert_eq!(backend.calls.get(), 0);
        assert!(history.messages().is_empty());
    }

    #[test]
    fn failed_reply_keeps_the_question() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut history = ChatHistory::load(&path);
        let backend = Echo {
            calls: Cell::new(0),
            fail: true,
        };
        assert!(send_message(&mut history, &backend, &snapshot(), "Mua không?", t0()).is_err());
        assert_eq!(ChatHistory::load(&path).messages().len(), 1);
    }

    #[test]
    fn save_keeps_the_last_twenty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut history = ChatHistory::load(&path);
        for i in 0..25 {
            history.push_user(&format!("q{}", i), t0());
        }
        history.save().unwrap();
        let reloaded = ChatHistory::load(&path);
        assert_eq!(reloaded.messages().len(), MAX_SAVED_MESSAGES);
        assert_eq!(reloaded.messages()[0].content, "q5");

        history.clear().unwrap();
        assert!(!path.exists());
        history.clear().unwrap();
    }
}

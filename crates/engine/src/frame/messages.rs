use std::collections::VecDeque;

use crate::config::MessageConfig;

const MAX_QUEUED_MESSAGES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub posted_ms: u64,
    pub expires_ms: u64,
}

/// Short-lived on-screen notices, oldest first. Expiry is by deadline only.
#[derive(Debug, Clone)]
pub struct MessageLog {
    ttl_ms: u64,
    max_visible: usize,
    entries: VecDeque<Message>,
}

impl MessageLog {
    pub fn new(config: &MessageConfig) -> Self {
        Self {
            ttl_ms: config.ttl_ms.max(1),
            max_visible: config.max_visible,
            entries: VecDeque::new(),
        }
    }

    /// Posting the same text as the newest message refreshes it instead of stacking.
    pub fn post(&mut self, text: impl Into<String>, now_ms: u64) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        let expires_ms = now_ms.saturating_add(self.ttl_ms);
        if let Some(last) = self.entries.back_mut() {
            if last.text == text {
                last.posted_ms = now_ms;
                last.expires_ms = expires_ms;
                return;
            }
        }
        self.entries.push_back(Message {
            text,
            posted_ms: now_ms,
            expires_ms,
        });
        while self.entries.len() > MAX_QUEUED_MESSAGES {
            self.entries.pop_front();
        }
    }

    pub fn expire(&mut self, now_ms: u64) {
        self.entries.retain(|message| message.expires_ms > now_ms);
    }

    /// Newest `max_visible` live messages, oldest first.
    pub fn visible(&self, now_ms: u64) -> impl Iterator<Item = &Message> {
        let live: Vec<&Message> = self
            .entries
            .iter()
            .filter(|message| message.expires_ms > now_ms)
            .collect();
        let skip = live.len().saturating_sub(self.max_visible);
        live.into_iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

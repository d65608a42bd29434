//! Scripted chat feed.
//!
//! Replays a fixed comment script on a cadence and keeps a bounded log of
//! emitted messages. The visible window is always the last `visible_count`
//! entries of that log. The first window is seeded straight from the head
//! of the script at construction time.

use crate::config::{ChatConfig, Comment};
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;

/// History retained beyond the visible window.
pub const MAX_HISTORY: usize = 200;

/// Author name used for messages typed by the visitor.
pub const LOCAL_USER: &str = "Anonymous User";

const LOCAL_COLOR: &str = "gray";

const PALETTE: [&str; 10] = [
    "blue", "green", "purple", "orange", "pink", "red", "yellow", "indigo", "teal", "cyan",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum MessageSource {
    /// Came from the script at this index.
    Scripted { index: usize },
    /// Typed by the visitor; never replayed.
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub user: String,
    pub initials: String,
    pub message: String,
    /// Cosmetic avatar color.
    pub color: &'static str,
    pub source: MessageSource,
    /// Virtual millisecond the message appeared.
    pub created_at: u64,
}

/// Up to two uppercase initials from a display name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[derive(Debug, Clone)]
pub struct CommentScheduler {
    script: Vec<Comment>,
    cursor: usize,
    visible_count: usize,
    looping: bool,
    stopped: bool,
    log: VecDeque<ChatMessage>,
    next_id: u64,
    /// Scripted messages emitted so far, seed included.
    emitted: u64,
}

impl CommentScheduler {
    pub fn new<R: Rng + ?Sized>(config: &ChatConfig, script: Vec<Comment>, rng: &mut R) -> Self {
        let seed = config.visible_count.min(script.len());
        let mut chat = Self {
            script,
            cursor: seed,
            visible_count: config.visible_count,
            looping: config.looping,
            stopped: false,
            log: VecDeque::new(),
            next_id: 1,
            emitted: 0,
        };
        for index in 0..seed {
            chat.push_scripted(index, 0, rng);
        }
        chat
    }

    /// True when there is nothing to schedule at all.
    pub fn is_idle(&self) -> bool {
        self.script.is_empty()
    }

    /// True once a non-looping script has run out.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Script index the next emission will use, if any.
    pub fn peek_next(&self) -> Option<usize> {
        if self.script.is_empty() || self.stopped {
            return None;
        }
        if self.cursor < self.script.len() {
            Some(self.cursor)
        } else if self.looping {
            Some(0)
        } else {
            None
        }
    }

    /// One scheduler step. Returns `None` (and stays stopped) when a
    /// non-looping script is exhausted.
    pub fn emit_next<R: Rng + ?Sized>(&mut self, now: u64, rng: &mut R) -> Option<&ChatMessage> {
        let Some(index) = self.peek_next() else {
            if !self.script.is_empty() && !self.stopped {
                tracing::debug!("comment script exhausted after {} messages", self.emitted);
            }
            self.stopped = !self.script.is_empty();
            return None;
        };
        if index == 0 && self.cursor != 0 {
            tracing::debug!("comment script wrapped");
        }
        self.cursor = index + 1;
        self.push_scripted(index, now, rng);
        self.log.back()
    }

    /// Append a message typed by the visitor. Blank input is ignored.
    pub fn post_local(&mut self, text: &str, now: u64) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let id = self.push(ChatMessage {
            id: 0,
            user: LOCAL_USER.to_string(),
            initials: "AU".to_string(),
            message: text.to_string(),
            color: LOCAL_COLOR,
            source: MessageSource::Local,
            created_at: now,
        });
        Some(id)
    }

    /// The last `visible_count` messages, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        let skip = self.log.len().saturating_sub(self.visible_count);
        self.log.iter().skip(skip)
    }

    /// Retained history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.log.iter()
    }

    fn push_scripted<R: Rng + ?Sized>(&mut self, index: usize, now: u64, rng: &mut R) {
        let comment = &self.script[index];
        let message = ChatMessage {
            id: 0,
            user: comment.user.clone(),
            initials: initials(&comment.user),
            message: comment.message.clone(),
            color: PALETTE[rng.gen_range(0..PALETTE.len())],
            source: MessageSource::Scripted { index },
            created_at: now,
        };
        self.push(message);
        self.emitted += 1;
    }

    fn push(&mut self, mut message: ChatMessage) -> u64 {
        message.id = self.next_id;
        self.next_id += 1;
        let id = message.id;
        self.log.push_back(message);
        let cap = MAX_HISTORY.max(self.visible_count);
        while self.log.len() > cap {
            self.log.pop_front();
        }
        id
    }
}

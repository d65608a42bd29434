//! Floating reaction events (hearts / emoji).
//!
//! Every emission lives for exactly [`REACTION_TTL_MS`] and is then removed
//! by its own timer. Removal matches on id, so overlapping lifetimes never
//! interfere with each other.

use crate::config::{ReactionsConfig, SpanRange};
use rand::Rng;
use serde::Serialize;

pub const REACTION_TTL_MS: u64 = 3000;

pub const HEART: &str = "\u{2764}\u{fe0f}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReactionKind {
    /// Emitted by the ambient ticker.
    Ambient,
    /// Emitted by an explicit tap.
    Tap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    pub id: u64,
    pub kind: ReactionKind,
    pub glyph: &'static str,
    /// Horizontal position in percent of the surface width.
    pub position: f64,
    pub created_at: u64,
}

impl ReactionEvent {
    pub fn expires_at(&self) -> u64 {
        self.created_at + REACTION_TTL_MS
    }
}

#[derive(Debug, Clone)]
pub struct ReactionEmitter {
    ambient_range: SpanRange,
    tap_range: SpanRange,
    active: Vec<ReactionEvent>,
    next_id: u64,
}

impl ReactionEmitter {
    pub fn new(config: &ReactionsConfig) -> Self {
        Self {
            ambient_range: config.ambient_range,
            tap_range: config.tap_range,
            active: Vec::new(),
            next_id: 0,
        }
    }

    /// Create one event and return a copy of it. The caller owns the
    /// removal timer.
    pub fn emit<R: Rng + ?Sized>(&mut self, kind: ReactionKind, now: u64, rng: &mut R) -> ReactionEvent {
        let range = match kind {
            ReactionKind::Ambient => self.ambient_range,
            ReactionKind::Tap => self.tap_range,
        };
        let (low, high) = range.bounds();
        let position = if high > low { rng.gen_range(low..=high) } else { low };
        let event = ReactionEvent {
            id: self.next_id,
            kind,
            glyph: HEART,
            position,
            created_at: now,
        };
        self.next_id += 1;
        self.active.push(event.clone());
        event
    }

    /// Remove the event with this id. Other events are untouched.
    pub fn expire(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|e| e.id != id);
        before != self.active.len()
    }

    pub fn active(&self) -> &[ReactionEvent] {
        &self.active
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

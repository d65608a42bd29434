//! Viewer count simulation.
//!
//! A bounded random walk with an optional one-time regime change (the
//! "drop"). The drop can be requested by two independent timer lines, the
//! provider's elapsed-time poll and the fallback timer; [`DropLatch`] makes
//! sure only the first request takes effect.

use crate::config::{CountRange, ViewerConfig};
use rand::Rng;
use serde::Serialize;

/// One-shot latch: unset -> set, never back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropLatch {
    tripped: bool,
}

impl DropLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and set in one step. Returns true only for the caller that
    /// flipped the latch.
    pub fn try_trip(&mut self) -> bool {
        !std::mem::replace(&mut self.tripped, true)
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewerPhase {
    /// Drop disabled: +/-1 jitter, floor at 1.
    Flat,
    PreDrop,
    /// Terminal.
    PostDrop,
}

/// Which timer line asked for the drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DropTrigger {
    PlaybackTime,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ViewerSimulator {
    current: i64,
    phase: ViewerPhase,
    latch: DropLatch,
    before_drop: CountRange,
    after_drop: CountRange,
    drop_time_seconds: f64,
    ticks: u64,
}

impl ViewerSimulator {
    pub fn new(config: &ViewerConfig) -> Self {
        let phase = if config.drop_enabled {
            ViewerPhase::PreDrop
        } else {
            ViewerPhase::Flat
        };
        Self {
            current: config.initial_count.max(1),
            phase,
            latch: DropLatch::new(),
            before_drop: config.before_drop,
            after_drop: config.after_drop,
            drop_time_seconds: config.drop_time_seconds.max(0.0),
            ticks: 0,
        }
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    pub fn has_dropped(&self) -> bool {
        self.phase == ViewerPhase::PostDrop
    }

    /// Periodic updates applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn drop_time_seconds(&self) -> f64 {
        self.drop_time_seconds
    }

    /// One periodic update step.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i64 {
        let next = match self.phase {
            ViewerPhase::Flat => {
                let delta = if rng.gen_bool(0.5) { 1 } else { -1 };
                self.current.saturating_add(delta)
            }
            ViewerPhase::PreDrop => {
                let delta = if rng.gen_bool(0.5) {
                    rng.gen_range(1..=15)
                } else {
                    -rng.gen_range(1..=12)
                };
                self.before_drop.clamp(self.current.saturating_add(delta))
            }
            ViewerPhase::PostDrop => {
                let magnitude = rng.gen_range(1..=5);
                let delta = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
                self.after_drop.clamp(self.current.saturating_add(delta))
            }
        };
        self.current = next.max(1);
        self.ticks += 1;
        self.current
    }

    /// Perform the PreDrop -> PostDrop transition if this is the first
    /// request. The count is resampled uniformly from the after-drop range
    /// so the change reads as a cliff, not a slide.
    pub fn try_drop<R: Rng + ?Sized>(&mut self, trigger: DropTrigger, rng: &mut R) -> bool {
        if self.phase != ViewerPhase::PreDrop || !self.latch.try_trip() {
            return false;
        }
        let (low, high) = self.after_drop.bounds();
        let before = self.current;
        self.current = rng.gen_range(low..=high).max(1);
        self.phase = ViewerPhase::PostDrop;
        tracing::info!(?trigger, before, after = self.current, "viewer drop");
        true
    }

    /// Feed a playback position from the provider poll.
    pub fn observe_elapsed<R: Rng + ?Sized>(&mut self, seconds: f64, rng: &mut R) -> bool {
        seconds >= self.drop_time_seconds && self.try_drop(DropTrigger::PlaybackTime, rng)
    }
}

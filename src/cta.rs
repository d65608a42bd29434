//! Delayed call-to-action reveal: hidden -> visible, once.

use crate::config::{seconds_to_ms, CtaConfig};

#[derive(Debug, Clone)]
pub struct CtaRevealer {
    enabled: bool,
    delay_ms: u64,
    visible: bool,
}

impl CtaRevealer {
    pub fn new(config: &CtaConfig) -> Self {
        Self {
            enabled: config.enabled,
            delay_ms: seconds_to_ms(config.delay_seconds),
            visible: false,
        }
    }

    /// Delay to arm the reveal timer with, or `None` if it must never be armed.
    pub fn arm_delay(&self) -> Option<u64> {
        (self.enabled && !self.visible).then_some(self.delay_ms)
    }

    /// Flip to visible. Returns true only on the actual transition.
    pub fn reveal(&mut self) -> bool {
        if !self.enabled || self.visible {
            return false;
        }
        self.visible = true;
        true
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

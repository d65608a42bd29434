//! The engagement surface: every component multiplexed onto one scheduler.
//!
//! A [`LiveSession`] owns the configuration, the virtual clock, the seeded
//! RNG, the five components and the mount point. Time only moves through
//! [`LiveSession::advance`] / [`LiveSession::advance_to`], which fire due
//! timers one at a time in order.

use crate::chat::{ChatMessage, CommentScheduler};
use crate::config::{seconds_to_ms, LiveConfig, ProviderKind, VideoConfig};
use crate::cta::CtaRevealer;
use crate::provider::{build_provider, MediaHost, VideoProvider, POLL_INTERVAL_MS};
use crate::reactions::{ReactionEmitter, ReactionEvent, ReactionKind, REACTION_TTL_MS};
use crate::scheduler::{Fired, Scheduler, TimerId};
use crate::surface::Surface;
use crate::viewers::{DropTrigger, ViewerPhase, ViewerSimulator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    ViewerTick,
    DropFallback,
    ProviderPoll,
    ChatNext,
    ReactionAmbient,
    ReactionExpire(u64),
    CtaReveal,
}

/// Everything a presentation layer needs at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub time_ms: u64,
    pub mounted: bool,
    pub provider: ProviderKind,
    pub viewers: i64,
    pub phase: ViewerPhase,
    pub dropped_at: Option<u64>,
    pub drop_trigger: Option<DropTrigger>,
    pub chat: Vec<ChatMessage>,
    pub reactions: Vec<ReactionEvent>,
    pub cta_visible: bool,
    pub cta_text: String,
    pub surface: String,
}

pub struct LiveSession<H: MediaHost> {
    config: LiveConfig,
    scheduler: Scheduler<Task>,
    rng: ChaCha8Rng,
    viewers: ViewerSimulator,
    chat: CommentScheduler,
    reactions: ReactionEmitter,
    cta: CtaRevealer,
    surface: Surface,
    provider: Box<dyn VideoProvider>,
    host: H,
    mounted: bool,
    viewer_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
    fallback_timer: Option<TimerId>,
    dropped: Option<(u64, DropTrigger)>,
}

impl<H: MediaHost> LiveSession<H> {
    pub fn new(config: LiveConfig, host: H) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        tracing::debug!(seed, "session rng seeded");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let chat = CommentScheduler::new(&config.chat, config.comments.clone(), &mut rng);
        Self {
            viewers: ViewerSimulator::new(&config.video.viewers),
            reactions: ReactionEmitter::new(&config.reactions),
            cta: CtaRevealer::new(&config.cta),
            provider: build_provider(&config.video),
            scheduler: Scheduler::new(),
            surface: Surface::new(),
            chat,
            rng,
            host,
            config,
            mounted: false,
            viewer_timer: None,
            poll_timer: None,
            fallback_timer: None,
            dropped: None,
        }
    }

    /// Start every component's timers and mount the provider. A second
    /// call while mounted does nothing.
    pub fn mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        tracing::info!(provider = %self.provider.kind(), at = self.now(), "session mounted");

        self.start_viewer_ticker();

        let chat_interval = seconds_to_ms(self.config.chat.interval_seconds);
        if self.chat.is_idle() {
            tracing::debug!("comment script empty, chat stays quiet");
        } else if chat_interval == 0 {
            tracing::warn!("chat interval is zero, scripted chat disabled");
        } else if !self.chat.is_stopped() {
            self.scheduler.schedule_once(chat_interval, Task::ChatNext);
        }

        if self.config.reactions.enabled {
            let interval = self.config.reactions.interval_ms;
            if interval == 0 {
                tracing::warn!("reaction interval is zero, ambient reactions disabled");
            } else {
                self.scheduler.schedule_repeating(interval, interval, Task::ReactionAmbient);
            }
        }

        if let Some(delay) = self.cta.arm_delay() {
            self.scheduler.schedule_once(delay, Task::CtaReveal);
        }

        self.mount_provider();
        true
    }

    /// Cancel every timer and release the provider. Component state is
    /// kept, so a later [`mount`](Self::mount) resumes where this left off.
    pub fn unmount(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.mounted = false;
        let cancelled = self.scheduler.cancel_all();
        self.viewer_timer = None;
        self.poll_timer = None;
        self.fallback_timer = None;
        self.provider.unmount(&mut self.surface, &mut self.host);
        self.reactions.clear();
        tracing::info!(cancelled, at = self.now(), "session unmounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn advance(&mut self, ms: u64) {
        self.advance_to(self.now().saturating_add(ms));
    }

    /// Fire every timer due up to and including `t`, in order.
    pub fn advance_to(&mut self, t: u64) {
        while let Some(fired) = self.scheduler.pop_due(t) {
            self.dispatch(fired);
        }
        self.scheduler.settle(t);
    }

    /// Post a message typed by the visitor.
    pub fn submit_chat(&mut self, text: &str) -> Option<u64> {
        let now = self.now();
        self.chat.post_local(text, now)
    }

    /// One reaction from an explicit tap.
    pub fn tap_reaction(&mut self) -> ReactionEvent {
        self.emit_reaction(ReactionKind::Tap)
    }

    /// Point the provider at a different video. The provider is rebuilt and
    /// re-mounted only when the normalised identifier actually changes.
    pub fn set_video_source(&mut self, source: &str) -> bool {
        let video = VideoConfig {
            source: source.to_string(),
            ..self.config.video.clone()
        };
        let provider = build_provider(&video);
        if provider.identifier() == self.provider.identifier() {
            return false;
        }
        tracing::info!(kind = %provider.kind(), at = self.now(), "video source changed, remounting");
        if self.mounted {
            self.unmount_provider();
        }
        self.provider = provider;
        self.config.video = video;
        if self.mounted {
            self.mount_provider();
        }
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            time_ms: self.now(),
            mounted: self.mounted,
            provider: self.provider.kind(),
            viewers: self.viewers.current(),
            phase: self.viewers.phase(),
            dropped_at: self.dropped.map(|(at, _)| at),
            drop_trigger: self.dropped.map(|(_, trigger)| trigger),
            chat: self.chat.visible().cloned().collect(),
            reactions: self.reactions.active().to_vec(),
            cta_visible: self.cta.is_visible(),
            cta_text: self.config.cta.text.clone(),
            surface: self.surface.to_html(),
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn viewers(&self) -> &ViewerSimulator {
        &self.viewers
    }

    pub fn chat(&self) -> &CommentScheduler {
        &self.chat
    }

    pub fn reactions(&self) -> &ReactionEmitter {
        &self.reactions
    }

    pub fn cta(&self) -> &CtaRevealer {
        &self.cta
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn provider(&self) -> &dyn VideoProvider {
        self.provider.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Virtual millisecond and cause of the drop, once it happened.
    pub fn dropped(&self) -> Option<(u64, DropTrigger)> {
        self.dropped
    }

    fn start_viewer_ticker(&mut self) {
        if let Some(id) = self.viewer_timer.take() {
            self.scheduler.cancel(id);
        }
        let interval = self.config.video.viewers.update_interval_ms;
        if interval == 0 {
            tracing::warn!("viewer update interval is zero, count stays fixed");
            return;
        }
        self.viewer_timer = Some(self.scheduler.schedule_repeating(interval, interval, Task::ViewerTick));
    }

    fn mount_provider(&mut self) {
        let now = self.now();
        self.provider.mount(&mut self.surface, &mut self.host, now);
        if self.viewers.phase() != ViewerPhase::PreDrop {
            return;
        }
        if self.provider.reports_elapsed() {
            self.poll_timer = Some(self.scheduler.schedule_repeating(
                POLL_INTERVAL_MS,
                POLL_INTERVAL_MS,
                Task::ProviderPoll,
            ));
        }
        let delay = seconds_to_ms(self.viewers.drop_time_seconds());
        self.fallback_timer = Some(self.scheduler.schedule_once(delay, Task::DropFallback));
    }

    fn unmount_provider(&mut self) {
        self.cancel_drop_timers();
        self.provider.unmount(&mut self.surface, &mut self.host);
    }

    fn cancel_drop_timers(&mut self) {
        for id in [self.poll_timer.take(), self.fallback_timer.take()].into_iter().flatten() {
            self.scheduler.cancel(id);
        }
    }

    fn on_dropped(&mut self, at: u64, trigger: DropTrigger) {
        self.dropped = Some((at, trigger));
        self.cancel_drop_timers();
        self.start_viewer_ticker();
    }

    fn emit_reaction(&mut self, kind: ReactionKind) -> ReactionEvent {
        let now = self.now();
        let event = self.reactions.emit(kind, now, &mut self.rng);
        self.scheduler.schedule_once(REACTION_TTL_MS, Task::ReactionExpire(event.id));
        event
    }

    fn dispatch(&mut self, fired: Fired<Task>) {
        let now = fired.at;
        match fired.payload {
            Task::ViewerTick => {
                let count = self.viewers.tick(&mut self.rng);
                tracing::trace!(count, at = now, "viewer tick");
            }
            Task::DropFallback => {
                self.fallback_timer = None;
                if self.viewers.try_drop(DropTrigger::Fallback, &mut self.rng) {
                    self.on_dropped(now, DropTrigger::Fallback);
                }
            }
            Task::ProviderPoll => {
                let Some(elapsed) = self.provider.poll_elapsed_seconds(&mut self.host, now) else {
                    return;
                };
                tracing::trace!(elapsed, at = now, "provider poll");
                if self.viewers.observe_elapsed(elapsed, &mut self.rng) {
                    self.on_dropped(now, DropTrigger::PlaybackTime);
                }
            }
            Task::ChatNext => {
                if self.chat.emit_next(now, &mut self.rng).is_some() {
                    let interval = seconds_to_ms(self.config.chat.interval_seconds);
                    self.scheduler.schedule_once(interval, Task::ChatNext);
                }
            }
            Task::ReactionAmbient => {
                self.emit_reaction(ReactionKind::Ambient);
            }
            Task::ReactionExpire(id) => {
                self.reactions.expire(id);
            }
            Task::CtaReveal => {
                if self.cta.reveal() {
                    tracing::info!(at = now, "call to action revealed");
                }
            }
        }
    }
}

//! Shared test helpers.

use live_sim::config::{Comment, CountRange, LiveConfig, ProviderKind};
use live_sim::provider::HeadlessHost;
use live_sim::LiveSession;

/// A script of `n` distinct comments.
#[allow(dead_code)]
pub fn script(n: usize) -> Vec<Comment> {
    (0..n)
        .map(|i| Comment::new(format!("Viewer {i}"), format!("message #{i}")))
        .collect()
}

/// The reference configuration: drop from 2500..3000 to 100..120 at 10 s.
#[allow(dead_code)]
pub fn reference_config(seed: u64) -> LiveConfig {
    let mut config = LiveConfig {
        seed: Some(seed),
        comments: script(200),
        ..LiveConfig::default()
    };
    config.video.kind = ProviderKind::Hosted;
    config.video.source = "dQw4w9WgXcQ".into();
    let viewers = &mut config.video.viewers;
    viewers.initial_count = 2402;
    viewers.drop_enabled = true;
    viewers.before_drop = CountRange::new(2500, 3000);
    viewers.after_drop = CountRange::new(100, 120);
    viewers.drop_time_seconds = 10.0;
    config
}

/// Build and mount a session on a headless host.
#[allow(dead_code)]
pub fn mounted(config: LiveConfig, host: HeadlessHost) -> LiveSession<HeadlessHost> {
    let mut session = LiveSession::new(config, host);
    session.mount();
    session
}

/// Script index of the newest visible message, if it was scripted.
#[allow(dead_code)]
pub fn newest_index(session: &LiveSession<HeadlessHost>) -> Option<usize> {
    match session.chat().visible().last()?.source {
        live_sim::chat::MessageSource::Scripted { index } => Some(index),
        live_sim::chat::MessageSource::Local => None,
    }
}

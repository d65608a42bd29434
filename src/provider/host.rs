//! The hosting environment a provider mounts into.
//!
//! Everything a real page would do on a provider's behalf (loading a client
//! library, constructing a player, reading a playback position, executing a
//! script) goes through [`MediaHost`]. [`HeadlessHost`] is the deterministic
//! implementation used by the CLI and tests.

use crate::surface::ScriptNode;
use std::collections::HashMap;

/// Handle to a player or media element owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaHandle(pub u64);

/// What a hosted player should be bound to and play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSpec {
    /// Id of the child element the player replaces.
    pub element_id: String,
    pub video_id: String,
    pub autoplay: bool,
    pub controls: bool,
}

pub trait MediaHost {
    /// Inject a client library unless one carrying `marker` already exists.
    /// Returns true if this call injected it.
    fn ensure_library(&mut self, marker: &str, src: &str, now: u64) -> bool;

    /// Whether the library behind `marker` has finished loading.
    fn library_ready(&self, marker: &str, now: u64) -> bool;

    fn create_player(&mut self, spec: &PlayerSpec, now: u64) -> MediaHandle;

    /// Whether the player has signalled ready.
    fn player_ready(&self, handle: MediaHandle, now: u64) -> bool;

    /// Elapsed playback seconds, if the player exposes them yet.
    fn current_time(&self, handle: MediaHandle, now: u64) -> Option<f64>;

    fn destroy_player(&mut self, handle: MediaHandle);

    /// Start a native media element on a file URL.
    fn attach_media(&mut self, url: &str, now: u64) -> MediaHandle;

    /// Playback position of a native media element.
    fn media_position(&self, handle: MediaHandle, now: u64) -> Option<f64>;

    fn release_media(&mut self, handle: MediaHandle);

    /// Execute a script node that was attached to the page.
    fn activate_script(&mut self, script: &ScriptNode, now: u64);
}

/// A script the host has executed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRun {
    pub src: Option<String>,
    pub inline_bytes: usize,
    pub at: u64,
}

#[derive(Debug, Clone)]
struct HeadlessMedia {
    source: String,
    /// Virtual millisecond playback starts.
    ready_at: u64,
}

/// Deterministic host with fixed load latencies.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    library_delay_ms: u64,
    ready_delay_ms: u64,
    start_position: f64,
    blocked: bool,
    /// Library marker -> virtual millisecond it finishes loading.
    libraries: HashMap<String, u64>,
    media: HashMap<MediaHandle, HeadlessMedia>,
    next_handle: u64,
    scripts: Vec<ScriptRun>,
    released: usize,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(500, 1000)
    }
}

impl HeadlessHost {
    pub fn new(library_delay_ms: u64, ready_delay_ms: u64) -> Self {
        Self {
            library_delay_ms,
            ready_delay_ms,
            start_position: 0.0,
            blocked: false,
            libraries: HashMap::new(),
            media: HashMap::new(),
            next_handle: 1,
            scripts: Vec::new(),
            released: 0,
        }
    }

    /// Everything loads and starts immediately.
    pub fn instant() -> Self {
        Self::new(0, 0)
    }

    /// Simulate a blocker: libraries never finish loading and media never
    /// reports a position.
    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    /// Playback starts from this position instead of zero.
    pub fn with_start_position(mut self, seconds: f64) -> Self {
        self.start_position = seconds.max(0.0);
        self
    }

    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }

    /// Players and media elements currently alive.
    pub fn live_media(&self) -> usize {
        self.media.len()
    }

    /// Players and media elements destroyed so far.
    pub fn released(&self) -> usize {
        self.released
    }

    pub fn scripts(&self) -> &[ScriptRun] {
        &self.scripts
    }

    pub fn media_source(&self, handle: MediaHandle) -> Option<&str> {
        self.media.get(&handle).map(|m| m.source.as_str())
    }

    fn start(&mut self, source: &str, now: u64) -> MediaHandle {
        let handle = MediaHandle(self.next_handle);
        self.next_handle += 1;
        self.media.insert(
            handle,
            HeadlessMedia {
                source: source.to_string(),
                ready_at: now.saturating_add(self.ready_delay_ms),
            },
        );
        handle
    }

    fn position(&self, handle: MediaHandle, now: u64) -> Option<f64> {
        if self.blocked {
            return None;
        }
        let media = self.media.get(&handle)?;
        let played = now.checked_sub(media.ready_at)?;
        Some(self.start_position + played as f64 / 1000.0)
    }

    fn release(&mut self, handle: MediaHandle) {
        if self.media.remove(&handle).is_some() {
            self.released += 1;
        }
    }
}

impl MediaHost for HeadlessHost {
    fn ensure_library(&mut self, marker: &str, src: &str, now: u64) -> bool {
        if self.libraries.contains_key(marker) {
            return false;
        }
        tracing::debug!(marker, src, "injecting client library");
        self.libraries
            .insert(marker.to_string(), now.saturating_add(self.library_delay_ms));
        true
    }

    fn library_ready(&self, marker: &str, now: u64) -> bool {
        !self.blocked && self.libraries.get(marker).is_some_and(|&at| now >= at)
    }

    fn create_player(&mut self, spec: &PlayerSpec, now: u64) -> MediaHandle {
        self.start(&spec.video_id, now)
    }

    fn player_ready(&self, handle: MediaHandle, now: u64) -> bool {
        !self.blocked && self.media.get(&handle).is_some_and(|m| now >= m.ready_at)
    }

    fn current_time(&self, handle: MediaHandle, now: u64) -> Option<f64> {
        self.position(handle, now)
    }

    fn destroy_player(&mut self, handle: MediaHandle) {
        self.release(handle);
    }

    fn attach_media(&mut self, url: &str, now: u64) -> MediaHandle {
        self.start(url, now)
    }

    fn media_position(&self, handle: MediaHandle, now: u64) -> Option<f64> {
        self.position(handle, now)
    }

    fn release_media(&mut self, handle: MediaHandle) {
        self.release(handle);
    }

    fn activate_script(&mut self, script: &ScriptNode, now: u64) {
        self.scripts.push(ScriptRun {
            src: script.attr("src").map(str::to_string),
            inline_bytes: script.text.len(),
            at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> PlayerSpec {
        PlayerSpec {
            element_id: "hosted-player".into(),
            video_id: "dQw4w9WgXcQ".into(),
            autoplay: true,
            controls: true,
        }
    }

    #[test]
    fn test_library_injected_once() {
        let mut host = HeadlessHost::new(500, 0);
        assert!(host.ensure_library("api", "https://example.com/api.js", 0));
        assert!(!host.ensure_library("api", "https://example.com/api.js", 100));
        assert!(!host.library_ready("api", 499));
        assert!(host.library_ready("api", 500));
        assert!(!host.library_ready("other", 500));
        assert_eq!(host.library_count(), 1);
    }

    #[test]
    fn test_player_position_after_ready() {
        let mut host = HeadlessHost::new(0, 1000).with_start_position(3.0);
        let handle = host.create_player(&spec(), 2000);
        assert!(!host.player_ready(handle, 2999));
        assert_eq!(host.current_time(handle, 2999), None);
        assert!(host.player_ready(handle, 3000));
        assert_eq!(host.current_time(handle, 4500), Some(4.5));
        assert_eq!(host.media_source(handle), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_blocked_host_never_plays() {
        let mut host = HeadlessHost::instant().blocked();
        host.ensure_library("api", "x", 0);
        assert!(!host.library_ready("api", 60_000));
        let media = host.attach_media("https://cdn.example.com/v.mp4", 0);
        assert_eq!(host.media_position(media, 60_000), None);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut host = HeadlessHost::instant();
        let media = host.attach_media("a.mp4", 0);
        host.release_media(media);
        host.release_media(media);
        assert_eq!(host.released(), 1);
        assert_eq!(host.live_media(), 0);
    }
}

use super::host::{MediaHandle, MediaHost, PlayerSpec};
use super::{MountGuard, VideoProvider};
use crate::config::{extract_video_id, ProviderKind};
use crate::surface::{Element, Node, ScriptNode, Surface};

/// Marker the client library is registered under; injecting it twice is a
/// no-op.
pub const HOSTED_LIBRARY_MARKER: &str = "hosted-player-api";
pub const HOSTED_LIBRARY_SRC: &str = "https://www.youtube.com/iframe_api";
/// Id of the child element the player binds to.
pub const HOSTED_PLAYER_ELEMENT: &str = "hosted-player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerState {
    Idle,
    AwaitingLibrary,
    AwaitingReady(MediaHandle),
    Playing(MediaHandle),
}

impl PlayerState {
    fn handle(self) -> Option<MediaHandle> {
        match self {
            Self::AwaitingReady(h) | Self::Playing(h) => Some(h),
            Self::Idle | Self::AwaitingLibrary => None,
        }
    }
}

/// Player driven through the provider's client library.
#[derive(Debug)]
pub struct HostedPlayer {
    video_id: String,
    guard: MountGuard,
    state: PlayerState,
}

impl HostedPlayer {
    pub fn new(source: &str) -> Self {
        Self {
            video_id: extract_video_id(source),
            guard: MountGuard::default(),
            state: PlayerState::Idle,
        }
    }

    /// Move the player along as far as the host allows: construct it once
    /// the library is loaded, start reading time once it is ready.
    fn advance(&mut self, host: &mut dyn MediaHost, now: u64) {
        if self.state == PlayerState::AwaitingLibrary && host.library_ready(HOSTED_LIBRARY_MARKER, now) {
            let spec = PlayerSpec {
                element_id: HOSTED_PLAYER_ELEMENT.to_string(),
                video_id: self.video_id.clone(),
                autoplay: true,
                controls: true,
            };
            let handle = host.create_player(&spec, now);
            tracing::debug!(video_id = %self.video_id, "hosted player created");
            self.state = PlayerState::AwaitingReady(handle);
        }
        if let PlayerState::AwaitingReady(handle) = self.state {
            if host.player_ready(handle, now) {
                tracing::debug!("hosted player ready");
                self.state = PlayerState::Playing(handle);
            }
        }
    }
}

impl VideoProvider for HostedPlayer {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Hosted
    }

    fn identifier(&self) -> &str {
        &self.video_id
    }

    fn mount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost, now: u64) -> bool {
        if !self.guard.begin(self.kind()) {
            return false;
        }
        surface.clear();
        if self.video_id.is_empty() {
            tracing::warn!("hosted provider has no video id, nothing to mount");
            return true;
        }

        if host.ensure_library(HOSTED_LIBRARY_MARKER, HOSTED_LIBRARY_SRC, now) {
            surface.append_head(Node::Script(ScriptNode {
                attrs: vec![
                    ("id".into(), HOSTED_LIBRARY_MARKER.into()),
                    ("src".into(), HOSTED_LIBRARY_SRC.into()),
                    ("async".into(), String::new()),
                ],
                text: String::new(),
                active: true,
            }));
        }
        surface.append(Node::Element(
            Element::new("div").with_attr("id", HOSTED_PLAYER_ELEMENT),
        ));
        self.state = PlayerState::AwaitingLibrary;
        self.advance(host, now);
        true
    }

    fn unmount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost) {
        if !self.guard.end(self.kind()) {
            return;
        }
        if let Some(handle) = self.state.handle() {
            host.destroy_player(handle);
        }
        self.state = PlayerState::Idle;
        surface.clear();
    }

    fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }

    fn poll_elapsed_seconds(&mut self, host: &mut dyn MediaHost, now: u64) -> Option<f64> {
        self.advance(host, now);
        match self.state {
            PlayerState::Playing(handle) => host.current_time(handle, now),
            _ => None,
        }
    }
}

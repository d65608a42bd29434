//! Video providers behind one lifecycle.
//!
//! Five unrelated delivery mechanisms share the [`VideoProvider`] contract:
//! mount into a [`Surface`], unmount, and optionally report elapsed playback
//! time. The variant is picked once by [`build_provider`].

mod direct;
mod embed;
pub mod host;
mod hosted;

pub use direct::DirectFile;
pub use embed::{FramedEmbed, InjectedScript, WrappedEmbed};
pub use host::{HeadlessHost, MediaHandle, MediaHost, PlayerSpec, ScriptRun};
pub use hosted::{HostedPlayer, HOSTED_LIBRARY_MARKER, HOSTED_PLAYER_ELEMENT};

use crate::config::{ProviderKind, VideoConfig};
use crate::surface::Surface;
use std::fmt;

/// Cadence of elapsed-time polling for providers that support it.
pub const POLL_INTERVAL_MS: u64 = 1000;

pub trait VideoProvider: fmt::Debug {
    fn kind(&self) -> ProviderKind;

    /// The payload this provider was built from, normalised. Two providers
    /// with the same kind and identifier render the same video.
    fn identifier(&self) -> &str;

    /// Attach the video to `surface`. Returns false if the provider was
    /// already mounted, in which case nothing happens.
    fn mount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost, now: u64) -> bool;

    /// Release the player and clear the container. Safe to call repeatedly.
    fn unmount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost);

    fn is_mounted(&self) -> bool;

    /// Best-effort elapsed playback seconds. Providers without a playback
    /// signal always return `None`.
    fn poll_elapsed_seconds(&mut self, _host: &mut dyn MediaHost, _now: u64) -> Option<f64> {
        None
    }

    /// Whether the session should poll this provider at all.
    fn reports_elapsed(&self) -> bool {
        self.kind().reports_elapsed()
    }
}

/// Pick the provider variant for a video configuration.
pub fn build_provider(config: &VideoConfig) -> Box<dyn VideoProvider> {
    match config.kind {
        ProviderKind::Hosted => Box::new(HostedPlayer::new(&config.source)),
        ProviderKind::FramedEmbed => Box::new(FramedEmbed::new(&config.source)),
        ProviderKind::WrappedEmbed => Box::new(WrappedEmbed::new(&config.source)),
        ProviderKind::InjectedScript => Box::new(InjectedScript::new(&config.source)),
        ProviderKind::DirectFile => Box::new(DirectFile::new(&config.source)),
    }
}

/// Mount flag shared by every variant. A mount attempt while mounted is
/// refused; unmounting twice is harmless.
#[derive(Debug, Default, Clone, Copy)]
struct MountGuard {
    mounted: bool,
}

impl MountGuard {
    fn begin(&mut self, kind: ProviderKind) -> bool {
        if self.mounted {
            tracing::debug!(%kind, "mount ignored, already mounted");
            return false;
        }
        self.mounted = true;
        tracing::info!(%kind, "provider mounted");
        true
    }

    fn end(&mut self, kind: ProviderKind) -> bool {
        if !self.mounted {
            return false;
        }
        self.mounted = false;
        tracing::info!(%kind, "provider unmounted");
        true
    }

    fn is_mounted(&self) -> bool {
        self.mounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(kind: ProviderKind, source: &str) -> VideoConfig {
        VideoConfig {
            kind,
            source: source.to_string(),
            ..VideoConfig::default()
        }
    }

    #[test]
    fn test_build_dispatches_on_kind() {
        for kind in [
            ProviderKind::Hosted,
            ProviderKind::FramedEmbed,
            ProviderKind::WrappedEmbed,
            ProviderKind::InjectedScript,
            ProviderKind::DirectFile,
        ] {
            let provider = build_provider(&video(kind, "x"));
            assert_eq!(provider.kind(), kind);
            assert_eq!(provider.reports_elapsed(), kind.reports_elapsed());
            assert!(!provider.is_mounted());
        }
    }

    #[test]
    fn test_hosted_identifier_is_extracted_id() {
        let provider = build_provider(&video(
            ProviderKind::Hosted,
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10",
        ));
        assert_eq!(provider.identifier(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_mount_guard() {
        let mut guard = MountGuard::default();
        assert!(guard.begin(ProviderKind::DirectFile));
        assert!(!guard.begin(ProviderKind::DirectFile));
        assert!(guard.end(ProviderKind::DirectFile));
        assert!(!guard.end(ProviderKind::DirectFile));
        assert!(guard.begin(ProviderKind::DirectFile));
    }

    #[test]
    fn test_every_variant_remounts_cleanly() {
        let sources = [
            (ProviderKind::Hosted, "dQw4w9WgXcQ"),
            (ProviderKind::FramedEmbed, "<div>a</div><script>x()</script>"),
            (ProviderKind::WrappedEmbed, "<div><iframe src=\"v\"></iframe></div>"),
            (ProviderKind::InjectedScript, "<div id=\"p\"></div><script src=\"s.js\"></script>"),
            (ProviderKind::DirectFile, "https://cdn.example.com/v.mp4"),
        ];
        for (kind, source) in sources {
            let mut host = HeadlessHost::instant();
            let mut surface = Surface::new();
            let mut provider = build_provider(&video(kind, source));
            assert!(provider.mount(&mut surface, &mut host, 0));
            assert!(!surface.is_empty(), "{kind} mounted nothing");
            let first = surface.to_html();
            provider.unmount(&mut surface, &mut host);
            provider.unmount(&mut surface, &mut host);
            assert!(surface.is_empty(), "{kind} left content behind");
            assert!(provider.mount(&mut surface, &mut host, 100));
            assert_eq!(surface.to_html(), first, "{kind} remount differs");
            assert_eq!(host.live_media(), usize::from(kind.reports_elapsed()));
        }
    }
}

//! Provider variants mounted through a full session.

mod common;

use common::{mounted, reference_config};
use live_sim::config::{LiveConfig, ProviderKind};
use live_sim::provider::HeadlessHost;
use live_sim::viewers::DropTrigger;

const FRAMED: &str = r#"<div id="panda-x"><iframe src="https://player.example.com/embed/?v=abc" allowfullscreen></iframe></div>
<script src="https://player.example.com/api.js" async></script>
<script>init("abc")</script>"#;

fn with_provider(kind: ProviderKind, source: &str) -> LiveConfig {
    let mut config = reference_config(11);
    config.video.kind = kind;
    config.video.source = source.to_string();
    config
}

#[test]
fn framed_embed_mount_tree() {
    let session = mounted(with_provider(ProviderKind::FramedEmbed, FRAMED), HeadlessHost::default());
    insta::assert_snapshot!(session.surface().dump(), @r#"
    head
    container
      <div id="panda-x">
        <iframe src="https://player.example.com/embed/?v=abc" allowfullscreen>
      script [active] src=https://player.example.com/api.js (0 bytes inline)
      script [active] (11 bytes inline)
    "#);
    assert_eq!(session.host().scripts().len(), 2);
}

#[test]
fn embeds_rely_on_the_fallback_timer() {
    for kind in [ProviderKind::FramedEmbed, ProviderKind::WrappedEmbed, ProviderKind::InjectedScript] {
        let mut session = mounted(with_provider(kind, FRAMED), HeadlessHost::instant());
        assert!(!session.provider().reports_elapsed());
        session.advance_to(9_999);
        assert_eq!(session.dropped(), None, "{kind}");
        session.advance_to(10_000);
        assert_eq!(session.dropped(), Some((10_000, DropTrigger::Fallback)), "{kind}");
    }
}

#[test]
fn direct_file_drops_on_playback_position() {
    let host = HeadlessHost::instant().with_start_position(9.5);
    let mut session = mounted(
        with_provider(ProviderKind::DirectFile, "https://cdn.example.com/replay.mp4"),
        host,
    );
    assert!(session.surface().to_html().starts_with("<video src=\"https://cdn.example.com/replay.mp4\" controls autoplay"));
    session.advance_to(1000);
    assert_eq!(session.dropped(), Some((1000, DropTrigger::PlaybackTime)));
}

#[test]
fn blocked_hosted_player_still_drops() {
    let mut session = mounted(reference_config(12), HeadlessHost::default().blocked());
    session.advance_to(10_000);
    assert_eq!(session.dropped(), Some((10_000, DropTrigger::Fallback)));
    assert_eq!(session.host().live_media(), 0);
}

#[test]
fn empty_payload_still_runs_fallback() {
    let mut session = mounted(with_provider(ProviderKind::WrappedEmbed, ""), HeadlessHost::default());
    assert!(session.surface().is_empty());
    session.advance_to(10_000);
    assert!(session.viewers().has_dropped());
}

#[test]
fn malformed_markup_is_kept_raw() {
    let markup = "<p>unterminated <div class=\"x\"";
    let session = mounted(with_provider(ProviderKind::InjectedScript, markup), HeadlessHost::default());
    assert_eq!(session.surface().to_html(), markup);
}

#[test]
fn source_change_remounts_provider() {
    let mut session = mounted(
        with_provider(ProviderKind::DirectFile, "https://cdn.example.com/a.mp4"),
        HeadlessHost::instant(),
    );
    assert!(!session.set_video_source(" https://cdn.example.com/a.mp4 "));
    assert!(session.set_video_source("https://cdn.example.com/b.mp4"));
    assert!(session.surface().to_html().contains("b.mp4"));
    assert_eq!(session.host().released(), 1);
    assert_eq!(session.host().live_media(), 1);
    assert_eq!(session.config().video.source, "https://cdn.example.com/b.mp4");
}

#[test]
fn unmount_leaves_nothing_running() {
    for kind in [
        ProviderKind::Hosted,
        ProviderKind::FramedEmbed,
        ProviderKind::WrappedEmbed,
        ProviderKind::InjectedScript,
        ProviderKind::DirectFile,
    ] {
        let source = match kind {
            ProviderKind::Hosted => "dQw4w9WgXcQ",
            ProviderKind::DirectFile => "https://cdn.example.com/a.mp4",
            _ => FRAMED,
        };
        let mut session = mounted(with_provider(kind, source), HeadlessHost::instant());
        session.advance_to(4_000);
        session.unmount();
        assert_eq!(session.pending_timers(), 0, "{kind}");
        assert!(session.surface().is_empty(), "{kind}");
        assert_eq!(session.host().live_media(), 0, "{kind}");
    }
}

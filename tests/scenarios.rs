//! End-to-end sessions on the virtual clock.

mod common;

use common::{mounted, newest_index, reference_config};
use live_sim::config::CountRange;
use live_sim::provider::HeadlessHost;
use live_sim::viewers::{DropTrigger, ViewerPhase};

#[test]
fn viewer_count_drops_at_ten_seconds_and_stays_low() {
    let mut session = mounted(reference_config(1), HeadlessHost::default());
    let before = CountRange::new(2500, 3000);
    let after = CountRange::new(100, 120);

    let mut t = 0;
    while t < 60_000 {
        t += 100;
        session.advance_to(t);
        let count = session.viewers().current();
        if t < 3000 {
            assert_eq!(count, 2402, "no tick yet at {t}");
        } else if t < 10_000 {
            assert_eq!(session.viewers().phase(), ViewerPhase::PreDrop, "at {t}");
            assert!(before.contains(count), "{count} outside pre-drop range at {t}");
        } else {
            assert_eq!(session.viewers().phase(), ViewerPhase::PostDrop, "at {t}");
            assert!(after.contains(count), "{count} outside post-drop range at {t}");
        }
    }
    // The default host's player only reaches 8 s of playback by then.
    assert_eq!(session.dropped(), Some((10_000, DropTrigger::Fallback)));
}

#[test]
fn comment_window_wraps_around_the_script() {
    let mut config = reference_config(2);
    config.chat.visible_count = 5;
    config.chat.interval_seconds = 1.0;
    config.chat.looping = true;
    let mut session = mounted(config, HeadlessHost::default());

    let indices: Vec<usize> = session
        .chat()
        .visible()
        .map(|m| match m.source {
            live_sim::chat::MessageSource::Scripted { index } => index,
            live_sim::chat::MessageSource::Local => unreachable!(),
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);

    session.advance_to(201_000);
    // 5 seeded + 201 timed emissions; the cursor passed the end once.
    assert_eq!(session.chat().emitted(), 206);
    assert_eq!(newest_index(&session), Some(5));
    assert_eq!(session.chat().peek_next(), Some(6));
    assert_eq!(session.chat().visible().count(), 5);
}

#[test]
fn comment_script_stops_without_loop() {
    let mut config = reference_config(3);
    config.comments.truncate(8);
    config.chat.looping = false;
    let mut session = mounted(config, HeadlessHost::default());

    session.advance_to(3000);
    assert_eq!(newest_index(&session), Some(7));
    session.advance_to(60_000);
    assert_eq!(session.chat().emitted(), 8);
    assert!(session.chat().is_stopped());
    assert_eq!(session.chat().peek_next(), None);
}

#[test]
fn disabled_drop_keeps_flat_walk() {
    let mut config = reference_config(4);
    config.video.viewers.drop_enabled = false;
    let mut session = mounted(config, HeadlessHost::instant().with_start_position(30.0));
    let after = CountRange::new(100, 120);

    for step in 1..=400 {
        session.advance_to(step * 300);
        let count = session.viewers().current();
        assert!(count >= 1);
        assert!(!after.contains(count), "clamped into post-drop range: {count}");
        assert_eq!(session.viewers().phase(), ViewerPhase::Flat);
    }
    assert_eq!(session.dropped(), None);
    // One step per tick, never more.
    assert!((2402 - 40..=2402 + 40).contains(&session.viewers().current()));
}

#[test]
fn disabled_drop_floors_at_one() {
    let mut config = reference_config(5);
    config.video.viewers.drop_enabled = false;
    config.video.viewers.initial_count = 2;
    config.video.viewers.update_interval_ms = 100;
    let mut session = mounted(config, HeadlessHost::default());

    for step in 1..=1000 {
        session.advance_to(step * 100);
        assert!(session.viewers().current() >= 1);
    }
    assert_eq!(session.viewers().ticks(), 1000);
}

#[test]
fn cta_reveals_once_at_twenty_seconds() {
    let mut session = mounted(reference_config(6), HeadlessHost::default());
    let mut transitions = 0;
    let mut visible = false;
    for step in 1..=240 {
        let t = step * 250;
        session.advance_to(t);
        let now_visible = session.cta().is_visible();
        if now_visible != visible {
            transitions += 1;
            visible = now_visible;
        }
        assert_eq!(now_visible, t >= 20_000, "at {t}");
    }
    assert_eq!(transitions, 1);
}

#[test]
fn disabled_cta_never_shows() {
    let mut config = reference_config(7);
    config.cta.enabled = false;
    let mut session = mounted(config, HeadlessHost::default());
    session.advance_to(120_000);
    assert!(!session.cta().is_visible());
}

#[test]
fn local_chat_joins_window_without_moving_script() {
    let mut session = mounted(reference_config(8), HeadlessHost::default());
    session.advance_to(2500);
    let next = session.chat().peek_next();
    assert_eq!(session.submit_chat("   "), None);
    let id = session.submit_chat("first time here").unwrap();
    assert_eq!(session.chat().visible().last().map(|m| m.id), Some(id));
    assert_eq!(session.chat().peek_next(), next);

    session.advance_to(10_000);
    assert!(session.chat().visible().all(|m| m.id != id));
    assert!(session.chat().history().any(|m| m.id == id));
}

#[test]
fn same_seed_same_session() {
    let run = |seed| {
        let mut session = mounted(reference_config(seed), HeadlessHost::default());
        let mut counts = Vec::new();
        for step in 1..=30 {
            session.advance_to(step * 1000);
            counts.push(session.viewers().current());
        }
        (counts, session.snapshot())
    };
    let (a, snap_a) = run(42);
    let (b, snap_b) = run(42);
    assert_eq!(a, b);
    assert_eq!(snap_a, snap_b);
}

#[test]
fn empty_script_never_schedules_chat() {
    let mut config = reference_config(9);
    config.comments.clear();
    let mut session = mounted(config, HeadlessHost::default());
    session.advance_to(30_000);
    assert_eq!(session.chat().visible().count(), 0);
    assert_eq!(session.chat().emitted(), 0);
}

#[test]
fn huge_initial_count_keeps_ticking() {
    let json = r#"{"video":{"source":"dQw4w9WgXcQ","viewers":{"dropEnabled":false,"initialCount":9223372036854775807}},"seed":3}"#;
    let config = live_sim::LiveConfig::from_json(json).unwrap();
    let mut session = mounted(config, HeadlessHost::default());
    session.advance_to(60_000);
    assert_eq!(session.viewers().ticks(), 20);
    assert!(session.viewers().current() >= i64::MAX - 20);
}

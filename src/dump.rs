//! Text renderings of a session for the terminal.

use crate::session::SessionSnapshot;
use crate::viewers::ViewerPhase;
use std::fmt::Write;

/// `mm:ss.mmm` for a virtual millisecond.
pub fn format_clock(ms: u64) -> String {
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

fn phase_label(phase: ViewerPhase) -> &'static str {
    match phase {
        ViewerPhase::Flat => "flat",
        ViewerPhase::PreDrop => "pre-drop",
        ViewerPhase::PostDrop => "post-drop",
    }
}

/// One status line per step, for `run`.
pub fn format_line(snapshot: &SessionSnapshot) -> String {
    let last = snapshot
        .chat
        .last()
        .map(|m| format!("{}: {}", m.user, m.message))
        .unwrap_or_default();
    format!(
        "[{}] viewers={:<5} {:<9} reactions={:<2} cta={} | {}",
        format_clock(snapshot.time_ms),
        snapshot.viewers,
        phase_label(snapshot.phase),
        snapshot.reactions.len(),
        if snapshot.cta_visible { "shown" } else { "hidden" },
        last
    )
}

/// Full multi-section dump, for `dump`.
pub fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Session @ {} ===", format_clock(snapshot.time_ms));
    let _ = writeln!(
        out,
        "provider: {} ({})",
        snapshot.provider,
        if snapshot.mounted { "mounted" } else { "unmounted" }
    );
    let _ = write!(out, "viewers: {} [{}]", snapshot.viewers, phase_label(snapshot.phase));
    if let (Some(at), Some(trigger)) = (snapshot.dropped_at, snapshot.drop_trigger) {
        let _ = write!(out, " dropped at {} by {:?}", format_clock(at), trigger);
    }
    out.push('\n');

    let _ = writeln!(out, "\n=== Chat ({}) ===", snapshot.chat.len());
    for m in &snapshot.chat {
        let _ = writeln!(out, "  [{:>2}] {}: {}", m.initials, m.user, m.message);
    }

    let _ = writeln!(out, "\n=== Reactions ({}) ===", snapshot.reactions.len());
    for r in &snapshot.reactions {
        let _ = writeln!(
            out,
            "  #{} {:?} at {:.1}% expires {}",
            r.id,
            r.kind,
            r.position,
            format_clock(r.expires_at())
        );
    }

    let _ = writeln!(out, "\n=== Call to action ===");
    if snapshot.cta_visible {
        let _ = writeln!(out, "  shown: {}", snapshot.cta_text);
    } else {
        let _ = writeln!(out, "  hidden");
    }

    let _ = writeln!(out, "\n=== Surface ===");
    if snapshot.surface.is_empty() {
        let _ = writeln!(out, "  (empty)");
    } else {
        let _ = writeln!(out, "  {}", snapshot.surface);
    }
    out
}

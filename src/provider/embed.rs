//! Providers fed with operator-supplied embed markup.
//!
//! None of these can report playback time; the session's fallback timer is
//! the only drop trigger while they are mounted.

use super::host::MediaHost;
use super::{MountGuard, VideoProvider};
use crate::config::ProviderKind;
use crate::markup::parse_lenient;
use crate::surface::{collect_scripts, find_element, find_element_mut, for_each_script_mut, Node, ScriptNode, Surface};

/// Parsed markup, or `None` (with a warning) when there is nothing to mount.
fn parse_payload(kind: ProviderKind, markup: &str) -> Option<Vec<Node>> {
    if markup.is_empty() {
        tracing::warn!(%kind, "embed markup is empty, nothing to mount");
        return None;
    }
    Some(parse_lenient(markup))
}

/// Executing copies of every script in document order.
fn activated_copies(nodes: &[Node]) -> Vec<ScriptNode> {
    collect_scripts(nodes)
        .into_iter()
        .map(ScriptNode::activated_copy)
        .collect()
}

/// Hand every active script already attached under `nodes` to the host.
fn execute_attached(nodes: &[Node], host: &mut dyn MediaHost, now: u64) {
    for script in collect_scripts(nodes) {
        if script.active {
            host.activate_script(script, now);
        }
    }
}

/// Structure first, then every script appended to the container so it
/// runs against an attached tree.
#[derive(Debug)]
pub struct FramedEmbed {
    markup: String,
    guard: MountGuard,
}

impl FramedEmbed {
    pub fn new(markup: &str) -> Self {
        Self {
            markup: markup.trim().to_string(),
            guard: MountGuard::default(),
        }
    }
}

impl VideoProvider for FramedEmbed {
    fn kind(&self) -> ProviderKind {
        ProviderKind::FramedEmbed
    }

    fn identifier(&self) -> &str {
        &self.markup
    }

    fn mount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost, now: u64) -> bool {
        if !self.guard.begin(self.kind()) {
            return false;
        }
        surface.clear();
        let Some(nodes) = parse_payload(self.kind(), &self.markup) else {
            return true;
        };
        let scripts = activated_copies(&nodes);
        // Top-level elements only; loose text between them is dropped.
        for node in nodes {
            if matches!(node, Node::Element(_) | Node::Raw { .. }) {
                surface.append(node);
            }
        }
        for script in scripts {
            surface.append(Node::Script(script));
        }
        execute_attached(surface.container(), host, now);
        true
    }

    fn unmount(&mut self, surface: &mut Surface, _host: &mut dyn MediaHost) {
        if self.guard.end(self.kind()) {
            surface.clear();
        }
    }

    fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }
}

/// Wrapper div plus iframe, restyled to fill the container. Scripts run
/// from the document head.
#[derive(Debug)]
pub struct WrappedEmbed {
    markup: String,
    guard: MountGuard,
}

impl WrappedEmbed {
    pub fn new(markup: &str) -> Self {
        Self {
            markup: markup.trim().to_string(),
            guard: MountGuard::default(),
        }
    }
}

const FILL_IFRAME: [(&str, &str); 6] = [
    ("position", "absolute"),
    ("top", "0"),
    ("left", "0"),
    ("width", "100%"),
    ("height", "100%"),
    ("border", "none"),
];

const FILL_WRAPPER: [(&str, &str); 4] = [
    ("position", "relative"),
    ("width", "100%"),
    ("height", "100%"),
    ("padding", "0"),
];

impl VideoProvider for WrappedEmbed {
    fn kind(&self) -> ProviderKind {
        ProviderKind::WrappedEmbed
    }

    fn identifier(&self) -> &str {
        &self.markup
    }

    fn mount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost, now: u64) -> bool {
        if !self.guard.begin(self.kind()) {
            return false;
        }
        surface.clear();
        let Some(mut nodes) = parse_payload(self.kind(), &self.markup) else {
            return true;
        };

        let has_iframe = match find_element_mut(&mut nodes, "iframe") {
            Some(iframe) => {
                for (prop, value) in FILL_IFRAME {
                    iframe.set_style(prop, value);
                }
                true
            }
            None => false,
        };
        if has_iframe {
            let wrapper = find_element_mut(&mut nodes, "div").map(|wrapper| {
                for (prop, value) in FILL_WRAPPER {
                    wrapper.set_style(prop, value);
                }
                wrapper.clone()
            });
            let mounted = wrapper.or_else(|| find_element(&nodes, "iframe").cloned());
            if let Some(element) = mounted {
                surface.append(Node::Element(element));
            }
        } else {
            tracing::warn!(kind = %self.kind(), "embed markup has no iframe");
        }

        let first = surface.head().len();
        for script in activated_copies(&nodes) {
            surface.append_head(Node::Script(script));
        }
        execute_attached(&surface.head()[first..], host, now);
        true
    }

    fn unmount(&mut self, surface: &mut Surface, _host: &mut dyn MediaHost) {
        if self.guard.end(self.kind()) {
            surface.clear();
        }
    }

    fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }
}

/// Markup becomes the container content as-is; each script is then swapped
/// in place for an executing copy.
#[derive(Debug)]
pub struct InjectedScript {
    markup: String,
    guard: MountGuard,
}

impl InjectedScript {
    pub fn new(markup: &str) -> Self {
        Self {
            markup: markup.trim().to_string(),
            guard: MountGuard::default(),
        }
    }
}

impl VideoProvider for InjectedScript {
    fn kind(&self) -> ProviderKind {
        ProviderKind::InjectedScript
    }

    fn identifier(&self) -> &str {
        &self.markup
    }

    fn mount(&mut self, surface: &mut Surface, host: &mut dyn MediaHost, now: u64) -> bool {
        if !self.guard.begin(self.kind()) {
            return false;
        }
        surface.clear();
        let Some(nodes) = parse_payload(self.kind(), &self.markup) else {
            return true;
        };
        surface.set_content(nodes);
        for_each_script_mut(surface.container_mut(), &mut |script: &mut ScriptNode| {
            *script = script.activated_copy();
        });
        execute_attached(surface.container(), host, now);
        true
    }

    fn unmount(&mut self, surface: &mut Surface, _host: &mut dyn MediaHost) {
        if self.guard.end(self.kind()) {
            surface.clear();
        }
    }

    fn is_mounted(&self) -> bool {
        self.guard.is_mounted()
    }
}

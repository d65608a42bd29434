//! The mount point a provider renders into.
//!
//! A minimal node tree standing in for the hosting page: the player
//! container plus the document head. Providers only ever append, replace,
//! or clear; the presentation layer reads the tree back out via
//! [`Surface::to_html`] or [`Surface::dump`].

use serde::Serialize;
use std::fmt::Write;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Node {
    Element(Element),
    Script(ScriptNode),
    Text { text: String },
    /// Markup that could not be parsed, kept verbatim.
    Raw { markup: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Set one inline style property, keeping the others in order.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut declarations: Vec<(String, String)> = self
            .attr("style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        match declarations.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(property)) {
            Some((_, v)) => *v = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }
        let style = declarations
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(";");
        self.set_attr("style", &style);
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.attr("style")?
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(property))
            .map(|(_, v)| v.trim())
    }
}

/// A script node. Scripts parsed out of markup are inert; only copies made
/// with [`ScriptNode::activated_copy`] are handed to the host to execute.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScriptNode {
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub active: bool,
}

impl ScriptNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Fresh copy carrying every attribute and the inline text.
    pub fn activated_copy(&self) -> Self {
        Self {
            attrs: self.attrs.clone(),
            text: self.text.clone(),
            active: true,
        }
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Depth-first visit of every script node.
pub fn for_each_script_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut ScriptNode)) {
    for node in nodes {
        match node {
            Node::Script(script) => f(script),
            Node::Element(e) => for_each_script_mut(&mut e.children, f),
            Node::Text { .. } | Node::Raw { .. } => {}
        }
    }
}

/// All script nodes in document order.
pub fn collect_scripts(nodes: &[Node]) -> Vec<&ScriptNode> {
    fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a ScriptNode>) {
        for node in nodes {
            match node {
                Node::Script(s) => out.push(s),
                Node::Element(e) => walk(&e.children, out),
                Node::Text { .. } | Node::Raw { .. } => {}
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

/// First element with this tag, depth-first.
pub fn find_element<'a>(nodes: &'a [Node], tag: &str) -> Option<&'a Element> {
    nodes.iter().find_map(|node| match node {
        Node::Element(e) if e.tag == tag => Some(e),
        Node::Element(e) => find_element(&e.children, tag),
        _ => None,
    })
}

pub fn find_element_mut<'a>(nodes: &'a mut [Node], tag: &str) -> Option<&'a mut Element> {
    for node in nodes {
        if let Node::Element(e) = node {
            if e.tag == tag {
                return Some(e);
            }
            if let Some(found) = find_element_mut(&mut e.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Surface {
    container: Vec<Node>,
    head: Vec<Node>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, node: Node) {
        self.container.push(node);
    }

    pub fn append_head(&mut self, node: Node) {
        self.head.push(node);
    }

    /// Replace the container's content wholesale.
    pub fn set_content(&mut self, nodes: Vec<Node>) {
        self.container = nodes;
    }

    pub fn container(&self) -> &[Node] {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Vec<Node> {
        &mut self.container
    }

    pub fn head(&self) -> &[Node] {
        &self.head
    }

    /// Empty the container. The head is document-level and survives.
    pub fn clear(&mut self) {
        self.container.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    pub fn to_html(&self) -> String {
        render_html(&self.container)
    }

    /// Indented tree listing of head and container.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("head\n");
        dump_nodes(&self.head, 1, &mut out);
        out.push_str("container\n");
        dump_nodes(&self.container, 1, &mut out);
        out
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

fn render_attrs(attrs: &[(String, String)], out: &mut String) {
    for (k, v) in attrs {
        if v.is_empty() {
            let _ = write!(out, " {k}");
        } else {
            let _ = write!(out, " {k}=\"{}\"", escape_attr(v));
        }
    }
}

pub fn render_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, &mut out);
    }
    out
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(e) => {
            let _ = write!(out, "<{}", e.tag);
            render_attrs(&e.attrs, out);
            out.push('>');
            if is_void(&e.tag) {
                return;
            }
            for child in &e.children {
                render_node(child, out);
            }
            let _ = write!(out, "</{}>", e.tag);
        }
        Node::Script(s) => {
            out.push_str("<script");
            render_attrs(&s.attrs, out);
            out.push('>');
            out.push_str(&s.text);
            out.push_str("</script>");
        }
        Node::Text { text } => out.push_str(&escape_text(text)),
        Node::Raw { markup } => out.push_str(markup),
    }
}

fn dump_nodes(nodes: &[Node], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Element(e) => {
                let mut attrs = String::new();
                render_attrs(&e.attrs, &mut attrs);
                let _ = writeln!(out, "{indent}<{}{}>", e.tag, attrs);
                dump_nodes(&e.children, depth + 1, out);
            }
            Node::Script(s) => {
                let state = if s.active { "active" } else { "inert" };
                let src = s.attr("src").map(|v| format!(" src={v}")).unwrap_or_default();
                let _ = writeln!(out, "{indent}script [{state}]{src} ({} bytes inline)", s.text.len());
            }
            Node::Text { text } => {
                let _ = writeln!(out, "{indent}{:?}", text);
            }
            Node::Raw { markup } => {
                let _ = writeln!(out, "{indent}raw ({} bytes)", markup.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_style_updates_in_place() {
        let mut div = Element::new("div").with_attr("style", "padding:56.25% 0 0 0; position: absolute");
        div.set_style("position", "relative");
        div.set_style("width", "100%");
        assert_eq!(div.attr("style"), Some("padding:56.25% 0 0 0;position:relative;width:100%"));
        assert_eq!(div.style("position"), Some("relative"));
    }

    #[test]
    fn test_render_html() {
        let mut video = Element::new("video").with_attr("src", "a.mp4?x=1&y=2").with_attr("controls", "");
        video.children.push(Node::text("fallback <b>"));
        let nodes = vec![
            Node::Element(video),
            Node::Element(Element::new("img").with_attr("alt", "say \"hi\"")),
            Node::Script(ScriptNode { attrs: vec![], text: "go()".into(), active: true }),
        ];
        assert_eq!(
            render_html(&nodes),
            "<video src=\"a.mp4?x=1&amp;y=2\" controls>fallback &lt;b&gt;</video>\
             <img alt=\"say &quot;hi&quot;\"><script>go()</script>"
        );
    }

    #[test]
    fn test_clear_keeps_head() {
        let mut surface = Surface::new();
        surface.append(Node::text("x"));
        surface.append_head(Node::Script(ScriptNode::default()));
        surface.clear();
        assert!(surface.is_empty());
        assert_eq!(surface.head().len(), 1);
    }

    #[test]
    fn test_find_and_collect() {
        let mut outer = Element::new("div");
        let mut inner = Element::new("section");
        inner.children.push(Node::Element(Element::new("iframe").with_attr("id", "one")));
        inner.children.push(Node::Script(ScriptNode { text: "a".into(), ..Default::default() }));
        outer.children.push(Node::Element(inner));
        let mut nodes = vec![
            Node::Element(outer),
            Node::Script(ScriptNode { text: "b".into(), ..Default::default() }),
        ];
        assert_eq!(find_element(&nodes, "iframe").and_then(|e| e.attr("id")), Some("one"));
        let texts: Vec<&str> = collect_scripts(&nodes).iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        find_element_mut(&mut nodes, "iframe").unwrap().set_attr("id", "two");
        assert_eq!(find_element(&nodes, "iframe").and_then(|e| e.attr("id")), Some("two"));
    }
}

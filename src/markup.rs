//! Parser for operator-supplied embed markup.
//!
//! Embed snippets are HTML fragments, not XML: void elements, valueless
//! attributes, bare ampersands, and script bodies full of `<` are all
//! normal. Script elements are cut out first with a regex and replaced by
//! numbered placeholders; the remaining structure goes through quick-xml in
//! a lenient configuration; placeholders are then swapped back for inert
//! [`ScriptNode`]s.

use crate::surface::{is_void, Element, Node, ScriptNode};
use crate::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;

const SLOT_TAG: &str = "live-sim-script-slot";

fn script_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").ok())
        .as_ref()
}

fn markup_error(position: u64, message: impl ToString) -> Error {
    Error::Markup {
        position: usize::try_from(position).unwrap_or(usize::MAX),
        message: message.to_string(),
    }
}

/// Parse a fragment into top-level nodes.
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>> {
    let (structure, scripts) = extract_scripts(markup)?;
    let mut nodes = parse_structure(&structure)?;
    let mut scripts: Vec<Option<ScriptNode>> = scripts.into_iter().map(Some).collect();
    fill_slots(&mut nodes, &mut scripts);
    Ok(nodes)
}

/// Parse, or keep the whole fragment as one opaque node if it is beyond
/// repair. Never fails.
pub fn parse_lenient(markup: &str) -> Vec<Node> {
    match parse_fragment(markup) {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::warn!("embed markup kept raw: {e}");
            vec![Node::Raw {
                markup: markup.to_string(),
            }]
        }
    }
}

fn extract_scripts(markup: &str) -> Result<(String, Vec<ScriptNode>)> {
    let mut scripts = Vec::new();
    let mut structure = String::with_capacity(markup.len());
    let mut last = 0;
    let Some(re) = script_regex() else {
        return Ok((markup.to_string(), scripts));
    };
    for caps in re.captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        structure.push_str(&markup[last..whole.start()]);
        let attrs_src = caps.get(1).map_or("", |m| m.as_str());
        let text = caps.get(2).map_or("", |m| m.as_str());
        let _ = std::fmt::Write::write_fmt(
            &mut structure,
            format_args!("<{SLOT_TAG} n=\"{}\"/>", scripts.len()),
        );
        scripts.push(ScriptNode {
            attrs: parse_script_attrs(attrs_src)?,
            text: text.to_string(),
            active: false,
        });
        last = whole.end();
    }
    structure.push_str(&markup[last..]);
    Ok((structure, scripts))
}

fn parse_script_attrs(attrs_src: &str) -> Result<Vec<(String, String)>> {
    let attrs_src = attrs_src.trim().trim_end_matches('/');
    if attrs_src.is_empty() {
        return Ok(Vec::new());
    }
    let tag = format!("<script {attrs_src}>");
    let mut reader = Reader::from_str(&tag);
    match reader.read_event() {
        Ok(Event::Start(e)) | Ok(Event::Empty(e)) => read_attrs(&e),
        Ok(_) => Ok(Vec::new()),
        Err(e) => Err(markup_error(0, e)),
    }
}

fn read_attrs(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.html_attributes() {
        let attr = attr.map_err(|err| markup_error(0, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase()
}

fn parse_structure(markup: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    fn attach(root: &mut Vec<Node>, stack: &mut [Element], node: Node) {
        match stack.last_mut() {
            Some(open) => open.children.push(node),
            None => root.push(node),
        }
    }

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(markup_error(reader.error_position(), e)),
        };
        match event {
            Event::Start(e) => {
                let tag = tag_name(&e);
                let element = Element {
                    attrs: read_attrs(&e)?,
                    children: Vec::new(),
                    tag: tag.clone(),
                };
                if is_void(&tag) || tag == SLOT_TAG {
                    attach(&mut root, &mut stack, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(e) => {
                let element = Element {
                    tag: tag_name(&e),
                    attrs: read_attrs(&e)?,
                    children: Vec::new(),
                };
                attach(&mut root, &mut stack, Node::Element(element));
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                // Close up to the matching open tag; stray end tags are ignored.
                if let Some(depth) = stack.iter().rposition(|open| open.tag == tag) {
                    while stack.len() > depth {
                        if let Some(open) = stack.pop() {
                            attach(&mut root, &mut stack, Node::Element(open));
                        }
                    }
                }
            }
            Event::Text(t) => {
                let text = match t.unescape() {
                    Ok(s) => s.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                if !text.trim().is_empty() {
                    attach(&mut root, &mut stack, Node::text(text));
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                attach(&mut root, &mut stack, Node::text(text));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    // Unclosed elements close at end of input.
    while let Some(open) = stack.pop() {
        attach(&mut root, &mut stack, Node::Element(open));
    }
    Ok(root)
}

fn fill_slots(nodes: &mut [Node], scripts: &mut [Option<ScriptNode>]) {
    for node in nodes.iter_mut() {
        let slot = match node {
            Node::Element(e) if e.tag == SLOT_TAG => e.attr("n").and_then(|n| n.parse::<usize>().ok()),
            Node::Element(e) => {
                fill_slots(&mut e.children, scripts);
                None
            }
            _ => None,
        };
        if let Some(script) = slot.and_then(|i| scripts.get_mut(i)).and_then(Option::take) {
            *node = Node::Script(script);
        }
    }
}

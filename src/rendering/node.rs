//! Rendered node tree and its HTML serialization
//!
//! Renderers return [`Node`] values rather than strings so the interactive mode can
//! attach editor affordances around each component without re-parsing markup. The
//! serializer is deterministic: attributes keep insertion order and style properties
//! are emitted in key order.

use crate::model::Styles;
use serde_json::Value;
use std::fmt::Write;

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// CSS properties whose numeric values carry no unit.
const UNITLESS_PROPERTIES: &[&str] = &[
    "flex",
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "line-height",
    "opacity",
    "order",
    "z-index",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on output
    Text(String),
    /// Pre-sanitized markup, emitted verbatim
    Html(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub style: Styles,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            style: Styles::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    /// Overlay `styles` on the element's current styles; later keys win.
    pub fn style(mut self, styles: &Styles) -> Self {
        for (k, v) in styles {
            self.style.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn style_prop(mut self, name: &str, value: &str) -> Self {
        self.style
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.child(Node::Text(text.to_string()))
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Html(html) => out.push_str(html),
            Node::Element(el) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attrs {
                    let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
                }
                let css = styles_to_css(&el.style);
                if !css.is_empty() {
                    let _ = write!(out, " style=\"{}\"", escape_html(&css));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                for child in &el.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `backgroundColor` -> `background-color`, `WebkitTransform` -> `-webkit-transform`.
pub fn css_property_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 || key.len() > 1 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn css_value(property: &str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => {
            let zero = n.as_f64().map(|f| f == 0.0).unwrap_or(false);
            if zero || UNITLESS_PROPERTIES.contains(&property) {
                Some(n.to_string())
            } else {
                Some(format!("{}px", n))
            }
        }
        other => {
            log::debug!("skipping style '{}': {} is not a CSS value", property, other);
            None
        }
    }
}

/// Serialize a style map to an inline declaration list (`prop:value;...`).
pub fn styles_to_css(styles: &Styles) -> String {
    let mut decls: Vec<(String, String)> = styles
        .iter()
        .filter(|(k, _)| !k.is_empty())
        .filter_map(|(k, v)| {
            let prop = css_property_name(k);
            css_value(&prop, v).map(|val| (prop, val))
        })
        .collect();
    // keys may collide after kebab-casing ("fontSize" and "font-size"); keep the last
    decls.sort_by(|a, b| a.0.cmp(&b.0));
    decls.dedup_by(|later, earlier| {
        if later.0 == earlier.0 {
            earlier.1 = later.1.clone();
            true
        } else {
            false
        }
    });
    let mut css = String::new();
    for (prop, val) in decls {
        let _ = write!(css, "{}:{};", prop, val);
    }
    css
}

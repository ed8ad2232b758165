//! Component type registry
//!
//! Maps a component's type tag to its renderer and to the default content and styles
//! new components start from. Lookups are total: unknown tags yield `None` for the
//! renderer and empty maps for the defaults.

use crate::model::{map_from_pairs, Content, Styles};
use crate::rendering::sections;
use crate::rendering::{Node, RenderInput, Renderer};
use crate::Result;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The builtin component types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Header,
    Hero,
    Text,
    Image,
    Button,
    Footer,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Header,
        ComponentKind::Hero,
        ComponentKind::Text,
        ComponentKind::Image,
        ComponentKind::Button,
        ComponentKind::Footer,
    ];

    /// The type tag stored on components
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Header => "header",
            ComponentKind::Hero => "hero",
            ComponentKind::Text => "text",
            ComponentKind::Image => "image",
            ComponentKind::Button => "button",
            ComponentKind::Footer => "footer",
        }
    }

    /// Label shown in the builder's component palette
    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::Header => "Header",
            ComponentKind::Hero => "Hero",
            ComponentKind::Text => "Text",
            ComponentKind::Image => "Image",
            ComponentKind::Button => "Button",
            ComponentKind::Footer => "Footer",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    fn renderer(self) -> Renderer {
        let render: fn(&RenderInput<'_>) -> Result<Node> = match self {
            ComponentKind::Header => sections::render_header,
            ComponentKind::Hero => sections::render_hero,
            ComponentKind::Text => sections::render_text,
            ComponentKind::Image => sections::render_image,
            ComponentKind::Button => sections::render_button,
            ComponentKind::Footer => sections::render_footer,
        };
        Arc::new(render)
    }

    fn default_content(self) -> Content {
        let value = match self {
            ComponentKind::Hero => json!({
                "title": "Your headline here",
                "subtitle": "A short sentence that explains what you offer",
                "image": "",
                "cta_text": "Get started",
                "cta_link": "#"
            }),
            ComponentKind::Header => json!({
                "title": "My Website",
                "logo": "",
                "menu_items": [
                    { "text": "Home", "link": "#" },
                    { "text": "Services", "link": "#services" },
                    { "text": "Contact", "link": "#contact" }
                ]
            }),
            ComponentKind::Text => json!({
                "text": "<p>Text content. You can use <strong>HTML</strong> here.</p>",
                "alignment": "left"
            }),
            ComponentKind::Image => json!({
                "src": "https://via.placeholder.com/600x300",
                "alt": "Example image",
                "caption": "Image description"
            }),
            ComponentKind::Button => json!({
                "text": "Click here",
                "link": "#",
                "variant": "primary"
            }),
            ComponentKind::Footer => json!({
                "text": "\u{a9} My Website. All rights reserved.",
                "links": [
                    { "text": "Privacy Policy", "url": "#" },
                    { "text": "Terms of Use", "url": "#" }
                ]
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Content::new(),
        }
    }

    fn default_styles(self) -> Styles {
        match self {
            ComponentKind::Hero => {
                map_from_pairs(&[("padding", "80px 20px"), ("textAlign", "center")])
            }
            ComponentKind::Header => {
                map_from_pairs(&[("padding", "20px"), ("borderBottom", "1px solid #eee")])
            }
            ComponentKind::Text => map_from_pairs(&[("padding", "40px 20px")]),
            ComponentKind::Image => {
                map_from_pairs(&[("padding", "40px 20px"), ("textAlign", "center")])
            }
            ComponentKind::Button => map_from_pairs(&[("padding", "20px"), ("textAlign", "center")]),
            ComponentKind::Footer => map_from_pairs(&[
                ("padding", "40px 20px"),
                ("textAlign", "center"),
                ("borderTop", "1px solid #eee"),
                ("marginTop", "40px"),
            ]),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered component type
#[derive(Clone)]
struct ComponentSpec {
    renderer: Renderer,
    default_content: Content,
    default_styles: Styles,
}

/// Lookup table from type tag to renderer and defaults
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    specs: BTreeMap<String, ComponentSpec>,
}

impl ComponentRegistry {
    /// A registry with no types. Every component renders as a placeholder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the six builtin types.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in ComponentKind::ALL {
            registry.register(
                kind.as_str(),
                kind.renderer(),
                kind.default_content(),
                kind.default_styles(),
            );
        }
        registry
    }

    /// Register a type, replacing any previous registration for the same tag.
    pub fn register(
        &mut self,
        type_tag: &str,
        renderer: Renderer,
        default_content: Content,
        default_styles: Styles,
    ) {
        self.specs.insert(
            type_tag.to_string(),
            ComponentSpec {
                renderer,
                default_content,
                default_styles,
            },
        );
    }

    pub fn resolve_renderer(&self, type_tag: &str) -> Option<&Renderer> {
        self.specs.get(type_tag).map(|s| &s.renderer)
    }

    /// Default content for a type; empty for unknown types.
    pub fn default_content(&self, type_tag: &str) -> Content {
        self.specs
            .get(type_tag)
            .map(|s| s.default_content.clone())
            .unwrap_or_default()
    }

    /// Default styles for a type; empty for unknown types.
    pub fn default_styles(&self, type_tag: &str) -> Styles {
        self.specs
            .get(type_tag)
            .map(|s| s.default_styles.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.specs.contains_key(type_tag)
    }

    /// Registered type tags, sorted.
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.specs.keys().collect::<Vec<_>>())
            .finish()
    }
}

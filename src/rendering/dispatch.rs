//! Page composition: ordering, visibility, per-component dispatch and the document shell.

use super::node::{Element, Node};
use super::sections::render_placeholder;
use super::{
    FailureKind, Mode, RenderFailure, RenderInput, RenderedDocument, RenderedSection,
};
use crate::merge::{merge_content, merge_styles};
use crate::model::{Component, ComponentId, Page};
use crate::registry::ComponentRegistry;
use crate::theme::{Theme, ThemeRegistry};
use crate::{Error, RenderConfig};
use log::warn;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Stylesheet embedded in static documents when `include_global_styles` is set.
const GLOBAL_STYLES: &str = "*{margin:0;padding:0;box-sizing:border-box;}\
a{color:#007bff;text-decoration:none;}\
a:hover{text-decoration:underline;}\
.btn{display:inline-block;cursor:pointer;transition:all 0.3s ease;}\
.btn:hover{transform:translateY(-2px);box-shadow:0 4px 12px rgba(0,0,0,0.15);}\
@media (max-width:768px){.ps-container{padding:0 15px !important;}h1{font-size:2rem !important;}.hero h1{font-size:2.5rem !important;}}";

const DRAG_HANDLE_GLYPH: &str = "\u{22ee}\u{22ee}";

/// Renders pages from a component registry and a theme registry.
///
/// Rendering is synchronous and pure: the same inputs always produce the same
/// document, byte for byte.
#[derive(Debug, Clone)]
pub struct Composer {
    components: ComponentRegistry,
    themes: ThemeRegistry,
    config: RenderConfig,
}

impl Composer {
    /// Composer with the builtin component types and themes.
    pub fn new(config: RenderConfig) -> Self {
        Self::with_registries(ComponentRegistry::builtin(), ThemeRegistry::builtin(), config)
    }

    pub fn with_registries(
        components: ComponentRegistry,
        themes: ThemeRegistry,
        config: RenderConfig,
    ) -> Self {
        Self {
            components,
            themes,
            config,
        }
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Mutable access for registering component types.
    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    pub fn themes(&self) -> &ThemeRegistry {
        &self.themes
    }

    /// Mutable access for registering themes.
    pub fn themes_mut(&mut self) -> &mut ThemeRegistry {
        &mut self.themes
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn render_page(&self, page: &Page, components: &[Component], mode: Mode) -> RenderedDocument {
        self.render_page_with_selection(page, components, mode, None)
    }

    /// Like [`render_page`](Self::render_page); in interactive mode the `selected`
    /// component's wrapper is marked with the `ps-selected` class.
    pub fn render_page_with_selection(
        &self,
        page: &Page,
        components: &[Component],
        mode: Mode,
        selected: Option<ComponentId>,
    ) -> RenderedDocument {
        let theme = self.themes.resolve(page.theme_name());

        let mut visible: Vec<&Component> = components.iter().filter(|c| c.is_visible).collect();
        // stable: equal positions keep their input order
        visible.sort_by_key(|c| c.position);

        let mut sections = Vec::with_capacity(visible.len());
        let mut failures = Vec::new();
        for component in visible {
            let (section, failure) = self.render_component(component, theme, mode);
            if let Some(failure) = failure {
                failures.push(failure);
            }
            sections.push(section);
        }

        let mut container = Element::new("main")
            .attr("class", "ps-container")
            .style(&theme.container);
        for section in &sections {
            let node = match mode {
                Mode::Static => section.node.clone(),
                Mode::Interactive => self.editor_wrapper(section, selected),
            };
            container = container.child(node);
        }
        let page_root = Element::new("div")
            .attr("class", "ps-page")
            .attr("data-theme", theme.name.as_str())
            .style(&theme.body)
            .child(container);

        let root = match mode {
            Mode::Interactive => page_root.into(),
            Mode::Static => self.document_shell(page, page_root),
        };

        RenderedDocument {
            mode,
            theme: theme.name.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            sections,
            failures,
            root,
        }
    }

    /// Render one component, substituting the placeholder for unknown types and for
    /// renderers that fail or panic.
    pub fn render_component(
        &self,
        component: &Component,
        theme: &Theme,
        mode: Mode,
    ) -> (RenderedSection, Option<RenderFailure>) {
        let type_tag = component.component_type.as_str();
        let outcome = match self.components.resolve_renderer(type_tag) {
            None => Err((
                FailureKind::UnknownType,
                Error::UnknownComponentType(type_tag.to_string()).to_string(),
            )),
            Some(renderer) => {
                let content = merge_content(&self.components, type_tag, &component.content);
                let styles = merge_styles(&self.components, type_tag, &component.styles);
                let input = RenderInput {
                    component_id: component.id,
                    component_type: type_tag,
                    content: &content,
                    styles: &styles,
                    theme,
                    mode,
                };
                match catch_unwind(AssertUnwindSafe(|| renderer(&input))) {
                    Ok(Ok(node)) => Ok(node),
                    Ok(Err(err)) => Err((FailureKind::Malformed, err.to_string())),
                    Err(payload) => Err((FailureKind::Malformed, panic_message(payload.as_ref()))),
                }
            }
        };

        let (node, failure) = match outcome {
            Ok(node) => (node, None),
            Err((kind, reason)) => {
                warn!(
                    "component {} ({}) rendered as placeholder: {}",
                    component.id, type_tag, reason
                );
                let failure = RenderFailure {
                    component_id: component.id,
                    component_type: type_tag.to_string(),
                    kind,
                    reason,
                };
                (render_placeholder(type_tag, theme), Some(failure))
            }
        };

        let section = RenderedSection {
            component_id: component.id,
            component_type: type_tag.to_string(),
            position: component.position,
            node,
            fallback: failure.is_some(),
        };
        (section, failure)
    }

    fn editor_wrapper(&self, section: &RenderedSection, selected: Option<ComponentId>) -> Node {
        let class = if selected == Some(section.component_id) {
            "ps-editable ps-selected"
        } else {
            "ps-editable"
        };
        let mut wrapper = Element::new("div")
            .attr("class", class)
            .attr("data-component-id", section.component_id.to_string())
            .attr("data-component-type", section.component_type.as_str())
            .attr("data-position", section.position.to_string())
            .attr("draggable", "true");
        if self.config.drag_handles {
            wrapper = wrapper.child(
                Element::new("div")
                    .attr("class", "ps-drag-handle")
                    .attr("aria-hidden", "true")
                    .text(DRAG_HANDLE_GLYPH),
            );
        }
        wrapper.child(section.node.clone()).into()
    }

    fn document_shell(&self, page: &Page, page_root: Element) -> Node {
        let mut head = Element::new("head")
            .child(Element::new("meta").attr("charset", "UTF-8"))
            .child(
                Element::new("meta")
                    .attr("name", "viewport")
                    .attr("content", "width=device-width, initial-scale=1"),
            )
            .child(Element::new("title").text(&page.title));
        if !page.description.is_empty() {
            head = head.child(
                Element::new("meta")
                    .attr("name", "description")
                    .attr("content", page.description.as_str()),
            );
        }
        if let Some(generator) = &self.config.generator {
            head = head.child(
                Element::new("meta")
                    .attr("name", "generator")
                    .attr("content", generator.as_str()),
            );
        }
        if self.config.include_global_styles {
            head = head.child(Element::new("style").child(Node::Html(GLOBAL_STYLES.to_string())));
        }

        Element::new("html")
            .attr("lang", self.config.lang.as_str())
            .child(head)
            .child(Element::new("body").child(page_root))
            .into()
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("renderer panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("renderer panicked: {}", s)
    } else {
        "renderer panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageConfig;

    fn page(theme: Option<&str>) -> Page {
        Page {
            id: 1,
            title: "Launch".into(),
            description: "Our launch page".into(),
            slug: "launch".into(),
            subdomain: "acme".into(),
            config: theme.map(PageConfig::with_theme).unwrap_or_default(),
            is_published: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn interactive_wrappers_carry_editor_attributes() {
        let composer = Composer::default();
        let comps = vec![Component::new(4, "hero", 0)];
        let doc = composer.render_page_with_selection(&page(None), &comps, Mode::Interactive, Some(4));
        let html = doc.to_html();
        assert!(html.starts_with("<div class=\"ps-page\" data-theme=\"default\""));
        assert!(html.contains("class=\"ps-editable ps-selected\" data-component-id=\"4\""));
        assert!(html.contains("draggable=\"true\""));
        assert!(html.contains("ps-drag-handle"));
    }

    #[test]
    fn static_shell_has_head_metadata() {
        let composer = Composer::default();
        let doc = composer.render_page(&page(Some("dark")), &[], Mode::Static);
        let html = doc.to_html();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<title>Launch</title>"));
        assert!(html.contains("<meta name=\"description\" content=\"Our launch page\">"));
        assert!(html.contains("data-theme=\"dark\""));
        assert!(!html.contains("ps-editable"));
    }

    #[test]
    fn panicking_renderer_is_contained() {
        let mut composer = Composer::default();
        composer.components_mut().register(
            "boom",
            std::sync::Arc::new(|_input: &RenderInput<'_>| -> crate::Result<Node> {
                panic!("kaboom")
            }),
            Default::default(),
            Default::default(),
        );
        let comps = vec![Component::new(1, "boom", 0), Component::new(2, "text", 1)];
        let doc = composer.render_page(&page(None), &comps, Mode::Static);
        assert_eq!(doc.failures.len(), 1);
        assert_eq!(doc.failures[0].kind, FailureKind::Malformed);
        assert!(doc.failures[0].reason.contains("kaboom"));
        assert!(doc.sections[0].fallback);
        assert!(!doc.sections[1].fallback);
    }
}

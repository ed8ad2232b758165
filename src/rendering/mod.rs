//! Rendering: node tree, builtin component renderers and the page composer
//!
//! A page renders in one of two modes. [`Mode::Interactive`] produces the tree the
//! builder mounts, with an editor wrapper around every component. [`Mode::Static`]
//! produces a complete HTML document for deployment. Both modes run the same
//! renderers, so a component's own markup is identical in either.

pub mod dispatch;
pub mod node;
pub mod sanitize;
pub mod sections;

use crate::model::{ComponentId, Content, Styles};
use crate::theme::Theme;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use dispatch::Composer;
pub use node::{Element, Node};

/// Execution context of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Editable preview inside the builder
    Interactive,
    /// Non-interactive HTML for deployment
    Static,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interactive" => Ok(Mode::Interactive),
            "static" => Ok(Mode::Static),
            other => Err(format!("unknown render mode '{}'", other)),
        }
    }
}

/// Everything a renderer may look at. Content and styles are already merged with the
/// type defaults.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub component_id: ComponentId,
    pub component_type: &'a str,
    pub content: &'a Content,
    pub styles: &'a Styles,
    pub theme: &'a Theme,
    pub mode: Mode,
}

/// A component renderer. Must be pure: no I/O, no blocking.
pub type Renderer = Arc<dyn Fn(&RenderInput<'_>) -> Result<Node> + Send + Sync>;

/// Why a component was replaced by the placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    UnknownType,
    Malformed,
}

/// A contained per-component failure. Never surfaced to page visitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub component_id: ComponentId,
    pub component_type: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// One visible component after rendering
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection {
    pub component_id: ComponentId,
    pub component_type: String,
    pub position: i64,
    /// The component's own markup, identical in both modes
    pub node: Node,
    /// Whether `node` is the placeholder
    pub fallback: bool,
}

/// Output of [`Composer::render_page`]
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub mode: Mode,
    /// Canonical name of the resolved theme
    pub theme: String,
    pub title: String,
    pub description: String,
    pub sections: Vec<RenderedSection>,
    pub failures: Vec<RenderFailure>,
    pub(crate) root: Node,
}

impl RenderedDocument {
    /// The full tree: the `<html>` element in static mode, the page container in
    /// interactive mode.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Serialize the document. Static mode includes the doctype.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if self.mode == Mode::Static {
            out.push_str("<!DOCTYPE html>\n");
        }
        self.root.write_html(&mut out);
        if self.mode == Mode::Static {
            out.push('\n');
        }
        out
    }

    /// Ids of rendered components, in render order.
    pub fn component_order(&self) -> Vec<ComponentId> {
        self.sections.iter().map(|s| s.component_id).collect()
    }

    pub fn section(&self, id: ComponentId) -> Option<&RenderedSection> {
        self.sections.iter().find(|s| s.component_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Static".parse::<Mode>(), Ok(Mode::Static));
        assert_eq!("interactive".parse::<Mode>(), Ok(Mode::Interactive));
        assert!("print".parse::<Mode>().is_err());
    }
}

//! Pagesmith composition engine
//!
//! Turns a landing page (metadata plus an ordered list of typed components) into
//! either an editable preview tree for the builder or a complete static HTML
//! document for deployment.
//!
//! # Features
//!
//! - **Type registry**: one lookup table from component type to renderer and defaults
//! - **Themes**: named style bundles with a shared dark-family classification
//! - **Live editing**: optimistic mutations with snapshot rollback on persistence failure
//! - **Static export**: deterministic, byte-identical output for identical input
//!
//! # Example
//!
//! ```
//! use pagesmith::{Composer, Mode, PagePayload, RenderConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let payload = PagePayload::from_json(r#"{
//!     "id": 1, "title": "Launch", "slug": "launch", "subdomain": "acme",
//!     "is_published": true, "config": {"theme": "dark"},
//!     "components": [{"id": 1, "type": "hero", "content": {}, "position": 0}]
//! }"#)?;
//!
//! let composer = Composer::new(RenderConfig::default());
//! let html = pagesmith::export_static_page(&composer, &payload.page, &payload.components)?;
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod export;
pub mod merge;
pub mod model;
pub mod registry;
pub mod rendering;
pub mod session;
pub mod store;
pub mod theme;

pub use export::{export_static_page, DeployReport, Deployer};
pub use model::{Component, ComponentId, ComponentPatch, NewComponent, Page, PageConfig, PagePayload};
pub use registry::{ComponentKind, ComponentRegistry};
pub use rendering::{Composer, Mode, RenderedDocument};
pub use session::{EditSession, Notice, SessionState};
pub use store::{MemoryStore, PageStore};
pub use theme::{is_dark_family, resolve_theme, Theme, ThemeRegistry};

/// Rendering options
///
/// The defaults produce an English document with the global stylesheet and a
/// generator tag, and drag handles in the editor preview.
///
/// # Examples
///
/// ```
/// let cfg = pagesmith::RenderConfig::default();
/// assert_eq!(cfg.lang, "en");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Value of the `lang` attribute on `<html>` in static documents
    pub lang: String,
    /// Embed the global stylesheet in static documents
    pub include_global_styles: bool,
    /// Content of `<meta name="generator">`; omitted when `None`
    pub generator: Option<String>,
    /// Add a drag handle to each editor wrapper (interactive mode only)
    pub drag_handles: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            include_global_styles: true,
            generator: Some("pagesmith".to_string()),
            drag_handles: true,
        }
    }
}

/// Live edit options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for one persistence call, in milliseconds. Exceeding it rolls the edit back.
    pub persist_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist_timeout_ms: 10000,
        }
    }
}

/// Deployment target options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Root directory; pages land under `<output_dir>/<subdomain>[/<slug>]/index.html`
    pub output_dir: PathBuf,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/var/www/sites"),
        }
    }
}

/// All configuration, as loaded from a JSON file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub session: SessionConfig,
    pub deploy: DeployConfig,
}

impl Config {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

//! Page and component data model
//!
//! These are the shapes the external CRUD layer hands to the engine. The engine treats
//! them as read-only inputs except inside an [`EditSession`](crate::session::EditSession).

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Identifier of a component, unique within one page
pub type ComponentId = i64;

/// Open key/value payload of a component. Recognized keys depend on the type.
pub type Content = Map<String, Value>;

/// Open CSS-like property map. Keys are camelCase property names.
pub type Styles = Map<String, Value>;

/// Slug used for a subdomain's landing page (deployed at the subdomain root).
pub const ROOT_SLUG: &str = "root";

/// Build a string-valued style (or content) map from literal pairs.
pub fn map_from_pairs(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// Theme-bearing page configuration. Unknown keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageConfig {
    pub fn with_theme(theme: &str) -> Self {
        Self {
            theme: Some(theme.to_string()),
            extra: Map::new(),
        }
    }
}

/// A landing page as stored by the CRUD layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub slug: String,
    pub subdomain: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: PageConfig,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Page {
    /// Theme name from the page configuration, if any.
    pub fn theme_name(&self) -> Option<&str> {
        self.config.theme.as_deref()
    }

    /// Check the routing invariants: slug matches `^[a-z0-9-]+$` and the subdomain is a
    /// valid DNS label.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_slug(&self.slug) {
            return Err(Error::InvalidPage(format!(
                "slug '{}' must match ^[a-z0-9-]+$",
                self.slug
            )));
        }
        if !is_valid_subdomain(&self.subdomain) {
            return Err(Error::InvalidPage(format!(
                "subdomain '{}' is not a valid DNS label",
                self.subdomain
            )));
        }
        Ok(())
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
    SLUG_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern"))
        .is_match(slug)
}

/// A DNS label: 1-63 characters, lowercase alphanumerics and hyphens, no leading or
/// trailing hyphen.
pub fn is_valid_subdomain(subdomain: &str) -> bool {
    static LABEL_REGEX: OnceLock<Regex> = OnceLock::new();
    LABEL_REGEX
        .get_or_init(|| {
            Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("dns label pattern")
        })
        .is_match(subdomain)
}

fn default_visible() -> bool {
    true
}

/// A single visual unit of a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Content,
    #[serde(default, deserialize_with = "null_as_default")]
    pub styles: Styles,
    #[serde(default)]
    pub position: i64,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

impl Component {
    pub fn new(id: ComponentId, component_type: &str, position: i64) -> Self {
        Self {
            id,
            component_type: component_type.to_string(),
            content: Content::new(),
            styles: Styles::new(),
            position,
            is_visible: true,
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    pub fn with_styles(mut self, styles: Styles) -> Self {
        self.styles = styles;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }
}

/// Data for creating a component through the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    pub content: Content,
    pub styles: Styles,
    pub position: i64,
    pub is_visible: bool,
}

impl NewComponent {
    pub fn into_component(self, id: ComponentId) -> Component {
        Component {
            id,
            component_type: self.component_type,
            content: self.content,
            styles: self.styles,
            position: self.position,
            is_visible: self.is_visible,
        }
    }
}

/// A partial update to a component.
///
/// `content` and `styles` are merged shallowly: each top-level key in the patch replaces
/// the stored key wholesale. Array-valued fields such as `menu_items` or `links` are
/// never merged element-wise; callers send the full array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl ComponentPatch {
    pub fn content(content: Content) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn styles(styles: Styles) -> Self {
        Self {
            styles: Some(styles),
            ..Default::default()
        }
    }

    pub fn visibility(is_visible: bool) -> Self {
        Self {
            is_visible: Some(is_visible),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.styles.is_none()
            && self.is_visible.is_none()
            && self.position.is_none()
    }

    /// Apply the patch in place.
    pub fn apply_to(&self, component: &mut Component) {
        if let Some(content) = &self.content {
            for (k, v) in content {
                component.content.insert(k.clone(), v.clone());
            }
        }
        if let Some(styles) = &self.styles {
            for (k, v) in styles {
                component.styles.insert(k.clone(), v.clone());
            }
        }
        if let Some(visible) = self.is_visible {
            component.is_visible = visible;
        }
        if let Some(position) = self.position {
            component.position = position;
        }
    }
}

/// A page together with its components, as exchanged with the CLI and fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePayload {
    #[serde(flatten)]
    pub page: Page,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl PagePayload {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(slug: &str, subdomain: &str) -> Page {
        Page {
            id: 1,
            title: "t".into(),
            description: String::new(),
            slug: slug.into(),
            subdomain: subdomain.into(),
            config: PageConfig::default(),
            is_published: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn slug_and_subdomain_rules() {
        assert!(page("my-landing-2", "acme").validate().is_ok());
        assert!(page("My Page", "acme").validate().is_err());
        assert!(page("ok", "-acme").validate().is_err());
        assert!(page("ok", "acme-").validate().is_err());
        assert!(page("ok", &"a".repeat(64)).validate().is_err());
        assert!(page("ok", &"a".repeat(63)).validate().is_ok());
        assert!(page("", "acme").validate().is_err());
    }

    #[test]
    fn null_payloads_become_empty_maps() {
        let c: Component = serde_json::from_value(json!({
            "id": 3, "type": "hero", "content": null, "styles": null, "position": 2
        }))
        .unwrap();
        assert!(c.content.is_empty());
        assert!(c.styles.is_empty());
        assert!(c.is_visible);
    }

    #[test]
    fn patch_replaces_arrays_wholesale() {
        let mut c = Component::new(1, "footer", 0).with_content(
            json!({"text": "a", "links": [{"text": "x", "url": "#"}, {"text": "y", "url": "#"}]})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let patch = ComponentPatch::content(
            json!({"links": [{"text": "z", "url": "/z"}]})
                .as_object()
                .cloned()
                .unwrap(),
        );
        patch.apply_to(&mut c);
        assert_eq!(c.content["links"], json!([{"text": "z", "url": "/z"}]));
        assert_eq!(c.content["text"], json!("a"));
    }

    #[test]
    fn payload_keeps_unknown_config_keys() {
        let payload = PagePayload::from_json(
            r#"{"id":1,"title":"T","slug":"root","subdomain":"acme",
                "config":{"theme":"dark","customStyles":{}},"components":[]}"#,
        )
        .unwrap();
        assert_eq!(payload.page.theme_name(), Some("dark"));
        assert!(payload.page.config.extra.contains_key("customStyles"));
        assert!(!payload.page.is_published);
    }
}

//! Theme resolution
//!
//! A theme is a named bundle of page-wide styling: body styles, container styles and a
//! few component-level modifiers. Every renderer asks the theme for its text palette
//! instead of testing theme names itself, so the dark/light classification lives in
//! exactly one place: [`Theme::dark_family`].

use crate::model::{map_from_pairs, Styles};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Name every unknown or missing theme resolves to.
pub const DEFAULT_THEME: &str = "default";

const SYSTEM_FONT: &str =
    "-apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, Oxygen, Ubuntu, Cantarell, sans-serif";

/// Text colours chosen for a theme's contrast class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Headings, links and body copy
    pub text: &'static str,
    /// Subtitles, captions and footer text
    pub muted: &'static str,
}

const LIGHT_ON_DARK: Palette = Palette {
    text: "#fff",
    muted: "#ccc",
};

const DARK_ON_LIGHT: Palette = Palette {
    text: "#333",
    muted: "#666",
};

/// A named style bundle
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Canonical (lowercase) name used in page configuration
    pub name: String,
    /// Display label
    pub label: String,
    /// Styles for the page's outermost element
    pub body: Styles,
    /// Styles for the container that holds the component list
    pub container: Styles,
    /// Whether components need light-on-dark contrast
    pub dark_family: bool,
    /// Extra styles for prominent surfaces (the hero section)
    pub surface: Styles,
    /// Overrides for call-to-action buttons; empty keeps the variant colours
    pub button: Styles,
}

impl Theme {
    /// A theme with the shared container layout and no component modifiers.
    pub fn new(name: &str, label: &str, body: Styles, dark_family: bool) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            label: label.to_string(),
            body,
            container: map_from_pairs(&[
                ("maxWidth", "1200px"),
                ("margin", "0 auto"),
                ("padding", "0 20px"),
            ]),
            dark_family,
            surface: Styles::new(),
            button: Styles::new(),
        }
    }

    pub fn with_surface(mut self, surface: Styles) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_button(mut self, button: Styles) -> Self {
        self.button = button;
        self
    }

    pub fn palette(&self) -> Palette {
        if self.dark_family {
            LIGHT_ON_DARK
        } else {
            DARK_ON_LIGHT
        }
    }
}

fn body_styles(font: &str, color: &str, background: (&str, &str)) -> Styles {
    map_from_pairs(&[
        ("fontFamily", font),
        ("lineHeight", "1.6"),
        ("color", color),
        background,
        ("margin", "0"),
        ("padding", "0"),
    ])
}

fn builtin_themes() -> Vec<Theme> {
    vec![
        Theme::new(
            "default",
            "Default",
            body_styles(SYSTEM_FONT, "#333", ("backgroundColor", "#fff")),
            false,
        ),
        Theme::new(
            "dark",
            "Dark",
            body_styles(SYSTEM_FONT, "#fff", ("backgroundColor", "#1a1a1a")),
            true,
        ),
        Theme::new(
            "modern",
            "Modern",
            body_styles(
                SYSTEM_FONT,
                "#fff",
                ("background", "linear-gradient(135deg, #667eea 0%, #764ba2 100%)"),
            ),
            true,
        )
        .with_surface(map_from_pairs(&[
            ("background", "rgba(255,255,255,0.1)"),
            ("backdropFilter", "blur(10px)"),
            ("borderRadius", "20px"),
            ("margin", "20px"),
        ]))
        .with_button(map_from_pairs(&[
            ("background", "rgba(255,255,255,0.2)"),
            ("color", "white"),
            ("border", "1px solid rgba(255,255,255,0.3)"),
        ])),
        Theme::new(
            "minimal",
            "Minimal",
            body_styles("Georgia, serif", "#333", ("backgroundColor", "#fafafa")),
            false,
        ),
    ]
}

/// Registry of themes keyed by canonical name
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: BTreeMap<String, Theme>,
    fallback: Theme,
}

impl ThemeRegistry {
    /// Registry holding the four builtin themes: default, dark, modern, minimal.
    pub fn builtin() -> Self {
        let mut themes = BTreeMap::new();
        let mut fallback = None;
        for theme in builtin_themes() {
            if theme.name == DEFAULT_THEME {
                fallback = Some(theme.clone());
            }
            themes.insert(theme.name.clone(), theme);
        }
        let fallback = fallback.unwrap_or_else(|| {
            Theme::new(
                DEFAULT_THEME,
                "Default",
                body_styles(SYSTEM_FONT, "#333", ("backgroundColor", "#fff")),
                false,
            )
        });
        Self { themes, fallback }
    }

    /// Register (or replace) a theme. Registering `default` also replaces the fallback.
    pub fn register(&mut self, theme: Theme) {
        if theme.name == DEFAULT_THEME {
            self.fallback = theme.clone();
        }
        self.themes.insert(theme.name.clone(), theme);
    }

    /// Resolve a theme by name. Missing and unknown names resolve to `default`.
    pub fn resolve(&self, name: Option<&str>) -> &Theme {
        let Some(name) = name else {
            return &self.fallback;
        };
        let key = name.trim().to_ascii_lowercase();
        match self.themes.get(&key) {
            Some(theme) => theme,
            None => {
                log::debug!("unknown theme '{}', using '{}'", name, DEFAULT_THEME);
                &self.fallback
            }
        }
    }

    /// Whether the named theme (after fallback) needs light-on-dark contrast.
    pub fn is_dark_family(&self, name: Option<&str>) -> bool {
        self.resolve(name).dark_family
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered themes in name order.
    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.themes.values()
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_registry() -> &'static ThemeRegistry {
    static BUILTIN: OnceLock<ThemeRegistry> = OnceLock::new();
    BUILTIN.get_or_init(ThemeRegistry::builtin)
}

/// Resolve a builtin theme; unknown or missing names yield `default`.
pub fn resolve_theme(name: Option<&str>) -> &'static Theme {
    builtin_registry().resolve(name)
}

/// Dark-family classification over the builtin themes (`dark`, `modern`).
pub fn is_dark_family(name: &str) -> bool {
    builtin_registry().is_dark_family(Some(name))
}

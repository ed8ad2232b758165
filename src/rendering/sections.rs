//! Builtin component renderers and the placeholder used for unknown or broken ones.
//!
//! Renderers read merged content, so every recognized key is present. They still
//! validate value shapes: a list field that is not a list of objects, or a text field
//! holding an object, is malformed data and fails only this component.

use super::node::{Element, Node};
use super::sanitize::{is_safe_url, sanitize_fragment};
use super::RenderInput;
use crate::model::{map_from_pairs, Styles};
use crate::theme::Theme;
use crate::{Error, Result};
use serde_json::{Map, Value};

fn malformed(input: &RenderInput<'_>, reason: String) -> Error {
    Error::MalformedComponentData {
        component_id: input.component_id,
        component_type: input.component_type.to_string(),
        reason,
    }
}

/// A scalar content field as display text. Missing and null read as empty.
fn text_field(input: &RenderInput<'_>, key: &str) -> Result<String> {
    scalar_text(input.content.get(key))
        .ok_or_else(|| malformed(input, format!("'{}' must be a string", key)))
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(_) => None,
    }
}

/// A list-of-objects content field (menu items, footer links).
fn list_field<'a>(input: &RenderInput<'a>, key: &str) -> Result<Vec<&'a Map<String, Value>>> {
    match input.content.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object()
                    .ok_or_else(|| malformed(input, format!("'{}[{}]' must be an object", key, i)))
            })
            .collect(),
        Some(_) => Err(malformed(input, format!("'{}' must be a list", key))),
    }
}

fn item_text(
    input: &RenderInput<'_>,
    item: &Map<String, Value>,
    list: &str,
    key: &str,
) -> Result<String> {
    scalar_text(item.get(key))
        .ok_or_else(|| malformed(input, format!("'{}.{}' must be a string", list, key)))
}

/// Script URLs never reach an `href` or `src`.
fn safe_url(url: &str, fallback: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() || !is_safe_url(trimmed) {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn base(pairs: &[(&str, &str)]) -> Styles {
    map_from_pairs(pairs)
}

fn cta_styles(theme: &Theme, variant: &str) -> Styles {
    let mut styles = match variant {
        "secondary" => base(&[("background", "#6c757d"), ("color", "white")]),
        "outline" => base(&[
            ("background", "transparent"),
            ("color", "#007bff"),
            ("border", "2px solid #007bff"),
        ]),
        _ => base(&[("background", "#007bff"), ("color", "white")]),
    };
    styles.extend(base(&[
        ("padding", "15px 30px"),
        ("textDecoration", "none"),
        ("borderRadius", "5px"),
        ("fontWeight", "bold"),
        ("display", "inline-block"),
        ("transition", "all 0.3s ease"),
    ]));
    styles.extend(theme.button.clone());
    styles
}

pub fn render_hero(input: &RenderInput<'_>) -> Result<Node> {
    let title = text_field(input, "title")?;
    let subtitle = text_field(input, "subtitle")?;
    let image = text_field(input, "image")?;
    let cta_text = text_field(input, "cta_text")?;
    let cta_link = text_field(input, "cta_link")?;
    let palette = input.theme.palette();

    let mut section = Element::new("section")
        .attr("class", "hero")
        .style(&base(&[("textAlign", "center"), ("padding", "80px 20px")]))
        .style(input.styles)
        .style(&input.theme.surface);

    if !image.is_empty() {
        section = section.child(
            Element::new("img")
                .attr("src", safe_url(&image, ""))
                .attr("alt", "Hero")
                .style(&base(&[
                    ("maxWidth", "100%"),
                    ("height", "auto"),
                    ("marginBottom", "30px"),
                ])),
        );
    }
    section = section
        .child(
            Element::new("h1")
                .style(&base(&[("fontSize", "3rem"), ("marginBottom", "20px")]))
                .style_prop("color", palette.text)
                .text(&title),
        )
        .child(
            Element::new("p")
                .style(&base(&[("fontSize", "1.2rem"), ("marginBottom", "30px")]))
                .style_prop("color", palette.muted)
                .text(&subtitle),
        );
    if !cta_text.is_empty() {
        let mut button = cta_styles(input.theme, "primary");
        if input.theme.button.is_empty() {
            button.insert("border".into(), Value::String("none".into()));
        }
        section = section.child(
            Element::new("a")
                .attr("class", "btn")
                .attr("href", safe_url(&cta_link, "#"))
                .style(&button)
                .text(&cta_text),
        );
    }
    Ok(section.into())
}

pub fn render_header(input: &RenderInput<'_>) -> Result<Node> {
    let title = text_field(input, "title")?;
    let logo = text_field(input, "logo")?;
    let items = list_field(input, "menu_items")?;
    let color = input.theme.palette().text;

    let mut brand = Element::new("div").style(&base(&[("display", "flex"), ("alignItems", "center")]));
    if !logo.is_empty() {
        brand = brand.child(
            Element::new("img")
                .attr("src", safe_url(&logo, ""))
                .attr("alt", "Logo")
                .style(&base(&[("height", "40px"), ("marginRight", "15px")])),
        );
    }
    brand = brand.child(
        Element::new("h1")
            .style(&base(&[("margin", "0"), ("fontSize", "1.5rem")]))
            .style_prop("color", color)
            .text(&title),
    );

    let mut header = Element::new("header")
        .style(&base(&[
            ("padding", "20px"),
            ("borderBottom", "1px solid #eee"),
            ("display", "flex"),
            ("justifyContent", "space-between"),
            ("alignItems", "center"),
        ]))
        .style(input.styles)
        .child(brand);

    if !items.is_empty() {
        let mut nav = Element::new("nav").style_prop("display", "inline-block");
        for item in items {
            let text = item_text(input, item, "menu_items", "text")?;
            let link = item_text(input, item, "menu_items", "link")?;
            nav = nav.child(
                Element::new("a")
                    .attr("href", safe_url(&link, "#"))
                    .style(&base(&[("marginLeft", "20px"), ("textDecoration", "none")]))
                    .style_prop("color", color)
                    .text(&text),
            );
        }
        header = header.child(nav);
    }
    Ok(header.into())
}

pub fn render_text(input: &RenderInput<'_>) -> Result<Node> {
    let text = text_field(input, "text")?;
    let alignment = text_field(input, "alignment")?;
    let alignment = match alignment.as_str() {
        "center" | "right" | "justify" => alignment,
        _ => "left".to_string(),
    };

    let section = Element::new("section")
        .style(&base(&[("padding", "40px 20px")]))
        .style_prop("textAlign", &alignment)
        .style(input.styles)
        .child(
            Element::new("div")
                .style(&base(&[("maxWidth", "800px"), ("margin", "0 auto")]))
                .style_prop("color", input.theme.palette().text)
                .child(Element::new("div").child(Node::Html(sanitize_fragment(&text)))),
        );
    Ok(section.into())
}

pub fn render_image(input: &RenderInput<'_>) -> Result<Node> {
    let src = text_field(input, "src")?;
    let alt = text_field(input, "alt")?;
    let caption = text_field(input, "caption")?;

    let mut section = Element::new("section")
        .style(&base(&[("padding", "40px 20px"), ("textAlign", "center")]))
        .style(input.styles)
        .child(
            Element::new("img")
                .attr("src", safe_url(&src, ""))
                .attr("alt", alt)
                .style(&base(&[
                    ("maxWidth", "100%"),
                    ("height", "auto"),
                    ("borderRadius", "8px"),
                ])),
        );
    if !caption.is_empty() {
        section = section.child(
            Element::new("p")
                .style(&base(&[("marginTop", "15px"), ("fontStyle", "italic")]))
                .style_prop("color", input.theme.palette().muted)
                .text(&caption),
        );
    }
    Ok(section.into())
}

pub fn render_button(input: &RenderInput<'_>) -> Result<Node> {
    let text = text_field(input, "text")?;
    let text = if text.is_empty() { "Click me".to_string() } else { text };
    let link = text_field(input, "link")?;
    let variant = text_field(input, "variant")?;

    let section = Element::new("section")
        .style(&base(&[("padding", "20px"), ("textAlign", "center")]))
        .style(input.styles)
        .child(
            Element::new("a")
                .attr("class", "btn")
                .attr("href", safe_url(&link, "#"))
                .style(&cta_styles(input.theme, &variant))
                .text(&text),
        );
    Ok(section.into())
}

pub fn render_footer(input: &RenderInput<'_>) -> Result<Node> {
    let text = text_field(input, "text")?;
    let links = list_field(input, "links")?;
    let color = input.theme.palette().muted;

    let mut footer = Element::new("footer")
        .style(&base(&[
            ("padding", "40px 20px"),
            ("textAlign", "center"),
            ("borderTop", "1px solid #eee"),
            ("marginTop", "40px"),
        ]))
        .style(input.styles)
        .child(
            Element::new("p")
                .style_prop("margin", "0")
                .style_prop("color", color)
                .text(&text),
        );
    if !links.is_empty() {
        let mut row = Element::new("div").style_prop("marginTop", "20px");
        for link in links {
            let label = item_text(input, link, "links", "text")?;
            let url = item_text(input, link, "links", "url")?;
            row = row.child(
                Element::new("a")
                    .attr("href", safe_url(&url, "#"))
                    .style(&base(&[("marginRight", "20px"), ("textDecoration", "none")]))
                    .style_prop("color", color)
                    .text(&label),
            );
        }
        footer = footer.child(row);
    }
    Ok(footer.into())
}

/// Visible stand-in for a component that has no renderer or whose renderer failed.
pub fn render_placeholder(type_tag: &str, theme: &Theme) -> Node {
    Element::new("div")
        .attr("class", "ps-placeholder")
        .attr("data-component-type", type_tag)
        .style(&base(&[
            ("padding", "20px"),
            ("border", "1px dashed #ccc"),
            ("margin", "10px 0"),
        ]))
        .style_prop("color", theme.palette().text)
        .text(&format!("Unimplemented component: {}", type_tag))
        .into()
}

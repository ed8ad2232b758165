//! Allow-list sanitizer for the rich-text body of text components.
//!
//! Allowed tags are parsed into a name and attribute list and rebuilt from those
//! parts; the source text of a tag is never copied to the output. Attributes not on
//! the allow-list are dropped and kept values are re-escaped, so a browser reading
//! the result sees exactly the attributes this module emitted.

use super::node::escape_html;
use regex::Regex;
use std::sync::OnceLock;

const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "i", "li", "ol", "p", "pre", "small", "span", "strong", "u", "ul",
];

const VOID_TAGS: &[&str] = &["br", "hr"];

const GLOBAL_ATTRS: &[&str] = &["class", "title"];

const LINK_ATTRS: &[&str] = &["href", "rel", "target"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn scheme_regex() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^([a-z][a-z0-9+.\-]*):").expect("url scheme pattern"))
}

/// Whether `url` may be placed in an `href` or `src`.
///
/// Relative references and fragments are fine. Absolute URLs must use one of the
/// web schemes. Browsers drop tabs and newlines inside a URL before reading the
/// scheme, so `java\tscript:` is judged as `javascript:`.
pub fn is_safe_url(url: &str) -> bool {
    let squeezed: String = url
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match scheme_regex().captures(&squeezed) {
        Some(caps) => URL_SCHEMES.contains(&&caps[1]),
        None => true,
    }
}

struct Tag<'a> {
    name: String,
    closing: bool,
    attrs: Vec<(String, &'a str)>,
    len: usize,
}

/// Keep allowed tags; escape everything else so it displays as text.
///
/// Event handler attributes are dropped from allowed tags, as is any link whose
/// URL fails [`is_safe_url`].
pub fn sanitize_fragment(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let candidate = &rest[lt..];
        match parse_tag(candidate) {
            Some(tag) if ALLOWED_TAGS.contains(&tag.name.as_str()) => {
                write_tag(&mut out, &tag);
                rest = &candidate[tag.len..];
            }
            _ => {
                out.push_str("&lt;");
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn write_tag(out: &mut String, tag: &Tag<'_>) {
    if tag.closing {
        if !VOID_TAGS.contains(&tag.name.as_str()) {
            out.push_str("</");
            out.push_str(&tag.name);
            out.push('>');
        }
        return;
    }
    out.push('<');
    out.push_str(&tag.name);
    let mut seen: Vec<&str> = Vec::new();
    for (name, raw) in &tag.attrs {
        // first occurrence wins, as in the browser
        if seen.contains(&name.as_str()) {
            continue;
        }
        seen.push(name);
        let allowed = GLOBAL_ATTRS.contains(&name.as_str())
            || (tag.name == "a" && LINK_ATTRS.contains(&name.as_str()));
        if !allowed {
            log::debug!("dropping attribute '{}' from <{}>", name, tag.name);
            continue;
        }
        let value = decode_entities(raw);
        if name == "href" && !is_safe_url(&value) {
            log::debug!("dropping unsafe href from <{}>", tag.name);
            continue;
        }
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(&value));
        out.push('"');
    }
    out.push('>');
}

fn is_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

/// Parse one start or end tag at the beginning of `src`.
///
/// `/` separates attributes just like whitespace, and a `>` inside a quoted value
/// does not end the tag. Returns `None` when `src` does not open a tag or the tag
/// never closes.
fn parse_tag(src: &str) -> Option<Tag<'_>> {
    let bytes = src.as_bytes();
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    let start = i;
    while i < bytes.len() && !is_name_end(bytes[i]) {
        i += 1;
    }
    let name = src[start..i].to_ascii_lowercase();
    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if *bytes.get(i)? == b'>' {
            return Some(Tag {
                name,
                closing,
                attrs,
                len: i + 1,
            });
        }
        let name_start = i;
        // a leading '=' belongs to the name
        i += 1;
        while i < bytes.len() && !is_name_end(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let attr_name = src[name_start..i].to_ascii_lowercase();
        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = "";
        if bytes.get(j) == Some(&b'=') {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match *bytes.get(j)? {
                quote @ (b'"' | b'\'') => {
                    let open = j + 1;
                    let close = open + src[open..].find(quote as char)?;
                    value = &src[open..close];
                    i = close + 1;
                }
                _ => {
                    let open = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = &src[open..j];
                    i = j;
                }
            }
        }
        attrs.push((attr_name, value));
    }
}

fn decode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_entity(&tail[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_markup() {
        let src = "<p class=\"lead\">Hello <strong>world</strong><br/></p>";
        assert_eq!(
            sanitize_fragment(src),
            "<p class=\"lead\">Hello <strong>world</strong><br></p>"
        );
    }

    #[test]
    fn escapes_scripts() {
        let out = sanitize_fragment("<p>a</p><script>alert(1)</script>");
        assert!(!out.contains("<script"));
        assert!(out.contains("&lt;script>alert(1)&lt;/script>"));
    }

    #[test]
    fn drops_handlers_and_script_urls() {
        assert_eq!(sanitize_fragment("<p onclick=\"x()\">a</p>"), "<p>a</p>");
        assert_eq!(
            sanitize_fragment("<a href=\"javascript:alert(1)\">x</a>"),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize_fragment("<a href=\"/ok\" target=_blank>x</a>"),
            "<a href=\"/ok\" target=\"_blank\">x</a>"
        );
    }

    #[test]
    fn slash_separated_handler_is_dropped() {
        let out = sanitize_fragment("<p/onclick=\"alert(1)\">x</p>");
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn quoted_gt_does_not_end_the_tag() {
        let out = sanitize_fragment("<a title=\">\" onclick=\"alert(1)\">x</a>");
        assert_eq!(out, "<a title=\"&gt;\">x</a>");
        assert!(!out.contains("onclick"));
    }

    #[test]
    fn obfuscated_script_urls_are_dropped() {
        for href in [
            "java\tscript:alert(1)",
            "java\nscript:alert(1)",
            " JavaScript:alert(1)",
            "&#106;avascript:alert(1)",
            "&#x6A;avascript:alert(1)",
            "vbscript:msgbox(1)",
            "data:text/html,<script>alert(1)</script>",
        ] {
            let out = sanitize_fragment(&format!("<a href=\"{}\">x</a>", href));
            assert!(out.starts_with("<a>x</a>"), "{:?} gave {}", href, out);
        }
    }

    #[test]
    fn entities_in_values_are_not_double_escaped() {
        assert_eq!(
            sanitize_fragment("<a href=\"/s?a=1&amp;b=2\">x</a>"),
            "<a href=\"/s?a=1&amp;b=2\">x</a>"
        );
    }

    #[test]
    fn url_schemes() {
        assert!(is_safe_url("https://example.com"));
        assert!(is_safe_url("mailto:hi@example.com"));
        assert!(is_safe_url("#top"));
        assert!(is_safe_url("/about"));
        assert!(is_safe_url("docs/a:b"));
        assert!(!is_safe_url("java\tscript:alert(1)"));
        assert!(!is_safe_url("\u{1}javascript:alert(1)"));
        assert!(!is_safe_url("data:image/svg+xml,<svg/onload=alert(1)>"));
    }

    #[test]
    fn unterminated_tag_is_escaped() {
        assert_eq!(sanitize_fragment("a <b"), "a &lt;b");
        assert_eq!(sanitize_fragment("<a title=\"x>y"), "&lt;a title=\"x>y");
    }
}

//! Conversion of documents into standalone html emails.
//!
//! Rendering is a pure function of the document: the same document always
//! yields byte-identical output. Every interpolated value is html-escaped
//! and link targets go through a scheme allowlist, so template content is
//! safe to render no matter where it came from.

use askama::Template;
use url::Url;

use crate::email::block::{Block, Content, Styles};
use crate::email::document::Document;
use crate::Result;

/// Height used for spacers whose height isn't a valid css length.
pub const DEFAULT_SPACER_HEIGHT: &str = "20px";

const LENGTH_UNITS: [&str; 6] = ["px", "rem", "em", "%", "pt", "vh"];

#[derive(Template)]
#[template(path = "email/shell.html")]
struct Shell<'a> {
    subject: &'a str,
    body: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<h1 style="text-align:center;margin:0 0 16px;{{ style }}">{{ text }}</h1>"#,
    ext = "html"
)]
struct HeaderFragment<'a> {
    text: &'a str,
    style: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<p style="margin:0 0 16px;line-height:1.6;{{ style }}">{{ text }}</p>"#,
    ext = "html"
)]
struct TextFragment<'a> {
    text: &'a str,
    style: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div style="text-align:center;margin:24px 0;"><a class="button" href="{{ url }}" style="{{ style }}">{{ text }}</a></div>"#,
    ext = "html"
)]
struct ButtonFragment<'a> {
    text: &'a str,
    url: &'a str,
    style: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div style="text-align:center;margin:16px 0;"><img src="{{ url }}" alt="{{ alt }}" style="max-width:100%;height:auto;{{ style }}"></div>"#,
    ext = "html"
)]
struct ImageFragment<'a> {
    url: &'a str,
    alt: &'a str,
    style: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<hr style="border:none;border-top:1px solid #e5e7eb;margin:24px 0;{{ style }}">"#,
    ext = "html"
)]
struct DividerFragment<'a> {
    style: &'a str,
}

#[derive(Template)]
#[template(source = r#"<div style="height:{{ height }};{{ style }}"></div>"#, ext = "html")]
struct SpacerFragment<'a> {
    height: &'a str,
    style: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div class="social-links" style="{{ style }}"><a href="https://www.facebook.com">Facebook</a><a href="https://www.instagram.com">Instagram</a><a href="https://twitter.com">Twitter</a><a href="https://www.youtube.com">YouTube</a></div>"#,
    ext = "html"
)]
struct SocialFragment<'a> {
    style: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div class="discount" style="{{ style }}"><p>{{ description }}</p><p class="discount-code">{{ code }}</p>{% if !expiry.is_empty() %}<p class="discount-expiry">Expires: {{ expiry }}</p>{% endif %}</div>"#,
    ext = "html"
)]
struct DiscountFragment<'a> {
    code: &'a str,
    description: &'a str,
    expiry: &'a str,
    style: &'a str,
}

/// Renders the document into a complete html email.
pub fn render(document: &Document) -> Result<String> {
    let mut fragments = Vec::with_capacity(document.blocks.len());
    for block in &document.blocks {
        if let Some(fragment) = render_block(block)? {
            fragments.push(fragment);
        }
    }
    let body = fragments.join("\n");

    let html = Shell {
        subject: &document.subject,
        body: &body,
    }
    .render()?;
    Ok(html)
}

/// Renders a single block into an html fragment.
///
/// Returns `None` for blocks that produce no output: unknown kinds and
/// images without a usable source.
pub fn render_block(block: &Block) -> Result<Option<String>> {
    let style = inline_style(&block.styles);
    let style = style.as_str();

    let fragment = match &block.content {
        Content::Header(c) => HeaderFragment {
            text: &c.text,
            style,
        }
        .render()?,
        Content::Text(c) => TextFragment {
            text: &c.text,
            style,
        }
        .render()?,
        Content::Button(c) => ButtonFragment {
            text: &c.text,
            url: link_target(&c.url).unwrap_or("#"),
            style,
        }
        .render()?,
        Content::Image(c) => match image_source(&c.url) {
            Some(url) => ImageFragment {
                url,
                alt: &c.alt,
                style,
            }
            .render()?,
            None => return Ok(None),
        },
        Content::Divider => DividerFragment { style }.render()?,
        Content::Spacer(c) => SpacerFragment {
            height: if is_css_length(&c.height) {
                c.height.trim()
            } else {
                DEFAULT_SPACER_HEIGHT
            },
            style,
        }
        .render()?,
        Content::Social => SocialFragment { style }.render()?,
        Content::Discount(c) => DiscountFragment {
            code: &c.code,
            description: &c.description,
            expiry: c.expiry.as_deref().unwrap_or_default(),
            style,
        }
        .render()?,
        Content::Unknown { .. } => return Ok(None),
    };

    Ok(Some(fragment))
}

/// Renders the plain-text alternative of the document, meant to accompany
/// the html part in a multipart message.
pub fn render_text(document: &Document) -> String {
    let mut out = Vec::new();
    for block in &document.blocks {
        match &block.content {
            Content::Header(c) | Content::Text(c) => out.push(c.text.clone()),
            Content::Button(c) => match link_target(&c.url) {
                Some(url) if url != "#" => out.push(format!("{}: {}", c.text, url)),
                _ => out.push(c.text.clone()),
            },
            Content::Divider => out.push("----------".to_string()),
            Content::Discount(c) => {
                let mut line = format!("{} Use code {}", c.description, c.code);
                if let Some(expiry) = &c.expiry {
                    line.push_str(&format!(" (expires {})", expiry));
                }
                out.push(line);
            }
            Content::Image(_) | Content::Spacer(_) | Content::Social | Content::Unknown { .. } => {}
        }
    }
    out.join("\n\n")
}

/// Returns the link target if it's safe to put in an `href`.
///
/// Allowed are absolute `http`, `https`, `mailto` and `tel` urls, in-page
/// fragments and root-relative paths.
pub fn link_target(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.starts_with('#') || is_root_relative(raw) {
        return Some(raw);
    }
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https" | "mailto" | "tel").then_some(raw)
}

/// Path on the same host. Browsers read `\` as `/` and drop tabs and
/// newlines, so `/\host` or `/<tab>/host` would leave the site.
fn is_root_relative(raw: &str) -> bool {
    let mut chars = raw.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !raw.chars().any(|c| c.is_ascii_control())
}

/// Returns the image source if it's an absolute `http` or `https` url.
pub fn image_source(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(raw)
}

/// Checks for a plain css length like `20px` or `1.5em`.
pub fn is_css_length(raw: &str) -> bool {
    let raw = raw.trim();
    let Some(unit) = LENGTH_UNITS.iter().find(|unit| raw.ends_with(**unit)) else {
        return false;
    };
    let number = &raw[..raw.len() - unit.len()];
    !number.is_empty()
        && number.chars().filter(|c| *c == '.').count() <= 1
        && number.chars().all(|c| c.is_ascii_digit() || c == '.')
        && number.chars().any(|c| c.is_ascii_digit())
}

/// Turns style overrides into inline css declarations.
///
/// Declarations that could break out of the attribute's css context are
/// dropped.
pub fn inline_style(styles: &Styles) -> String {
    styles
        .iter()
        .filter(|(property, value)| {
            !property.is_empty()
                && property
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !value.trim().is_empty()
                && !value.contains(&[';', '{', '}'][..])
        })
        .map(|(property, value)| format!("{}:{};", property, value.trim()))
        .collect()
}

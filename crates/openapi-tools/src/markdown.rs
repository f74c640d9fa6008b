//! Best-effort HTML → Markdown for operation and parameter descriptions.
//!
//! API descriptions exported from doc generators often contain inline HTML. Only the tags such
//! descriptions actually use are translated; every other tag is stripped and entities are
//! decoded. Conversion never fails outward: if the rules cannot be built the input is returned
//! untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

struct Converter {
    tag: Regex,
    link: Regex,
    heading: Regex,
    line_break: Regex,
    paragraph: Regex,
    list_item: Regex,
    list: Regex,
    strong: Regex,
    emphasis: Regex,
    code: Regex,
    pre: Regex,
    any_tag: Regex,
    blank_lines: Regex,
}

impl Converter {
    fn build() -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(\s[^<>]*)?/?>")?,
            link: Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)?,
            heading: Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>")?,
            line_break: Regex::new(r"(?i)<br\s*/?>")?,
            paragraph: Regex::new(r"(?i)</?p(\s[^>]*)?>")?,
            list_item: Regex::new(r"(?i)<li(\s[^>]*)?>")?,
            list: Regex::new(r"(?i)</?(ul|ol)(\s[^>]*)?>")?,
            strong: Regex::new(r"(?i)</?(strong|b)(\s[^>]*)?>")?,
            emphasis: Regex::new(r"(?i)</?(em|i)(\s[^>]*)?>")?,
            code: Regex::new(r"(?i)</?code(\s[^>]*)?>")?,
            pre: Regex::new(r"(?i)</?pre(\s[^>]*)?>")?,
            any_tag: Regex::new(r"</?[A-Za-z][^<>]*>")?,
            blank_lines: Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+")?,
        })
    }

    fn convert(&self, html: &str) -> String {
        // `pre` goes first so the `code` rule below does not double-fence it.
        let text = self.pre.replace_all(html, "\n```\n");
        let text = self.link.replace_all(&text, "[$2]($1)");
        let text = self.heading.replace_all(&text, |caps: &Captures<'_>| {
            let level = caps[1].parse::<usize>().unwrap_or(1);
            format!("\n\n{} {}\n\n", "#".repeat(level), caps[2].trim())
        });
        let text = self.line_break.replace_all(&text, "\n");
        let text = self.paragraph.replace_all(&text, "\n\n");
        let text = self.list_item.replace_all(&text, "\n- ");
        let text = self.list.replace_all(&text, "\n");
        let text = self.strong.replace_all(&text, "**");
        let text = self.emphasis.replace_all(&text, "_");
        let text = self.code.replace_all(&text, "`");
        let text = self.any_tag.replace_all(&text, "");
        let text = decode_entities(&text);
        let text = self.blank_lines.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

fn converter() -> Option<&'static Converter> {
    static CONVERTER: OnceLock<Option<Converter>> = OnceLock::new();
    CONVERTER
        .get_or_init(|| match Converter::build() {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(error = %e, "HTML to Markdown conversion disabled");
                None
            }
        })
        .as_ref()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// True when `text` contains something that looks like an HTML tag.
#[must_use]
pub fn looks_like_html(text: &str) -> bool {
    converter().is_some_and(|c| c.tag.is_match(text))
}

/// Convert HTML to Markdown. Returns the input unchanged when conversion is unavailable.
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    match converter() {
        Some(c) => c.convert(html),
        None => html.to_string(),
    }
}

/// Description text as attached to tools and schema fields.
#[must_use]
pub fn normalize_description(text: &str, convert_html: bool) -> String {
    if convert_html && looks_like_html(text) {
        let converted = html_to_markdown(text);
        if converted.is_empty() {
            text.to_string()
        } else {
            converted
        }
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_tags() {
        assert!(looks_like_html("Use <b>this</b>"));
        assert!(looks_like_html("line<br/>break"));
        assert!(!looks_like_html("a < b and c > d"));
        assert!(!looks_like_html("plain text"));
    }

    #[test]
    fn converts_common_inline_markup() {
        let md = html_to_markdown(
            r#"<p>Send a <strong>message</strong> to a <a href="https://example.com/chat">chat</a>.</p><p>Use <code>chat_id</code>.</p>"#,
        );
        assert_eq!(
            md,
            "Send a **message** to a [chat](https://example.com/chat).\n\nUse `chat_id`."
        );
    }

    #[test]
    fn converts_lists_headings_and_entities() {
        let md = html_to_markdown("<h2>Limits</h2><ul><li>a &amp; b</li><li>c</li></ul>");
        assert_eq!(md, "## Limits\n\n- a & b\n- c");
    }

    #[test]
    fn unknown_tags_are_stripped() {
        assert_eq!(html_to_markdown("<span class=\"x\">hi</span>"), "hi");
    }

    #[test]
    fn normalize_respects_toggle_and_plain_text() {
        assert_eq!(normalize_description("<b>x</b>", false), "<b>x</b>");
        assert_eq!(normalize_description("<b>x</b>", true), "**x**");
        assert_eq!(normalize_description("a < b", true), "a < b");
    }
}

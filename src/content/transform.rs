use crate::content::markdown::MarkupConverter;
use crate::feed::parser::{FeedItem, ItemType};
use regex::Regex;
use std::sync::OnceLock;

/// Canonical excerpt marker emitted into final content, regardless of how
/// the source spelled it.
pub const MORE_MARKER: &str = "<!-- more -->";

/// Recognizes "more" markers with extra dashes, any case and stray
/// whitespace: `<!--more-->`, `<!---- MORE ---->`, ...
fn more_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<!-{2,}\s*more\s*-{2,}>").expect("valid regex"))
}

/// Block-editor `<!-- wp:more -->` comments that wrap the real marker.
fn wp_more_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<!--\s*/?wp:more\s*-->").expect("valid regex"))
}

fn blank_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"))
}

/// Converts an item's HTML body (and optional excerpt) into final markdown.
///
/// Non-page items get the excerpt-marker policy: a recognized "more" marker
/// splits the content into teaser and rest, each converted independently and
/// rejoined around the canonical [`MORE_MARKER`]; with no marker but a
/// declared excerpt, the converted excerpt is prepended followed by the
/// marker. Pages are converted as-is.
///
/// The paragraph-preservation pre-pass (posts only, flag-gated) wraps
/// blank-line-separated blocks in `<p>` tags when the source HTML carries no
/// paragraph markup, so the converter does not collapse them into one line.
///
/// Output always uses LF line endings.
pub fn render_content(
    item: &FeedItem,
    converter: &dyn MarkupConverter,
    paragraph_fix: bool,
) -> String {
    let html = prepare_html(&item.content_html);

    let fix = |part: &str| -> String {
        if paragraph_fix && item.item_type == ItemType::Post {
            preserve_paragraphs(part)
        } else {
            part.to_string()
        }
    };
    let convert = |part: &str| -> String { converter.convert(&fix(part)).trim().to_string() };

    let output = if item.item_type == ItemType::Page {
        convert(&html)
    } else if let Some(m) = more_marker_re().find(&html) {
        let teaser = convert(&html[..m.start()]);
        let rest = convert(&html[m.end()..]);
        format!("{teaser}\n{MORE_MARKER}\n{rest}")
    } else if let Some(excerpt) = item.excerpt_html.as_deref() {
        let excerpt_md = convert(&prepare_html(excerpt));
        let content_md = convert(&html);
        format!("{excerpt_md}\n{MORE_MARKER}\n{content_md}")
    } else {
        convert(&html)
    };

    output.replace("\r\n", "\n")
}

/// Pre-conversion cleanup shared by content and excerpt: strip block-editor
/// wp:more comments and space out `{{` so template engines downstream never
/// see an opening expression.
fn prepare_html(html: &str) -> String {
    let stripped = wp_more_re().replace_all(html, "");
    stripped.replace("{{", "{ {")
}

/// Wraps blank-line-separated blocks in `<p>` tags when the HTML has no
/// explicit paragraph markup of its own.
fn preserve_paragraphs(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if lower.contains("<p>") || lower.contains("<p ") {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len() + 32);
    for block in blank_line_re().split(html) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        out.push_str("<p>");
        out.push_str(block);
        out.push_str("</p>");
    }
    out
}

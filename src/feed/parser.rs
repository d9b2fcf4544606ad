use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use thiserror::Error;

/// Maximum allowed element nesting depth.
/// The WXR structure is shallow (rss/channel/item/postmeta/...); anything
/// deeper is hostile or corrupt input.
const MAX_XML_DEPTH: usize = 64;

/// Reserved category identifier that never enters the typed model.
const UNCATEGORIZED: &str = "uncategorized";

/// Errors that can occur while parsing a WXR document.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The document is well-formed XML but not a WordPress export.
    #[error("Unsupported feed format: no WordPress channel metadata found")]
    UnsupportedFormat,

    /// XML parsing failed.
    #[error("Feed parse error: {0}")]
    Parse(String),

    /// Element nesting depth exceeds the safety limit.
    #[error("Feed nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// Whether comments were open or closed on the original post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStatus {
    #[default]
    Open,
    Closed,
}

/// Publication status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    Draft,
    #[default]
    Publish,
    Other,
}

/// WordPress post type of an item.
///
/// Items without a `wp:post_type` element are treated as posts, matching
/// how WordPress itself exports bare items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemType {
    #[default]
    Post,
    Page,
    Attachment,
    Other,
}

/// One entry from the export, constructed once by the parser and immutable
/// thereafter. All optional-field defaulting happens here.
#[derive(Debug, Clone, Default)]
pub struct FeedItem {
    /// Post title. May be empty; the assembler numbers untitled posts.
    pub title: String,
    /// Absolute URL of the original item. Empty when absent.
    pub link: String,
    /// Source-format timestamp, passed through verbatim.
    pub date: String,
    /// WordPress post ID.
    pub id: u64,
    /// `wp:post_name`; may contain percent-encoding, preserved as-is.
    pub slug: String,
    /// Raw HTML body.
    pub content_html: String,
    /// Raw HTML excerpt, when present.
    pub excerpt_html: Option<String>,
    pub comment_status: CommentStatus,
    pub status: ItemStatus,
    pub item_type: ItemType,
    /// Tag names, in document order, deduplicated.
    pub tags: Vec<String>,
    /// Category names referencing [`FeedCategory::name`], in document order,
    /// deduplicated, never containing the reserved "uncategorized" term.
    pub categories: Vec<String>,
    /// `wp:attachment_url`, only meaningful for attachments.
    pub attachment_url: Option<String>,
    /// `wp:postmeta` key/value pairs, only meaningful for attachments.
    pub attachment_meta: HashMap<String, String>,
}

/// A declared taxonomy term with its parent link.
///
/// An empty `parent` marks a root category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCategory {
    pub name: String,
    pub parent: String,
}

/// A parsed WXR feed: ordered items plus the flat category declarations.
#[derive(Debug, Clone, Default)]
pub struct WxrFeed {
    pub items: Vec<FeedItem>,
    pub categories: Vec<FeedCategory>,
}

/// Raw per-item element buffers, folded into a [`FeedItem`] at `</item>`.
#[derive(Default)]
struct ItemDraft {
    title: String,
    link: String,
    pub_date: String,
    wp_post_date: String,
    excerpt_encoded: String,
    description: String,
    post_id: String,
    content: String,
    comment_status: String,
    post_name: String,
    status: String,
    post_type: String,
    attachment_url: String,
    tags: Vec<String>,
    categories: Vec<String>,
    meta: HashMap<String, String>,
}

impl ItemDraft {
    fn finish(self) -> FeedItem {
        let date = if self.wp_post_date.is_empty() {
            self.pub_date
        } else {
            self.wp_post_date
        };
        let excerpt = if !self.excerpt_encoded.is_empty() {
            Some(self.excerpt_encoded)
        } else if !self.description.is_empty() {
            Some(self.description)
        } else {
            None
        };
        let item_type = match self.post_type.as_str() {
            "" | "post" => ItemType::Post,
            "page" => ItemType::Page,
            "attachment" => ItemType::Attachment,
            _ => ItemType::Other,
        };
        let status = match self.status.as_str() {
            "draft" => ItemStatus::Draft,
            "" | "publish" => ItemStatus::Publish,
            _ => ItemStatus::Other,
        };
        let comment_status = if self.comment_status == "closed" {
            CommentStatus::Closed
        } else {
            CommentStatus::Open
        };

        FeedItem {
            title: self.title,
            link: self.link,
            date,
            id: self.post_id.trim().parse().unwrap_or(0),
            slug: self.post_name,
            content_html: self.content,
            excerpt_html: excerpt,
            comment_status,
            status,
            item_type,
            tags: self.tags,
            categories: self.categories,
            attachment_url: if self.attachment_url.is_empty() {
                None
            } else {
                Some(self.attachment_url)
            },
            attachment_meta: self.meta,
        }
    }
}

/// In-progress item `<category>` element: attributes captured at the start
/// tag, text accumulated until the end tag.
struct TermRef {
    domain: String,
    nicename: String,
}

/// Parses WXR bytes into the typed feed model.
///
/// The parser is a single event-loop pass over the document, tracking the
/// element stack to know which buffer each text/CDATA node belongs to.
/// Namespaced element names (`wp:post_id`, `content:encoded`, ...) are
/// matched by their qualified name; no namespace resolution is needed since
/// WXR always uses the standard prefixes.
///
/// # Errors
///
/// - [`FeedError::Parse`] for malformed XML, carrying the parser message
/// - [`FeedError::UnsupportedFormat`] when the document lacks WordPress
///   channel metadata (a channel `<title>` or any `wp:` element)
/// - [`FeedError::MaxDepthExceeded`] for absurdly nested input
pub fn parse_wxr(bytes: &[u8]) -> Result<WxrFeed, FeedError> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_reader(text.as_bytes());

    let mut feed = WxrFeed::default();
    let mut stack: Vec<String> = Vec::new();
    let mut current_text = String::new();

    let mut item: Option<ItemDraft> = None;
    let mut term: Option<TermRef> = None;
    // Channel-level <wp:category> builder: (name, parent)
    let mut channel_cat: Option<(String, String)> = None;
    // Current <wp:postmeta> pair
    let mut meta_pair: Option<(String, String)> = None;

    let mut saw_wp_marker = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.push(name.clone());
                if stack.len() > MAX_XML_DEPTH {
                    return Err(FeedError::MaxDepthExceeded(MAX_XML_DEPTH));
                }
                current_text.clear();

                if name.starts_with("wp:") {
                    saw_wp_marker = true;
                }

                match name.as_str() {
                    "item" => item = Some(ItemDraft::default()),
                    "category" if item.is_some() => {
                        term = Some(read_term_attributes(&e, &reader));
                    }
                    "wp:category" if item.is_none() => {
                        channel_cat = Some((String::new(), String::new()));
                    }
                    "wp:postmeta" => meta_pair = Some((String::new(), String::new())),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name.starts_with("wp:") {
                    saw_wp_marker = true;
                }
                // Self-closing elements carry no text; nothing to record.
            }
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(t) => current_text.push_str(&t),
                Err(err) => {
                    // Unknown entities (&nbsp; and friends) outside CDATA:
                    // keep the raw text rather than failing the whole feed.
                    tracing::warn!(error = %err, "Unescapable text node, keeping raw bytes");
                    current_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            },
            Ok(Event::CData(e)) => {
                current_text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                match name.as_str() {
                    "item" => {
                        if let Some(draft) = item.take() {
                            feed.items.push(draft.finish());
                        }
                    }
                    "category" => {
                        if let (Some(t), Some(draft)) = (term.take(), item.as_mut()) {
                            record_term(draft, t, current_text.trim());
                        }
                    }
                    "wp:category" => {
                        if let Some((cat_name, parent)) = channel_cat.take() {
                            if !cat_name.is_empty() {
                                feed.categories.push(FeedCategory {
                                    name: cat_name,
                                    parent,
                                });
                            }
                        }
                    }
                    "wp:cat_name" => {
                        if let Some((cat_name, _)) = channel_cat.as_mut() {
                            *cat_name = current_text.trim().to_string();
                        }
                    }
                    "wp:category_parent" => {
                        if let Some((_, parent)) = channel_cat.as_mut() {
                            *parent = current_text.trim().to_string();
                        }
                    }
                    "wp:postmeta" => {
                        if let (Some((key, value)), Some(draft)) = (meta_pair.take(), item.as_mut())
                        {
                            if !key.is_empty() {
                                draft.meta.insert(key, value);
                            }
                        }
                    }
                    "wp:meta_key" => {
                        if let Some((key, _)) = meta_pair.as_mut() {
                            *key = current_text.trim().to_string();
                        }
                    }
                    "wp:meta_value" => {
                        if let Some((_, value)) = meta_pair.as_mut() {
                            *value = current_text.trim().to_string();
                        }
                    }
                    _ => {
                        if let Some(draft) = item.as_mut() {
                            record_item_field(draft, &name, &current_text);
                        }
                    }
                }

                current_text.clear();
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    // Detection mirrors the reference system's loose probe: any wp:
    // metadata, or at least an RSS channel carrying a title.
    if !saw_wp_marker && !has_channel_title(&text) {
        return Err(FeedError::UnsupportedFormat);
    }

    Ok(feed)
}

/// Checks for an `rss > channel > title` element without a second full pass
/// over the item contents.
fn has_channel_title(text: &str) -> bool {
    let mut reader = Reader::from_reader(text.as_bytes());
    let mut stack: Vec<String> = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.push(name);
                if stack.len() == 3 && stack[0] == "rss" && stack[1] == "channel" {
                    if stack[2] == "title" {
                        return true;
                    }
                    // The channel preamble precedes the items; stop there.
                    if stack[2] == "item" {
                        return false;
                    }
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
        buf.clear();
    }
}

/// Extracts `domain` and `nicename` attributes from an item category element.
fn read_term_attributes(e: &quick_xml::events::BytesStart<'_>, reader: &Reader<&[u8]>) -> TermRef {
    let mut domain = String::new();
    let mut nicename = String::new();
    let decoder = reader.decoder();

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed category attribute");
                continue;
            }
        };
        match attr.key.as_ref() {
            b"domain" => {
                if let Ok(v) = attr.decode_and_unescape_value(decoder) {
                    domain = v.to_string();
                }
            }
            b"nicename" => {
                if let Ok(v) = attr.decode_and_unescape_value(decoder) {
                    nicename = v.to_string();
                }
            }
            _ => {}
        }
    }

    TermRef { domain, nicename }
}

/// Partitions a taxonomy-term reference into the item's tags or categories.
fn record_term(draft: &mut ItemDraft, term: TermRef, name: &str) {
    if name.is_empty() {
        return;
    }
    match term.domain.as_str() {
        "post_tag" => {
            if !draft.tags.iter().any(|t| t == name) {
                draft.tags.push(name.to_string());
            }
        }
        "category" => {
            if term.nicename == UNCATEGORIZED {
                return;
            }
            if !draft.categories.iter().any(|c| c == name) {
                draft.categories.push(name.to_string());
            }
        }
        _ => {}
    }
}

/// Routes a closed leaf element's text into the matching draft buffer.
fn record_item_field(draft: &mut ItemDraft, name: &str, text: &str) {
    let field = match name {
        "title" => &mut draft.title,
        "link" => &mut draft.link,
        "pubDate" => &mut draft.pub_date,
        "wp:post_date" => &mut draft.wp_post_date,
        "excerpt:encoded" => &mut draft.excerpt_encoded,
        "description" => &mut draft.description,
        "wp:post_id" => &mut draft.post_id,
        "content:encoded" => &mut draft.content,
        "wp:comment_status" => &mut draft.comment_status,
        "wp:post_name" => &mut draft.post_name,
        "wp:status" => &mut draft.status,
        "wp:post_type" => &mut draft.post_type,
        "wp:attachment_url" => &mut draft.attachment_url,
        _ => return,
    };

    // Content bodies keep their whitespace; scalar fields are trimmed.
    match name {
        "content:encoded" | "excerpt:encoded" | "description" => field.push_str(text),
        _ => field.push_str(text.trim()),
    }
}

use crate::feed::parser::{FeedItem, ItemType};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// File extensions accepted for import, compared case-insensitively.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Meta key WordPress uses for an attachment's upload-relative file path.
const ATTACHED_FILE_KEY: &str = "_wp_attached_file";

/// Errors for a single image fetch. Always recoverable: the importer logs
/// and skips, never aborting the run.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error fetching {url}: status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image-import mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportImages {
    /// Feature disabled; attachments are ignored entirely.
    #[default]
    Disabled,
    /// Import originals and any resized derivatives the content references.
    All,
    /// Import originals only; derivative references are rewritten to the
    /// original's local path.
    OriginalOnly,
}

/// One resolved mapping from a remote image to its stored local copy.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Exact URL the entry was stored under (the declared attachment URL).
    pub remote_url: String,
    /// On-disk destination the bytes were written to.
    pub local_path: PathBuf,
    /// The string spliced into rewritten markdown links: a root-relative
    /// path in the flat layout, a bare filename in the bundle layout.
    pub link_target: String,
    /// Slug of the owning post, set only in the per-post bundle layout.
    pub bundle_slug: Option<String>,
}

/// Fetches attachment images, stores them locally and rewrites content
/// references — including WordPress's `-WIDTHxHEIGHT` resized-derivative
/// filename convention.
///
/// Lifecycle within a run: [`import_all`](Self::import_all) populates the
/// index (write-once per attachment URL), then
/// [`rewrite_images`](Self::rewrite_images) is called per post. Derivative
/// fetches triggered during rewriting are deduplicated across posts.
pub struct ImageImporter {
    client: reqwest::Client,
    source_dir: PathBuf,
    mode: ImportImages,
    bundle_layout: bool,
    index: HashMap<String, ImageAsset>,
    /// Derivative remote URL → link target, for fetch deduplication.
    derivatives: HashMap<String, String>,
    imported: usize,
}

impl ImageImporter {
    pub fn new(
        client: reqwest::Client,
        source_dir: impl Into<PathBuf>,
        mode: ImportImages,
        bundle_layout: bool,
    ) -> Self {
        Self {
            client,
            source_dir: source_dir.into(),
            mode,
            bundle_layout,
            index: HashMap::new(),
            derivatives: HashMap::new(),
            imported: 0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.mode != ImportImages::Disabled
    }

    /// Number of attachment originals successfully imported.
    pub fn imported_count(&self) -> usize {
        self.imported
    }

    /// Runs the import pass over every attachment item. Failures are logged
    /// per item and never abort the pass.
    pub async fn import_all(&mut self, items: &[FeedItem]) {
        if !self.enabled() {
            return;
        }
        for item in items {
            if item.item_type == ItemType::Attachment {
                self.import_one(item).await;
            }
        }
    }

    async fn import_one(&mut self, item: &FeedItem) {
        let url = match item.attachment_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => {
                tracing::warn!(title = %item.title, "\"{}\" image not found", item.title);
                return;
            }
        };

        let filename = match url_filename(url) {
            Some(name) => name,
            None => {
                tracing::warn!(url = %url, "Attachment URL has no filename, skipping");
                return;
            }
        };

        if !has_image_extension(&filename) {
            tracing::debug!(url = %url, "Attachment is not an importable image, skipping");
            return;
        }

        let rel_path = match item.attachment_meta.get(ATTACHED_FILE_KEY) {
            Some(path) if !path.is_empty() => path.trim_start_matches('/').to_string(),
            _ => {
                tracing::warn!(
                    url = %url,
                    "Image found but without a valid path. Using {}",
                    filename
                );
                filename.clone()
            }
        };

        let (local_path, link_target, bundle_slug) = if self.bundle_layout {
            let slug = bundle_slug_for(item);
            let basename = rel_path.rsplit('/').next().unwrap_or(&rel_path).to_string();
            if slug.is_empty() {
                tracing::warn!(url = %url, "Cannot derive a post bundle for attachment, skipping");
                return;
            }
            (
                self.source_dir.join("_posts").join(&slug).join(&basename),
                basename,
                Some(slug),
            )
        } else {
            (
                self.source_dir.join(&rel_path),
                format!("/{rel_path}"),
                None,
            )
        };

        match self.fetch_and_store(url, &local_path).await {
            Ok(()) => {
                tracing::info!("Image found: {}", rel_path);
                // Write-once per key: the first declaration wins.
                self.index.entry(url.to_string()).or_insert(ImageAsset {
                    remote_url: url.to_string(),
                    local_path,
                    link_target,
                    bundle_slug,
                });
                self.imported += 1;
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to import image");
            }
        }
    }

    async fn fetch_and_store(&self, url: &str, dest: &Path) -> Result<(), ImageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, &bytes)?;
        Ok(())
    }

    /// Rewrites every imported image reference in a converted markdown body
    /// to its local path.
    ///
    /// A referenced filename carrying a `-WIDTHxHEIGHT` suffix is resolved
    /// through the canonical original URL; the derivative's own bytes are
    /// fetched and stored beside the original (unless running in
    /// original-only mode). Only the URL substring inside the image syntax
    /// is replaced — caption text, including parenthesized prose later on
    /// the same line, is never touched.
    pub async fn rewrite_images(&mut self, content: &str) -> String {
        if !self.enabled() || self.index.is_empty() {
            return content.to_string();
        }

        let mut out = String::with_capacity(content.len());
        let mut last = 0;

        for caps in image_link_re().captures_iter(content) {
            let url_match = match caps.name("url") {
                Some(m) => m,
                None => continue,
            };
            let url = url_match.as_str();
            let canonical = strip_resize_suffix(url);

            let asset = match self.index.get(canonical.as_ref()) {
                Some(asset) => asset.clone(),
                None => continue,
            };

            let target = if url == canonical || self.mode == ImportImages::OriginalOnly {
                Some(asset.link_target.clone())
            } else {
                self.derivative_target(url, &asset).await
            };

            if let Some(target) = target {
                out.push_str(&content[last..url_match.start()]);
                out.push_str(&target);
                last = url_match.end();
            }
        }

        out.push_str(&content[last..]);
        out
    }

    /// Resolves (fetching if needed) the local link target for a resized
    /// derivative. Returns `None` when the fetch fails; the reference is
    /// then left pointing at the remote URL.
    async fn derivative_target(&mut self, url: &str, original: &ImageAsset) -> Option<String> {
        if let Some(target) = self.derivatives.get(url) {
            return Some(target.clone());
        }

        let filename = url_filename(url)?;
        let local_path = original.local_path.with_file_name(&filename);
        let link_target = match original.link_target.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => format!("{dir}/{filename}"),
            _ => filename.clone(),
        };

        match self.fetch_and_store(url, &local_path).await {
            Ok(()) => {
                self.derivatives.insert(url.to_string(), link_target.clone());
                Some(link_target)
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to import resized image");
                None
            }
        }
    }
}

/// Markdown image syntax; the `url` group is the only span ever replaced.
fn image_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"!\[[^\]]*\]\(\s*(?P<url>[^)\s]+)(?:\s+"[^"]*")?\s*\)"#).expect("valid regex")
    })
}

fn resize_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<stem>.+)-\d+x\d+(?P<ext>\.[A-Za-z0-9]+)$").expect("valid regex"))
}

/// Strips a trailing `-WIDTHxHEIGHT` suffix from the filename portion of a
/// URL, recovering the canonical original URL.
fn strip_resize_suffix(url: &str) -> std::borrow::Cow<'_, str> {
    let (dir, filename) = match url.rsplit_once('/') {
        Some((dir, filename)) => (Some(dir), filename),
        None => (None, url),
    };

    match resize_suffix_re().captures(filename) {
        Some(caps) => {
            let original = format!("{}{}", &caps["stem"], &caps["ext"]);
            match dir {
                Some(dir) => std::borrow::Cow::Owned(format!("{dir}/{original}")),
                None => std::borrow::Cow::Owned(original),
            }
        }
        None => std::borrow::Cow::Borrowed(url),
    }
}

/// Last path segment of a URL, ignoring query and fragment.
fn url_filename(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.trim_end_matches('/').rsplit('/').next()?;
    if name.is_empty() || name.contains(':') {
        None
    } else {
        Some(name.to_string())
    }
}

fn has_image_extension(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|ok| ok.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Derives the owning post's slug for the bundle layout: the parent path
/// segment of the attachment's link, with the attachment's own slug segment
/// stripped.
fn bundle_slug_for(item: &FeedItem) -> String {
    if let Ok(url) = url::Url::parse(&item.link) {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() >= 2 {
            return segments[segments.len() - 2].to_string();
        }
    }
    String::new()
}

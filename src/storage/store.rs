use crate::storage::front_matter;
use crate::storage::types::{Layout, PostRecord, StoreError};
use crate::util::{percent_decode, slugify};
use std::fs;
use std::path::{Path, PathBuf};

/// The persistence collaborator: turns an assembled record into a stored
/// file, and can enumerate what is already stored for duplicate detection.
pub trait PostStore {
    /// Persists one record, returning the path it was written to.
    fn create(&self, record: &PostRecord) -> Result<PathBuf, StoreError>;

    /// Normalized identifiers of already-stored posts, derived by running
    /// existing `_posts` filenames through the same slugification used for
    /// new titles.
    fn existing_post_slugs(&self) -> Result<Vec<String>, StoreError>;
}

/// File-based store writing markdown documents under a content source
/// directory: posts in `_posts/`, drafts in `_drafts/`, pages at the root.
pub struct FileStore {
    source_dir: PathBuf,
}

impl FileStore {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    /// Root directory this store writes under.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Derives the filename stem: the percent-decoded slug when one exists,
    /// otherwise the slugified title.
    fn file_stem(&self, record: &PostRecord) -> Result<String, StoreError> {
        if let Some(slug) = record.slug.as_deref() {
            if !slug.is_empty() {
                return Ok(percent_decode(slug).into_owned());
            }
        }
        let stem = slugify(&record.title);
        if stem.is_empty() {
            return Err(StoreError::UnnamableRecord(record.id));
        }
        Ok(stem)
    }

    fn layout_dir(&self, layout: Layout) -> PathBuf {
        match layout {
            Layout::Post => self.source_dir.join("_posts"),
            Layout::Draft => self.source_dir.join("_drafts"),
            Layout::Page => self.source_dir.clone(),
        }
    }
}

impl PostStore for FileStore {
    fn create(&self, record: &PostRecord) -> Result<PathBuf, StoreError> {
        let dir = self.layout_dir(record.layout);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.md", self.file_stem(record)?));
        let mut document = front_matter::render(record);
        document.push('\n');
        document.push_str(&record.content);
        if !document.ends_with('\n') {
            document.push('\n');
        }

        fs::write(&path, document)?;
        tracing::debug!(path = %path.display(), "Wrote record");
        Ok(path)
    }

    fn existing_post_slugs(&self) -> Result<Vec<String>, StoreError> {
        let posts_dir = self.source_dir.join("_posts");
        if !posts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut slugs = Vec::new();
        collect_file_stems(&posts_dir, &mut slugs)?;
        Ok(slugs.into_iter().map(|s| slugify(&s)).collect())
    }
}

/// Recursively gathers file stems under a directory. Per-post asset
/// subdirectories are traversed so their parent post is still seen, but
/// only regular files contribute stems.
fn collect_file_stems(dir: &Path, out: &mut Vec<String>) -> Result<(), StoreError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_file_stems(&path, out)?;
        } else if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            out.push(stem.to_string());
        }
    }
    Ok(())
}

//! The migration run: feed acquisition, per-item assembly and persistence.
//!
//! Feed-level failures (unreachable source, unparseable document) abort the
//! run before any output is written. Everything after that point — image
//! fetches, category cycles, individual write failures — is recoverable:
//! logged, counted and skipped, so one bad item never sinks the rest.

use crate::assets::{ImageImporter, ImportImages};
use crate::content::{render_content, MarkupConverter};
use crate::feed::{load_source, parse_wxr, CategoryResolver, FeedError, SourceError};
use crate::feed::{CommentStatus, FeedItem, ItemStatus, ItemType};
use crate::storage::{Layout, PostRecord, PostStore};
use crate::util::slugify;
use thiserror::Error;

/// Fatal errors: no partial output is attempted when these occur.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Options for one migration run, merged from CLI flags and config.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Local path or http(s) URL of the WXR document.
    pub source: String,
    /// Maximum number of post-type items to accept. Zero means no limit;
    /// invalid CLI values are normalized to zero before this point.
    pub limit: usize,
    /// Derive an alias path from each item's original link.
    pub alias: bool,
    /// Skip items whose normalized title matches an already-stored post.
    pub skip_duplicate: bool,
    pub import_images: ImportImages,
    /// Wrap paragraph-less post HTML before conversion.
    pub paragraph_fix: bool,
    /// Category applied to posts that have none.
    pub default_category: String,
    /// Store images in per-post bundles rather than the flat layout.
    pub post_asset_folder: bool,
    /// Content root; images land under this directory.
    pub source_dir: String,
}

/// Aggregate counts reported at the end of every run, even when some items
/// failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Records successfully persisted.
    pub migrated: usize,
    /// Attachment originals imported.
    pub images: usize,
    /// Records whose persistence failed.
    pub failed: usize,
    /// Items skipped by the duplicate policy.
    pub skipped: usize,
    /// Items that needed a synthetic title.
    pub untitled: usize,
}

/// Runs a complete migration: load, parse, import images, assemble and
/// persist each eligible item in feed order.
pub async fn run(
    client: &reqwest::Client,
    store: &dyn PostStore,
    converter: &dyn MarkupConverter,
    options: &MigrationOptions,
) -> Result<MigrationSummary, MigrateError> {
    tracing::info!(source = %options.source, "Analyzing source");
    let bytes = load_source(client, &options.source).await?;
    let feed = parse_wxr(&bytes)?;

    let mut resolver = CategoryResolver::new(&feed.categories);

    // The index must be fully populated before any content rewriting.
    let mut importer = ImageImporter::new(
        client.clone(),
        &options.source_dir,
        options.import_images,
        options.post_asset_folder,
    );
    importer.import_all(&feed.items).await;

    let existing = existing_slugs(store, options.skip_duplicate);
    let limit = effective_limit(options.limit, &feed.items);

    let mut summary = MigrationSummary::default();
    let mut posts_taken = 0usize;

    for item in &feed.items {
        match item.item_type {
            ItemType::Post | ItemType::Page => {}
            // Attachments were handled by the import pass; anything else
            // (menus, custom types) is not modeled.
            _ => continue,
        }

        if item.item_type == ItemType::Post {
            if posts_taken >= limit {
                continue;
            }
            posts_taken += 1;
        }

        let title = if item.title.is_empty() {
            summary.untitled += 1;
            let synthetic = format!("Untitled Post - {}", summary.untitled);
            tracing::warn!("Post found but without any titles. Using {}", synthetic);
            synthetic
        } else {
            tracing::info!("Post found: {}", item.title);
            item.title.clone()
        };

        if options.skip_duplicate && existing.contains(&slugify(&title)) {
            summary.skipped += 1;
            tracing::info!(title = %title, "Skipping duplicate of an existing post");
            continue;
        }

        let markdown = render_content(item, converter, options.paragraph_fix);
        let content = importer.rewrite_images(&markdown).await;

        let record = assemble_record(item, title, content, &mut resolver, options);
        match store.create(&record) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Record persisted");
                summary.migrated += 1;
            }
            Err(e) => {
                tracing::error!(title = %record.title, error = %e, "Failed to persist record");
                summary.failed += 1;
            }
        }
    }

    summary.images = importer.imported_count();
    report(&summary);
    Ok(summary)
}

/// Shapes one feed item into the normalized output record.
fn assemble_record(
    item: &FeedItem,
    title: String,
    content: String,
    resolver: &mut CategoryResolver,
    options: &MigrationOptions,
) -> PostRecord {
    let layout = match (item.item_type, item.status) {
        (ItemType::Page, _) => Layout::Page,
        (_, ItemStatus::Draft) => Layout::Draft,
        _ => Layout::Post,
    };

    let (tags, categories) = if item.item_type == ItemType::Post {
        let mut paths = resolver.paths_for(&item.categories);
        if paths.is_empty() {
            paths = vec![vec![options.default_category.clone()]];
        }
        (item.tags.clone(), paths)
    } else {
        (Vec::new(), Vec::new())
    };

    let alias = if options.alias && !item.link.is_empty() {
        url::Url::parse(&item.link)
            .ok()
            .map(|u| u.path().to_string())
    } else {
        None
    };

    PostRecord {
        title,
        id: item.id,
        date: item.date.clone(),
        content,
        layout,
        slug: (!item.slug.is_empty()).then(|| item.slug.clone()),
        tags,
        categories,
        comments: (item.comment_status == CommentStatus::Closed).then_some(false),
        alias,
    }
}

/// A limit is only a limit when it is positive and smaller than the number
/// of post-type items available.
fn effective_limit(limit: usize, items: &[FeedItem]) -> usize {
    let post_count = items
        .iter()
        .filter(|i| i.item_type == ItemType::Post)
        .count();
    if limit == 0 || limit > post_count {
        post_count
    } else {
        limit
    }
}

/// Lists already-stored post identifiers for the duplicate policy. A
/// listing failure degrades to "nothing stored" rather than aborting.
fn existing_slugs(store: &dyn PostStore, enabled: bool) -> Vec<String> {
    if !enabled {
        return Vec::new();
    }
    match store.existing_post_slugs() {
        Ok(slugs) => slugs,
        Err(e) => {
            tracing::warn!(error = %e, "Could not list existing posts, duplicate check disabled");
            Vec::new()
        }
    }
}

fn report(summary: &MigrationSummary) {
    if summary.untitled > 0 {
        tracing::warn!(
            "{} posts did not have titles and were prefixed with \"Untitled Post\".",
            summary.untitled
        );
    }
    if summary.migrated > 0 {
        tracing::info!("{} posts migrated.", summary.migrated);
    }
    if summary.images > 0 {
        tracing::info!("{} images migrated.", summary.images);
    }
    if summary.failed > 0 {
        tracing::error!("{} posts failed to migrate.", summary.failed);
    }
    if summary.skipped > 0 {
        tracing::info!("{} posts skipped.", summary.skipped);
    }
}

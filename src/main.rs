use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use wxr_migrate::assets::ImportImages;
use wxr_migrate::content::Html2md;
use wxr_migrate::storage::FileStore;
use wxr_migrate::{migrator, Config, MigrationOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImageMode {
    /// Import originals and every resized derivative referenced in content
    All,
    /// Import originals only; derivative links are rewritten to them
    Original,
}

#[derive(Parser, Debug)]
#[command(
    name = "wxr-migrate",
    about = "Migrate a WordPress export (WXR) to markdown source files"
)]
struct Args {
    /// Path or URL of the WordPress export file
    source: String,

    /// Maximum number of posts to import (pages are always imported)
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Add an alias of each post's original URL path to its front-matter
    #[arg(long)]
    alias: bool,

    /// Skip posts whose title matches an already existing post
    #[arg(long)]
    skip_duplicate: bool,

    /// Import attachment images and rewrite content links to them
    #[arg(
        long = "import-image",
        value_enum,
        value_name = "MODE",
        num_args = 0..=1,
        default_missing_value = "all"
    )]
    import_image: Option<ImageMode>,

    /// Wrap paragraph-less post content in <p> tags before conversion
    #[arg(long)]
    paragraph_fix: bool,

    /// Category for posts that have none (overrides the config file)
    #[arg(long, value_name = "NAME")]
    default_category: Option<String>,

    /// Config file path
    #[arg(long, value_name = "FILE", default_value = "migrate.toml")]
    config: PathBuf,

    /// Destination content directory (overrides the config file)
    #[arg(long, value_name = "DIR")]
    dest: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load config file")?;

    let options = MigrationOptions {
        source: args.source,
        limit: args.limit.unwrap_or(0),
        alias: args.alias,
        skip_duplicate: args.skip_duplicate,
        import_images: match args.import_image {
            None => ImportImages::Disabled,
            Some(ImageMode::All) => ImportImages::All,
            Some(ImageMode::Original) => ImportImages::OriginalOnly,
        },
        paragraph_fix: args.paragraph_fix,
        default_category: args
            .default_category
            .unwrap_or(config.default_category),
        post_asset_folder: config.post_asset_folder,
        source_dir: args.dest.unwrap_or(config.source_dir),
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let store = FileStore::new(&options.source_dir);

    let summary = migrator::run(&client, &store, &Html2md, &options)
        .await
        .context("Migration failed")?;

    println!(
        "Migration complete: {} migrated, {} images, {} skipped, {} failed.",
        summary.migrated, summary.images, summary.skipped, summary.failed
    );
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

//! End-to-end migration tests: a WXR document goes in, markdown files with
//! front matter come out.
//!
//! Each test runs against its own temporary directory; remote-source tests
//! serve the export (and images) from a wiremock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxr_migrate::assets::ImportImages;
use wxr_migrate::content::Html2md;
use wxr_migrate::storage::FileStore;
use wxr_migrate::{migrator, MigrateError, MigrationOptions};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn wxr(channel_body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<rss version="2.0"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:excerpt="http://wordpress.org/export/1.2/excerpt/"
    xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
    <title>Test Blog</title>
    <wp:wxr_version>1.2</wp:wxr_version>
{channel_body}
</channel>
</rss>"#
    )
}

fn options(source: &str, source_dir: &std::path::Path) -> MigrationOptions {
    MigrationOptions {
        source: source.to_string(),
        limit: 0,
        alias: false,
        skip_duplicate: false,
        import_images: ImportImages::Disabled,
        paragraph_fix: false,
        default_category: "uncategorized".to_string(),
        post_asset_folder: false,
        source_dir: source_dir.to_str().unwrap().to_string(),
    }
}

async fn migrate(opts: &MigrationOptions) -> Result<wxr_migrate::MigrationSummary, MigrateError> {
    let store = FileStore::new(&opts.source_dir);
    migrator::run(&reqwest::Client::new(), &store, &Html2md, opts).await
}

#[tokio::test]
async fn test_full_post_front_matter() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("export.xml");
    std::fs::write(
        &export,
        wxr(r#"
    <wp:category><wp:cat_name><![CDATA[ipsum]]></wp:cat_name><wp:category_parent><![CDATA[lorem]]></wp:category_parent></wp:category>
    <wp:category><wp:cat_name><![CDATA[lorem]]></wp:cat_name><wp:category_parent></wp:category_parent></wp:category>
    <item>
        <title>Hello World</title>
        <link>http://example.com/2020/07/hello-world/</link>
        <pubDate>Tue, 07 Jul 2020 10:30:00 +0000</pubDate>
        <wp:post_date>2020-07-07 10:30:00</wp:post_date>
        <wp:post_id>12</wp:post_id>
        <wp:post_name>hello-world</wp:post_name>
        <wp:post_type>post</wp:post_type>
        <wp:status>publish</wp:status>
        <wp:comment_status>closed</wp:comment_status>
        <category domain="category" nicename="ipsum"><![CDATA[ipsum]]></category>
        <category domain="post_tag" nicename="rust"><![CDATA[rust]]></category>
        <content:encoded><![CDATA[<p>Welcome to <strong>WordPress</strong>.</p>]]></content:encoded>
    </item>"#),
    )
    .unwrap();

    let source_dir = dir.path().join("source");
    let mut opts = options(export.to_str().unwrap(), &source_dir);
    opts.alias = true;

    let summary = migrate(&opts).await.unwrap();
    assert_eq!(summary.migrated, 1);
    assert_eq!(summary.failed, 0);

    let written =
        std::fs::read_to_string(source_dir.join("_posts/hello-world.md")).unwrap();
    assert!(written.starts_with("---\ntitle: Hello World\n"));
    assert!(written.contains("id: 12\n"));
    assert!(written.contains("date: 2020-07-07 10:30:00\n"));
    assert!(written.contains("tags:\n  - rust\n"));
    assert!(written.contains("categories:\n  - - lorem\n    - ipsum\n"));
    assert!(written.contains("comments: false\n"));
    assert!(written.contains("alias: /2020/07/hello-world/\n"));
    assert!(written.contains("**WordPress**"));
}

#[tokio::test]
async fn test_remote_source_with_image_import() {
    let server = MockServer::start().await;
    let image_url = format!("{}/wp-content/uploads/2020/07/hexo.png", server.uri());
    let body = wxr(&format!(
        r#"
    <item>
        <title>With Image</title>
        <content:encoded><![CDATA[<p>Look:</p><img src="{image_url}" alt="logo" />]]></content:encoded>
    </item>
    <item>
        <title>hexo</title>
        <link>http://example.com/2020/07/with-image/hexo/</link>
        <wp:post_type>attachment</wp:post_type>
        <wp:attachment_url>{image_url}</wp:attachment_url>
        <wp:postmeta>
            <wp:meta_key>_wp_attached_file</wp:meta_key>
            <wp:meta_value>2020/07/hexo.png</wp:meta_value>
        </wp:postmeta>
    </item>"#
    ));

    Mock::given(method("GET"))
        .and(path("/export.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-content/uploads/2020/07/hexo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source_dir = dir.path().join("source");
    let mut opts = options(&format!("{}/export.xml", server.uri()), &source_dir);
    opts.import_images = ImportImages::All;

    let summary = migrate(&opts).await.unwrap();
    assert_eq!(summary.migrated, 1);
    assert_eq!(summary.images, 1);

    // The image landed under the flat upload-relative layout
    let stored = std::fs::read(source_dir.join("2020/07/hexo.png")).unwrap();
    assert_eq!(stored, PNG_BYTES);

    // The attachment itself produced no document, and the post's reference
    // now points at the local copy
    let written =
        std::fs::read_to_string(source_dir.join("_posts/with-image.md")).unwrap();
    assert!(written.contains("](/2020/07/hexo.png)"));
    assert!(!written.contains(&image_url));
    assert!(!source_dir.join("_posts/hexo.md").exists());
}

#[tokio::test]
async fn test_unreachable_image_leaves_reference_remote() {
    let server = MockServer::start().await;
    let image_url = format!("{}/uploads/gone.png", server.uri());
    let body = wxr(&format!(
        r#"
    <item>
        <title>Broken Image</title>
        <content:encoded><![CDATA[<img src="{image_url}" alt="x" />]]></content:encoded>
    </item>
    <item>
        <title>gone</title>
        <wp:post_type>attachment</wp:post_type>
        <wp:attachment_url>{image_url}</wp:attachment_url>
    </item>"#
    ));

    Mock::given(method("GET"))
        .and(path("/export.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uploads/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source_dir = dir.path().join("source");
    let mut opts = options(&format!("{}/export.xml", server.uri()), &source_dir);
    opts.import_images = ImportImages::All;

    let summary = migrate(&opts).await.unwrap();
    assert_eq!(summary.migrated, 1);
    assert_eq!(summary.images, 0);

    let written =
        std::fs::read_to_string(source_dir.join("_posts/broken-image.md")).unwrap();
    assert!(written.contains(&image_url));
}

#[tokio::test]
async fn test_remote_source_http_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let opts = options(&format!("{}/export.xml", server.uri()), dir.path());

    let result = migrate(&opts).await;
    assert!(matches!(result, Err(MigrateError::Source(_))));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_non_wxr_document_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("feed.xml");
    std::fs::write(&export, "<feed xmlns=\"http://www.w3.org/2005/Atom\"></feed>").unwrap();

    let opts = options(export.to_str().unwrap(), dir.path());
    let result = migrate(&opts).await;
    assert!(matches!(result, Err(MigrateError::Feed(_))));
}

#[tokio::test]
async fn test_pages_and_drafts_layout() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("export.xml");
    std::fs::write(
        &export,
        wxr(r#"
    <item>
        <title>About</title>
        <wp:post_type>page</wp:post_type>
        <content:encoded><![CDATA[<p>About page</p>]]></content:encoded>
        <category domain="category" nicename="news"><![CDATA[news]]></category>
    </item>
    <item>
        <title>Work in Progress</title>
        <wp:status>draft</wp:status>
        <content:encoded><![CDATA[<p>soon</p>]]></content:encoded>
    </item>"#),
    )
    .unwrap();

    let source_dir = dir.path().join("source");
    let opts = options(export.to_str().unwrap(), &source_dir);
    let summary = migrate(&opts).await.unwrap();
    assert_eq!(summary.migrated, 2);

    // Pages never carry tags or categories, not even the default
    let page = std::fs::read_to_string(source_dir.join("about.md")).unwrap();
    assert!(!page.contains("categories:"));

    assert!(source_dir.join("_drafts/work-in-progress.md").exists());
}

#[tokio::test]
async fn test_excerpt_becomes_more_marker() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("export.xml");
    std::fs::write(
        &export,
        wxr(r#"
    <item>
        <title>Teased</title>
        <excerpt:encoded><![CDATA[<p>The teaser.</p>]]></excerpt:encoded>
        <content:encoded><![CDATA[<p>The body.</p>]]></content:encoded>
    </item>"#),
    )
    .unwrap();

    let source_dir = dir.path().join("source");
    let opts = options(export.to_str().unwrap(), &source_dir);
    migrate(&opts).await.unwrap();

    let written = std::fs::read_to_string(source_dir.join("_posts/teased.md")).unwrap();
    let teaser = written.find("The teaser.").unwrap();
    let marker = written.find("<!-- more -->").unwrap();
    let body = written.find("The body.").unwrap();
    assert!(teaser < marker && marker < body);
}

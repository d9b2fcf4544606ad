use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while acquiring the raw feed bytes.
///
/// All four variants are fatal to the run: without a feed document there is
/// nothing to migrate.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local source path does not exist.
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),

    /// Local source path exists but could not be read.
    #[error("Failed to read source file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Source unreachable: {0}")]
    Request(#[from] reqwest::Error),

    /// HTTP response with non-2xx status code.
    #[error("Source unreachable: HTTP status {0}")]
    HttpStatus(u16),
}

/// Returns true when the source string should be fetched over HTTP.
fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Obtains the raw feed bytes from a local path or a remote URL.
///
/// An absolute `http(s)://` source is fetched with a single GET — no retry,
/// no redirect handling beyond what the client performs by default. Anything
/// else is treated as a local file path.
///
/// # Errors
///
/// - [`SourceError::Request`] / [`SourceError::HttpStatus`] when the HTTP
///   request errors or returns a non-2xx status
/// - [`SourceError::NotFound`] when the local path does not exist
/// - [`SourceError::Io`] for other local read failures
pub async fn load_source(client: &reqwest::Client, source: &str) -> Result<Vec<u8>, SourceError> {
    if is_remote(source) {
        let response = client.get(source).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        return Ok(bytes.to_vec());
    }

    let path = Path::new(source);
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    tokio::fs::read(path).await.map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

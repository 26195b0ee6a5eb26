use crate::error::MirrorError;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where a manifest or checksum listing is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextSource {
    Local(PathBuf),
    Remote(Url),
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Local(path) => write!(f, "{}", path.display()),
            TextSource::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Reads the whole text of `source`. Any IO, network or non-2xx failure is
/// reported as [`MirrorError::SourceUnavailable`].
pub async fn fetch_text(
    client: &reqwest::Client,
    source: &TextSource,
) -> Result<String, MirrorError> {
    let unavailable = |reason: String| MirrorError::SourceUnavailable {
        location: source.to_string(),
        reason,
    };

    match source {
        TextSource::Local(path) => {
            tracing::debug!(path = %path.display(), "Reading local file");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| unavailable(e.to_string()))
        }
        TextSource::Remote(url) => {
            tracing::debug!(%url, "Fetching remote file");
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| unavailable(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(unavailable(format!("HTTP status {status}")));
            }

            response.text().await.map_err(|e| unavailable(e.to_string()))
        }
    }
}

use crate::verification::{ContentDigest, ContentDigestHasher, DigestAlgorithm};
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;
use tokio::io::AsyncReadExt;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Snapshot of a destination path taken right before a download decision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalFileState {
    pub exists: bool,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
}

impl LocalFileState {
    /// Present with at least one byte. Empty files count as incomplete.
    pub fn has_content(&self) -> bool {
        self.exists && self.size_bytes > 0
    }
}

/// Reports the state of `path`. A missing path is the common case, not an error.
pub async fn inspect(path: &Path) -> LocalFileState {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => LocalFileState {
            exists: true,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok(),
        },
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Destination exists but is not a regular file");
            LocalFileState {
                exists: true,
                ..LocalFileState::default()
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => LocalFileState::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not stat destination");
            LocalFileState::default()
        }
    }
}

/// Streams `path` through the hasher for `algorithm`.
pub async fn digest(path: &Path, algorithm: DigestAlgorithm) -> std::io::Result<ContentDigest> {
    let file = tokio::fs::File::open(path).await?;
    let mut reader = tokio::io::BufReader::new(file);
    let mut hasher = ContentDigestHasher::new(algorithm);
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

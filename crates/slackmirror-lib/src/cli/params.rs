use crate::download::EngineOptions;
use crate::source::TextSource;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Checksum listing location plus the prefix that aligns its paths with
/// manifest locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumSource {
    pub source: TextSource,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct MirrorParams {
    pub base_url: Url,
    pub manifest: TextSource,
    pub checksums: Option<ChecksumSource>,
    pub output_dir: PathBuf,
    pub filters: HashSet<String>,
    pub request_timeout: Duration,
    pub engine: EngineOptions,
    pub strict: bool,
}

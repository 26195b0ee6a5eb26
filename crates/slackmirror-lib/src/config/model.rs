use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub download: DownloadConfig,
    pub output: OutputConfig,
    /// Default package name filter; empty means every package.
    pub packages: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct MirrorConfig {
    pub base_url: String,
    /// Manifest path relative to `base_url`.
    pub manifest_path: String,
    /// Checksum listing relative to `base_url`; `None` disables verification.
    pub checksums_path: Option<String>,
    /// Prefix that lines checksum paths up with manifest locations. Defaults
    /// to the directory part of `checksums_path`.
    pub checksums_prefix: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://slackware.oregonstate.edu/slackware64-current".to_string(),
            manifest_path: "slackware64/PACKAGES.TXT".to_string(),
            checksums_path: Some("slackware64/CHECKSUMS.md5".to_string()),
            checksums_prefix: None,
        }
    }
}

impl MirrorConfig {
    pub fn effective_checksums_prefix(&self) -> String {
        if let Some(prefix) = &self.checksums_prefix {
            return prefix.clone();
        }
        self.checksums_path
            .as_deref()
            .and_then(|path| path.rsplit_once('/'))
            .map(|(dir, _)| dir.to_string())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DownloadConfig {
    /// Ceiling in KB/s; 0 disables throttling.
    pub rate_limit_kbps: u64,
    pub sleep_secs: u64,
    pub chunk_size: usize,
    pub idle_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub preserve_existing: bool,
    pub overwrite: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            rate_limit_kbps: 500,
            sleep_secs: 3,
            chunk_size: 32 * 1024,
            idle_delay_ms: 100,
            request_timeout_secs: 60,
            preserve_existing: false,
            overwrite: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
        }
    }
}

use crate::cli::args::Command;
use crate::cli::params::{ChecksumSource, MirrorParams};
use crate::config::{Config, load_config};
use crate::download::{EngineOptions, RateLimiter};
use crate::error::MirrorError;
use crate::source::TextSource;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Loads configuration and merges the command-line request on top of it.
pub fn resolve_command(command: Command) -> Result<MirrorParams, MirrorError> {
    let app_config = load_config(command.config_path.as_deref())?;
    resolve_with_config(command, app_config)
}

pub fn resolve_with_config(
    command: Command,
    app_config: Config,
) -> Result<MirrorParams, MirrorError> {
    let Config {
        mirror,
        download,
        output,
        packages,
    } = app_config;

    let raw_base_url = command.base_url.unwrap_or_else(|| mirror.base_url.clone());
    let base_url = parse_base_url(&raw_base_url)?;

    let manifest = match command.packages_file {
        Some(path) => TextSource::Local(PathBuf::from(path)),
        None => TextSource::Remote(mirror_url(&base_url, &mirror.manifest_path)),
    };

    let checksums = if command.no_checksums {
        None
    } else if let Some(path) = command.checksums_file {
        Some(ChecksumSource {
            source: TextSource::Local(PathBuf::from(path)),
            prefix: mirror.checksums_prefix.clone().unwrap_or_default(),
        })
    } else {
        mirror
            .checksums_path
            .as_deref()
            .map(|checksums_path| ChecksumSource {
                source: TextSource::Remote(mirror_url(&base_url, checksums_path)),
                prefix: mirror.effective_checksums_prefix(),
            })
    };

    if download.chunk_size == 0 {
        return Err(MirrorError::CliArgumentValidation {
            details: "download.chunk_size must be greater than 0.".to_string(),
        });
    }

    let overwrite = command.overwrite || download.overwrite;
    let preserve_existing = command.preserve_existing || download.preserve_existing;
    if overwrite && preserve_existing {
        tracing::warn!("Both overwrite and preserve-existing are set; overwrite takes precedence");
    }

    let filters = if command.packages.is_empty() {
        packages.into_iter().collect()
    } else {
        command.packages.into_iter().collect()
    };

    Ok(MirrorParams {
        base_url,
        manifest,
        checksums,
        output_dir: command.output_dir.map(PathBuf::from).unwrap_or(output.path),
        filters,
        request_timeout: Duration::from_secs(download.request_timeout_secs),
        engine: EngineOptions {
            rate_limiter: RateLimiter::new(
                command.rate_limit_kbps.unwrap_or(download.rate_limit_kbps),
                Duration::from_millis(download.idle_delay_ms),
            ),
            sleep_between: Duration::from_secs(command.sleep_secs.unwrap_or(download.sleep_secs)),
            chunk_size: download.chunk_size,
            preserve_existing,
            overwrite,
            dry_run: command.dry_run,
        },
        strict: command.strict,
    })
}

fn parse_base_url(raw: &str) -> Result<Url, MirrorError> {
    let url = Url::parse(raw).map_err(|e| MirrorError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(MirrorError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

/// Appends a `/`-separated relative path to the mirror root.
fn mirror_url(base_url: &Url, relative: &str) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(relative.split('/').filter(|segment| !segment.is_empty() && *segment != "."));
    }
    url
}

use super::types::{DownloadTarget, TargetPlan};
use crate::checksum::ChecksumIndex;
use crate::error::MirrorError;
use crate::manifest::PackageRecord;
use itertools::Itertools;
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// Turns manifest records into the ordered, deduplicated set of targets.
///
/// Targets are deduplicated by destination path and keep the order in which
/// their first record appeared. A non-empty `filters` set keeps only records
/// whose name matches exactly.
pub fn plan_targets(
    records: &[PackageRecord],
    filters: &HashSet<String>,
    checksums: Option<&ChecksumIndex>,
    base_url: &Url,
) -> Result<TargetPlan, MirrorError> {
    let mut targets = Vec::new();

    for record in records
        .iter()
        .filter(|record| filters.is_empty() || filters.contains(&record.name))
        .unique_by(|record| destination_path(record))
    {
        if !is_contained(record) {
            tracing::warn!(
                name = %record.name,
                location = %record.location,
                "Skipping manifest entry that points outside the local store"
            );
            continue;
        }

        targets.push(DownloadTarget {
            name: record.name.clone(),
            location: record.location.clone(),
            url: target_url(base_url, record)?,
            destination_path: destination_path(record),
            expected_size_kb: record.compressed_size_kb,
            reference_digest: checksums
                .and_then(|index| index.lookup(&record.location, &record.name))
                .cloned(),
        });
    }

    let total_size_kb = targets
        .iter()
        .fold(0u64, |total, target| total.saturating_add(target.expected_size_kb));

    Ok(TargetPlan {
        targets,
        total_size_kb,
    })
}

fn destination_path(record: &PackageRecord) -> PathBuf {
    record
        .location
        .split('/')
        .filter(|segment| !segment.is_empty())
        .chain(std::iter::once(record.name.as_str()))
        .collect()
}

fn is_contained(record: &PackageRecord) -> bool {
    let location_ok = record.location.split('/').all(|segment| segment != "..");
    let name_ok = !record.name.contains('/') && record.name != "." && record.name != "..";
    location_ok && name_ok
}

fn target_url(base_url: &Url, record: &PackageRecord) -> Result<Url, MirrorError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| MirrorError::InvalidUrl {
            url: base_url.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        })?
        .pop_if_empty()
        .extend(record.location.split('/').filter(|segment| !segment.is_empty()))
        .push(&record.name);
    Ok(url)
}

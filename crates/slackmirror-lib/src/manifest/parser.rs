use super::types::{PackageRecord, normalize_location};
use crate::error::MirrorError;

const NAME_FIELD: &str = "PACKAGE NAME:";
const LOCATION_FIELD: &str = "PACKAGE LOCATION:";
const SIZE_FIELD: &str = "PACKAGE SIZE (compressed):";

#[derive(Default)]
struct PendingEntry {
    name: Option<String>,
    location: Option<String>,
}

/// Scrapes `PACKAGE NAME` / `PACKAGE LOCATION` / `PACKAGE SIZE (compressed)`
/// blocks out of a `PACKAGES.TXT` style manifest.
///
/// Records come back in manifest order. Entries missing a field before the
/// next `PACKAGE NAME:` line are dropped. Other lines (uncompressed size,
/// descriptions) are ignored.
pub fn parse_manifest(text: &str) -> Result<Vec<PackageRecord>, MirrorError> {
    if text.trim().is_empty() {
        return Err(MirrorError::ManifestFormat {
            details: "manifest is empty".to_string(),
        });
    }

    let mut records = Vec::new();
    let mut pending = PendingEntry::default();
    let mut dropped = 0usize;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(value) = line.strip_prefix(NAME_FIELD) {
            if pending.name.is_some() {
                dropped += 1;
            }
            let name = value.trim();
            pending = PendingEntry {
                name: (!name.is_empty()).then(|| name.to_string()),
                location: None,
            };
        } else if let Some(value) = line.strip_prefix(LOCATION_FIELD) {
            if pending.name.is_some() && pending.location.is_none() {
                pending.location = Some(normalize_location(value));
            }
        } else if let Some(value) = line.strip_prefix(SIZE_FIELD) {
            let PendingEntry {
                name: Some(name),
                location: Some(location),
            } = std::mem::take(&mut pending)
            else {
                continue;
            };
            records.push(PackageRecord {
                name,
                location,
                compressed_size_kb: parse_size_kb(value),
            });
        }
    }

    if pending.name.is_some() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped incomplete manifest entries");
    }

    if records.is_empty() {
        return Err(MirrorError::ManifestFormat {
            details: "no package entries found".to_string(),
        });
    }

    Ok(records)
}

/// `"1234 K"` -> 1234. Anything unparsable counts as zero.
fn parse_size_kb(value: &str) -> u64 {
    value
        .split_whitespace()
        .next()
        .and_then(|number| number.parse().ok())
        .unwrap_or(0)
}

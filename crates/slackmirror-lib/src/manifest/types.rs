/// One package entry scraped from a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageRecord {
    /// Package file name, e.g. `a-1.0.tgz`.
    pub name: String,
    /// Manifest-relative directory with any leading `./` and trailing `/` removed.
    pub location: String,
    /// Compressed size in kilobytes; zero when the manifest value did not parse.
    pub compressed_size_kb: u64,
}

/// Normalizes a manifest location: `./slackware64/a/` becomes `slackware64/a`.
pub fn normalize_location(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
